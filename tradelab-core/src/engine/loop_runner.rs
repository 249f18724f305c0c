//! Bar-by-bar simulation loop.
//!
//! Three steps per bar, strictly in date order:
//! 1. Strategy: feed the bar to the strategy's indicators, then decide
//! 2. Broker: execute the resulting order, if any, at the bar's close
//! 3. Post-bar: mark-to-market and append a portfolio snapshot

use log::{debug, info, warn};

use crate::broker::{Broker, ExecutionError, ExecutionOutcome, RejectReason};
use crate::domain::{BarSeries, EquityCurve, OrderSide, PortfolioSnapshot};
use crate::strategy::Strategy;

use super::state::{EngineConfig, SimulationError, SimulationResult};
use super::trade_extraction::extract_trades;

/// Run `strategy` over `series` and return the full result.
///
/// Strategy and broker start fresh every call, so the same inputs always
/// produce the same result. Any open position at the last bar stays open and
/// is valued at that bar's close.
pub fn run_simulation<S: Strategy + ?Sized>(
    series: &BarSeries,
    strategy: &mut S,
    config: &EngineConfig,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;
    strategy.reset();

    let mut broker = Broker::new(config.initial_cash, config.commission_rate);
    let mut equity_curve = EquityCurve::with_capacity(series.len());
    let mut fills = Vec::new();

    info!(
        "starting {} over {} bars ({} to {}), cash {:.2}",
        strategy.name(),
        series.len(),
        series.first_date(),
        series.last_date(),
        config.initial_cash
    );

    for (t, bar) in series.iter().enumerate() {
        // ─── Strategy ───
        let indicators = strategy.update(bar);
        let order = strategy.decide(bar, &indicators, &broker.handle());

        // ─── Broker ───
        if let Some(order) = order {
            let (side, size) = (order.side, order.size);
            broker.submit(order)?;
            match broker.process_pending(t, bar.date, bar.close)? {
                Some(ExecutionOutcome::Filled(fill)) => fills.push(fill),
                Some(ExecutionOutcome::Rejected(RejectReason::InsufficientCash {
                    required,
                    available,
                })) if side == OrderSide::Buy => {
                    // Strategy sizing should never produce this.
                    return Err(ExecutionError::UnaffordableBuy {
                        size,
                        cost: required,
                        cash: available,
                    }
                    .into());
                }
                Some(ExecutionOutcome::Rejected(reason)) => {
                    warn!("{}: {side} order dropped: {reason:?}", bar.date);
                }
                None => {}
            }
        }

        // ─── Post-bar ───
        let position = broker.position();
        let position_value = position.market_value(bar.close);
        let total_value = broker.portfolio_value(bar.close);
        debug_assert!(
            broker.cash() + position.size as f64 * bar.close == total_value,
            "accounting identity broken at bar {t}"
        );
        debug_assert!(position.size >= 0, "negative position at bar {t}");

        equity_curve.push(PortfolioSnapshot {
            date: bar.date,
            cash: broker.cash(),
            position_size: position.size,
            position_value,
            total_value,
        });
        debug!("{}: close {:.2}, value {:.2}", bar.date, bar.close, total_value);
    }

    let trades = extract_trades(&fills);
    let position = broker.position();
    let open_position = (!position.is_flat()).then_some(position);

    if let Some(final_value) = equity_curve.final_value() {
        info!(
            "finished {}: {} fills, {} trades, final value {:.2}",
            strategy.name(),
            fills.len(),
            trades.len(),
            final_value
        );
    }

    Ok(SimulationResult {
        equity_curve,
        fills,
        trades,
        open_position,
        final_cash: broker.cash(),
        total_commission: broker.commission_paid(),
        bar_count: series.len(),
        warmup_bars: strategy.warmup_bars(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerHandle;
    use crate::domain::{Bar, Order};
    use crate::strategy::{BarIndicators, StrategySpec};
    use crate::synthetic::{from_closes, random_walk};

    /// Buys a fixed size at one bar and sells it at another.
    struct Scripted {
        buy_at: usize,
        sell_at: usize,
        size: i64,
        seen: usize,
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn warmup_bars(&self) -> usize {
            0
        }

        fn update(&mut self, _bar: &Bar) -> BarIndicators {
            self.seen += 1;
            BarIndicators::default()
        }

        fn decide(&self, _bar: &Bar, _ind: &BarIndicators, _broker: &BrokerHandle) -> Option<Order> {
            let t = self.seen - 1;
            if t == self.buy_at {
                Some(Order::buy(self.size))
            } else if t == self.sell_at {
                Some(Order::sell(self.size))
            } else {
                None
            }
        }

        fn reset(&mut self) {
            self.seen = 0;
        }
    }

    fn scripted(buy_at: usize, sell_at: usize, size: i64) -> Scripted {
        Scripted {
            buy_at,
            sell_at,
            size,
            seen: 0,
        }
    }

    #[test]
    fn buy_at_50_sell_at_55() {
        let series = from_closes(&[50.0, 52.0, 55.0, 53.0]).unwrap();
        let mut strategy = scripted(0, 2, 100);
        let result =
            run_simulation(&series, &mut strategy, &EngineConfig::frictionless(100_000.0)).unwrap();

        assert_eq!(result.final_cash, 100_500.0);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].pnl, 500.0);
        assert_eq!(result.open_position, None);
        assert_eq!(result.equity_curve.values(), vec![100_000.0, 100_200.0, 100_500.0, 100_500.0]);
    }

    #[test]
    fn open_position_is_reported_not_liquidated() {
        let series = from_closes(&[10.0, 11.0, 12.0]).unwrap();
        let mut strategy = scripted(1, usize::MAX, 5);
        let result =
            run_simulation(&series, &mut strategy, &EngineConfig::frictionless(1_000.0)).unwrap();

        assert!(result.trades.is_empty());
        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.open_position.map(|p| p.size), Some(5));
        assert_eq!(result.final_value(), Some(1_000.0 - 55.0 + 60.0));
    }

    #[test]
    fn oversized_sell_aborts_the_run() {
        let series = from_closes(&[10.0, 11.0, 12.0]).unwrap();
        let mut strategy = scripted(usize::MAX, 1, 5);
        let err = run_simulation(&series, &mut strategy, &EngineConfig::frictionless(1_000.0))
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Execution(ExecutionError::OversizedSell { .. })
        ));
    }

    #[test]
    fn unaffordable_buy_aborts_the_run() {
        let series = from_closes(&[10.0, 11.0]).unwrap();
        let mut strategy = scripted(0, usize::MAX, 1_000);
        let err = run_simulation(&series, &mut strategy, &EngineConfig::frictionless(1_000.0))
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Execution(ExecutionError::UnaffordableBuy { size: 1_000, .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let series = from_closes(&[10.0]).unwrap();
        let mut strategy = scripted(0, 1, 1);
        let err = run_simulation(&series, &mut strategy, &EngineConfig::new(-1.0, 0.0)).unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));
    }

    #[test]
    fn one_snapshot_per_bar() {
        let series = random_walk(250, 7);
        let mut strategy = StrategySpec::ma_crossover().build().unwrap();
        let result = run_simulation(&series, &mut strategy, &EngineConfig::default()).unwrap();
        assert_eq!(result.equity_curve.len(), 250);
        assert_eq!(result.bar_count, 250);
        assert_eq!(result.warmup_bars, 30);
        for (snap, bar) in result.equity_curve.snapshots().iter().zip(series.iter()) {
            assert_eq!(snap.date, bar.date);
            assert!(snap.position_size >= 0);
            assert_eq!(snap.cash + snap.position_size as f64 * bar.close, snap.total_value);
        }
    }

    #[test]
    fn rerun_with_same_strategy_instance_is_identical() {
        let series = random_walk(300, 11);
        let mut strategy = StrategySpec::rsi().build().unwrap();
        let config = EngineConfig::default();
        let first = run_simulation(&series, &mut strategy, &config).unwrap();
        let second = run_simulation(&series, &mut strategy, &config).unwrap();
        assert_eq!(first, second);
    }
}
