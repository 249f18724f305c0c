//! Moving average crossover.
//!
//! - Entry: SMA(short) crosses above SMA(long)
//! - Exit: SMA(short) crosses below SMA(long)

use crate::broker::BrokerHandle;
use crate::domain::{Bar, Order};
use crate::indicators::{Cross, CrossOver, Sma, StreamingIndicator};

use super::{transition, BarIndicators, Strategy, StrategyError, StrategyState};

#[derive(Debug, Clone)]
pub struct MaCrossover {
    fast: Sma,
    slow: Sma,
    cross: CrossOver,
    name: String,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, StrategyError> {
        if short_window >= long_window {
            return Err(StrategyError::InvalidWindows {
                short: short_window,
                long: long_window,
            });
        }
        Ok(Self {
            fast: Sma::new(short_window)?,
            slow: Sma::new(long_window)?,
            cross: CrossOver::new(),
            name: format!("ma_crossover_{short_window}_{long_window}"),
        })
    }

    pub fn short_window(&self) -> usize {
        self.fast.period()
    }

    pub fn long_window(&self) -> usize {
        self.slow.period()
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        // The first defined crossover value is always 0; a real cross needs
        // one more bar.
        self.slow.period()
    }

    fn update(&mut self, bar: &Bar) -> BarIndicators {
        let fast_ma = self.fast.update(bar.close);
        let slow_ma = self.slow.update(bar.close);
        let cross = self.cross.update(fast_ma, slow_ma);
        BarIndicators {
            fast_ma,
            slow_ma,
            cross,
            ..BarIndicators::default()
        }
    }

    fn decide(&self, bar: &Bar, indicators: &BarIndicators, broker: &BrokerHandle) -> Option<Order> {
        let entry = indicators.cross == Some(Cross::Above);
        let exit = indicators.cross == Some(Cross::Below);
        let state = StrategyState::from_position(&broker.position());
        transition(state, entry, exit, bar, broker)
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.cross.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderSide;
    use crate::strategy::test_support::drive;

    #[test]
    fn buys_on_golden_cross_and_sells_on_death_cross() {
        let mut strategy = MaCrossover::new(2, 3).unwrap();
        let closes = [10.0, 10.0, 10.0, 9.0, 12.0, 13.0, 9.0, 7.0];
        let orders = drive(&mut strategy, &closes, 1_000.0);

        // bar 3: fast 9.5 < slow 9.67 (from equal at bar 2) -> cross below, flat, nothing
        assert!(orders[3].is_none());
        // bar 4: fast 10.5 > slow 10.33 -> cross above -> buy 1000 / 12
        let buy = orders[4].as_ref().unwrap();
        assert_eq!(buy.side, OrderSide::Buy);
        assert_eq!(buy.size, 83);
        assert!(orders[5].is_none());
        // bar 6: fast 11 < slow 11.33 -> cross below -> sell all
        let sell = orders[6].as_ref().unwrap();
        assert_eq!(sell.side, OrderSide::Sell);
        assert_eq!(sell.size, 83);
        assert!(orders[7].is_none());
    }

    #[test]
    fn no_orders_during_warmup() {
        let mut strategy = MaCrossover::new(3, 5).unwrap();
        let closes = [1.0, 5.0, 1.0, 5.0];
        assert!(drive(&mut strategy, &closes, 1_000.0).iter().all(Option::is_none));
        assert_eq!(strategy.warmup_bars(), 5);
    }

    #[test]
    fn rejects_inverted_windows() {
        assert_eq!(
            MaCrossover::new(30, 10).unwrap_err(),
            StrategyError::InvalidWindows { short: 30, long: 10 }
        );
        assert!(MaCrossover::new(0, 10).is_err());
    }

    #[test]
    fn reset_clears_indicator_state() {
        let mut strategy = MaCrossover::new(2, 3).unwrap();
        let first = drive(&mut strategy, &[10.0, 10.0, 10.0, 9.0, 12.0], 1_000.0);
        strategy.reset();
        let second = drive(&mut strategy, &[10.0, 10.0, 10.0, 9.0, 12.0], 1_000.0);
        assert_eq!(first, second);
    }
}
