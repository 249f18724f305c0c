//! Strategy state machine — turns per-bar indicator values into market orders.
//!
//! Every strategy is a two-state machine (`Flat`, `Long`) whose state is read
//! off the broker's position. Variants differ only in their entry and exit
//! conditions; sizing and the pending-order guard live in [`transition`].
//!
//! # Invariants
//! - `update()` sees bars strictly in date order; at bar i only bars <= i have
//!   been fed to the strategy's indicators.
//! - `decide()` is pure given its inputs.
//! - At most one order per bar.

pub mod bollinger;
pub mod kind;
pub mod ma_crossover;
pub mod ma_trend;
pub mod rsi;

pub use bollinger::BollingerStrategy;
pub use kind::{StrategyKind, StrategySpec};
pub use ma_crossover::MaCrossover;
pub use ma_trend::MaTrend;
pub use rsi::RsiStrategy;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broker::BrokerHandle;
use crate::domain::{Bar, Order, Position};
use crate::indicators::{BollingerValue, Cross, IndicatorError};

/// Invalid strategy parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
    #[error("short window ({short}) must be smaller than long window ({long})")]
    InvalidWindows { short: usize, long: usize },
    #[error("RSI thresholds must satisfy 0 <= oversold < overbought <= 100 (got {oversold}, {overbought})")]
    InvalidThresholds { oversold: f64, overbought: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyState {
    Flat,
    Long,
}

impl StrategyState {
    pub fn from_position(position: &Position) -> Self {
        if position.is_long() {
            StrategyState::Long
        } else {
            StrategyState::Flat
        }
    }
}

/// Indicator values a strategy computed for one bar. Fields a variant does
/// not use stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BarIndicators {
    pub fast_ma: Option<f64>,
    pub slow_ma: Option<f64>,
    pub cross: Option<Cross>,
    pub rsi: Option<f64>,
    pub bands: Option<BollingerValue>,
}

/// A per-bar trading strategy.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Bars consumed before the entry/exit conditions can first be evaluated.
    fn warmup_bars(&self) -> usize;

    /// Feed the current bar to the strategy's indicators.
    fn update(&mut self, bar: &Bar) -> BarIndicators;

    /// Decide what to do at this bar, given this bar's indicators and a
    /// read-only view of the broker.
    fn decide(&self, bar: &Bar, indicators: &BarIndicators, broker: &BrokerHandle) -> Option<Order>;

    /// Clear all indicator state.
    fn reset(&mut self);
}

/// Shared Flat/Long transition.
///
/// - Flat + entry: Buy the largest whole-share size the cash covers,
///   commission included. No order if that size is 0.
/// - Long + exit: Sell the entire holding.
/// - Anything else, or an order already outstanding: no order.
pub fn transition(
    state: StrategyState,
    entry: bool,
    exit: bool,
    bar: &Bar,
    broker: &BrokerHandle,
) -> Option<Order> {
    if broker.has_pending_order() {
        return None;
    }
    match state {
        StrategyState::Flat if entry => {
            let size = affordable_size(broker.cash(), bar.close, broker.commission_rate());
            if size == 0 {
                debug!("{}: entry signal but cash {:.2} buys no shares", bar.date, broker.cash());
                return None;
            }
            debug!("{}: BUY CREATE {} @ {:.2}", bar.date, size, bar.close);
            Some(Order::buy(size))
        }
        StrategyState::Long if exit => {
            let size = broker.position().size;
            debug!("{}: SELL CREATE {} @ {:.2}", bar.date, size, bar.close);
            Some(Order::sell(size))
        }
        _ => None,
    }
}

/// floor(cash / (price * (1 + commission_rate))), adjusted down if rounding
/// would leave the broker's cost above `cash`.
pub fn affordable_size(cash: f64, price: f64, commission_rate: f64) -> i64 {
    let unit = price * (1.0 + commission_rate);
    if !(unit.is_finite() && unit > 0.0) || !(cash.is_finite() && cash > 0.0) {
        return 0;
    }
    let mut size = (cash / unit).floor() as i64;
    while size > 0 {
        let notional = size as f64 * price;
        if notional + notional * commission_rate <= cash {
            break;
        }
        size -= 1;
    }
    size
}


#[cfg(test)]
mod tests {
    use super::test_support::bar;
    use super::*;
    use crate::broker::Broker;
    use crate::domain::OrderSide;

    #[test]
    fn flat_entry_sizes_by_cash() {
        let broker = Broker::new(10_000.0, 0.0);
        let order = transition(StrategyState::Flat, true, false, &bar(0, 30.0), &broker.handle()).unwrap();
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.size, 333);
    }

    #[test]
    fn flat_without_entry_does_nothing() {
        let broker = Broker::new(10_000.0, 0.0);
        assert!(transition(StrategyState::Flat, false, true, &bar(0, 30.0), &broker.handle()).is_none());
    }

    #[test]
    fn long_exit_sells_everything() {
        let mut broker = Broker::new(10_000.0, 0.0);
        let b = bar(0, 50.0);
        broker.execute(Order::buy(120), 0, b.date, 50.0).unwrap();
        let state = StrategyState::from_position(&broker.position());
        assert_eq!(state, StrategyState::Long);
        let order = transition(state, true, true, &b, &broker.handle()).unwrap();
        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.size, 120);
    }

    #[test]
    fn cash_too_small_emits_nothing() {
        let broker = Broker::new(20.0, 0.0);
        assert!(transition(StrategyState::Flat, true, false, &bar(0, 30.0), &broker.handle()).is_none());
    }

    #[test]
    fn pending_order_blocks_transition() {
        let mut broker = Broker::new(10_000.0, 0.0);
        broker.submit(Order::buy(1)).unwrap();
        assert!(transition(StrategyState::Flat, true, false, &bar(0, 30.0), &broker.handle()).is_none());
    }

    #[test]
    fn sizing_leaves_room_for_commission() {
        // 10_000 / 100 = 100 shares, but 100 * 100 * 1.001 = 10_010 > cash.
        assert_eq!(affordable_size(10_000.0, 100.0, 0.001), 99);
        assert_eq!(affordable_size(10_000.0, 100.0, 0.0), 100);
        assert_eq!(affordable_size(0.0, 100.0, 0.0), 0);
        assert_eq!(affordable_size(1_000.0, 0.0, 0.0), 0);
    }

    #[test]
    fn sized_buy_is_always_affordable() {
        let mut broker = Broker::new(12_345.67, 0.0005);
        let b = bar(0, 37.13);
        let size = affordable_size(broker.cash(), b.close, broker.commission_rate());
        let outcome = broker.execute(Order::buy(size), 0, b.date, b.close).unwrap();
        assert!(outcome.fill().is_some());
        assert!(broker.cash() >= 0.0);
        assert!(broker.cash() < b.close * 1.0005);
    }
}
