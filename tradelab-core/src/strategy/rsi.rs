//! RSI mean reversion.
//!
//! - Entry: RSI < oversold
//! - Exit: RSI > overbought

use crate::broker::BrokerHandle;
use crate::domain::{Bar, Order};
use crate::indicators::{Rsi, StreamingIndicator};

use super::{transition, BarIndicators, Strategy, StrategyError, StrategyState};

#[derive(Debug, Clone)]
pub struct RsiStrategy {
    rsi: Rsi,
    oversold: f64,
    overbought: f64,
    name: String,
}

impl RsiStrategy {
    pub fn new(rsi_period: usize, oversold: f64, overbought: f64) -> Result<Self, StrategyError> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !(in_range(oversold) && in_range(overbought) && oversold < overbought) {
            return Err(StrategyError::InvalidThresholds {
                oversold,
                overbought,
            });
        }
        Ok(Self {
            rsi: Rsi::new(rsi_period)?,
            oversold,
            overbought,
            name: format!("rsi_{rsi_period}_{oversold}_{overbought}"),
        })
    }

    pub fn oversold(&self) -> f64 {
        self.oversold
    }

    pub fn overbought(&self) -> f64 {
        self.overbought
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.rsi.lookback()
    }

    fn update(&mut self, bar: &Bar) -> BarIndicators {
        BarIndicators {
            rsi: self.rsi.update(bar.close),
            ..BarIndicators::default()
        }
    }

    fn decide(&self, bar: &Bar, indicators: &BarIndicators, broker: &BrokerHandle) -> Option<Order> {
        let rsi = indicators.rsi?;
        let state = StrategyState::from_position(&broker.position());
        transition(state, rsi < self.oversold, rsi > self.overbought, bar, broker)
    }

    fn reset(&mut self) {
        self.rsi.reset();
    }
}
