//! Closed set of strategy variants, buildable from serialized parameters.

use serde::{Deserialize, Serialize};

use crate::broker::BrokerHandle;
use crate::domain::{Bar, Order};

use super::{
    BarIndicators, BollingerStrategy, MaCrossover, MaTrend, RsiStrategy, Strategy, StrategyError,
};

/// Strategy parameters (serializable enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    /// Short SMA crosses long SMA.
    MaCrossover { short_window: usize, long_window: usize },

    /// RSI dips below `oversold`, exit above `overbought`.
    Rsi {
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    },

    /// Close touches the lower band, exit at the upper band.
    Bollinger { bb_period: usize, bb_dev: f64 },

    /// Close above a short SMA stacked on a long SMA.
    MaTrend { short_window: usize, long_window: usize },
}

impl StrategySpec {
    pub const fn ma_crossover() -> Self {
        StrategySpec::MaCrossover {
            short_window: 10,
            long_window: 30,
        }
    }

    pub const fn rsi() -> Self {
        StrategySpec::Rsi {
            rsi_period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }

    pub const fn bollinger() -> Self {
        StrategySpec::Bollinger {
            bb_period: 20,
            bb_dev: 2.0,
        }
    }

    pub const fn ma_trend() -> Self {
        StrategySpec::MaTrend {
            short_window: 5,
            long_window: 20,
        }
    }

    pub fn build(&self) -> Result<StrategyKind, StrategyError> {
        Ok(match *self {
            StrategySpec::MaCrossover {
                short_window,
                long_window,
            } => StrategyKind::MaCrossover(MaCrossover::new(short_window, long_window)?),
            StrategySpec::Rsi {
                rsi_period,
                oversold,
                overbought,
            } => StrategyKind::Rsi(RsiStrategy::new(rsi_period, oversold, overbought)?),
            StrategySpec::Bollinger { bb_period, bb_dev } => {
                StrategyKind::Bollinger(BollingerStrategy::new(bb_period, bb_dev)?)
            }
            StrategySpec::MaTrend {
                short_window,
                long_window,
            } => StrategyKind::MaTrend(MaTrend::new(short_window, long_window)?),
        })
    }
}

/// A built strategy; dispatches to the wrapped variant.
#[derive(Debug, Clone)]
pub enum StrategyKind {
    MaCrossover(MaCrossover),
    Rsi(RsiStrategy),
    Bollinger(BollingerStrategy),
    MaTrend(MaTrend),
}

impl StrategyKind {
    fn inner(&self) -> &dyn Strategy {
        match self {
            StrategyKind::MaCrossover(s) => s,
            StrategyKind::Rsi(s) => s,
            StrategyKind::Bollinger(s) => s,
            StrategyKind::MaTrend(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Strategy {
        match self {
            StrategyKind::MaCrossover(s) => s,
            StrategyKind::Rsi(s) => s,
            StrategyKind::Bollinger(s) => s,
            StrategyKind::MaTrend(s) => s,
        }
    }
}

impl Strategy for StrategyKind {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn warmup_bars(&self) -> usize {
        self.inner().warmup_bars()
    }

    fn update(&mut self, bar: &Bar) -> BarIndicators {
        self.inner_mut().update(bar)
    }

    fn decide(&self, bar: &Bar, indicators: &BarIndicators, broker: &BrokerHandle) -> Option<Order> {
        self.inner().decide(bar, indicators, broker)
    }

    fn reset(&mut self) {
        self.inner_mut().reset()
    }
}
