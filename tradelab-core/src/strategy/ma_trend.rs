//! Stacked moving average trend follower.
//!
//! - Entry: close > SMA(short) > SMA(long)
//! - Exit: close < SMA(short)

use crate::broker::BrokerHandle;
use crate::domain::{Bar, Order};
use crate::indicators::{Sma, StreamingIndicator};

use super::{transition, BarIndicators, Strategy, StrategyError, StrategyState};

#[derive(Debug, Clone)]
pub struct MaTrend {
    short: Sma,
    long: Sma,
    name: String,
}

impl MaTrend {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, StrategyError> {
        if short_window >= long_window {
            return Err(StrategyError::InvalidWindows {
                short: short_window,
                long: long_window,
            });
        }
        Ok(Self {
            short: Sma::new(short_window)?,
            long: Sma::new(long_window)?,
            name: format!("ma_trend_{short_window}_{long_window}"),
        })
    }
}

impl Strategy for MaTrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.long.lookback()
    }

    fn update(&mut self, bar: &Bar) -> BarIndicators {
        BarIndicators {
            fast_ma: self.short.update(bar.close),
            slow_ma: self.long.update(bar.close),
            ..BarIndicators::default()
        }
    }

    fn decide(&self, bar: &Bar, indicators: &BarIndicators, broker: &BrokerHandle) -> Option<Order> {
        let (short, long) = (indicators.fast_ma?, indicators.slow_ma?);
        let entry = bar.close > short && short > long;
        let exit = bar.close < short;
        transition(StrategyState::from_position(&broker.position()), entry, exit, bar, broker)
    }

    fn reset(&mut self) {
        self.short.reset();
        self.long.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderSide;
    use crate::strategy::test_support::drive;

    #[test]
    fn enters_on_stacked_averages_and_exits_below_short() {
        let mut strategy = MaTrend::new(2, 3).unwrap();
        let orders = drive(&mut strategy, &[10.0, 10.0, 10.0, 11.0, 12.0, 11.0], 1_000.0);

        assert!(orders[..3].iter().all(Option::is_none));
        // bar 3: 11 > 10.5 > 10.33
        let buy = orders[3].as_ref().unwrap();
        assert_eq!((buy.side, buy.size), (OrderSide::Buy, 90));
        assert!(orders[4].is_none());
        // bar 5: 11 < 11.5
        let sell = orders[5].as_ref().unwrap();
        assert_eq!((sell.side, sell.size), (OrderSide::Sell, 90));
    }

    #[test]
    fn warmup_matches_long_window() {
        assert_eq!(MaTrend::new(5, 20).unwrap().warmup_bars(), 19);
        assert!(MaTrend::new(20, 20).is_err());
    }
}
