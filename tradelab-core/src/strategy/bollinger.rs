//! Bollinger band reversion.
//!
//! - Entry: close <= lower band
//! - Exit: close >= upper band

use crate::broker::BrokerHandle;
use crate::domain::{Bar, Order};
use crate::indicators::{BollingerBands, StreamingIndicator};

use super::{transition, BarIndicators, Strategy, StrategyError, StrategyState};

#[derive(Debug, Clone)]
pub struct BollingerStrategy {
    bands: BollingerBands,
    name: String,
}

impl BollingerStrategy {
    pub fn new(bb_period: usize, bb_dev: f64) -> Result<Self, StrategyError> {
        Ok(Self {
            bands: BollingerBands::new(bb_period, bb_dev)?,
            name: format!("bollinger_{bb_period}_{bb_dev}"),
        })
    }
}

impl Strategy for BollingerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.bands.lookback()
    }

    fn update(&mut self, bar: &Bar) -> BarIndicators {
        let bands = self.bands.update(bar.close);
        BarIndicators {
            fast_ma: bands.map(|b| b.middle),
            bands,
            ..BarIndicators::default()
        }
    }

    fn decide(&self, bar: &Bar, indicators: &BarIndicators, broker: &BrokerHandle) -> Option<Order> {
        let bands = indicators.bands?;
        let state = StrategyState::from_position(&broker.position());
        transition(
            state,
            bar.close <= bands.lower,
            bar.close >= bands.upper,
            bar,
            broker,
        )
    }

    fn reset(&mut self) {
        self.bands.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderSide;
    use crate::strategy::test_support::drive;

    #[test]
    fn buys_at_lower_band_and_sells_at_upper() {
        let mut strategy = BollingerStrategy::new(3, 1.0).unwrap();
        // bar 2: window [10, 10, 7], mean 9, sd sqrt(2) -> lower 7.59, close 7 below
        // bar 3: window [10, 7, 12], mean 9.67, sd 2.05 -> upper 11.72, close 12 above
        let orders = drive(&mut strategy, &[10.0, 10.0, 7.0, 12.0, 12.0], 700.0);

        let buy = orders[2].as_ref().unwrap();
        assert_eq!((buy.side, buy.size), (OrderSide::Buy, 100));
        let sell = orders[3].as_ref().unwrap();
        assert_eq!((sell.side, sell.size), (OrderSide::Sell, 100));
    }

    #[test]
    fn flat_prices_touch_both_bands() {
        // Zero-width bands: close == lower == upper, so entry fires once and the
        // exit fires on the next bar.
        let mut strategy = BollingerStrategy::new(2, 2.0).unwrap();
        let orders = drive(&mut strategy, &[10.0, 10.0, 10.0], 100.0);
        assert!(orders[0].is_none());
        assert_eq!(orders[1].as_ref().map(|o| o.side), Some(OrderSide::Buy));
        assert_eq!(orders[2].as_ref().map(|o| o.side), Some(OrderSide::Sell));
    }

    #[test]
    fn rejects_negative_deviation() {
        assert!(BollingerStrategy::new(20, -2.0).is_err());
    }
}
