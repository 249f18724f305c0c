//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + factor * stddev(close, period)
//! - Lower: middle - factor * stddev(close, period)
//!
//! Uses population stddev (divide by N), kept incrementally from a running sum
//! and sum of squares.
//! Lookback: period - 1.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::{check_period, IndicatorError, StreamingIndicator};

/// All three bands for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    factor: f64,
    name: String,
    window: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl BollingerBands {
    pub fn new(period: usize, factor: f64) -> Result<Self, IndicatorError> {
        check_period("Bollinger", period)?;
        if !factor.is_finite() || factor < 0.0 {
            return Err(IndicatorError::InvalidFactor {
                indicator: "Bollinger",
                factor,
            });
        }
        Ok(Self {
            period,
            factor,
            name: format!("bollinger_{period}_{factor}"),
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            sum_sq: 0.0,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl StreamingIndicator for BollingerBands {
    type Output = BollingerValue;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, value: f64) -> Option<BollingerValue> {
        self.window.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
        if self.window.len() > self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
                self.sum_sq -= leaving * leaving;
            }
        }
        if self.window.len() < self.period {
            return None;
        }

        let n = self.period as f64;
        let middle = self.sum / n;
        // Cancellation can push a flat window slightly negative.
        let variance = (self.sum_sq / n - middle * middle).max(0.0);
        let band = self.factor * variance.sqrt();

        Some(BollingerValue {
            upper: middle + band,
            middle,
            lower: middle - band,
        })
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
        self.sum_sq = 0.0;
    }
}
