//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use std::collections::VecDeque;

use super::{check_period, IndicatorError, StreamingIndicator};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
    window: VecDeque<f64>,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("SMA", period)?;
        Ok(Self {
            period,
            name: format!("sma_{period}"),
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl StreamingIndicator for Sma {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
            }
        }
        if self.window.len() < self.period {
            return None;
        }
        Some(self.sum / self.period as f64)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_3_warmup_then_mean() {
        let mut sma = Sma::new(3).unwrap();
        let result = sma.compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(result, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_5_basic() {
        let mut sma = Sma::new(5).unwrap();
        let result = sma.compute(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        assert_eq!(result.len(), 7);
        assert!(result[..4].iter().all(Option::is_none));
        assert_approx(result[4].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(result[5].unwrap(), 13.0, DEFAULT_EPSILON);
        assert_approx(result[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let mut sma = Sma::new(1).unwrap();
        assert_eq!(
            sma.compute(&[100.0, 200.0, 300.0]),
            vec![Some(100.0), Some(200.0), Some(300.0)]
        );
    }

    #[test]
    fn sma_matches_naive_mean_over_long_series() {
        let closes: Vec<f64> = (0..500).map(|i| 100.0 + (i as f64 * 0.37).sin() * 7.0).collect();
        let mut sma = Sma::new(20).unwrap();
        let result = sma.compute(&closes);
        for i in 19..closes.len() {
            let naive = closes[i - 19..=i].iter().sum::<f64>() / 20.0;
            assert_approx(result[i].unwrap(), naive, 1e-9);
        }
    }

    #[test]
    fn sma_reset_forgets_history() {
        let mut sma = Sma::new(2).unwrap();
        sma.update(1.0);
        sma.update(3.0);
        sma.reset();
        assert_eq!(sma.update(10.0), None);
        assert_eq!(sma.update(20.0), Some(15.0));
    }

    #[test]
    fn sma_lookback_and_name() {
        let sma = Sma::new(20).unwrap();
        assert_eq!(sma.lookback(), 19);
        assert_eq!(sma.name(), "sma_20");
        assert_eq!(Sma::new(1).unwrap().lookback(), 0);
    }

    #[test]
    fn sma_zero_period_rejected() {
        assert!(matches!(
            Sma::new(0),
            Err(IndicatorError::InvalidPeriod { period: 0, .. })
        ));
    }

    #[test]
    fn sma_too_few_values() {
        let mut sma = Sma::new(5).unwrap();
        assert!(sma.compute(&[10.0, 11.0]).iter().all(Option::is_none));
    }
}
