//! Streaming indicator implementations.
//!
//! Every indicator consumes one close per bar through `update()` in O(1)
//! amortized time and returns `None` while it is still warming up. Batch
//! computation (`compute()`) is a thin loop over `update()`, so a batch series
//! and a bar-by-bar replay always agree.
//!
//! Look-ahead guard: the value returned for bar t depends only on the values
//! passed to `update()` up to and including bar t.

pub mod bollinger;
pub mod cross;
pub mod rsi;
pub mod sma;

pub use bollinger::{BollingerBands, BollingerValue};
pub use cross::{Cross, CrossOver};
pub use rsi::Rsi;
pub use sma::Sma;

use thiserror::Error;

/// Invalid indicator parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{indicator} period must be >= 1 (got {period})")]
    InvalidPeriod {
        indicator: &'static str,
        period: usize,
    },
    #[error("{indicator} band factor must be finite and non-negative (got {factor})")]
    InvalidFactor { indicator: &'static str, factor: f64 },
}

/// A single-input indicator fed one value per bar.
pub trait StreamingIndicator: Send + Sync {
    type Output: Copy;

    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars consumed before the first value is produced.
    fn lookback(&self) -> usize;

    /// Feed the next value; returns the indicator for this bar, or `None` during warm-up.
    fn update(&mut self, value: f64) -> Option<Self::Output>;

    /// Forget all history.
    fn reset(&mut self);

    /// Reset, then replay `values` from the start.
    fn compute(&mut self, values: &[f64]) -> Vec<Option<Self::Output>> {
        self.reset();
        values.iter().map(|&v| self.update(v)).collect()
    }
}

pub(crate) fn check_period(indicator: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { indicator, period });
    }
    Ok(())
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
