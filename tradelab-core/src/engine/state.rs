//! Engine configuration, run errors, and the simulation result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broker::ExecutionError;
use crate::domain::{EquityCurve, Fill, Position, Trade};
use crate::strategy::StrategyError;

/// Configuration for a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
    /// Fraction of notional charged on every fill (0.0005 = 5 bps).
    pub commission_rate: f64,
}

impl EngineConfig {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        Self {
            initial_cash,
            commission_rate,
        }
    }

    /// Zero-commission config, handy for hand-checked scenarios.
    pub fn frictionless(initial_cash: f64) -> Self {
        Self::new(initial_cash, 0.0)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(SimulationError::Config(format!(
                "initial_cash must be positive (got {})",
                self.initial_cash
            )));
        }
        if !(self.commission_rate.is_finite() && (0.0..1.0).contains(&self.commission_rate)) {
            return Err(SimulationError::Config(format!(
                "commission_rate must be in [0, 1) (got {})",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(100_000.0, 0.0005)
    }
}

/// Anything that aborts a simulation. No partial result is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid engine config: {0}")]
    Config(String),
    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),
    #[error("execution invariant violated: {0}")]
    Execution(#[from] ExecutionError),
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One snapshot per bar.
    pub equity_curve: EquityCurve,
    pub fills: Vec<Fill>,
    /// Closed round trips only.
    pub trades: Vec<Trade>,
    /// Holding still open at the last bar; valued in the final snapshot.
    pub open_position: Option<Position>,
    pub final_cash: f64,
    pub total_commission: f64,
    pub bar_count: usize,
    pub warmup_bars: usize,
}

impl SimulationResult {
    pub fn final_value(&self) -> Option<f64> {
        self.equity_curve.final_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.initial_cash, 100_000.0);
        assert_eq!(config.commission_rate, 0.0005);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_cash_and_commission() {
        assert!(EngineConfig::new(0.0, 0.0).validate().is_err());
        assert!(EngineConfig::new(f64::INFINITY, 0.0).validate().is_err());
        assert!(EngineConfig::new(1_000.0, -0.01).validate().is_err());
        assert!(EngineConfig::new(1_000.0, 1.0).validate().is_err());
        assert!(EngineConfig::frictionless(1_000.0).validate().is_ok());
    }

    #[test]
    fn execution_error_converts() {
        let err: SimulationError = ExecutionError::OversizedSell {
            requested: 2,
            held: 1,
        }
        .into();
        assert!(err.to_string().contains("exceeds held position"));
    }
}
