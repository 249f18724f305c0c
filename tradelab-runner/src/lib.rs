//! TradeLab Runner — backtest configuration, single runs, sweeps, metrics.
//!
//! This crate builds on `tradelab-core` to provide:
//! - TOML configuration with per-strategy defaults and run fingerprinting
//! - Single-backtest runner producing metrics next to the raw curve and trades
//! - Benchmark alignment and outperformance
//! - Parallel parameter sweeps

pub mod benchmark;
pub mod config;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use benchmark::{align_benchmark, aligned_benchmark_cumulative, outperformance};
pub use config::{BacktestConfig, ConfigError, RunId, StrategyName};
pub use metrics::{PerformanceMetrics, YearlyReturn};
pub use runner::{
    run_backtest, run_backtest_from_bars, run_backtest_from_toml, BacktestResult, RunError,
};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
