//! Backtest runner — wires together config, engine, and metrics.
//!
//! Entry points:
//! - `run_backtest()`: validated config + validated series. Used by sweeps.
//! - `run_backtest_from_bars()`: validates raw bars first.
//! - `run_backtest_from_toml()`: parses the config from TOML text.

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradelab_core::domain::{Bar, BarError, BarSeries, EquityCurve, Fill, Position, Trade};
use tradelab_core::{run_simulation, SimulationError, Strategy};

use crate::benchmark::aligned_benchmark_cumulative;
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] BarError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

impl From<toml::de::Error> for RunError {
    fn from(err: toml::de::Error) -> Self {
        RunError::Config(ConfigError::Parse(err))
    }
}

/// Current schema version for serialized results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub strategy_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub metrics: PerformanceMetrics,
    pub equity_curve: EquityCurve,
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    /// Holding still open at the last bar, if any.
    pub open_position: Option<Position>,
    /// Benchmark cumulative return aligned to the equity curve.
    pub benchmark_cumulative: Option<Vec<f64>>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Run one backtest over an already-validated series.
///
/// `benchmark_closes` are index closing prices matched to the series by
/// position; an empty slice is treated like `None`.
pub fn run_backtest(
    config: &BacktestConfig,
    series: &BarSeries,
    benchmark_closes: Option<&[f64]>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let mut strategy = config.build_strategy()?;
    let run_id = config.run_id();

    info!(
        "run {}: {} over {} bars ({} to {})",
        &run_id[..12],
        strategy.name(),
        series.len(),
        series.first_date(),
        series.last_date()
    );

    let sim = run_simulation(series, &mut strategy, &config.engine_config())?;

    let benchmark_cumulative = benchmark_closes
        .and_then(|closes| aligned_benchmark_cumulative(closes, sim.equity_curve.len()));
    let metrics = PerformanceMetrics::compute(
        &sim.equity_curve,
        &sim.trades,
        config.initial_cash,
        benchmark_cumulative.as_deref(),
    );

    info!(
        "run {} finished: final value {:.2}, {} trades",
        &run_id[..12],
        metrics.final_value,
        metrics.total_trades
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        strategy_name: strategy.name().to_string(),
        start_date: series.first_date(),
        end_date: series.last_date(),
        bar_count: sim.bar_count,
        warmup_bars: sim.warmup_bars,
        metrics,
        equity_curve: sim.equity_curve,
        trades: sim.trades,
        fills: sim.fills,
        open_position: sim.open_position,
        benchmark_cumulative,
    })
}

/// Validate raw bars, then run.
pub fn run_backtest_from_bars(
    config: &BacktestConfig,
    bars: Vec<Bar>,
    benchmark_closes: Option<&[f64]>,
) -> Result<BacktestResult, RunError> {
    let series = BarSeries::new(bars)?;
    run_backtest(config, &series, benchmark_closes)
}

/// Parse a TOML config, then run.
pub fn run_backtest_from_toml(
    toml: &str,
    series: &BarSeries,
    benchmark_closes: Option<&[f64]>,
) -> Result<BacktestResult, RunError> {
    let config = BacktestConfig::from_toml_str(toml)?;
    run_backtest(&config, series, benchmark_closes)
}
