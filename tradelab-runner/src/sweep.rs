//! Parameter sweep utilities for grid search.
//!
//! Every run owns its strategy and broker; only the bar series and the
//! benchmark closes are shared, by reference.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashMap;

use tradelab_core::domain::BarSeries;
use tradelab_core::StrategySpec;

use crate::config::BacktestConfig;
use crate::runner::{run_backtest, BacktestResult};

/// Parameter grid.
///
/// Each strategy family is swept over the cartesian product of its
/// parameter lists; families with an empty list contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    pub ma_short_windows: Vec<usize>,
    pub ma_long_windows: Vec<usize>,
    /// Also sweep the trend-following MA variant over the same windows.
    pub include_ma_trend: bool,

    pub rsi_periods: Vec<usize>,
    pub rsi_thresholds: Vec<(f64, f64)>,

    pub bb_periods: Vec<usize>,
    pub bb_devs: Vec<f64>,
}

impl ParamGrid {
    /// Short windows 5, 10, 20 against long windows 30, 50, 100.
    pub fn ma_crossover_default() -> Self {
        Self {
            ma_short_windows: vec![5, 10, 20],
            ma_long_windows: vec![30, 50, 100],
            ..Self::default()
        }
    }

    /// Generates every valid strategy spec in the grid.
    pub fn specs(&self) -> Vec<StrategySpec> {
        let mut specs = Vec::new();

        for &short in &self.ma_short_windows {
            for &long in &self.ma_long_windows {
                // Skip invalid combinations (short >= long)
                if short >= long {
                    continue;
                }
                specs.push(StrategySpec::MaCrossover {
                    short_window: short,
                    long_window: long,
                });
                if self.include_ma_trend {
                    specs.push(StrategySpec::MaTrend {
                        short_window: short,
                        long_window: long,
                    });
                }
            }
        }

        for &period in &self.rsi_periods {
            for &(oversold, overbought) in &self.rsi_thresholds {
                specs.push(StrategySpec::Rsi {
                    rsi_period: period,
                    oversold,
                    overbought,
                });
            }
        }

        for &period in &self.bb_periods {
            for &dev in &self.bb_devs {
                specs.push(StrategySpec::Bollinger {
                    bb_period: period,
                    bb_dev: dev,
                });
            }
        }

        specs
    }

    /// Returns the number of configurations `generate_configs` yields.
    pub fn size(&self) -> usize {
        self.specs().len()
    }

    /// Generates all configurations in the grid, sharing the base's cash and commission.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        self.specs()
            .iter()
            .map(|spec| BacktestConfig::from_spec(spec, base.initial_cash, base.commission))
            .collect()
    }
}

/// Parameter sweep executor.
///
/// Runs backtests for all configurations in a grid, optionally in parallel.
pub struct ParamSweep<'a> {
    series: &'a BarSeries,
    benchmark_closes: Option<&'a [f64]>,
    parallel: bool,
}

impl<'a> ParamSweep<'a> {
    pub fn new(series: &'a BarSeries) -> Self {
        Self {
            series,
            benchmark_closes: None,
            parallel: true,
        }
    }

    pub fn with_benchmark(mut self, closes: &'a [f64]) -> Self {
        self.benchmark_closes = Some(closes);
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn run_one(&self, config: &BacktestConfig) -> Result<BacktestResult> {
        run_backtest(config, self.series, self.benchmark_closes)
            .with_context(|| format!("backtest failed for {:?}", config.strategy_spec()))
    }

    /// Executes a parameter sweep over the given grid.
    ///
    /// Results come back in grid order regardless of parallelism.
    pub fn sweep(&self, grid: &ParamGrid, base: &BacktestConfig) -> Result<SweepResults> {
        let configs = grid.generate_configs(base);

        let results: Vec<BacktestResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| self.run_one(config))
                .collect::<Result<Vec<_>>>()?
        } else {
            configs
                .iter()
                .map(|config| self.run_one(config))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(SweepResults::new(results))
    }
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();

        Self { results, by_run_id }
    }

    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Gets a result by RunId.
    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results sorted by Sharpe ratio, descending; undefined Sharpe sorts last.
    pub fn sorted_by_sharpe(&self) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| {
            let a = a.metrics.sharpe_ratio.unwrap_or(f64::NEG_INFINITY);
            let b = b.metrics.sharpe_ratio.unwrap_or(f64::NEG_INFINITY);
            b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&BacktestResult> {
        self.sorted_by_sharpe().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.sorted_by_sharpe().into_iter().next()
    }
}
