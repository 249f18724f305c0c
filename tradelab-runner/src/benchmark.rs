//! Benchmark comparison — cumulative return of an index series, aligned by
//! index to the strategy's equity curve.
//!
//! The benchmark is matched by position, not by date: a longer benchmark is
//! truncated and a shorter one is padded with its last value.

use log::warn;

use crate::metrics::cumulative_returns;

/// Cumulative return of a closing-price series, seeded at 1.0.
pub fn benchmark_cumulative(closes: &[f64]) -> Vec<f64> {
    cumulative_returns(closes)
}

/// Truncate or pad `benchmark` to `target_len`. `None` for an empty benchmark.
pub fn align_benchmark(benchmark: &[f64], target_len: usize) -> Option<Vec<f64>> {
    let &last = benchmark.last()?;
    let mut aligned: Vec<f64> = benchmark.iter().copied().take(target_len).collect();

    if benchmark.len() > target_len {
        warn!(
            "benchmark has {} points, truncating to {target_len}",
            benchmark.len()
        );
    } else if benchmark.len() < target_len {
        warn!(
            "benchmark has {} points, padding to {target_len} with last value {last:.4}",
            benchmark.len()
        );
        aligned.resize(target_len, last);
    }
    Some(aligned)
}

/// Benchmark closes → cumulative return aligned to the curve length.
pub fn aligned_benchmark_cumulative(closes: &[f64], target_len: usize) -> Option<Vec<f64>> {
    align_benchmark(&benchmark_cumulative(closes), target_len)
}

/// Final portfolio return minus final benchmark return, both as fractions.
pub fn outperformance(portfolio_cumulative: &[f64], benchmark_cumulative: &[f64]) -> Option<f64> {
    let portfolio = portfolio_cumulative.last()?;
    let benchmark = benchmark_cumulative.last()?;
    Some((portfolio - 1.0) - (benchmark - 1.0))
}
