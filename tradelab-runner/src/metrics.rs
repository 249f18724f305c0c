//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity values and/or trade list in, scalar
//! out. Metrics that are undefined for the input (no trades, zero variance,
//! too few bars) come back as `None` and render as "N/A".

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tradelab_core::domain::{EquityCurve, Trade};

use crate::benchmark::outperformance;

/// Trading days per year, for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Portfolio return for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyReturn {
    pub year: i32,
    pub return_pct: f64,
}

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(with = "na")]
    pub sharpe_ratio: Option<f64>,
    /// Largest peak-to-trough decline of cumulative return, as a positive fraction.
    pub max_drawdown: f64,
    /// Longest stretch of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub total_return: f64,
    #[serde(with = "na")]
    pub annual_return: Option<f64>,
    #[serde(with = "na")]
    pub annual_volatility: Option<f64>,

    // ── Trades ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    #[serde(with = "na")]
    pub win_rate: Option<f64>,
    pub longest_win_streak: usize,
    pub longest_lose_streak: usize,
    #[serde(with = "na")]
    pub average_win: Option<f64>,
    #[serde(with = "na")]
    pub average_loss: Option<f64>,
    #[serde(with = "na")]
    pub profit_factor: Option<f64>,

    pub final_value: f64,
    pub yearly_returns: Vec<YearlyReturn>,

    // ── Benchmark ──
    #[serde(with = "na")]
    pub benchmark_return: Option<f64>,
    #[serde(with = "na")]
    pub outperformance: Option<f64>,
}

impl PerformanceMetrics {
    /// Compute all metrics from an equity curve and trade list.
    ///
    /// `initial_cash` is the base for the first calendar year's return.
    /// `benchmark_cumulative` must already be aligned to the curve's length.
    pub fn compute(
        curve: &EquityCurve,
        trades: &[Trade],
        initial_cash: f64,
        benchmark_cumulative: Option<&[f64]>,
    ) -> Self {
        let values = curve.values();
        let cumulative = cumulative_returns(&values);
        let stats = TradeStats::from_trades(trades);
        let total = total_return(&values);
        let benchmark_return = benchmark_cumulative
            .and_then(|b| b.last())
            .map(|last| last - 1.0);

        Self {
            sharpe_ratio: sharpe_ratio(&values),
            max_drawdown: max_drawdown(&cumulative),
            max_drawdown_duration: max_drawdown_duration(&values),
            total_return: total,
            annual_return: annual_return(&values),
            annual_volatility: annual_volatility(&values),
            total_trades: stats.total,
            winning_trades: stats.winning,
            losing_trades: stats.losing,
            win_rate: win_rate(trades),
            longest_win_streak: stats.longest_win_streak,
            longest_lose_streak: stats.longest_lose_streak,
            average_win: average_win(trades),
            average_loss: average_loss(trades),
            profit_factor: profit_factor(trades),
            final_value: curve.final_value().unwrap_or(initial_cash),
            yearly_returns: yearly_returns(curve, initial_cash),
            benchmark_return,
            outperformance: benchmark_cumulative.and_then(|b| outperformance(&cumulative, b)),
        }
    }
}

// ─── Return series ──────────────────────────────────────────────────

/// Bar-over-bar returns: r[i] = (v[i] - v[i-1]) / v[i-1], 0 when v[i-1] <= 0.
/// Length is `values.len() - 1`.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

/// Running product of (1 + r), seeded at 1.0. Same length as `values`.
pub fn cumulative_returns(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len());
    out.push(1.0);
    let mut acc = 1.0;
    for r in daily_returns(values) {
        acc *= 1.0 + r;
        out.push(acc);
    }
    out
}

/// Total return as a fraction of the first value.
pub fn total_return(values: &[f64]) -> f64 {
    cumulative_returns(values).last().map_or(0.0, |c| c - 1.0)
}

/// Compound annual growth rate over `(len - 1) / 252` years, one year per
/// 252 bar-to-bar periods.
///
/// `None` for fewer than 2 bars or a non-positive end value.
pub fn annual_return(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let growth = 1.0 + total_return(values);
    if growth <= 0.0 {
        return None;
    }
    let years = (values.len() - 1) as f64 / TRADING_DAYS_PER_YEAR;
    Some(growth.powf(1.0 / years) - 1.0)
}

// ─── Risk ───────────────────────────────────────────────────────────

/// Maximum drawdown of a cumulative-return series, as a positive fraction.
///
/// Single pass with a running peak. 0.0 for empty or monotonically rising input.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &value in cumulative {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

/// Longest run of consecutive bars strictly below the running peak.
pub fn max_drawdown_duration(values: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0;
    let mut longest = 0;
    for &value in values {
        if value >= peak {
            peak = value;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

/// Annualized Sharpe ratio (risk-free rate 0).
///
/// Sharpe = mean(daily returns) / std(daily returns) * sqrt(252), with the
/// sample standard deviation. `None` for fewer than 2 returns or zero variance.
pub fn sharpe_ratio(values: &[f64]) -> Option<f64> {
    let returns = daily_returns(values);
    if returns.len() < 2 {
        return None;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return None;
    }
    Some(mean_f64(&returns) / std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Annualized standard deviation of daily returns.
pub fn annual_volatility(values: &[f64]) -> Option<f64> {
    let returns = daily_returns(values);
    if returns.len() < 2 {
        return None;
    }
    Some(std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt())
}

// ─── Trades ─────────────────────────────────────────────────────────

/// Win/loss counts and streaks. Break-even trades count toward the total
/// only, and end both streaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total: usize,
    pub winning: usize,
    pub losing: usize,
    pub longest_win_streak: usize,
    pub longest_lose_streak: usize,
}

impl TradeStats {
    pub fn from_trades(trades: &[Trade]) -> Self {
        Self {
            total: trades.len(),
            winning: trades.iter().filter(|t| t.is_winner()).count(),
            losing: trades.iter().filter(|t| t.is_loser()).count(),
            longest_win_streak: max_consecutive(trades, Trade::is_winner),
            longest_lose_streak: max_consecutive(trades, Trade::is_loser),
        }
    }
}

/// Fraction of trades that were winners. `None` with no trades.
pub fn win_rate(trades: &[Trade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    Some(winners as f64 / trades.len() as f64)
}

/// Mean pnl of winning trades.
pub fn average_win(trades: &[Trade]) -> Option<f64> {
    let wins: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).collect();
    (!wins.is_empty()).then(|| mean_f64(&wins))
}

/// Mean pnl of losing trades (negative).
pub fn average_loss(trades: &[Trade]) -> Option<f64> {
    let losses: Vec<f64> = trades.iter().filter(|t| t.is_loser()).map(|t| t.pnl).collect();
    (!losses.is_empty()).then(|| mean_f64(&losses))
}

/// Gross profit / gross loss. `None` when there is no loss to divide by.
pub fn profit_factor(trades: &[Trade]) -> Option<f64> {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();
    if gross_loss < 1e-10 {
        return None;
    }
    Some(gross_profit / gross_loss)
}

// ─── Calendar ───────────────────────────────────────────────────────

/// Return for each calendar year in the curve.
///
/// A year's base is the previous year's last value; the first year uses
/// `initial_cash`.
pub fn yearly_returns(curve: &EquityCurve, initial_cash: f64) -> Vec<YearlyReturn> {
    let mut out: Vec<YearlyReturn> = Vec::new();
    let mut base = initial_cash;
    let mut snapshots = curve.snapshots().iter().peekable();

    while let Some(first) = snapshots.next() {
        let year = first.date.year();
        let mut last = first.total_value;
        while let Some(next) = snapshots.next_if(|s| s.date.year() == year) {
            last = next.total_value;
        }
        let return_pct = if base > 0.0 { last / base - 1.0 } else { 0.0 };
        out.push(YearlyReturn { year, return_pct });
        base = last;
    }
    out
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[Trade], pred: fn(&Trade) -> bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if pred(trade) {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

// ─── Presentation ───────────────────────────────────────────────────

/// `Option<f64>` as a number, or the string "N/A" when undefined.
mod na {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.is_finite() => s.serialize_f64(*v),
            _ => s.serialize_str("N/A"),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(v) => Ok(Some(v)),
            Repr::Text(t) if t == "N/A" => Ok(None),
            Repr::Text(t) => Err(D::Error::custom(format!(
                "expected a number or \"N/A\", got {t:?}"
            ))),
        }
    }
}

struct Pct(Option<f64>);

impl fmt::Display for Pct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.2}%", v * 100.0),
            None => write!(f, "N/A"),
        }
    }
}

struct Num(Option<f64>);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.2}"),
            None => write!(f, "N/A"),
        }
    }
}

impl fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final value:          {:.2}", self.final_value)?;
        writeln!(f, "Total return:         {}", Pct(Some(self.total_return)))?;
        writeln!(f, "Annual return:        {}", Pct(self.annual_return))?;
        writeln!(f, "Annual volatility:    {}", Pct(self.annual_volatility))?;
        writeln!(f, "Sharpe ratio:         {}", Num(self.sharpe_ratio))?;
        writeln!(f, "Max drawdown:         {}", Pct(Some(self.max_drawdown)))?;
        writeln!(f, "Max drawdown length:  {} bars", self.max_drawdown_duration)?;
        writeln!(f, "Total trades:         {}", self.total_trades)?;
        writeln!(f, "Winning trades:       {}", self.winning_trades)?;
        writeln!(f, "Losing trades:        {}", self.losing_trades)?;
        writeln!(f, "Win rate:             {}", Pct(self.win_rate))?;
        writeln!(f, "Longest win streak:   {}", self.longest_win_streak)?;
        writeln!(f, "Longest lose streak:  {}", self.longest_lose_streak)?;
        writeln!(f, "Average win:          {}", Num(self.average_win))?;
        writeln!(f, "Average loss:         {}", Num(self.average_loss))?;
        writeln!(f, "Profit factor:        {}", Num(self.profit_factor))?;
        writeln!(f, "Benchmark return:     {}", Pct(self.benchmark_return))?;
        write!(f, "Outperformance:       {}", Pct(self.outperformance))?;
        for y in &self.yearly_returns {
            write!(f, "\n  {}: {}", y.year, Pct(Some(y.return_pct)))?;
        }
        Ok(())
    }
}
