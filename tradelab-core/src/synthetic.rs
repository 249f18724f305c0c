//! Synthetic bar series for tests and benchmarks.
//!
//! Nothing here is market data. Series are deterministic for a given seed and
//! use weekday dates starting 2020-01-01.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, BarError, BarSeries};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

/// `n` consecutive weekdays starting at `start` (or the next weekday after it).
fn weekdays(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut current = start;
    while dates.len() < n {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current = current + Days::new(1);
    }
    dates
}

/// Random walk from 100.0 with daily returns in [-3%, 3%). At least one bar.
pub fn random_walk(n: usize, seed: u64) -> BarSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0_f64;

    let bars = weekdays(start_date(), n.max(1))
        .into_iter()
        .map(|date| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);
            price = close;
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect();

    BarSeries::from_generated(bars)
}

/// Flat bars (open = high = low = close) on consecutive weekdays.
pub fn from_closes(closes: &[f64]) -> Result<BarSeries, BarError> {
    let bars = weekdays(start_date(), closes.len())
        .into_iter()
        .zip(closes)
        .map(|(date, &close)| Bar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        })
        .collect();
    BarSeries::new(bars)
}
