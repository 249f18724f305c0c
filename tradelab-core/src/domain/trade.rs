//! Trade — a completed flat → long → flat round trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A complete round-trip trade record: entry fill paired with the next exit fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size ──
    pub size: i64,

    // ── PnL ──
    /// Commission paid on both legs.
    pub commission: f64,
    /// Net PnL: price difference times size, minus commission.
    pub pnl: f64,

    pub bars_held: usize,
}

impl Trade {
    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        let cost = self.entry_price * self.size as f64;
        if cost == 0.0 {
            return 0.0;
        }
        self.pnl / cost
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> Trade {
        Trade {
            entry_bar: 4,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            entry_price: 100.0,
            exit_bar: 8,
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            exit_price: 110.0,
            size: 50,
            commission: 15.0,
            pnl: 485.0,
            bars_held: 4,
        }
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        let expected = 485.0 / (100.0 * 50.0);
        assert!((trade.return_pct() - expected).abs() < 1e-10);
    }

    #[test]
    fn winner_and_loser() {
        let mut trade = sample_trade();
        assert!(trade.is_winner());
        assert!(!trade.is_loser());
        trade.pnl = 0.0;
        assert!(!trade.is_winner());
        assert!(!trade.is_loser());
        trade.pnl = -1.0;
        assert!(trade.is_loser());
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
