//! Portfolio snapshots and the equity curve they form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio state at the close of one bar.
///
/// The accounting identity `total_value == cash + position_value` holds for
/// every snapshot the engine records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub position_size: i64,
    pub position_value: f64,
    pub total_value: f64,
}

/// One snapshot per simulated bar, in date order. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquityCurve {
    snapshots: Vec<PortfolioSnapshot>,
}

impl EquityCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, snapshot: PortfolioSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[PortfolioSnapshot] {
        &self.snapshots
    }

    pub fn get(&self, index: usize) -> Option<&PortfolioSnapshot> {
        self.snapshots.get(index)
    }

    /// Total portfolio value per bar.
    pub fn values(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.total_value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.snapshots.iter().map(|s| s.date).collect()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.snapshots.last().map(|s| s.total_value)
    }
}
