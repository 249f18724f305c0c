//! CrossOver — detects the bar where series A moves across series B.
//!
//! CrossAbove = (A > B) AND (previous A <= previous B)  → +1
//! CrossBelow = (A < B) AND (previous A >= previous B)  → -1
//!
//! Two-input, so it does not implement `StreamingIndicator`. It produces no
//! value while either operand is still warming up, and 0 on the first bar
//! where both are defined (there is no previous relation to compare against).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cross {
    Above,
    Below,
    None,
}

impl Cross {
    /// +1 / -1 / 0 encoding.
    pub fn value(self) -> i8 {
        match self {
            Cross::Above => 1,
            Cross::Below => -1,
            Cross::None => 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CrossOver {
    prev: Option<(f64, f64)>,
}

impl CrossOver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, a: Option<f64>, b: Option<f64>) -> Option<Cross> {
        let (Some(a), Some(b)) = (a, b) else {
            self.prev = None;
            return None;
        };
        let cross = match self.prev.replace((a, b)) {
            Some((pa, pb)) if pa <= pb && a > b => Cross::Above,
            Some((pa, pb)) if pa >= pb && a < b => Cross::Below,
            _ => Cross::None,
        };
        Some(cross)
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }

    /// Batch helper over two aligned series.
    pub fn compute(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<Cross>> {
        let mut cross = Self::new();
        a.iter()
            .zip(b.iter())
            .map(|(&a, &b)| cross.update(a, b))
            .collect()
    }
}
