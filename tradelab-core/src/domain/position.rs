use serde::{Deserialize, Serialize};

/// Long-only holding in the traded instrument.
///
/// `size` is a signed share count so that an accounting bug would surface as a
/// negative value instead of wrapping; the broker never lets it go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub size: i64,
    pub average_cost: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    pub fn is_long(&self) -> bool {
        self.size > 0
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.size as f64 * current_price
    }
}
