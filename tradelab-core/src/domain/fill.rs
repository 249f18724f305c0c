use crate::domain::order::OrderSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fill record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub side: OrderSide,
    pub size: i64,
    pub price: f64,
    pub commission: f64,
}

impl Fill {
    /// Gross traded value, before commission.
    pub fn notional(&self) -> f64 {
        self.size as f64 * self.price
    }

    /// Signed cash impact: negative for buys, positive for sells, commission included.
    pub fn cash_flow(&self) -> f64 {
        match self.side {
            OrderSide::Buy => -(self.notional() + self.commission),
            OrderSide::Sell => self.notional() - self.commission,
        }
    }
}
