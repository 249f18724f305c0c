//! Market orders emitted by strategies and resolved by the broker in the same bar.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order lifecycle. There is no multi-bar pending state: an order is created
/// `Pending` and is `Filled` or `Rejected` before the bar ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Rejected,
}

/// A whole-share market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub side: OrderSide,
    pub size: i64,
    pub status: OrderStatus,
}

impl Order {
    pub fn buy(size: i64) -> Self {
        Self {
            side: OrderSide::Buy,
            size,
            status: OrderStatus::Pending,
        }
    }

    pub fn sell(size: i64) -> Self {
        Self {
            side: OrderSide::Sell,
            size,
            status: OrderStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}
