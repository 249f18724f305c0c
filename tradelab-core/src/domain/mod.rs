//! Domain types for TradeLab

pub mod bar;
pub mod fill;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod trade;

pub use bar::{Bar, BarError, BarSeries};
pub use fill::Fill;
pub use order::{Order, OrderSide, OrderStatus};
pub use portfolio::{EquityCurve, PortfolioSnapshot};
pub use position::Position;
pub use trade::Trade;
