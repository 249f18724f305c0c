//! Simulation driver — single pass over a bar series.
//!
//! Per bar: the strategy updates its indicators and decides, the broker
//! executes at the bar's close, then a portfolio snapshot is recorded. Trades
//! are derived from the fill log after the loop.

pub mod loop_runner;
pub mod state;
pub mod trade_extraction;

pub use loop_runner::run_simulation;
pub use state::{EngineConfig, SimulationError, SimulationResult};
pub use trade_extraction::extract_trades;
