//! TradeLab Core — bars, streaming indicators, strategies, broker, bar loop.
//!
//! This crate contains the single-instrument backtesting engine:
//! - Domain types (bars, orders, fills, positions, trades, equity curve)
//! - Streaming indicators (SMA, RSI, Bollinger bands, crossover)
//! - Flat/Long strategy state machine with four built-in variants
//! - Broker simulator with commission and whole-share accounting
//! - Bar-by-bar simulation driver and trade extraction

pub mod broker;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;
pub mod synthetic;

pub use broker::{Broker, BrokerHandle, ExecutionError, ExecutionOutcome, RejectReason};
pub use domain::{Bar, BarError, BarSeries, EquityCurve, Fill, Order, Position, Trade};
pub use engine::{run_simulation, EngineConfig, SimulationError, SimulationResult};
pub use strategy::{Strategy, StrategyError, StrategyKind, StrategySpec};
