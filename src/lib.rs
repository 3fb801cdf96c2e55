//! Flashloan Arbitrage Bot - Off-chain opportunity detection and execution
//! orchestration for cross-DEX arbitrage funded by single-asset flashloans.
//!
//! The engine samples quoted exchange rates across liquidity venues, scores
//! round-trip profitability after fees, gas and loan premium, gates every
//! candidate through a risk manager with a circuit breaker, and submits the
//! settlement transaction when a candidate survives.

pub mod config;
pub mod types;
pub mod errors;
pub mod network;
pub mod venues;
pub mod oracle;
pub mod arbitrage;
pub mod risk;
pub mod gas;
pub mod execution;
pub mod telemetry;
pub mod scheduler;
pub mod engine;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{EngineError, EngineResult};
pub use types::*;

// Type alias for our concrete provider
pub type ConcreteProvider = alloy::providers::RootProvider<alloy::transports::BoxTransport>;
