//! Risk gating, daily stats and the circuit breaker

pub mod stats;
pub mod manager;

pub use stats::*;
pub use manager::*;
