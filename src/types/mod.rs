//! Core data types and structures

pub mod tokens;
pub mod quote;
pub mod opportunity;
pub mod profitability;
pub mod risk;
pub mod execution;
pub mod telemetry;

pub use tokens::*;
pub use quote::*;
pub use opportunity::*;
pub use profitability::*;
pub use risk::*;
pub use execution::*;
pub use telemetry::*;
