//! Custom error types for the engine
//!
//! Business-level "no result" outcomes (no quote, no opportunity, not
//! viable, not approved) are expressed as `Option`/report data, never as
//! errors. These variants cover the remaining failure classes: transient
//! infrastructure trouble, execution failures, and the fatal startup
//! configuration class that is allowed to terminate the process.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        retry_count: u32,
    },

    #[error("Contract interaction failed: {contract} - {message}")]
    Contract {
        contract: Address,
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Price validation failed: {symbol} price {price} is invalid - {reason}")]
    PriceValidation {
        symbol: String,
        price: Decimal,
        reason: String,
    },

    #[error("Insufficient liquidity on {venue}: {details}")]
    InsufficientLiquidity { venue: String, details: String },

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Circuit breaker active: {reason}")]
    CircuitBreakerOpen {
        reason: String,
        cooldown_remaining: Duration,
    },

    #[error("Execution failed: {reason}")]
    Execution { reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
