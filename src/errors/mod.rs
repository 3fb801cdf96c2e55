//! Error taxonomy and result alias

pub mod engine_error;

pub use engine_error::*;
