//! Performance tracking and advisory alerts

pub mod performance;

pub use performance::*;
