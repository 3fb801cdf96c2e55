//! Opportunity discovery and profitability scoring

pub mod finder;
pub mod profitability;

pub use finder::*;
pub use profitability::*;
