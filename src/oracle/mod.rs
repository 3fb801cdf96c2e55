//! Reference price oracle

pub mod fallback;
pub mod price_feed;

pub use fallback::*;
pub use price_feed::*;
