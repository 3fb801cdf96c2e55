//! Configuration management for the arbitrage engine

pub mod settings;
pub mod venues;

pub use settings::*;
pub use venues::*;

use lazy_static::lazy_static;

lazy_static! {
    pub static ref CONFIG: Config = Config::load();
}
