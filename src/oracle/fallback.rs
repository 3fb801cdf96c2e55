//! Static fallback prices
//!
//! Used whenever the live feed is unavailable, stale or malformed. Values
//! are deliberately conservative round numbers; they keep the engine
//! deciding instead of blocking, and the deviation check upstream keeps
//! them from approving nonsense.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const FALLBACK_PRICES: &[(&str, Decimal)] = &[
    ("WETH", dec!(2500)),
    ("WBTC", dec!(65000)),
    ("USDC", dec!(1)),
    ("DAI", dec!(1)),
];

pub fn fallback_price(symbol: &str) -> Option<Decimal> {
    FALLBACK_PRICES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| *p)
}
