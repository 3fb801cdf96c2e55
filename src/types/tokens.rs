//! Token and trading pair definitions

use alloy::primitives::{address, Address};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u32,
}

/// A pair sampled for arbitrage. Quotes are always taken in the
/// base -> quote direction; the quote asset is the one borrowed.
#[derive(Debug, Clone, Copy)]
pub struct TradingPair {
    pub base: TokenInfo,
    pub quote: TokenInfo,
}

impl TradingPair {
    pub fn label(&self) -> String {
        format!("{}/{}", self.base.symbol, self.quote.symbol)
    }
}

// Mainnet token set
pub const WETH: TokenInfo = TokenInfo {
    symbol: "WETH",
    address: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
    decimals: 18,
};
pub const USDC: TokenInfo = TokenInfo {
    symbol: "USDC",
    address: address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
    decimals: 6,
};
pub const DAI: TokenInfo = TokenInfo {
    symbol: "DAI",
    address: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
    decimals: 18,
};
pub const WBTC: TokenInfo = TokenInfo {
    symbol: "WBTC",
    address: address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"),
    decimals: 8,
};

// Chainlink USD aggregator feeds, mainnet
pub const PRICE_FEEDS: &[(&str, Address)] = &[
    ("WETH", address!("5f4eC3Df9cbd43714FE2740f5E3616155c5b8419")),
    ("WBTC", address!("F4030086522a5bEEa4988F8cA5B36dbC97BeE88c")),
    ("USDC", address!("8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6")),
    ("DAI", address!("Aed0c38402a5d19df6E4c03F4E2DceD6e29c1ee9")),
];

pub fn feed_for(symbol: &str) -> Option<Address> {
    PRICE_FEEDS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, a)| *a)
}
