//! Venue definitions and the closed set of venue kinds
//!
//! Adding a venue type means adding one `VenueKind` variant plus its quote
//! and encode implementations; dispatch everywhere else is exhaustive
//! matching on the tag.

use alloy::primitives::{address, Address};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{TradingPair, DAI, USDC, WBTC, WETH};

/// Fee tiers walked, in order, when quoting a concentrated-liquidity
/// venue: 0.05%, 0.3%, 1%.
pub const DEFAULT_FEE_TIERS: &[u32] = &[500, 3000, 10000];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueKind {
    /// x*y=k pair venue: quotes via the router's getAmountsOut, swaps via
    /// swapExactTokensForTokens.
    ConstantProduct { router: Address, factory: Address },
    /// Tick-based venue: quotes via the quoter per fee tier, swaps via
    /// exactInputSingle.
    ConcentratedLiquidity {
        quoter: Address,
        router: Address,
        fee_tiers: Vec<u32>,
    },
    /// Multi-asset vault venue. No quote or encode strategy is wired up;
    /// configuring one for a pair surfaces as "no quote" / an encoding
    /// abort downstream.
    VaultStyle { vault: Address, pool_id: [u8; 32] },
    /// Venue driven by operator-supplied calldata with no quoting
    /// capability of its own.
    GenericCallData { target: Address, calldata: Vec<u8> },
}

impl VenueKind {
    pub fn tag(&self) -> &'static str {
        match self {
            VenueKind::ConstantProduct { .. } => "constant-product",
            VenueKind::ConcentratedLiquidity { .. } => "concentrated-liquidity",
            VenueKind::VaultStyle { .. } => "vault-style",
            VenueKind::GenericCallData { .. } => "generic-call-data",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub id: String,
    pub kind: VenueKind,
    /// Per-leg trading fee in basis points. Concentrated venues override
    /// this with the fee of the tier that answered.
    pub fee_bps: u32,
    /// Minimum base-asset-side pool liquidity before a quote is emitted.
    pub min_liquidity: Decimal,
}

pub fn default_venues() -> Vec<VenueConfig> {
    vec![
        VenueConfig {
            id: "uniswap-v2".to_string(),
            kind: VenueKind::ConstantProduct {
                router: address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
                factory: address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc8aa6f"),
            },
            fee_bps: 30,
            min_liquidity: dec!(0.5),
        },
        VenueConfig {
            id: "sushiswap".to_string(),
            kind: VenueKind::ConstantProduct {
                router: address!("d9e1cE17f2641f24aE83637ab66a2cca9C378B9F"),
                factory: address!("C0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac"),
            },
            fee_bps: 30,
            min_liquidity: dec!(0.5),
        },
        VenueConfig {
            id: "uniswap-v3".to_string(),
            kind: VenueKind::ConcentratedLiquidity {
                quoter: address!("b27308f9F90D607463bb33eA1BeBb41C27CE5AB6"),
                router: address!("E592427A0AEce92De3Edee1F18E0157C05861564"),
                fee_tiers: DEFAULT_FEE_TIERS.to_vec(),
            },
            fee_bps: 30,
            min_liquidity: dec!(0.5),
        },
    ]
}

pub fn default_pairs() -> Vec<TradingPair> {
    vec![
        TradingPair {
            base: WETH,
            quote: USDC,
        },
        TradingPair {
            base: WETH,
            quote: DAI,
        },
        TradingPair {
            base: WBTC,
            quote: USDC,
        },
    ]
}

/// Fee in basis points for a concentrated-liquidity tier value
/// (tier 3000 = 0.3% = 30 bps).
pub fn tier_fee_bps(tier: u32) -> u32 {
    tier / 100
}

/// Startup pass dropping venues that can never quote: zero contract
/// addresses or an empty fee-tier list. Whether the survivors are
/// enough to arbitrage is `Config::validate`'s call.
pub fn validate_venues(venues: Vec<VenueConfig>) -> Vec<VenueConfig> {
    venues
        .into_iter()
        .filter(|venue| {
            let usable = match &venue.kind {
                VenueKind::ConstantProduct { router, factory } => {
                    *router != Address::ZERO && *factory != Address::ZERO
                }
                VenueKind::ConcentratedLiquidity {
                    quoter,
                    router,
                    fee_tiers,
                } => *quoter != Address::ZERO && *router != Address::ZERO && !fee_tiers.is_empty(),
                VenueKind::VaultStyle { vault, .. } => *vault != Address::ZERO,
                VenueKind::GenericCallData { target, .. } => *target != Address::ZERO,
            };
            if !usable {
                tracing::warn!(venue = %venue.id, "Dropping venue with unusable configuration");
            }
            usable
        })
        .collect()
}
