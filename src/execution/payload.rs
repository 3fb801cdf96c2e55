//! Settlement payload construction
//!
//! Each leg becomes a venue-specific swap call with a slippage-bounded
//! minimum output, addressed to the settlement contract as recipient.
//! The two legs plus the loan terms are packed into the params blob the
//! settlement contract decodes inside its flashloan callback.

use alloy::{
    primitives::{keccak256, Address, Bytes, U256},
    sol_types::SolValue,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    config::{VenueConfig, VenueKind},
    errors::{EngineError, EngineResult},
    types::Opportunity,
    utils::to_raw,
};

const SWAP_DEADLINE_SECS: u64 = 1200;

#[derive(Debug, Clone)]
pub struct LegPayload {
    pub target: Address,
    pub calldata: Bytes,
}

#[derive(Debug, Clone)]
pub struct FlashloanParams {
    pub token_a: Address,
    pub token_b: Address,
    pub amount: U256,
    pub targets: Vec<Address>,
    pub calldatas: Vec<Bytes>,
    pub min_profit: U256,
}

fn word_address(addr: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_slice());
    word
}

fn deadline() -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    U256::from(now + SWAP_DEADLINE_SECS)
}

/// amount * (10000 - slippage_bps) / 10000.
pub fn min_out_with_slippage(amount: U256, slippage_bps: u32) -> U256 {
    amount * U256::from(10_000u32.saturating_sub(slippage_bps)) / U256::from(10_000u32)
}

/// Both swap legs for an opportunity: quote -> base on the buy venue,
/// base -> quote on the sell venue. Fails when any involved venue lacks
/// a known encoding strategy.
pub fn build_leg_payloads(
    opportunity: &Opportunity,
    venues: &[VenueConfig],
    settlement: Address,
    slippage_bps: u32,
) -> EngineResult<Vec<LegPayload>> {
    let base = opportunity.pair.base;
    let quote = opportunity.pair.quote;

    let buy_leg = encode_leg(
        venue_by_id(venues, &opportunity.buy_venue)?,
        quote.address,
        base.address,
        opportunity.borrow_amount_raw,
        min_out_with_slippage(to_raw(opportunity.trade_size, base.decimals), slippage_bps),
        opportunity.buy_quote.fee_tier,
        settlement,
    )?;

    let sell_leg = encode_leg(
        venue_by_id(venues, &opportunity.sell_venue)?,
        base.address,
        quote.address,
        to_raw(opportunity.trade_size, base.decimals),
        min_out_with_slippage(opportunity.sell_quote.amount_out, slippage_bps),
        opportunity.sell_quote.fee_tier,
        settlement,
    )?;

    Ok(vec![buy_leg, sell_leg])
}

fn venue_by_id<'a>(venues: &'a [VenueConfig], id: &str) -> EngineResult<&'a VenueConfig> {
    venues
        .iter()
        .find(|v| v.id == id)
        .ok_or_else(|| EngineError::Execution {
            reason: format!("venue {} is not configured", id),
        })
}

fn encode_leg(
    venue: &VenueConfig,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
    min_out: U256,
    fee_tier: Option<u32>,
    recipient: Address,
) -> EngineResult<LegPayload> {
    match &venue.kind {
        VenueKind::ConstantProduct { router, .. } => Ok(LegPayload {
            target: *router,
            calldata: encode_swap_exact_tokens(amount_in, min_out, token_in, token_out, recipient),
        }),
        VenueKind::ConcentratedLiquidity { router, .. } => Ok(LegPayload {
            target: *router,
            calldata: encode_exact_input_single(
                token_in,
                token_out,
                fee_tier.unwrap_or(3000),
                recipient,
                amount_in,
                min_out,
            ),
        }),
        VenueKind::GenericCallData { target, calldata } => Ok(LegPayload {
            target: *target,
            calldata: Bytes::from(calldata.clone()),
        }),
        VenueKind::VaultStyle { .. } => Err(EngineError::Execution {
            reason: format!(
                "venue {} has no known encoding strategy ({})",
                venue.id,
                venue.kind.tag()
            ),
        }),
    }
}

fn encode_swap_exact_tokens(
    amount_in: U256,
    amount_out_min: U256,
    token_in: Address,
    token_out: Address,
    recipient: Address,
) -> Bytes {
    let mut encoded =
        keccak256("swapExactTokensForTokens(uint256,uint256,address[],address,uint256)")[..4]
            .to_vec();

    encoded.extend_from_slice(&amount_in.to_be_bytes::<32>());
    encoded.extend_from_slice(&amount_out_min.to_be_bytes::<32>());
    // Offset of the dynamic path array: 5 head words.
    encoded.extend_from_slice(&U256::from(160).to_be_bytes::<32>());
    encoded.extend_from_slice(&word_address(recipient));
    encoded.extend_from_slice(&deadline().to_be_bytes::<32>());
    encoded.extend_from_slice(&U256::from(2).to_be_bytes::<32>());
    encoded.extend_from_slice(&word_address(token_in));
    encoded.extend_from_slice(&word_address(token_out));

    Bytes::from(encoded)
}

fn encode_exact_input_single(
    token_in: Address,
    token_out: Address,
    fee_tier: u32,
    recipient: Address,
    amount_in: U256,
    amount_out_min: U256,
) -> Bytes {
    let mut encoded = keccak256(
        "exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160))",
    )[..4]
        .to_vec();

    encoded.extend_from_slice(&word_address(token_in));
    encoded.extend_from_slice(&word_address(token_out));
    encoded.extend_from_slice(&U256::from(fee_tier).to_be_bytes::<32>());
    encoded.extend_from_slice(&word_address(recipient));
    encoded.extend_from_slice(&deadline().to_be_bytes::<32>());
    encoded.extend_from_slice(&amount_in.to_be_bytes::<32>());
    encoded.extend_from_slice(&amount_out_min.to_be_bytes::<32>());
    // sqrtPriceLimitX96 = 0; the minimum-output bound is the guard.
    encoded.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());

    Bytes::from(encoded)
}

/// ABI-encode the params blob the settlement contract decodes in its
/// flashloan callback.
pub fn encode_flashloan_params(params: &FlashloanParams) -> Bytes {
    let tuple = (
        params.token_a,
        params.token_b,
        params.amount,
        params.targets.clone(),
        params.calldatas.clone(),
        params.min_profit,
    );
    Bytes::from(tuple.abi_encode_params())
}

/// Calldata for the settlement contract's requestFlashLoan entry point.
pub fn build_flashloan_calldata(asset: Address, amount: U256, params: &Bytes) -> Vec<u8> {
    let mut encoded = keccak256("requestFlashLoan(address,uint256,bytes)")[..4].to_vec();

    encoded.extend_from_slice(&word_address(asset));
    encoded.extend_from_slice(&amount.to_be_bytes::<32>());
    // Offset of the dynamic bytes argument: 3 head words.
    encoded.extend_from_slice(&U256::from(96).to_be_bytes::<32>());
    encoded.extend_from_slice(&U256::from(params.len()).to_be_bytes::<32>());
    encoded.extend_from_slice(params);
    // Pad the tail to a word boundary.
    let remainder = params.len() % 32;
    if remainder != 0 {
        encoded.extend_from_slice(&vec![0u8; 32 - remainder]);
    }

    encoded
}

/// Expected profit floor handed to the contract; executions landing
/// under it revert instead of settling a marginal trade.
pub fn min_profit_raw(net_profit: Decimal, quote_decimals: u32) -> U256 {
    to_raw((net_profit * dec!(0.5)).max(dec!(0)), quote_decimals)
}
