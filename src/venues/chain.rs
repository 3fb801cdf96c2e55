//! Low-level venue call boundary
//!
//! The trait isolates the rest of the quoting stack from the RPC layer so
//! tests can substitute in-memory implementations.

use alloy::{
    primitives::{keccak256, Address, U256},
    providers::Provider,
    rpc::types::eth::TransactionRequest,
    sol_types::SolValue,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::ConcreteProvider;

#[async_trait]
pub trait QuoteCalls: Send + Sync {
    /// Pair address registered with the factory, or None when no such
    /// pair exists.
    async fn pair_for(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>>;

    /// Reserves of a constant-product pair in the pair's token0/token1
    /// order.
    async fn reserves(&self, pair: Address) -> Result<(U256, U256)>;

    /// Router getAmountsOut along a path.
    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>>;

    /// Concentrated-liquidity quoter simulation for one fee tier.
    async fn quote_single(
        &self,
        quoter: Address,
        token_in: Address,
        token_out: Address,
        fee_tier: u32,
        amount_in: U256,
    ) -> Result<U256>;
}

pub struct RpcQuoteCalls {
    provider: Arc<ConcreteProvider>,
}

impl RpcQuoteCalls {
    pub fn new(provider: Arc<ConcreteProvider>) -> Self {
        Self { provider }
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<alloy::primitives::Bytes> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.provider
            .call(&tx)
            .await
            .with_context(|| format!("eth_call to {} failed", to))
    }
}

fn word_address(addr: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_slice());
    word
}

#[async_trait]
impl QuoteCalls for RpcQuoteCalls {
    async fn pair_for(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>> {
        let mut data = keccak256("getPair(address,address)")[..4].to_vec();
        data.extend_from_slice(&word_address(token_a));
        data.extend_from_slice(&word_address(token_b));

        let result = self.eth_call(factory, data).await?;
        let pair = Address::abi_decode(&result, true).context("Failed to decode getPair")?;

        if pair == Address::ZERO {
            Ok(None)
        } else {
            Ok(Some(pair))
        }
    }

    async fn reserves(&self, pair: Address) -> Result<(U256, U256)> {
        let data = keccak256("getReserves()")[..4].to_vec();
        let result = self.eth_call(pair, data).await?;
        let decoded = <(U256, U256, U256)>::abi_decode(&result, true)
            .context("Failed to decode reserves")?;
        Ok((decoded.0, decoded.1))
    }

    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>> {
        let mut data = keccak256("getAmountsOut(uint256,address[])")[..4].to_vec();
        data.extend_from_slice(&amount_in.to_be_bytes::<32>());
        // Offset of the dynamic path array: 2 head words.
        data.extend_from_slice(&U256::from(64).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(path.len()).to_be_bytes::<32>());
        for addr in path {
            data.extend_from_slice(&word_address(*addr));
        }

        let result = self.eth_call(router, data).await?;
        <Vec<U256>>::abi_decode(&result, true).context("Failed to decode getAmountsOut")
    }

    async fn quote_single(
        &self,
        quoter: Address,
        token_in: Address,
        token_out: Address,
        fee_tier: u32,
        amount_in: U256,
    ) -> Result<U256> {
        let mut data =
            keccak256("quoteExactInputSingle(address,address,uint24,uint256,uint160)")[..4]
                .to_vec();
        data.extend_from_slice(&word_address(token_in));
        data.extend_from_slice(&word_address(token_out));
        data.extend_from_slice(&U256::from(fee_tier).to_be_bytes::<32>());
        data.extend_from_slice(&amount_in.to_be_bytes::<32>());
        // sqrtPriceLimitX96 = 0, no price bound on the simulation
        data.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());

        let result = self.eth_call(quoter, data).await?;
        U256::abi_decode(&result, true).context("Failed to decode quoter output")
    }
}
