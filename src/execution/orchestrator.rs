//! Execution orchestrator
//!
//! Strictly single-flight: one submission owns the engine until it
//! reaches a terminal state, and a second request in that window is
//! rejected outright rather than queued. Ahead of every submission the
//! opportunity is re-validated against live gas and freshness, the
//! account balance is checked, and the venue payloads are built; any
//! failure from that point on is a recorded result, never a crash.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::eth::TransactionRequest,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    config::{ExecutionSettings, VenueConfig, QUOTE_FRESHNESS_SECS},
    execution::payload::{
        build_flashloan_calldata, build_leg_payloads, encode_flashloan_params, min_profit_raw,
        FlashloanParams,
    },
    gas::GasPricingStrategy,
    types::{
        ExecutionOutcome, ExecutionResult, ExecutionUrgency, GasFees, Opportunity,
        ProfitabilityReport, SkipReason,
    },
    ConcreteProvider,
};

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub to: Address,
    pub from: Address,
    pub calldata: Vec<u8>,
    pub gas_limit: u64,
    pub fees: GasFees,
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub tx_hash: String,
    pub gas_used: u64,
    pub reverted: bool,
}

#[async_trait]
pub trait SettlementCalls: Send + Sync {
    async fn native_balance(&self, account: Address) -> Result<U256>;
    /// Simulated gas use for the request, for the limit calculation.
    async fn estimate_gas(&self, request: &SubmitRequest) -> Result<u64>;
    /// Submit and wait for the terminal receipt. A confirmed-but-
    /// reverted transaction is an Ok receipt with `reverted` set;
    /// errors mean the submission itself failed.
    async fn submit(&self, request: SubmitRequest) -> Result<SubmissionReceipt>;
}

pub struct RpcSettlementCalls {
    provider: Arc<ConcreteProvider>,
}

impl RpcSettlementCalls {
    pub fn new(provider: Arc<ConcreteProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SettlementCalls for RpcSettlementCalls {
    async fn native_balance(&self, account: Address) -> Result<U256> {
        self.provider
            .get_balance(account)
            .await
            .context("Failed to fetch native balance")
    }

    async fn estimate_gas(&self, request: &SubmitRequest) -> Result<u64> {
        let tx = TransactionRequest::default()
            .to(request.to)
            .from(request.from)
            .input(request.calldata.clone().into());
        let estimate = self
            .provider
            .estimate_gas(&tx)
            .await
            .context("Failed to estimate gas")?;
        Ok(estimate as u64)
    }

    async fn submit(&self, request: SubmitRequest) -> Result<SubmissionReceipt> {
        let mut tx = TransactionRequest::default()
            .to(request.to)
            .from(request.from)
            .input(request.calldata.into())
            .gas_limit(request.gas_limit);

        tx = match request.fees {
            GasFees::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => tx
                .max_fee_per_gas(max_fee_per_gas)
                .max_priority_fee_per_gas(max_priority_fee_per_gas),
            GasFees::Legacy { gas_price } => tx.with_gas_price(gas_price),
        };

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .context("Failed to send transaction")?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        info!("📡 Settlement transaction sent: {}", tx_hash);

        let receipt = pending
            .get_receipt()
            .await
            .context("Failed to await receipt")?;

        Ok(SubmissionReceipt {
            tx_hash,
            gas_used: receipt.gas_used as u64,
            reverted: !receipt.status(),
        })
    }
}

pub struct ExecutionOrchestrator {
    calls: Arc<dyn SettlementCalls>,
    gas: Arc<GasPricingStrategy>,
    settings: ExecutionSettings,
    settlement_contract: Address,
    executor_account: Address,
    venues: Vec<VenueConfig>,
    min_margin_pct: Decimal,
    flight: Mutex<()>,
    last_submission: RwLock<Option<Instant>>,
}

impl ExecutionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calls: Arc<dyn SettlementCalls>,
        gas: Arc<GasPricingStrategy>,
        settings: ExecutionSettings,
        settlement_contract: Address,
        executor_account: Address,
        venues: Vec<VenueConfig>,
        min_margin_pct: Decimal,
    ) -> Self {
        Self {
            calls,
            gas,
            settings,
            settlement_contract,
            executor_account,
            venues,
            min_margin_pct,
            flight: Mutex::new(()),
            last_submission: RwLock::new(None),
        }
    }

    pub async fn execute(
        &self,
        opportunity: &Opportunity,
        report: &ProfitabilityReport,
    ) -> ExecutionOutcome {
        // Single flight: a request while one is in progress is rejected,
        // not queued.
        let _flight = match self.flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                return ExecutionOutcome::Skipped {
                    reason: SkipReason::InProgress,
                }
            }
        };

        let cooldown = Duration::from_secs(self.settings.cooldown_secs);
        if let Some(last) = *self.last_submission.read().await {
            let elapsed = last.elapsed();
            if elapsed < cooldown {
                return ExecutionOutcome::Skipped {
                    reason: SkipReason::CooldownActive {
                        remaining_secs: (cooldown - elapsed).as_secs(),
                    },
                };
            }
        }

        let started = Instant::now();

        // Revalidate: the opportunity was scored seconds ago and the
        // world has moved since.
        let current_gas = self.gas.current_gas_price_gwei().await;
        if report.gas_price_gwei > dec!(0) {
            let drift_pct =
                (current_gas - report.gas_price_gwei) / report.gas_price_gwei * dec!(100);
            if drift_pct > self.settings.gas_drift_limit_pct {
                return self.completed_failure(
                    opportunity,
                    started,
                    None,
                    None,
                    format!(
                        "opportunity went stale: gas price drifted {:.1}% above scored {} gwei",
                        drift_pct, report.gas_price_gwei
                    ),
                );
            }
        }

        if report.profit_margin_pct <= self.min_margin_pct {
            return self.completed_failure(
                opportunity,
                started,
                None,
                None,
                format!(
                    "opportunity went stale: margin {:.3}% at or below floor {:.3}%",
                    report.profit_margin_pct, self.min_margin_pct
                ),
            );
        }

        if opportunity.age() > Duration::from_secs(QUOTE_FRESHNESS_SECS) {
            return self.completed_failure(
                opportunity,
                started,
                None,
                None,
                format!(
                    "opportunity went stale: quotes are {}s old",
                    opportunity.age().as_secs()
                ),
            );
        }

        let urgency = urgency_for_spread(opportunity.spread_pct);
        let gas_settings = self.gas.gas_settings(urgency, None).await;

        // Balance check: 2x the worst-case gas cost must be on hand.
        let cost_wei = gas_settings
            .fees
            .effective_price()
            .saturating_mul(gas_settings.gas_limit as u128);
        let required = U256::from(cost_wei) * U256::from(2u8);
        match self.calls.native_balance(self.executor_account).await {
            Ok(balance) if balance >= required => {}
            Ok(balance) => {
                return self.completed_failure(
                    opportunity,
                    started,
                    None,
                    None,
                    format!(
                        "insufficient native balance: have {} wei, need {} wei",
                        balance, required
                    ),
                );
            }
            Err(e) => {
                return self.completed_failure(
                    opportunity,
                    started,
                    None,
                    None,
                    format!("balance check failed: {e:#}"),
                );
            }
        }

        // Payload preparation.
        let legs = match build_leg_payloads(
            opportunity,
            &self.venues,
            self.settlement_contract,
            self.settings.slippage_tolerance_bps,
        ) {
            Ok(legs) => legs,
            Err(e) => {
                return self.completed_failure(opportunity, started, None, None, e.to_string());
            }
        };

        let params = encode_flashloan_params(&FlashloanParams {
            token_a: opportunity.pair.base.address,
            token_b: opportunity.pair.quote.address,
            amount: opportunity.borrow_amount_raw,
            targets: legs.iter().map(|leg| leg.target).collect(),
            calldatas: legs.iter().map(|leg| leg.calldata.clone()).collect(),
            min_profit: min_profit_raw(report.net_profit, opportunity.pair.quote.decimals),
        });
        let calldata = build_flashloan_calldata(
            opportunity.pair.quote.address,
            opportunity.borrow_amount_raw,
            &params,
        );

        let mut request = SubmitRequest {
            to: self.settlement_contract,
            from: self.executor_account,
            calldata,
            gas_limit: gas_settings.gas_limit,
            fees: gas_settings.fees,
        };

        // Refine the limit with a simulation of the real payload; on
        // estimation failure the hardcoded ceiling already in place
        // stands.
        let gas_estimate = match self.calls.estimate_gas(&request).await {
            Ok(units) => Some(units),
            Err(e) => {
                debug!("Gas estimation failed, keeping default limit: {e:#}");
                None
            }
        };
        let gas_settings = self.gas.gas_settings(urgency, gas_estimate).await;
        request.gas_limit = gas_settings.gas_limit;
        request.fees = gas_settings.fees;

        info!(
            opportunity_id = %opportunity.id,
            pair = %opportunity.pair.label(),
            urgency = ?urgency,
            gas_gwei = %gas_settings.effective_price_gwei,
            "🚀 Submitting flashloan arbitrage"
        );

        *self.last_submission.write().await = Some(Instant::now());

        let timeout = Duration::from_secs(self.settings.confirmation_timeout_secs);
        match tokio::time::timeout(timeout, self.calls.submit(request)).await {
            Ok(Ok(receipt)) if !receipt.reverted => {
                let result = ExecutionResult {
                    id: uuid::Uuid::new_v4().to_string(),
                    opportunity_id: opportunity.id.clone(),
                    timestamp: Utc::now(),
                    success: true,
                    tx_hash: Some(receipt.tx_hash),
                    gas_used: Some(receipt.gas_used),
                    realized_profit_usd: Some(report.net_profit_usd),
                    failure_reason: None,
                    latency_ms: started.elapsed().as_millis() as u64,
                };
                info!(
                    opportunity_id = %opportunity.id,
                    profit = %report.net_profit_usd,
                    "✅ Arbitrage settled"
                );
                ExecutionOutcome::Completed(result)
            }
            Ok(Ok(receipt)) => self.completed_failure(
                opportunity,
                started,
                Some(receipt.tx_hash),
                Some(receipt.gas_used),
                "settlement transaction reverted on-chain".to_string(),
            ),
            Ok(Err(e)) => self.completed_failure(
                opportunity,
                started,
                None,
                None,
                format!("submission failed: {e:#}"),
            ),
            Err(_) => self.completed_failure(
                opportunity,
                started,
                None,
                None,
                format!("no confirmation within {}s", timeout.as_secs()),
            ),
        }
    }

    fn completed_failure(
        &self,
        opportunity: &Opportunity,
        started: Instant,
        tx_hash: Option<String>,
        gas_used: Option<u64>,
        reason: String,
    ) -> ExecutionOutcome {
        warn!(opportunity_id = %opportunity.id, "Execution failed: {}", reason);
        ExecutionOutcome::Completed(ExecutionResult {
            id: uuid::Uuid::new_v4().to_string(),
            opportunity_id: opportunity.id.clone(),
            timestamp: Utc::now(),
            success: false,
            tx_hash,
            gas_used,
            realized_profit_usd: None,
            failure_reason: Some(reason),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Wider spreads attract more competition; bid harder for them.
fn urgency_for_spread(spread_pct: Decimal) -> ExecutionUrgency {
    if spread_pct >= dec!(3) {
        ExecutionUrgency::Urgent
    } else if spread_pct >= dec!(1.5) {
        ExecutionUrgency::Fast
    } else {
        ExecutionUrgency::Standard
    }
}

#[cfg(test)]
pub mod tests_support {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SubmitBehavior {
        Confirm,
        Revert,
        Error,
    }

    pub struct MockSettlementCalls {
        pub balance: U256,
        pub behavior: SubmitBehavior,
        pub gas_estimate: Option<u64>,
        pub submit_delay: Duration,
        pub submissions: AtomicU32,
        pub last_gas_limit: std::sync::Mutex<Option<u64>>,
    }

    impl Default for MockSettlementCalls {
        fn default() -> Self {
            Self {
                // 1 ETH, comfortably above any gas requirement here.
                balance: U256::from(10u64).pow(U256::from(18u64)),
                behavior: SubmitBehavior::Confirm,
                gas_estimate: Some(480_000),
                submit_delay: Duration::ZERO,
                submissions: AtomicU32::new(0),
                last_gas_limit: std::sync::Mutex::new(None),
            }
        }
    }

    impl MockSettlementCalls {
        pub fn submission_count(&self) -> u32 {
            self.submissions.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SettlementCalls for MockSettlementCalls {
        async fn native_balance(&self, _account: Address) -> Result<U256> {
            Ok(self.balance)
        }

        async fn estimate_gas(&self, _request: &SubmitRequest) -> Result<u64> {
            self.gas_estimate
                .ok_or_else(|| anyhow::anyhow!("execution would revert"))
        }

        async fn submit(&self, request: SubmitRequest) -> Result<SubmissionReceipt> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            *self.last_gas_limit.lock().unwrap() = Some(request.gas_limit);
            if !self.submit_delay.is_zero() {
                tokio::time::sleep(self.submit_delay).await;
            }
            match self.behavior {
                SubmitBehavior::Confirm => Ok(SubmissionReceipt {
                    tx_hash: "0xabc".to_string(),
                    gas_used: 410_000,
                    reverted: false,
                }),
                SubmitBehavior::Revert => Ok(SubmissionReceipt {
                    tx_hash: "0xdef".to_string(),
                    gas_used: 390_000,
                    reverted: true,
                }),
                SubmitBehavior::Error => anyhow::bail!("rpc connection reset"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::{MockSettlementCalls, SubmitBehavior};
    use super::*;
    use crate::config::default_venues;
    use crate::gas::tests_support::MockGasFeeCalls;
    use crate::types::{Quote, TradingPair, USDC, WETH};
    use crate::utils::to_raw;

    const GWEI: u128 = 1_000_000_000;

    fn settings(cooldown_secs: u64) -> ExecutionSettings {
        ExecutionSettings {
            enabled: true,
            cooldown_secs,
            gas_drift_limit_pct: dec!(20),
            slippage_tolerance_bps: 500,
            confirmation_timeout_secs: 5,
            fee_market: false,
        }
    }

    fn opportunity() -> Opportunity {
        let pair = TradingPair {
            base: WETH,
            quote: USDC,
        };
        let quote = |venue: &str, price: Decimal| Quote {
            venue_id: venue.to_string(),
            token_in: WETH,
            token_out: USDC,
            amount_in: to_raw(dec!(1), 18),
            amount_out: to_raw(price, 6),
            price,
            fee_bps: 30,
            liquidity: None,
            fee_tier: None,
            captured_at: Instant::now(),
            timestamp: Utc::now(),
        };
        Opportunity {
            id: "opp".to_string(),
            pair,
            buy_venue: "uniswap-v2".to_string(),
            buy_quote: quote("uniswap-v2", dec!(2000)),
            sell_venue: "sushiswap".to_string(),
            sell_quote: quote("sushiswap", dec!(2050)),
            spread_pct: dec!(2.5),
            borrow_amount: dec!(2000),
            borrow_amount_raw: to_raw(dec!(2000), 6),
            trade_size: dec!(1),
            discovered_at: Instant::now(),
            timestamp: Utc::now(),
        }
    }

    fn report(gas_price_gwei: Decimal) -> ProfitabilityReport {
        ProfitabilityReport {
            gross_profit: dec!(50),
            gross_profit_usd: dec!(50),
            venue_fee_cost: dec!(12),
            venue_fee_cost_usd: dec!(12),
            loan_premium: dec!(1.8),
            loan_premium_usd: dec!(1.8),
            gas_cost_native: dec!(0.002),
            gas_cost_usd: dec!(5),
            net_profit: dec!(31.2),
            net_profit_usd: dec!(31.2),
            profit_margin_pct: dec!(1.56),
            break_even_amount: dec!(752),
            risk_score: 25,
            is_profitable: true,
            gas_price_gwei,
        }
    }

    fn orchestrator(
        calls: Arc<MockSettlementCalls>,
        gas_price_wei: u128,
        cooldown_secs: u64,
    ) -> ExecutionOrchestrator {
        let gas = Arc::new(GasPricingStrategy::new(
            Arc::new(MockGasFeeCalls {
                legacy_wei: Some(gas_price_wei),
                ..Default::default()
            }),
            false,
        ));
        ExecutionOrchestrator::new(
            calls,
            gas,
            settings(cooldown_secs),
            Address::repeat_byte(0xAA),
            Address::repeat_byte(0xEE),
            default_venues(),
            dec!(0.5),
        )
    }

    #[tokio::test]
    async fn confirmed_submission_completes_successfully() {
        let calls = Arc::new(MockSettlementCalls::default());
        let orch = orchestrator(calls.clone(), 20 * GWEI, 0);

        let outcome = orch.execute(&opportunity(), &report(dec!(20))).await;
        match outcome {
            ExecutionOutcome::Completed(result) => {
                assert!(result.success);
                assert_eq!(result.tx_hash.as_deref(), Some("0xabc"));
                assert_eq!(result.gas_used, Some(410_000));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.submission_count(), 1);
        // 480k simulated + 20% margin.
        assert_eq!(*calls.last_gas_limit.lock().unwrap(), Some(576_000));
    }

    #[tokio::test]
    async fn estimation_failure_submits_with_default_ceiling() {
        let calls = Arc::new(MockSettlementCalls {
            gas_estimate: None,
            ..Default::default()
        });
        let orch = orchestrator(calls.clone(), 20 * GWEI, 0);

        let outcome = orch.execute(&opportunity(), &report(dec!(20))).await;
        assert!(matches!(outcome, ExecutionOutcome::Completed(r) if r.success));
        assert_eq!(
            *calls.last_gas_limit.lock().unwrap(),
            Some(crate::config::DEFAULT_GAS_LIMIT)
        );
    }

    #[tokio::test]
    async fn second_request_during_flight_is_rejected_not_queued() {
        let calls = Arc::new(MockSettlementCalls {
            submit_delay: Duration::from_millis(300),
            ..Default::default()
        });
        let orch = Arc::new(orchestrator(calls.clone(), 20 * GWEI, 0));

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.execute(&opportunity(), &report(dec!(20))).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = orch.execute(&opportunity(), &report(dec!(20))).await;
        match second {
            ExecutionOutcome::Skipped { reason } => assert_eq!(reason, SkipReason::InProgress),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let first = first.await.unwrap();
        assert!(matches!(first, ExecutionOutcome::Completed(r) if r.success));
        // Only one settlement submission ever went out.
        assert_eq!(calls.submission_count(), 1);
    }

    #[tokio::test]
    async fn cooldown_rejects_submissions_after_completion() {
        let calls = Arc::new(MockSettlementCalls::default());
        let orch = orchestrator(calls.clone(), 20 * GWEI, 30);

        let first = orch.execute(&opportunity(), &report(dec!(20))).await;
        assert!(matches!(first, ExecutionOutcome::Completed(r) if r.success));

        let second = orch.execute(&opportunity(), &report(dec!(20))).await;
        match second {
            ExecutionOutcome::Skipped {
                reason: SkipReason::CooldownActive { remaining_secs },
            } => assert!(remaining_secs <= 30),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.submission_count(), 1);
    }

    #[tokio::test]
    async fn gas_drift_above_limit_is_a_recorded_failure() {
        let calls = Arc::new(MockSettlementCalls::default());
        // Live gas is 30 gwei but the report was scored at 20: +50%.
        let orch = orchestrator(calls.clone(), 30 * GWEI, 0);

        let outcome = orch.execute(&opportunity(), &report(dec!(20))).await;
        match outcome {
            ExecutionOutcome::Completed(result) => {
                assert!(!result.success);
                assert!(result.failure_reason.unwrap().contains("gas price drifted"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.submission_count(), 0);
    }

    #[tokio::test]
    async fn insufficient_balance_is_a_recorded_failure() {
        let calls = Arc::new(MockSettlementCalls {
            balance: U256::from(1_000u64),
            ..Default::default()
        });
        let orch = orchestrator(calls.clone(), 20 * GWEI, 0);

        let outcome = orch.execute(&opportunity(), &report(dec!(20))).await;
        match outcome {
            ExecutionOutcome::Completed(result) => {
                assert!(!result.success);
                assert!(result
                    .failure_reason
                    .unwrap()
                    .contains("insufficient native balance"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(calls.submission_count(), 0);
    }

    #[tokio::test]
    async fn reverted_receipt_is_a_handled_failure_with_tx_hash() {
        let calls = Arc::new(MockSettlementCalls {
            behavior: SubmitBehavior::Revert,
            ..Default::default()
        });
        let orch = orchestrator(calls, 20 * GWEI, 0);

        let outcome = orch.execute(&opportunity(), &report(dec!(20))).await;
        match outcome {
            ExecutionOutcome::Completed(result) => {
                assert!(!result.success);
                assert_eq!(result.tx_hash.as_deref(), Some("0xdef"));
                assert!(result.failure_reason.unwrap().contains("reverted"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rpc_error_is_caught_and_reported() {
        let calls = Arc::new(MockSettlementCalls {
            behavior: SubmitBehavior::Error,
            ..Default::default()
        });
        let orch = orchestrator(calls, 20 * GWEI, 0);

        let outcome = orch.execute(&opportunity(), &report(dec!(20))).await;
        match outcome {
            ExecutionOutcome::Completed(result) => {
                assert!(!result.success);
                assert!(result.failure_reason.unwrap().contains("submission failed"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
