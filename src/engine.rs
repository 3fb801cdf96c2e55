//! The scan pipeline: quotes -> finder -> profitability -> risk -> execution
//!
//! One `scan_cycle` walks every configured pair. Each stage either
//! produces data for the next or records why the candidate stopped;
//! nothing below a fatal startup error can abort a cycle.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    arbitrage::{OpportunityFinder, ProfitabilityCalculator},
    execution::ExecutionOrchestrator,
    gas::GasPricingStrategy,
    risk::RiskManager,
    telemetry::PerformanceTracker,
    types::{ExecutionOutcome, TradingPair},
    utils::{self, to_raw},
    venues::{CacheStats, VenueQuoteProvider},
};

#[derive(Debug, Clone)]
pub struct EngineHealth {
    pub breaker_open: bool,
    pub consecutive_failures: u32,
    pub daily_loss_usd: Decimal,
}

/// What one cycle did, for the loop's periodic logging.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub pairs_scanned: usize,
    pub opportunities: usize,
    pub viable: usize,
    pub executed: usize,
    /// (opportunity id, machine-readable reason) per stopped candidate.
    pub rejections: Vec<(String, String)>,
}

pub struct ArbEngine {
    venues: Arc<VenueQuoteProvider>,
    finder: OpportunityFinder,
    calculator: ProfitabilityCalculator,
    risk: Arc<RiskManager>,
    gas: Arc<GasPricingStrategy>,
    orchestrator: Option<Arc<ExecutionOrchestrator>>,
    telemetry: Arc<PerformanceTracker>,
    pairs: Vec<TradingPair>,
    trade_size: Decimal,
}

impl ArbEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        venues: Arc<VenueQuoteProvider>,
        finder: OpportunityFinder,
        calculator: ProfitabilityCalculator,
        risk: Arc<RiskManager>,
        gas: Arc<GasPricingStrategy>,
        orchestrator: Option<Arc<ExecutionOrchestrator>>,
        telemetry: Arc<PerformanceTracker>,
        pairs: Vec<TradingPair>,
        trade_size: Decimal,
    ) -> Self {
        Self {
            venues,
            finder,
            calculator,
            risk,
            gas,
            orchestrator,
            telemetry,
            pairs,
            trade_size,
        }
    }

    pub async fn scan_cycle(&self) -> CycleReport {
        let mut cycle = CycleReport::default();
        for pair in &self.pairs {
            cycle.pairs_scanned += 1;
            self.scan_pair(pair, &mut cycle).await;
        }
        cycle
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.venues.cache_stats().await
    }

    pub fn telemetry(&self) -> &Arc<PerformanceTracker> {
        &self.telemetry
    }

    /// Health facts for the periodic status line.
    pub async fn health(&self) -> EngineHealth {
        let (breaker_open, _) = self.risk.breaker_snapshot().await;
        let daily = self.risk.daily_snapshot().await;
        EngineHealth {
            breaker_open,
            consecutive_failures: daily.consecutive_failures,
            daily_loss_usd: daily.realized_loss_usd,
        }
    }

    async fn scan_pair(&self, pair: &TradingPair, cycle: &mut CycleReport) {
        let amount_in = to_raw(self.trade_size, pair.base.decimals);

        let opportunity = match self
            .finder
            .find_opportunity_validated(pair, amount_in)
            .await
        {
            Some(opportunity) => opportunity,
            None => return,
        };

        cycle.opportunities += 1;
        self.telemetry.record_opportunity().await;
        info!(
            pair = %pair.label(),
            buy = %opportunity.buy_venue,
            sell = %opportunity.sell_venue,
            spread = %opportunity.spread_pct,
            "💹 Opportunity found"
        );

        let gas_price = self.gas.current_gas_price_gwei().await;
        let report = match self.calculator.evaluate(&opportunity, gas_price).await {
            Some(report) => report,
            None => {
                cycle
                    .rejections
                    .push((opportunity.id.clone(), "evaluation failed".to_string()));
                return;
            }
        };

        if !self.calculator.is_viable(&report) {
            info!(
                opportunity_id = %opportunity.id,
                net_profit_usd = %report.net_profit_usd,
                margin = %report.profit_margin_pct,
                risk_score = report.risk_score,
                "Opportunity not viable"
            );
            cycle
                .rejections
                .push((opportunity.id.clone(), "not viable".to_string()));
            return;
        }
        cycle.viable += 1;

        let assessment = self.risk.assess(&opportunity, &report, gas_price).await;
        if !assessment.approved {
            let reason = assessment
                .rejection_reason()
                .unwrap_or_else(|| "risk score above ceiling".to_string());
            warn!(
                opportunity_id = %opportunity.id,
                score = assessment.score,
                reason = %reason,
                "⛔ Risk manager rejected opportunity"
            );
            cycle.rejections.push((opportunity.id.clone(), reason));
            return;
        }

        utils::print_opportunity(&opportunity, &report);

        let orchestrator = match &self.orchestrator {
            Some(orchestrator) => orchestrator,
            None => {
                info!(
                    opportunity_id = %opportunity.id,
                    "Execution disabled, opportunity logged only"
                );
                return;
            }
        };

        match orchestrator.execute(&opportunity, &report).await {
            ExecutionOutcome::Skipped { reason } => {
                info!(
                    opportunity_id = %opportunity.id,
                    "Execution skipped: {}",
                    reason.describe()
                );
                cycle
                    .rejections
                    .push((opportunity.id.clone(), reason.describe()));
            }
            ExecutionOutcome::Completed(result) => {
                cycle.executed += 1;
                self.risk
                    .record_result(&opportunity, &report, &result)
                    .await;
                self.telemetry
                    .record_execution(&result, report.profit_margin_pct)
                    .await;
                // Gas is only burned once a transaction actually landed.
                if result.tx_hash.is_some() {
                    self.telemetry.record_gas_cost(report.gas_cost_usd).await;
                }
                utils::print_execution_result(&result);
            }
        }
    }
}
