//! Risk manager: the gatekeeper in front of execution
//!
//! Every assessment walks the same ladder: emergency stop, circuit
//! breaker, then the per-factor accumulation. Any critical factor
//! rejects outright; otherwise the aggregated score decides against the
//! configured ceiling. Post-execution feedback flows back through
//! `record_result`, which owns the breaker activation.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::{
    config::RiskSettings,
    risk::stats::SharedRiskState,
    types::{
        ExecutionResult, Opportunity, ProfitabilityReport, RiskAssessment, RiskFactor, Severity,
    },
};

/// Penalty added for every critical/high factor beyond the first.
const SEVERE_FACTOR_PENALTY: u32 = 10;

pub struct RiskManager {
    settings: RiskSettings,
    state: SharedRiskState,
}

/// The raw inputs the factor ladder looks at, pulled out of the
/// opportunity and report so the scoring stays a pure function.
#[derive(Debug, Clone)]
pub struct AssessmentInputs {
    pub margin_pct: Decimal,
    pub position_size: Decimal,
    pub slippage_bps: u32,
    pub gas_price_gwei: Decimal,
    pub projected_daily_loss_usd: Decimal,
    pub consecutive_failures: u32,
}

impl RiskManager {
    pub fn new(settings: RiskSettings, state: SharedRiskState) -> Self {
        Self { settings, state }
    }

    pub async fn assess(
        &self,
        opportunity: &Opportunity,
        report: &ProfitabilityReport,
        current_gas_price_gwei: Decimal,
    ) -> RiskAssessment {
        let mut state = self.state.write().await;
        state.reset_if_new_day();

        if self.settings.emergency_stop {
            return rejection(RiskFactor {
                name: "emergency stop",
                severity: Severity::Critical,
                points: 100,
                detail: "global emergency stop flag is set".to_string(),
            });
        }

        if state.breaker.active {
            let cooldown = Duration::from_secs(self.settings.circuit_breaker_cooldown_secs);
            let elapsed = state
                .breaker
                .activated_at
                .map(|at| at.elapsed())
                .unwrap_or(Duration::ZERO);

            if elapsed >= cooldown {
                info!("Circuit breaker cooldown complete, closing");
                state.breaker.active = false;
                state.breaker.activated_at = None;
                state.daily.consecutive_failures = 0;
            } else {
                let remaining = cooldown - elapsed;
                return rejection(RiskFactor {
                    name: "circuit breaker active",
                    severity: Severity::Critical,
                    points: 100,
                    detail: format!("cooldown ends in {}s", remaining.as_secs()),
                });
            }
        }

        let inputs = AssessmentInputs {
            margin_pct: report.profit_margin_pct,
            position_size: opportunity.borrow_amount,
            slippage_bps: estimate_slippage_bps(opportunity),
            gas_price_gwei: current_gas_price_gwei,
            projected_daily_loss_usd: state.daily.realized_loss_usd + report.gas_cost_usd,
            consecutive_failures: state.daily.consecutive_failures,
        };

        let factors = accumulate_factors(&self.settings, &inputs);
        let score = final_score(&factors);
        let has_critical = factors.iter().any(|f| f.severity == Severity::Critical);
        let approved = !has_critical && score <= self.settings.max_risk_score;

        let capped_position = factors
            .iter()
            .any(|f| f.name == "position size above maximum")
            .then_some(self.settings.max_position_size);

        RiskAssessment {
            factors,
            score,
            approved,
            capped_position,
            max_slippage_bps: Some(self.settings.max_slippage_bps),
        }
    }

    /// Post-execution feedback. Updates the daily ledger, drives the
    /// consecutive-failure counter and trips the breaker at the
    /// configured threshold.
    pub async fn record_result(
        &self,
        _opportunity: &Opportunity,
        report: &ProfitabilityReport,
        result: &ExecutionResult,
    ) {
        let mut state = self.state.write().await;
        state.reset_if_new_day();

        state.daily.trades_attempted += 1;

        if result.success {
            state.daily.trades_succeeded += 1;
            state.daily.realized_profit_usd += result
                .realized_profit_usd
                .unwrap_or(report.net_profit_usd);
            state.daily.consecutive_failures = 0;
        } else {
            state.daily.trades_failed += 1;
            // A reverted flashloan unwinds both swaps; the gas is the
            // realized loss.
            state.daily.realized_loss_usd += report.gas_cost_usd;
            state.daily.consecutive_failures += 1;

            if state.daily.consecutive_failures >= self.settings.circuit_breaker_threshold
                && !state.breaker.active
            {
                state.breaker.active = true;
                state.breaker.activated_at = Some(Instant::now());
                warn!(
                    failures = state.daily.consecutive_failures,
                    "⚡ Circuit breaker OPEN after consecutive failures"
                );
            }
        }
    }

    pub async fn breaker_snapshot(&self) -> (bool, Option<Instant>) {
        let state = self.state.read().await;
        (state.breaker.active, state.breaker.activated_at)
    }

    pub async fn daily_snapshot(&self) -> crate::risk::stats::DailyRiskStats {
        self.state.read().await.daily.clone()
    }
}

fn rejection(factor: RiskFactor) -> RiskAssessment {
    let score = factor.points;
    RiskAssessment {
        factors: vec![factor],
        score,
        approved: false,
        capped_position: None,
        max_slippage_bps: None,
    }
}

/// Linear price-impact estimate over both legs, from the pool reserves
/// captured with the quotes. Legs without a reserve snapshot contribute
/// nothing; the flat liquidity baseline in the profitability score
/// covers that blind spot.
pub fn estimate_slippage_bps(opportunity: &Opportunity) -> u32 {
    let mut bps = dec!(0);
    for quote in [&opportunity.buy_quote, &opportunity.sell_quote] {
        if let Some(liquidity) = &quote.liquidity {
            if liquidity.reserve_in > dec!(0) {
                bps += opportunity.trade_size / liquidity.reserve_in * dec!(10000);
            }
        }
    }
    bps.min(dec!(10000)).trunc().to_u32().unwrap_or(10000)
}

/// The factor ladder. Pure so the monotonicity property can be checked
/// exhaustively.
pub fn accumulate_factors(settings: &RiskSettings, inputs: &AssessmentInputs) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if inputs.margin_pct < settings.min_margin_pct {
        factors.push(RiskFactor {
            name: "profit margin below floor",
            severity: Severity::Medium,
            points: 15,
            detail: format!(
                "margin {:.3}% below floor {:.3}%",
                inputs.margin_pct, settings.min_margin_pct
            ),
        });
    }

    if inputs.position_size > settings.max_position_size {
        factors.push(RiskFactor {
            name: "position size above maximum",
            severity: Severity::Medium,
            points: 15,
            detail: format!(
                "size {} above cap {}",
                inputs.position_size, settings.max_position_size
            ),
        });
    }

    if inputs.slippage_bps > settings.max_slippage_bps {
        factors.push(RiskFactor {
            name: "estimated slippage above maximum",
            severity: Severity::High,
            points: 20,
            detail: format!(
                "estimated {} bps above cap {} bps",
                inputs.slippage_bps, settings.max_slippage_bps
            ),
        });
    }

    if inputs.gas_price_gwei > settings.max_gas_price_gwei {
        factors.push(RiskFactor {
            name: "gas price above maximum",
            severity: Severity::High,
            points: 15,
            detail: format!(
                "{} gwei above cap {} gwei",
                inputs.gas_price_gwei, settings.max_gas_price_gwei
            ),
        });
    }

    if inputs.projected_daily_loss_usd > settings.max_daily_loss_usd {
        factors.push(RiskFactor {
            name: "projected daily loss above maximum",
            severity: Severity::Critical,
            points: 40,
            detail: format!(
                "projected ${} above cap ${}",
                inputs.projected_daily_loss_usd, settings.max_daily_loss_usd
            ),
        });
    }

    if inputs.consecutive_failures > 0 {
        let near_threshold =
            inputs.consecutive_failures + 1 >= settings.circuit_breaker_threshold;
        factors.push(RiskFactor {
            name: "recent consecutive failures",
            severity: if near_threshold {
                Severity::High
            } else {
                Severity::Medium
            },
            points: (10 * inputs.consecutive_failures).min(30) as u8,
            detail: format!(
                "{} of {} failures before the breaker trips",
                inputs.consecutive_failures, settings.circuit_breaker_threshold
            ),
        });
    }

    factors
}

/// Sum of factor points plus a penalty for every critical/high factor
/// beyond the first, capped at 100.
pub fn final_score(factors: &[RiskFactor]) -> u8 {
    let base: u32 = factors.iter().map(|f| f.points as u32).sum();
    let severe = factors
        .iter()
        .filter(|f| matches!(f.severity, Severity::High | Severity::Critical))
        .count() as u32;
    let penalty = severe.saturating_sub(1) * SEVERE_FACTOR_PENALTY;
    (base + penalty).min(100) as u8
}
