//! Profitability scoring
//!
//! Every candidate gets a full report, profitable or not, so rejections
//! can always be logged with the exact numbers behind them. Only an
//! internal failure (no usable reference price at all) produces None.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::error;

use crate::{
    config::{
        ProfitabilitySettings, FLASHLOAN_PREMIUM_RATE, GAS_FLASHLOAN_BASE, GAS_PER_SWAP,
        GAS_SAFETY_BUFFER,
    },
    oracle::PriceOracle,
    types::{Opportunity, ProfitabilityReport},
};

// Flat baseline points for risks the model does not observe directly.
const GAS_VOLATILITY_BASELINE: u8 = 5;
const LIQUIDITY_RISK_BASELINE: u8 = 10;

pub struct ProfitabilityCalculator {
    oracle: Arc<PriceOracle>,
    settings: ProfitabilitySettings,
}

impl ProfitabilityCalculator {
    pub fn new(oracle: Arc<PriceOracle>, settings: ProfitabilitySettings) -> Self {
        Self { oracle, settings }
    }

    /// Score one opportunity at the given gas price. Negative-profit
    /// candidates still produce a report; None only means the reference
    /// prices were unusable.
    pub async fn evaluate(
        &self,
        opportunity: &Opportunity,
        gas_price_gwei: Decimal,
    ) -> Option<ProfitabilityReport> {
        let quote_usd = self
            .oracle
            .get_price(opportunity.pair.quote.symbol)
            .await;
        let native_usd = self.oracle.get_price("WETH").await;

        if quote_usd <= dec!(0) || native_usd <= dec!(0) {
            error!(
                pair = %opportunity.pair.label(),
                "No usable reference price, cannot evaluate opportunity"
            );
            return None;
        }

        Some(build_report(
            opportunity,
            quote_usd,
            native_usd,
            gas_price_gwei,
        ))
    }

    /// Final go/no-go on the economics alone; risk-manager gating comes
    /// after this.
    pub fn is_viable(&self, report: &ProfitabilityReport) -> bool {
        report.is_profitable
            && report.net_profit_usd >= self.settings.min_profit_usd
            && report.risk_score <= self.settings.max_risk_score
            && report.profit_margin_pct > self.settings.min_margin_pct
    }
}

/// Deterministic cost/benefit breakdown. Asset-unit figures are in the
/// borrowed (quote) asset; `quote_usd` and `native_usd` convert to USD.
pub fn build_report(
    opportunity: &Opportunity,
    quote_usd: Decimal,
    native_usd: Decimal,
    gas_price_gwei: Decimal,
) -> ProfitabilityReport {
    let borrow = opportunity.borrow_amount;
    let size = opportunity.trade_size;

    let gross_profit = size * (opportunity.sell_quote.price - opportunity.buy_quote.price);
    let gross_profit_usd = gross_profit * quote_usd;

    // Leg 1 trades the borrowed amount, leg 2 trades the proceeds of
    // selling the base position.
    let buy_fee_rate = Decimal::from(opportunity.buy_quote.fee_bps) / dec!(10000);
    let sell_fee_rate = Decimal::from(opportunity.sell_quote.fee_bps) / dec!(10000);
    let sell_proceeds = size * opportunity.sell_quote.price;
    let venue_fee_cost = borrow * buy_fee_rate + sell_proceeds * sell_fee_rate;
    let venue_fee_cost_usd = venue_fee_cost * quote_usd;

    let loan_premium = borrow * FLASHLOAN_PREMIUM_RATE;
    let loan_premium_usd = loan_premium * quote_usd;

    let gas_units = GAS_FLASHLOAN_BASE + GAS_PER_SWAP * 2 + GAS_SAFETY_BUFFER;
    let gas_cost_native = gas_price_gwei * Decimal::from(gas_units) / dec!(1_000_000_000);
    let gas_cost_usd = gas_cost_native * native_usd;
    let gas_cost_in_quote = if quote_usd > dec!(0) {
        gas_cost_usd / quote_usd
    } else {
        dec!(0)
    };

    let total_costs = venue_fee_cost + loan_premium + gas_cost_in_quote;
    let net_profit = gross_profit - total_costs;
    let net_profit_usd = net_profit * quote_usd;

    let profit_margin_pct = if borrow > dec!(0) {
        net_profit / borrow * dec!(100)
    } else {
        dec!(0)
    };

    let break_even_amount = if opportunity.spread_pct > dec!(0) {
        total_costs / (opportunity.spread_pct / dec!(100))
    } else {
        dec!(0)
    };

    let risk_score = risk_score(opportunity.spread_pct, net_profit, total_costs);

    ProfitabilityReport {
        gross_profit,
        gross_profit_usd,
        venue_fee_cost,
        venue_fee_cost_usd,
        loan_premium,
        loan_premium_usd,
        gas_cost_native,
        gas_cost_usd,
        net_profit,
        net_profit_usd,
        profit_margin_pct,
        break_even_amount,
        risk_score,
        is_profitable: net_profit > dec!(0),
        gas_price_gwei,
    }
}

/// Additive 0-100 heuristic: thin spreads and poor profit-to-cost ratios
/// dominate, plus flat baselines for gas volatility and liquidity depth
/// the model does not observe.
fn risk_score(spread_pct: Decimal, net_profit: Decimal, total_costs: Decimal) -> u8 {
    let mut score: u32 = 0;

    score += if spread_pct < dec!(1) {
        30
    } else if spread_pct < dec!(2) {
        20
    } else if spread_pct < dec!(5) {
        10
    } else {
        0
    };

    let profit_to_cost = if total_costs > dec!(0) {
        net_profit / total_costs
    } else {
        Decimal::MAX
    };
    score += if profit_to_cost < dec!(0.1) {
        25
    } else if profit_to_cost < dec!(0.2) {
        15
    } else if profit_to_cost < dec!(0.5) {
        10
    } else {
        0
    };

    score += GAS_VOLATILITY_BASELINE as u32;
    score += LIQUIDITY_RISK_BASELINE as u32;

    score.min(100) as u8
}
