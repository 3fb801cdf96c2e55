//! Profitability report types

use rust_decimal::Decimal;
use serde::Serialize;

/// Full cost/benefit breakdown for one opportunity. Asset-denominated
/// figures are in the borrowed (quote) asset; every cost also carries a
/// USD conversion. Invariant: net = gross - (fees + premium + gas).
#[derive(Debug, Clone, Serialize)]
pub struct ProfitabilityReport {
    pub gross_profit: Decimal,
    pub gross_profit_usd: Decimal,
    pub venue_fee_cost: Decimal,
    pub venue_fee_cost_usd: Decimal,
    pub loan_premium: Decimal,
    pub loan_premium_usd: Decimal,
    pub gas_cost_native: Decimal,
    pub gas_cost_usd: Decimal,
    pub net_profit: Decimal,
    pub net_profit_usd: Decimal,
    /// net profit / borrowed amount * 100.
    pub profit_margin_pct: Decimal,
    /// Minimum borrow size at which the trade stops being a loss.
    pub break_even_amount: Decimal,
    /// Additive heuristic, 0 (benign) to 100 (do not touch).
    pub risk_score: u8,
    pub is_profitable: bool,
    /// Gas price the report was scored with; re-checked before submission.
    pub gas_price_gwei: Decimal,
}
