//! Risk assessment types

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One triggered risk rule with its contribution to the final score.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFactor {
    pub name: &'static str,
    pub severity: Severity,
    pub points: u8,
    pub detail: String,
}

/// Outcome of gating one profitability report through the risk manager.
/// Any critical factor forces `approved = false` regardless of score.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub factors: Vec<RiskFactor>,
    pub score: u8,
    pub approved: bool,
    /// Recommended position cap when size triggered a factor.
    pub capped_position: Option<Decimal>,
    /// Recommended slippage bound for execution.
    pub max_slippage_bps: Option<u32>,
}

impl RiskAssessment {
    pub fn has_critical(&self) -> bool {
        self.factors
            .iter()
            .any(|f| f.severity == Severity::Critical)
    }

    /// Machine-readable reason for a rejection, if rejected.
    pub fn rejection_reason(&self) -> Option<String> {
        if self.approved {
            return None;
        }
        let factor = self
            .factors
            .iter()
            .max_by_key(|f| (f.severity, f.points))
            .map(|f| f.name.to_string())
            .unwrap_or_else(|| "risk score above ceiling".to_string());
        Some(factor)
    }
}
