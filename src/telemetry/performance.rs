//! Rolling performance counters and advisory alerts
//!
//! Counters only ever feed logs and alert events. Nothing here blocks
//! execution; capital protection lives in the risk manager.

use chrono::Utc;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    types::{Alert, AlertKind, ExecutionResult, PerformanceSnapshot},
    venues::CacheStats,
};

/// Bounded latency history; the oldest samples are evicted first.
const LATENCY_HISTORY_LIMIT: usize = 256;
/// Minimum sample size before rate alerts are considered meaningful.
const MIN_SAMPLES_FOR_ALERTS: u64 = 5;

#[derive(Debug, Clone)]
pub struct AlertThresholds {
    pub min_success_rate_pct: f64,
    pub max_error_rate_pct: f64,
    pub max_avg_latency_ms: f64,
    pub min_avg_margin_pct: Decimal,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_success_rate_pct: 50.0,
            max_error_rate_pct: 30.0,
            max_avg_latency_ms: 30_000.0,
            min_avg_margin_pct: dec!(0.2),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    opportunities_found: u64,
    trades_attempted: u64,
    trades_succeeded: u64,
    trades_failed: u64,
    cumulative_profit_usd: Decimal,
    cumulative_gas_cost_usd: Decimal,
    margin_sum_pct: Decimal,
    margin_samples: u64,
    latencies_ms: VecDeque<u64>,
}

pub struct PerformanceTracker {
    started_at: Instant,
    thresholds: AlertThresholds,
    counters: RwLock<Counters>,
}

impl PerformanceTracker {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            started_at: Instant::now(),
            thresholds,
            counters: RwLock::new(Counters::default()),
        }
    }

    pub async fn record_opportunity(&self) {
        self.counters.write().await.opportunities_found += 1;
    }

    pub async fn record_execution(&self, result: &ExecutionResult, margin_pct: Decimal) {
        let mut counters = self.counters.write().await;
        counters.trades_attempted += 1;
        counters.margin_sum_pct += margin_pct;
        counters.margin_samples += 1;

        if result.success {
            counters.trades_succeeded += 1;
            if let Some(profit) = result.realized_profit_usd {
                counters.cumulative_profit_usd += profit;
            }
        } else {
            counters.trades_failed += 1;
        }

        if counters.latencies_ms.len() >= LATENCY_HISTORY_LIMIT {
            counters.latencies_ms.pop_front();
        }
        counters.latencies_ms.push_back(result.latency_ms);
    }

    pub async fn record_gas_cost(&self, gas_cost_usd: Decimal) {
        self.counters.write().await.cumulative_gas_cost_usd += gas_cost_usd;
    }

    pub async fn snapshot(&self, cache: CacheStats) -> PerformanceSnapshot {
        let counters = self.counters.read().await;
        let uptime_secs = self.started_at.elapsed().as_secs();
        let hours = (uptime_secs as f64 / 3600.0).max(f64::EPSILON);

        let avg_latency = if counters.latencies_ms.is_empty() {
            0.0
        } else {
            counters.latencies_ms.iter().sum::<u64>() as f64 / counters.latencies_ms.len() as f64
        };

        let success_rate = if counters.trades_attempted > 0 {
            counters.trades_succeeded as f64 / counters.trades_attempted as f64 * 100.0
        } else {
            100.0
        };
        let error_rate = if counters.trades_attempted > 0 {
            counters.trades_failed as f64 / counters.trades_attempted as f64 * 100.0
        } else {
            0.0
        };

        let avg_margin = if counters.margin_samples > 0 {
            counters.margin_sum_pct / Decimal::from(counters.margin_samples)
        } else {
            dec!(0)
        };

        let profit_per_hour = counters.cumulative_profit_usd
            / Decimal::from_f64(hours).unwrap_or(dec!(1)).max(dec!(0.001));

        PerformanceSnapshot {
            opportunities_found: counters.opportunities_found,
            trades_attempted: counters.trades_attempted,
            trades_succeeded: counters.trades_succeeded,
            trades_failed: counters.trades_failed,
            cumulative_profit_usd: counters.cumulative_profit_usd,
            cumulative_gas_cost_usd: counters.cumulative_gas_cost_usd,
            avg_execution_latency_ms: avg_latency,
            success_rate_pct: success_rate,
            error_rate_pct: error_rate,
            opportunities_per_hour: counters.opportunities_found as f64 / hours,
            profit_per_hour_usd: profit_per_hour,
            avg_margin_pct: avg_margin,
            quote_cache_hits: cache.hits,
            quote_cache_misses: cache.misses,
            uptime_secs,
        }
    }

    /// Evaluate the alert thresholds against the current counters.
    /// Raised alerts are logged and returned; they never gate anything.
    pub async fn check_alerts(&self, cache: CacheStats) -> Vec<Alert> {
        let snapshot = self.snapshot(cache).await;
        let mut alerts = Vec::new();

        if snapshot.trades_attempted >= MIN_SAMPLES_FOR_ALERTS {
            if snapshot.success_rate_pct < self.thresholds.min_success_rate_pct {
                alerts.push(Alert {
                    kind: AlertKind::LowSuccessRate,
                    message: format!(
                        "success rate {:.1}% below floor {:.1}%",
                        snapshot.success_rate_pct, self.thresholds.min_success_rate_pct
                    ),
                    raised_at: Utc::now(),
                });
            }
            if snapshot.error_rate_pct > self.thresholds.max_error_rate_pct {
                alerts.push(Alert {
                    kind: AlertKind::HighErrorRate,
                    message: format!(
                        "error rate {:.1}% above ceiling {:.1}%",
                        snapshot.error_rate_pct, self.thresholds.max_error_rate_pct
                    ),
                    raised_at: Utc::now(),
                });
            }
            if snapshot.avg_execution_latency_ms > self.thresholds.max_avg_latency_ms {
                alerts.push(Alert {
                    kind: AlertKind::SlowExecution,
                    message: format!(
                        "average execution latency {:.0}ms above ceiling {:.0}ms",
                        snapshot.avg_execution_latency_ms, self.thresholds.max_avg_latency_ms
                    ),
                    raised_at: Utc::now(),
                });
            }
            if snapshot.avg_margin_pct < self.thresholds.min_avg_margin_pct {
                alerts.push(Alert {
                    kind: AlertKind::ThinMargins,
                    message: format!(
                        "average margin {:.3}% below floor {:.3}%",
                        snapshot.avg_margin_pct, self.thresholds.min_avg_margin_pct
                    ),
                    raised_at: Utc::now(),
                });
            }
        }

        for alert in &alerts {
            warn!(kind = ?alert.kind, "🚨 {}", alert.message);
        }
        alerts
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(success: bool, latency_ms: u64, profit: Option<Decimal>) -> ExecutionResult {
        ExecutionResult {
            id: "exec".to_string(),
            opportunity_id: "opp".to_string(),
            timestamp: Utc::now(),
            success,
            tx_hash: success.then(|| "0xabc".to_string()),
            gas_used: Some(400_000),
            realized_profit_usd: profit,
            failure_reason: (!success).then(|| "reverted".to_string()),
            latency_ms,
        }
    }

    #[tokio::test]
    async fn counters_accumulate_and_rates_derive() {
        let tracker = PerformanceTracker::default();

        tracker.record_opportunity().await;
        tracker.record_opportunity().await;
        tracker
            .record_execution(&result(true, 800, Some(dec!(25))), dec!(1.2))
            .await;
        tracker
            .record_execution(&result(false, 1200, None), dec!(0.8))
            .await;
        tracker.record_gas_cost(dec!(7)).await;

        let snapshot = tracker.snapshot(CacheStats::default()).await;
        assert_eq!(snapshot.opportunities_found, 2);
        assert_eq!(snapshot.trades_attempted, 2);
        assert_eq!(snapshot.trades_succeeded, 1);
        assert_eq!(snapshot.trades_failed, 1);
        assert_eq!(snapshot.cumulative_profit_usd, dec!(25));
        assert_eq!(snapshot.cumulative_gas_cost_usd, dec!(7));
        assert!((snapshot.success_rate_pct - 50.0).abs() < 1e-9);
        assert!((snapshot.error_rate_pct - 50.0).abs() < 1e-9);
        assert!((snapshot.avg_execution_latency_ms - 1000.0).abs() < 1e-9);
        assert_eq!(snapshot.avg_margin_pct, dec!(1.0));
    }

    #[tokio::test]
    async fn no_alerts_below_minimum_sample_size() {
        let tracker = PerformanceTracker::default();
        tracker
            .record_execution(&result(false, 100, None), dec!(0))
            .await;
        let alerts = tracker.check_alerts(CacheStats::default()).await;
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn breached_thresholds_raise_alerts() {
        let tracker = PerformanceTracker::new(AlertThresholds {
            min_success_rate_pct: 50.0,
            max_error_rate_pct: 30.0,
            max_avg_latency_ms: 500.0,
            min_avg_margin_pct: dec!(0.2),
        });

        for _ in 0..5 {
            tracker
                .record_execution(&result(false, 1000, None), dec!(0.05))
                .await;
        }

        let alerts = tracker.check_alerts(CacheStats::default()).await;
        let kinds: Vec<_> = alerts.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AlertKind::LowSuccessRate));
        assert!(kinds.contains(&AlertKind::HighErrorRate));
        assert!(kinds.contains(&AlertKind::SlowExecution));
        assert!(kinds.contains(&AlertKind::ThinMargins));
    }

    #[tokio::test]
    async fn latency_history_is_bounded() {
        let tracker = PerformanceTracker::default();
        for i in 0..(LATENCY_HISTORY_LIMIT + 50) {
            tracker
                .record_execution(&result(true, i as u64, Some(dec!(1))), dec!(1))
                .await;
        }
        let counters = tracker.counters.read().await;
        assert_eq!(counters.latencies_ms.len(), LATENCY_HISTORY_LIMIT);
        // Oldest entries were evicted.
        assert_eq!(*counters.latencies_ms.front().unwrap(), 50);
    }
}
