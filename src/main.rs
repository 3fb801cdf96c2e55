//! Flashloan Arbitrage Bot - Main Entry Point

use anyhow::Result;
use flash_arb_bot::*;
use std::sync::Arc;
use tracing::{error, info};

use flash_arb_bot::{
    arbitrage::{OpportunityFinder, ProfitabilityCalculator},
    engine::ArbEngine,
    execution::{ExecutionOrchestrator, RpcSettlementCalls},
    gas::{GasPricingStrategy, RpcGasFeeCalls},
    oracle::{PriceOracle, RpcFeedCalls},
    risk::{RiskManager, RiskState},
    scheduler::{ScanScheduler, Tick},
    telemetry::{AlertThresholds, PerformanceTracker},
    venues::{RpcQuoteCalls, VenueQuoteProvider},
};

/// Cycles between periodic statistics / alert evaluations.
const STATS_EVERY_CYCLES: u64 = 20;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let _logging_guard = utils::setup_logging()?;
    utils::setup_output_directories()?;

    let config = CONFIG.clone();

    info!("⚡ Flashloan Arbitrage Bot v0.5.0");
    info!("📋 Configuration:");
    info!("   Trade size: {} (base units)", config.trade_size);
    info!("   Scan interval: {}s", config.scan_interval_secs);
    info!("   Min spread: {}%", config.min_spread_pct);
    info!("   Min profit: ${}", config.profitability.min_profit_usd);
    info!("   Max risk score: {}", config.risk.max_risk_score);
    info!(
        "   Circuit breaker: {} failures, {}s cooldown",
        config.risk.circuit_breaker_threshold, config.risk.circuit_breaker_cooldown_secs
    );
    info!("   Execution: {}", config.execution.enabled);
    info!("   Venues: {}", config.venues.len());
    for venue in &config.venues {
        info!("     {} ({})", venue.id, venue.kind.tag());
    }
    info!(
        "   Pairs: {}",
        config
            .pairs
            .iter()
            .map(|p| p.label())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Fatal configuration problems stop the process here; everything
    // past this point degrades instead of exiting.
    config.validate()?;

    let provider = network::setup_provider(&config).await?;

    let usable_venues = config::validate_venues(config.venues.clone());
    if usable_venues.len() < 2 {
        anyhow::bail!(
            "only {} usable venue(s) after validation, need at least 2",
            usable_venues.len()
        );
    }

    let venues = Arc::new(VenueQuoteProvider::new(
        Arc::new(RpcQuoteCalls::new(provider.clone())),
        usable_venues.clone(),
    ));
    let oracle = Arc::new(PriceOracle::new(Arc::new(RpcFeedCalls::new(
        provider.clone(),
    ))));
    let finder = OpportunityFinder::new(
        venues.clone(),
        oracle.clone(),
        config.min_spread_pct,
        config.oracle_deviation_pct,
    );
    let calculator = ProfitabilityCalculator::new(oracle.clone(), config.profitability.clone());
    let risk = Arc::new(RiskManager::new(config.risk.clone(), RiskState::shared()));
    let gas = Arc::new(GasPricingStrategy::new(
        Arc::new(RpcGasFeeCalls::new(provider.clone())),
        config.execution.fee_market,
    ));

    let orchestrator = if config.execution.enabled {
        let settlement_contract = config
            .settlement_contract
            .expect("validated: settlement contract required");
        let executor_account = config
            .executor_account
            .expect("validated: executor account required");
        info!("🚀 Execution enabled, settlement contract {settlement_contract}");
        Some(Arc::new(ExecutionOrchestrator::new(
            Arc::new(RpcSettlementCalls::new(provider.clone())),
            gas.clone(),
            config.execution.clone(),
            settlement_contract,
            executor_account,
            usable_venues.clone(),
            config.profitability.min_margin_pct,
        )))
    } else {
        info!("👀 Observation mode, opportunities are logged but not executed");
        None
    };

    let telemetry = Arc::new(PerformanceTracker::new(AlertThresholds::default()));
    let engine = ArbEngine::new(
        venues,
        finder,
        calculator,
        risk,
        gas,
        orchestrator,
        telemetry,
        config.pairs.clone(),
        config.trade_size,
    );

    let (mut scheduler, shutdown) = ScanScheduler::new(std::time::Duration::from_secs(
        config.scan_interval_secs,
    ));
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("\n📛 Received shutdown signal (Ctrl+C)...");
        shutdown.shutdown();
    });

    info!("\n🚀 Starting scan loop...\n");
    let mut cycles: u64 = 0;

    loop {
        match scheduler.tick().await {
            Tick::Scan => {
                cycles += 1;
                let report = engine.scan_cycle().await;
                if report.opportunities > 0 {
                    info!(
                        "Cycle {}: {} pairs, {} opportunities, {} viable, {} executed",
                        cycles,
                        report.pairs_scanned,
                        report.opportunities,
                        report.viable,
                        report.executed
                    );
                }
                for (opportunity_id, reason) in &report.rejections {
                    info!(opportunity_id = %opportunity_id, reason = %reason, "Candidate stopped");
                }

                if cycles % STATS_EVERY_CYCLES == 0 {
                    let health = engine.health().await;
                    info!(
                        "🏥 Health: breaker={}, consecutive_failures={}, daily_loss=${:.2}",
                        if health.breaker_open { "OPEN" } else { "CLOSED" },
                        health.consecutive_failures,
                        health.daily_loss_usd
                    );

                    let cache = engine.cache_stats().await;
                    let snapshot = engine.telemetry().snapshot(cache).await;
                    utils::print_session_stats(&snapshot);

                    let alerts = engine.telemetry().check_alerts(cache).await;
                    if !alerts.is_empty() {
                        error!("{} alert(s) active, see log for details", alerts.len());
                    }
                }
            }
            Tick::Shutdown => {
                info!("Shutdown signal received, exiting scan loop...");
                break;
            }
        }
    }

    let cache = engine.cache_stats().await;
    let snapshot = engine.telemetry().snapshot(cache).await;
    info!("\n🛑 Shutting down gracefully...");
    utils::print_session_stats(&snapshot);

    Ok(())
}
