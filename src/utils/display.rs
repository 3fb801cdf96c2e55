//! Display and printing utilities

use tracing::{error, info, warn};

use crate::types::{ExecutionResult, Opportunity, PerformanceSnapshot, ProfitabilityReport};

pub fn print_opportunity(opportunity: &Opportunity, report: &ProfitabilityReport) {
    warn!("\n🎯 ARBITRAGE OPPORTUNITY #{}", opportunity.id);
    warn!("📍 Pair: {}", opportunity.pair.label());
    warn!(
        "📋 Route: buy on {} @ {:.4}, sell on {} @ {:.4}",
        opportunity.buy_venue,
        opportunity.buy_quote.price,
        opportunity.sell_venue,
        opportunity.sell_quote.price
    );
    warn!("💰 Profit Analysis:");
    warn!("   Spread: {:.3}%", opportunity.spread_pct);
    warn!(
        "   Borrow: {:.4} {}",
        opportunity.borrow_amount,
        opportunity.pair.quote.symbol
    );
    warn!("   Gross Profit: ${:.2}", report.gross_profit_usd);
    warn!(
        "   Costs: fees ${:.2} + premium ${:.2} + gas ${:.2}",
        report.venue_fee_cost_usd, report.loan_premium_usd, report.gas_cost_usd
    );
    warn!("   Net Profit: ${:.2}", report.net_profit_usd);
    warn!("   Margin: {:.3}%", report.profit_margin_pct);
    warn!("   Break-even size: {:.2}", report.break_even_amount);
    warn!("   Risk Score: {}/100", report.risk_score);
}

pub fn print_execution_result(result: &ExecutionResult) {
    if result.success {
        warn!("\n✅ EXECUTION #{}", result.id);
        if let Some(tx_hash) = &result.tx_hash {
            warn!("   Tx Hash: {}", tx_hash);
        }
        if let Some(gas_used) = result.gas_used {
            warn!("   Gas Used: {}", gas_used);
        }
        if let Some(profit) = result.realized_profit_usd {
            warn!("   Profit: ${:.2}", profit);
        }
        warn!("   Latency: {}ms", result.latency_ms);
    } else {
        error!("\n❌ EXECUTION FAILED #{}", result.id);
        error!(
            "   Reason: {}",
            result
                .failure_reason
                .as_deref()
                .unwrap_or("unknown")
        );
    }
}

pub fn print_session_stats(snapshot: &PerformanceSnapshot) {
    let minutes = snapshot.uptime_secs / 60;

    info!("\n📊 Session Statistics ({} minutes)", minutes);
    info!("   📈 SCANNING:");
    info!("     Opportunities found: {}", snapshot.opportunities_found);
    info!(
        "     Opportunities/hour: {:.1}",
        snapshot.opportunities_per_hour
    );
    info!(
        "     Quote cache: {} hits / {} misses",
        snapshot.quote_cache_hits, snapshot.quote_cache_misses
    );

    info!("   🚀 EXECUTION:");
    info!("     Attempted: {}", snapshot.trades_attempted);
    info!("     Succeeded: {}", snapshot.trades_succeeded);
    info!("     Failed: {}", snapshot.trades_failed);
    info!("     Success rate: {:.1}%", snapshot.success_rate_pct);
    info!(
        "     Avg latency: {:.0}ms",
        snapshot.avg_execution_latency_ms
    );

    info!("   💰 ECONOMICS:");
    info!(
        "     Cumulative profit: ${:.2}",
        snapshot.cumulative_profit_usd
    );
    info!(
        "     Cumulative gas: ${:.2}",
        snapshot.cumulative_gas_cost_usd
    );
    info!("     Profit/hour: ${:.2}", snapshot.profit_per_hour_usd);
    info!("     Avg margin: {:.3}%", snapshot.avg_margin_pct);
    info!("");
}
