//! Full-pass and categorization command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use gastos_core::{
    CategoryCatalog, Categorizer, CategorySource, EngineConfig, MemoryStore, PatternKind,
};

use super::{build_engine, build_gateway, load_transactions, peso, resolve_at, truncate};

/// Run one full analysis pass and print every stage's output
pub async fn cmd_analyze(config: EngineConfig, file: &Path, at: Option<&str>) -> Result<()> {
    let now = resolve_at(at)?;
    let (engine, _store) = build_engine(config, file)?;

    println!("🔎 Running full analysis pass...\n");
    let report = engine.full_pass(now).await?;

    println!("📊 Categorization");
    println!("  processed:   {}", report.categorization.processed);
    println!("  by rule:     {}", report.categorization.by_rule);
    println!("  by AI:       {}", report.categorization.by_ai);
    println!("  fallback:    {}", report.categorization.fallback);

    println!("\n📈 Patterns ({})", report.patterns.len());
    for pattern in &report.patterns {
        let arrow = match pattern.kind {
            PatternKind::Outlier => "⚠",
            _ => "↑",
        };
        println!(
            "  {} {} {}: {} → {} ({:+.0}%, {})",
            arrow,
            pattern.category,
            pattern.kind,
            peso(pattern.previous_amount),
            peso(pattern.current_amount),
            pattern.percent_change * 100.0,
            pattern.severity,
        );
    }

    println!("\n💰 Budget");
    println!("  monthly income: {}", peso(report.plan.monthly_income));
    for (bucket, allocation) in &report.plan.allocations {
        println!(
            "  {:<8} {:>12}  ({:.0}%)",
            bucket.to_string(),
            peso(allocation.amount),
            allocation.ratio * 100.0
        );
    }
    for over in &report.plan.over_target {
        println!(
            "  ⚠ {} over target: {} vs {}",
            over.category,
            peso(over.actual),
            peso(over.target)
        );
        println!("    💡 {}", over.suggestion);
    }

    println!("\n🚨 Alerts");
    let alerts = engine.active_alerts();
    if alerts.is_empty() {
        println!("  none");
    }
    for alert in &alerts {
        println!("  [{}] {} — {}", alert.severity, alert.alert_type, alert.message);
    }

    Ok(())
}

/// Categorize a CSV file and print the first `limit` labels
pub async fn cmd_categorize(config: EngineConfig, file: &Path, limit: usize) -> Result<()> {
    let transactions = load_transactions(file)?;
    let store = MemoryStore::with_transactions(transactions.clone());

    let catalog = Arc::new(CategoryCatalog::builtin());
    let categorizer = match build_gateway(&config) {
        Some(gateway) => Categorizer::with_gateway(catalog, config.categorizer, gateway),
        None => Categorizer::new(catalog, config.categorizer),
    };

    let (results, summary) = categorizer.categorize(&transactions, &store).await;

    println!(
        "📋 {} transactions ({} rule, {} AI, {} fallback)\n",
        summary.processed, summary.by_rule, summary.by_ai, summary.fallback
    );
    for (tx, label) in transactions.iter().zip(&results).take(limit) {
        let source = match label.source {
            CategorySource::Rule => "rule",
            CategorySource::Ai => "ai",
            CategorySource::Fallback => "other",
        };
        println!(
            "  {:<32} {:>12}  {} ({:.2}, {})",
            truncate(&tx.raw_description, 32),
            peso(tx.amount),
            label.category,
            label.confidence,
            source,
        );
    }
    if results.len() > limit {
        println!("  ... {} more", results.len() - limit);
    }

    Ok(())
}
