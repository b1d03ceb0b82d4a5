//! Budget command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use gastos_core::{
    BudgetPlan, BudgetPlanner, Categorizer, CategoryCatalog, EngineConfig, MemoryStore,
    TransactionSource,
};

use super::{build_gateway, load_transactions, peso};

/// Categorize the file's transactions and plan the month containing `now`
///
/// The planner aggregates by category, so the rule pass (and AI refinement
/// when enabled) has to run first; raw CSV rows carry no category and would
/// all land in the fallback bucket.
pub async fn build_plan(
    mut config: EngineConfig,
    file: &Path,
    income: Option<f64>,
    now: DateTime<Utc>,
) -> Result<BudgetPlan> {
    if let Some(pesos) = income {
        config.budget.declared_income = Some((pesos * 100.0).round() as i64);
    }

    let store = MemoryStore::with_transactions(load_transactions(file)?);
    let catalog = Arc::new(CategoryCatalog::builtin());
    let gateway = build_gateway(&config);

    let categorizer = match gateway.clone() {
        Some(gateway) => {
            Categorizer::with_gateway(catalog.clone(), config.categorizer.clone(), gateway)
        }
        None => Categorizer::new(catalog.clone(), config.categorizer.clone()),
    };
    let pending = store.list_transactions("local", DateTime::<Utc>::MIN_UTC)?;
    categorizer.categorize(&pending, &store).await;

    let planner = match gateway {
        Some(gateway) => BudgetPlanner::with_gateway(catalog, config.budget, gateway),
        None => BudgetPlanner::new(catalog, config.budget),
    };
    let annotated = store.list_transactions("local", DateTime::<Utc>::MIN_UTC)?;
    Ok(planner.plan(&annotated, now).await)
}

/// Print the recommended plan for the current month
pub async fn cmd_budget(config: EngineConfig, file: &Path, income: Option<f64>) -> Result<()> {
    let plan = build_plan(config, file, income, Utc::now()).await?;

    println!("💰 Monthly income: {}\n", peso(plan.monthly_income));
    println!("Buckets:");
    for (bucket, allocation) in &plan.allocations {
        println!(
            "  {:<8} {:>12}  ({:.0}%)  {}",
            bucket.to_string(),
            peso(allocation.amount),
            allocation.ratio * 100.0,
            allocation.categories.join(", "),
        );
    }

    println!("\nPer-category targets:");
    for (category, target) in &plan.per_category_targets {
        println!("  {:<14} {:>12}", category, peso(*target));
    }

    if plan.over_target.is_empty() {
        println!("\n✅ No categories over target");
    } else {
        println!("\n⚠ Over target:");
        for over in &plan.over_target {
            println!(
                "  {}: {} vs {} target",
                over.category,
                peso(over.actual),
                peso(over.target)
            );
            println!("    💡 {}", over.suggestion);
        }
    }

    Ok(())
}
