//! Budget planning
//!
//! Derives a recommended needs/wants/savings allocation and per-category
//! targets from observed (or declared) monthly income. The numeric plan is
//! fully deterministic; AI only ever contributes advisory suggestion text
//! for over-target categories, and a static tip list covers the fallback.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::ai::parsing::parse_tip;
use crate::ai::AiGateway;
use crate::categories::CategoryCatalog;
use crate::config::BudgetConfig;
use crate::models::{
    BucketAllocation, BudgetPlan, OverTarget, Transaction, TransactionKind,
};
use crate::patterns::monthly_aggregates;

/// Static fallback tips per category
fn static_tip(category: &str) -> String {
    match category {
        "Food" => "Plan meals for the week and cook in batches; delivery fees add up fast".into(),
        "Transport" => "Compare ride-hailing against transit for your regular routes".into(),
        "Utilities" => "Check for plan downgrades or promos on your telco and internet bills".into(),
        "Entertainment" => "Audit your streaming subscriptions for overlap".into(),
        "Shopping" => "Hold non-essential purchases for 48 hours before checking out".into(),
        "Healthcare" => "Ask for generic equivalents when refilling prescriptions".into(),
        _ => format!("Review your recent {} spending for items you can trim", category),
    }
}

/// Computes the recommended allocation each pass
pub struct BudgetPlanner {
    catalog: Arc<CategoryCatalog>,
    config: BudgetConfig,
    gateway: Option<AiGateway>,
}

impl BudgetPlanner {
    pub fn new(catalog: Arc<CategoryCatalog>, config: BudgetConfig) -> Self {
        Self {
            catalog,
            config,
            gateway: None,
        }
    }

    pub fn with_gateway(
        catalog: Arc<CategoryCatalog>,
        config: BudgetConfig,
        gateway: AiGateway,
    ) -> Self {
        Self {
            catalog,
            config,
            gateway: Some(gateway),
        }
    }

    /// Income for the month containing `now`: a declared value always takes
    /// precedence; otherwise income-kind transactions are summed
    pub fn monthly_income(&self, transactions: &[Transaction], now: DateTime<Utc>) -> i64 {
        if let Some(declared) = self.config.declared_income {
            return declared;
        }
        let current_ym = (now.year(), now.month());
        transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Income && t.year_month() == current_ym)
            .map(|t| t.magnitude())
            .sum()
    }

    /// Build the plan for the month containing `now`; recomputed in full
    /// every pass
    pub async fn plan(&self, transactions: &[Transaction], now: DateTime<Utc>) -> BudgetPlan {
        let income = self.monthly_income(transactions, now);
        let ratios = self.config.ratios.normalized();

        let mut allocations = BTreeMap::new();
        for (bucket, ratio) in [
            (crate::models::Bucket::Needs, ratios.needs),
            (crate::models::Bucket::Wants, ratios.wants),
            (crate::models::Bucket::Savings, ratios.savings),
        ] {
            allocations.insert(
                bucket,
                BucketAllocation {
                    amount: (income as f64 * ratio).round() as i64,
                    ratio,
                    categories: self.catalog.categories_in_bucket(bucket),
                },
            );
        }

        let mut per_category_targets = BTreeMap::new();
        for profile in self.catalog.profiles() {
            per_category_targets.insert(
                profile.name.clone(),
                (income as f64 * profile.budget_ratio).round() as i64,
            );
        }

        let current_ym = (now.year(), now.month());
        let actuals = monthly_aggregates(transactions, current_ym);

        let mut over_target = Vec::new();
        for aggregate in &actuals {
            let target = match per_category_targets.get(&aggregate.category) {
                Some(&t) if t > 0 => t,
                _ => continue,
            };
            // Tolerance band avoids alert noise from minor variance
            let limit = (target as f64 * (1.0 + self.config.tolerance)) as i64;
            if aggregate.total <= limit {
                continue;
            }

            let suggestion = self
                .suggestion(&aggregate.category, aggregate.total, target)
                .await;
            over_target.push(OverTarget {
                category: aggregate.category.clone(),
                actual: aggregate.total,
                target,
                suggestion,
            });
        }

        debug!(
            income,
            over_target = over_target.len(),
            "budget plan generated"
        );

        BudgetPlan {
            monthly_income: income,
            allocations,
            per_category_targets,
            over_target,
            generated_at: now,
        }
    }

    /// AI tip when inference succeeds, static tip otherwise. The numeric
    /// plan is already fixed by the time this runs; AI output is prose only.
    async fn suggestion(&self, category: &str, actual: i64, target: i64) -> String {
        if let Some(gateway) = &self.gateway {
            let prompt = format!(
                "A user budgeted {target:.2} for {category} this month but has spent {actual:.2}. \
                 Give one short, practical money-saving tip for this category. \
                 Respond with only a JSON object: {{\"tip\": \"...\"}}",
                target = target as f64 / 100.0,
                actual = actual as f64 / 100.0,
                category = category,
            );
            match gateway.generate(&prompt).await.and_then(|r| parse_tip(&r)) {
                Ok(tip) => return tip,
                Err(e) => {
                    debug!(category = %category, error = %e, "AI tip unavailable, using static tip");
                }
            }
        }
        static_tip(category)
    }
}
