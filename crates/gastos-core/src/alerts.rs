//! Alert management
//!
//! Converts budget deviations and spending patterns into prioritized,
//! deduplicated alerts. Rules run in a fixed order and each emits at most
//! one alert per category per pass. Alerts are keyed by
//! `(type, category)`: re-detecting an ongoing condition refreshes the
//! existing unacknowledged alert in place, so the active list never grows
//! unbounded from repeated detections.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::AlertConfig;
use crate::models::{
    Alert, AlertKey, AlertSeverity, AlertType, BudgetPlan, PatternKind, Severity,
    SpendingPattern, Transaction, TransactionKind,
};

/// Key used for the cross-category rapid-spending alert
const RAPID_SPENDING_SCOPE: &str = "all";

/// Result of one evaluation pass, split so the scheduler can notify only
/// on newly created keys
#[derive(Debug, Default, Clone)]
pub struct AlertEvaluation {
    pub created: Vec<Alert>,
    pub refreshed: Vec<Alert>,
}

/// Candidate produced by a rule before deduplication
struct Candidate {
    category: String,
    alert_type: AlertType,
    severity: AlertSeverity,
    message: String,
    suggestion: Option<String>,
}

/// Stateful alert manager; owns the active set and the id counter
pub struct AlertManager {
    config: AlertConfig,
    /// Multiple of a budget target past which overspending is high severity
    high_multiple: f64,
    active: HashMap<AlertKey, Alert>,
    next_id: u64,
}

impl AlertManager {
    pub fn new(config: AlertConfig, high_multiple: f64) -> Self {
        Self {
            config,
            high_multiple,
            active: HashMap::new(),
            next_id: 1,
        }
    }

    /// Full evaluation: overspending, then high-severity patterns, then
    /// rapid spending. Alerts are never created from data older than the
    /// current analysis window because both inputs are rebuilt each pass.
    pub fn evaluate(
        &mut self,
        patterns: &[SpendingPattern],
        plan: &BudgetPlan,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> AlertEvaluation {
        let mut candidates = Vec::new();

        // Rule 1: over-target budget categories
        for over in &plan.over_target {
            let severity = if over.actual as f64 > over.target as f64 * self.high_multiple {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };
            candidates.push(Candidate {
                category: over.category.clone(),
                alert_type: AlertType::Overspending,
                severity,
                message: format!(
                    "{} spending is ₱{:.2} against a ₱{:.2} target",
                    over.category,
                    over.actual as f64 / 100.0,
                    over.target as f64 / 100.0,
                ),
                suggestion: Some(over.suggestion.clone()),
            });
        }

        // Rule 2: high-severity spikes and outliers
        for pattern in patterns {
            if pattern.severity != Severity::High {
                continue;
            }
            if !matches!(pattern.kind, PatternKind::Spike | PatternKind::Outlier) {
                continue;
            }
            candidates.push(Candidate {
                category: pattern.category.clone(),
                alert_type: AlertType::Pattern,
                severity: AlertSeverity::from(pattern.severity),
                message: format!(
                    "{} {} detected: {:+.0}% vs baseline",
                    pattern.category,
                    pattern.kind,
                    pattern.percent_change * 100.0,
                ),
                suggestion: None,
            });
        }

        // Rule 3: rapid-succession spending
        if let Some(candidate) = self.rapid_spending_candidate(transactions, now) {
            candidates.push(candidate);
        }

        self.upsert_all(candidates, now)
    }

    /// Fast-path evaluation: only the rapid-spending rule, so it can run on
    /// a tighter cadence than the full pipeline
    pub fn evaluate_fast_path(
        &mut self,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> AlertEvaluation {
        let candidates = self
            .rapid_spending_candidate(transactions, now)
            .into_iter()
            .collect();
        self.upsert_all(candidates, now)
    }

    fn rapid_spending_candidate(
        &self,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Option<Candidate> {
        let window_start = now - Duration::minutes(self.config.rapid_spending_window_mins);

        let recent: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| {
                t.kind == TransactionKind::Expense
                    && t.timestamp > window_start
                    && t.timestamp <= now
            })
            .collect();

        let total: i64 = recent.iter().map(|t| t.magnitude()).sum();
        if recent.len() < self.config.rapid_spending_count
            || total < self.config.rapid_spending_amount
        {
            return None;
        }

        Some(Candidate {
            category: RAPID_SPENDING_SCOPE.to_string(),
            alert_type: AlertType::RapidSpending,
            severity: AlertSeverity::Critical,
            message: format!(
                "{} expenses totaling ₱{:.2} in the last {} minutes",
                recent.len(),
                total as f64 / 100.0,
                self.config.rapid_spending_window_mins,
            ),
            suggestion: Some("Pause and review these charges before spending more".into()),
        })
    }

    fn upsert_all(&mut self, candidates: Vec<Candidate>, now: DateTime<Utc>) -> AlertEvaluation {
        let mut evaluation = AlertEvaluation::default();

        for candidate in candidates {
            let key: AlertKey = (candidate.alert_type, candidate.category.clone());

            if let Some(existing) = self.active.get_mut(&key) {
                // Refresh in place: same id and created_at, fresh content
                existing.severity = candidate.severity;
                existing.message = candidate.message;
                existing.suggestion = candidate.suggestion;
                evaluation.refreshed.push(existing.clone());
                continue;
            }

            let alert = Alert {
                id: self.next_id,
                category: candidate.category,
                alert_type: candidate.alert_type,
                severity: candidate.severity,
                message: candidate.message,
                suggestion: candidate.suggestion,
                created_at: now,
                acknowledged: false,
            };
            self.next_id += 1;
            self.active.insert(key, alert.clone());
            evaluation.created.push(alert);
        }

        debug!(
            created = evaluation.created.len(),
            refreshed = evaluation.refreshed.len(),
            active = self.active.len(),
            "alert evaluation complete"
        );
        evaluation
    }

    /// Acknowledge by id, retiring the key. A later detection of the same
    /// condition creates a fresh alert rather than silently refreshing one
    /// the user already dismissed.
    pub fn acknowledge(&mut self, id: u64) -> bool {
        let key = self
            .active
            .iter()
            .find(|(_, a)| a.id == id)
            .map(|(k, _)| k.clone());
        match key {
            Some(key) => {
                self.active.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Current active set, most urgent first
    pub fn active_alerts(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self.active.values().cloned().collect();
        alerts.sort_by(|a, b| {
            b.severity
                .priority()
                .cmp(&a.severity.priority())
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OverTarget;
    use std::collections::BTreeMap;

    fn expense_at(id: &str, ts: &str, amount_minor: i64) -> Transaction {
        Transaction {
            id: id.into(),
            timestamp: ts.parse().unwrap(),
            amount: -amount_minor,
            raw_description: "TEST".into(),
            kind: TransactionKind::Expense,
            category: Some("Shopping".into()),
            subcategory: None,
            category_confidence: Some(0.75),
        }
    }

    fn empty_plan() -> BudgetPlan {
        BudgetPlan {
            monthly_income: 0,
            allocations: BTreeMap::new(),
            per_category_targets: BTreeMap::new(),
            over_target: Vec::new(),
            generated_at: now(),
        }
    }

    fn plan_with_over_target(category: &str, actual: i64, target: i64) -> BudgetPlan {
        BudgetPlan {
            over_target: vec![OverTarget {
                category: category.into(),
                actual,
                target,
                suggestion: "trim it".into(),
            }],
            ..empty_plan()
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-08-20T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_overspending_medium_below_high_multiple() {
        // Food ₱12,000 against a ₱9,000 target: 1.33x, below the 1.5x bar
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let plan = plan_with_over_target("Food", 1_200_000, 900_000);

        let evaluation = manager.evaluate(&[], &plan, &[], now());
        assert_eq!(evaluation.created.len(), 1);
        let alert = &evaluation.created[0];
        assert_eq!(alert.alert_type, AlertType::Overspending);
        assert_eq!(alert.category, "Food");
        assert_eq!(alert.severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_overspending_high_above_multiple() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let plan = plan_with_over_target("Food", 1_500_000, 900_000);

        let evaluation = manager.evaluate(&[], &plan, &[], now());
        assert_eq!(evaluation.created[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_high_pattern_becomes_alert() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let patterns = vec![SpendingPattern {
            category: "Transport".into(),
            kind: PatternKind::Spike,
            severity: Severity::High,
            current_amount: 500_000,
            previous_amount: 200_000,
            percent_change: 1.5,
            detected_at: now(),
        }];

        let evaluation = manager.evaluate(&patterns, &empty_plan(), &[], now());
        assert_eq!(evaluation.created.len(), 1);
        assert_eq!(evaluation.created[0].alert_type, AlertType::Pattern);
        assert_eq!(evaluation.created[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_medium_pattern_not_alerted() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let patterns = vec![SpendingPattern {
            category: "Food".into(),
            kind: PatternKind::Spike,
            severity: Severity::Medium,
            current_amount: 180_000,
            previous_amount: 100_000,
            percent_change: 0.8,
            detected_at: now(),
        }];

        let evaluation = manager.evaluate(&patterns, &empty_plan(), &[], now());
        assert!(evaluation.created.is_empty());
    }

    #[test]
    fn test_rapid_spending_fires_once_per_window() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        // Three expenses totaling ₱6,000 within ten minutes
        let mut transactions = vec![
            expense_at("a", "2026-08-20T11:50:00Z", 200_000),
            expense_at("b", "2026-08-20T11:55:00Z", 200_000),
            expense_at("c", "2026-08-20T11:58:00Z", 200_000),
        ];

        let first = manager.evaluate_fast_path(&transactions, now());
        assert_eq!(first.created.len(), 1);
        assert_eq!(first.created[0].severity, AlertSeverity::Critical);

        // A fourth transaction in the same window refreshes, never duplicates
        transactions.push(expense_at("d", "2026-08-20T11:59:00Z", 100_000));
        let second = manager.evaluate_fast_path(&transactions, now());
        assert!(second.created.is_empty());
        assert_eq!(second.refreshed.len(), 1);
        assert_eq!(manager.active_alerts().len(), 1);
    }

    #[test]
    fn test_rapid_spending_below_threshold_silent() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let transactions = vec![
            expense_at("a", "2026-08-20T11:50:00Z", 100_000),
            expense_at("b", "2026-08-20T11:55:00Z", 100_000),
            expense_at("c", "2026-08-20T11:58:00Z", 100_000),
        ];
        // ₱3,000 total: count met, amount not
        let evaluation = manager.evaluate_fast_path(&transactions, now());
        assert!(evaluation.created.is_empty());
    }

    #[test]
    fn test_old_transactions_outside_window_ignored() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let transactions = vec![
            expense_at("a", "2026-08-20T09:00:00Z", 300_000),
            expense_at("b", "2026-08-20T09:10:00Z", 300_000),
            expense_at("c", "2026-08-20T09:20:00Z", 300_000),
        ];
        let evaluation = manager.evaluate_fast_path(&transactions, now());
        assert!(evaluation.created.is_empty());
    }

    #[test]
    fn test_idempotent_under_no_new_data() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let plan = plan_with_over_target("Food", 1_200_000, 900_000);

        let first = manager.evaluate(&[], &plan, &[], now());
        let keys_before: Vec<_> = manager.active_alerts().iter().map(|a| a.key()).collect();

        let second = manager.evaluate(&[], &plan, &[], now());
        let keys_after: Vec<_> = manager.active_alerts().iter().map(|a| a.key()).collect();

        assert_eq!(first.created.len(), 1);
        assert!(second.created.is_empty());
        assert_eq!(second.refreshed.len(), 1);
        assert_eq!(keys_before, keys_after);
    }

    #[test]
    fn test_acknowledged_alert_retires_then_recreates() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let plan = plan_with_over_target("Food", 1_200_000, 900_000);

        let first = manager.evaluate(&[], &plan, &[], now());
        let id = first.created[0].id;
        assert!(manager.acknowledge(id));
        assert!(manager.active_alerts().is_empty());

        // The condition persists, so the next pass raises a fresh alert
        let second = manager.evaluate(&[], &plan, &[], now());
        assert_eq!(second.created.len(), 1);
        assert_ne!(second.created[0].id, id);
    }

    #[test]
    fn test_active_alerts_sorted_by_severity() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let plan = plan_with_over_target("Food", 1_200_000, 900_000);
        let transactions = vec![
            expense_at("a", "2026-08-20T11:50:00Z", 300_000),
            expense_at("b", "2026-08-20T11:55:00Z", 300_000),
            expense_at("c", "2026-08-20T11:58:00Z", 300_000),
        ];

        manager.evaluate(&[], &plan, &transactions, now());
        let alerts = manager.active_alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[1].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_active_alerts_order_stable_across_calls() {
        // Two Medium overspending alerts created in the same pass share a
        // severity and timestamp; the id breaks the tie.
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        let plan = BudgetPlan {
            over_target: vec![
                OverTarget {
                    category: "Food".into(),
                    actual: 1_200_000,
                    target: 900_000,
                    suggestion: "trim it".into(),
                },
                OverTarget {
                    category: "Transport".into(),
                    actual: 600_000,
                    target: 500_000,
                    suggestion: "trim it".into(),
                },
            ],
            ..empty_plan()
        };
        manager.evaluate(&[], &plan, &[], now());

        let first: Vec<u64> = manager.active_alerts().iter().map(|a| a.id).collect();
        assert_eq!(first.len(), 2);
        for _ in 0..10 {
            let again: Vec<u64> = manager.active_alerts().iter().map(|a| a.id).collect();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_acknowledge_unknown_id() {
        let mut manager = AlertManager::new(AlertConfig::default(), 1.5);
        assert!(!manager.acknowledge(42));
    }
}
