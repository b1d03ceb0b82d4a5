//! Analysis engine
//!
//! Composes the full pipeline over pluggable collaborators: pull
//! transactions, categorize, detect patterns, build the budget plan,
//! evaluate alerts, notify. Each full pass recomputes everything from the
//! current analysis window; nothing incremental is carried between passes
//! except the alert manager's active set and the intervention log.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Months, Utc};
use tracing::{info, warn};

use crate::ai::{AiClient, AiGateway};
use crate::alerts::{AlertEvaluation, AlertManager};
use crate::budget::BudgetPlanner;
use crate::categories::CategoryCatalog;
use crate::categorize::{CategorizationSummary, Categorizer};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{Alert, AlertSeverity, BudgetPlan, Intervention, SpendingPattern};
use crate::patterns::PatternDetector;
use crate::store::{AnnotationSink, NotificationSink, TransactionSource};

/// Outcome of one full analysis pass
#[derive(Debug, Clone)]
pub struct PassReport {
    pub transactions: usize,
    pub categorization: CategorizationSummary,
    pub patterns: Vec<SpendingPattern>,
    pub plan: BudgetPlan,
    pub alerts_created: usize,
    pub alerts_refreshed: usize,
    pub completed_at: DateTime<Utc>,
}

/// The analysis engine for one user's transaction stream
///
/// Alert state and the intervention log live behind mutexes so the
/// scheduler can drive full passes and the fast path from separate tasks
/// over a shared `Arc<AnalysisEngine>`.
pub struct AnalysisEngine {
    config: EngineConfig,
    user_id: String,
    source: Arc<dyn TransactionSource>,
    annotations: Arc<dyn AnnotationSink>,
    notifier: Arc<dyn NotificationSink>,
    categorizer: Categorizer,
    detector: PatternDetector,
    planner: BudgetPlanner,
    alerts: Mutex<AlertManager>,
    interventions: Mutex<Vec<Intervention>>,
    next_intervention_id: Mutex<u64>,
}

impl AnalysisEngine {
    /// Build an engine from config; when inference is enabled the gateway
    /// client comes from the `GASTOS_AI_*` environment variables if set,
    /// otherwise from the config endpoint
    pub fn new(
        config: EngineConfig,
        user_id: impl Into<String>,
        source: Arc<dyn TransactionSource>,
        annotations: Arc<dyn AnnotationSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let gateway = if config.inference.enabled {
            let client = AiClient::from_env().unwrap_or_else(|| {
                AiClient::http(&config.inference.endpoint, &config.inference.model)
            });
            Some(AiGateway::new(client, config.inference.clone()))
        } else {
            None
        };
        Self::with_gateway(config, user_id, source, annotations, notifier, gateway)
    }

    /// Build an engine with an explicit gateway (or none for rule-only)
    pub fn with_gateway(
        config: EngineConfig,
        user_id: impl Into<String>,
        source: Arc<dyn TransactionSource>,
        annotations: Arc<dyn AnnotationSink>,
        notifier: Arc<dyn NotificationSink>,
        gateway: Option<AiGateway>,
    ) -> Self {
        let catalog = Arc::new(CategoryCatalog::builtin());

        let categorizer = match gateway.clone() {
            Some(g) => Categorizer::with_gateway(
                Arc::clone(&catalog),
                config.categorizer.clone(),
                g,
            ),
            None => Categorizer::new(Arc::clone(&catalog), config.categorizer.clone()),
        };
        let planner = match gateway {
            Some(g) => {
                BudgetPlanner::with_gateway(Arc::clone(&catalog), config.budget.clone(), g)
            }
            None => BudgetPlanner::new(Arc::clone(&catalog), config.budget.clone()),
        };

        Self {
            detector: PatternDetector::new(config.patterns.clone()),
            alerts: Mutex::new(AlertManager::new(
                config.alerts.clone(),
                config.budget.high_multiple,
            )),
            interventions: Mutex::new(Vec::new()),
            next_intervention_id: Mutex::new(1),
            user_id: user_id.into(),
            source,
            annotations,
            notifier,
            categorizer,
            planner,
            config,
        }
    }

    /// Start of the analysis window for a pass at `now`
    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.config.analysis_window_months.0))
            .unwrap_or(now)
    }

    /// Run one full analysis pass for the moment `now`
    ///
    /// Stages run in order; a categorization sink failure degrades (logged,
    /// skipped) while a source failure aborts the pass.
    pub async fn full_pass(&self, now: DateTime<Utc>) -> Result<PassReport> {
        let since = self.window_start(now);
        let transactions = self.source.list_transactions(&self.user_id, since)?;

        // Stage 1: categorize anything the store hasn't labeled yet
        let pending: Vec<_> = transactions
            .iter()
            .filter(|t| t.category.is_none())
            .cloned()
            .collect();
        let (_, categorization) = self
            .categorizer
            .categorize(&pending, self.annotations.as_ref())
            .await;

        // Re-read so downstream stages see the fresh annotations
        let transactions = self.source.list_transactions(&self.user_id, since)?;

        // Stages 2 and 3 are independent of each other
        let patterns = self.detector.detect(&transactions, now);
        let plan = self.planner.plan(&transactions, now).await;

        // Stage 4: alerts over everything the pass produced
        let evaluation = {
            let mut alerts = self.alerts.lock().unwrap();
            alerts.evaluate(&patterns, &plan, &transactions, now)
        };
        self.notify(&evaluation);
        self.escalate_critical(&evaluation, now);

        info!(
            transactions = transactions.len(),
            patterns = patterns.len(),
            alerts_created = evaluation.created.len(),
            alerts_refreshed = evaluation.refreshed.len(),
            "full analysis pass complete"
        );

        Ok(PassReport {
            transactions: transactions.len(),
            categorization,
            patterns,
            plan,
            alerts_created: evaluation.created.len(),
            alerts_refreshed: evaluation.refreshed.len(),
            completed_at: now,
        })
    }

    /// Run the rapid-spending fast path for the moment `now`
    ///
    /// Cheap enough for a tight cadence: one source read over the trailing
    /// window and a single alert rule, no categorization or inference.
    pub async fn fast_pass(&self, now: DateTime<Utc>) -> Result<AlertEvaluation> {
        let since = now - chrono::Duration::minutes(self.config.alerts.rapid_spending_window_mins);
        let transactions = self.source.list_transactions(&self.user_id, since)?;

        let evaluation = {
            let mut alerts = self.alerts.lock().unwrap();
            alerts.evaluate_fast_path(&transactions, now)
        };
        self.notify(&evaluation);
        self.escalate_critical(&evaluation, now);
        Ok(evaluation)
    }

    fn notify(&self, evaluation: &AlertEvaluation) {
        for alert in &evaluation.created {
            self.notifier.alert_created(alert);
        }
        for alert in &evaluation.refreshed {
            self.notifier.alert_refreshed(alert);
        }
    }

    /// Newly created critical alerts trigger an autonomous intervention,
    /// recorded append-only and pushed to the notification sink. Refreshed
    /// alerts never re-trigger; one intervention per alert occurrence.
    fn escalate_critical(&self, evaluation: &AlertEvaluation, now: DateTime<Utc>) {
        for alert in &evaluation.created {
            if alert.severity != AlertSeverity::Critical {
                continue;
            }

            let intervention = {
                let mut next_id = self.next_intervention_id.lock().unwrap();
                let id = *next_id;
                *next_id += 1;
                Intervention {
                    id,
                    triggering_pattern: alert.message.clone(),
                    action: "Pushed an immediate spending warning".into(),
                    reasoning: format!(
                        "{} alert reached critical severity",
                        alert.alert_type
                    ),
                    expected_impact: "Interrupt the spending burst before it grows".into(),
                    executed_at: now,
                }
            };

            warn!(
                alert_id = alert.id,
                intervention_id = intervention.id,
                "critical alert escalated to intervention"
            );
            self.interventions.lock().unwrap().push(intervention.clone());
            self.notifier.intervention_executed(&intervention);
        }
    }

    /// Current active alerts, most urgent first
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().active_alerts()
    }

    /// Acknowledge an alert by id, retiring its dedup key
    pub fn acknowledge_alert(&self, id: u64) -> bool {
        self.alerts.lock().unwrap().acknowledge(id)
    }

    /// Full intervention audit log, oldest first
    pub fn interventions(&self) -> Vec<Intervention> {
        self.interventions.lock().unwrap().clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Transaction, TransactionKind};
    use crate::store::{MemoryStore, RecordingNotifier};

    fn tx(id: &str, ts: &str, amount: i64, description: &str) -> Transaction {
        Transaction {
            id: id.into(),
            timestamp: ts.parse().unwrap(),
            amount,
            raw_description: description.into(),
            kind: if amount >= 0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            },
            category: None,
            subcategory: None,
            category_confidence: None,
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-08-20T12:00:00Z".parse().unwrap()
    }

    fn engine_over(store: &MemoryStore, notifier: &RecordingNotifier) -> AnalysisEngine {
        AnalysisEngine::with_gateway(
            EngineConfig::default(),
            "u1",
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(notifier.clone()),
            None, // rule-only
        )
    }

    #[tokio::test]
    async fn test_full_pass_on_empty_store() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let engine = engine_over(&store, &notifier);

        let report = engine.full_pass(now()).await.unwrap();
        assert_eq!(report.transactions, 0);
        assert_eq!(report.alerts_created, 0);
        assert!(report.patterns.is_empty());
    }

    #[tokio::test]
    async fn test_full_pass_categorizes_and_alerts() {
        // Income ₱30,000; Food spend ₱12,000 against a ₱6,000 target
        let store = MemoryStore::with_transactions(vec![
            tx("i1", "2026-08-01T09:00:00Z", 3_000_000, "PAYROLL AUG"),
            tx("e1", "2026-08-05T12:00:00Z", -600_000, "JOLLIBEE KATIPUNAN"),
            tx("e2", "2026-08-12T12:00:00Z", -600_000, "GRABFOOD ORDER"),
        ]);
        let notifier = RecordingNotifier::new();
        let engine = engine_over(&store, &notifier);

        let report = engine.full_pass(now()).await.unwrap();

        // Annotations reached the store
        assert_eq!(
            store.transaction("e1").unwrap().category.as_deref(),
            Some("Food")
        );
        assert!(report.categorization.processed >= 2);

        // Overspending alert for Food, delivered through the sink
        assert_eq!(report.alerts_created, 1);
        assert_eq!(notifier.created_count(), 1);
        let alerts = engine.active_alerts();
        assert_eq!(alerts[0].category, "Food");
    }

    #[tokio::test]
    async fn test_repeat_pass_refreshes_not_duplicates() {
        let store = MemoryStore::with_transactions(vec![
            tx("i1", "2026-08-01T09:00:00Z", 3_000_000, "PAYROLL AUG"),
            tx("e1", "2026-08-05T12:00:00Z", -1_200_000, "JOLLIBEE KATIPUNAN"),
        ]);
        let notifier = RecordingNotifier::new();
        let engine = engine_over(&store, &notifier);

        let first = engine.full_pass(now()).await.unwrap();
        let second = engine.full_pass(now()).await.unwrap();

        assert_eq!(first.alerts_created, 1);
        assert_eq!(second.alerts_created, 0);
        assert_eq!(second.alerts_refreshed, 1);
        assert_eq!(engine.active_alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_fast_pass_escalates_to_intervention() {
        // Rapid burst: three expenses totaling ₱6,000 inside the hour
        let store = MemoryStore::with_transactions(vec![
            tx("e1", "2026-08-20T11:40:00Z", -200_000, "SHOP A"),
            tx("e2", "2026-08-20T11:45:00Z", -200_000, "SHOP B"),
            tx("e3", "2026-08-20T11:50:00Z", -200_000, "SHOP C"),
        ]);
        let notifier = RecordingNotifier::new();
        let engine = engine_over(&store, &notifier);

        let evaluation = engine.fast_pass(now()).await.unwrap();
        assert_eq!(evaluation.created.len(), 1);
        assert_eq!(evaluation.created[0].severity, AlertSeverity::Critical);

        // One intervention, recorded and notified
        assert_eq!(engine.interventions().len(), 1);
        assert_eq!(notifier.intervention_count(), 1);

        // A second fast pass refreshes the alert without re-escalating
        let again = engine.fast_pass(now()).await.unwrap();
        assert!(again.created.is_empty());
        assert_eq!(engine.interventions().len(), 1);
        assert_eq!(notifier.intervention_count(), 1);
    }

    #[tokio::test]
    async fn test_acknowledge_retires_alert() {
        let store = MemoryStore::with_transactions(vec![
            tx("i1", "2026-08-01T09:00:00Z", 3_000_000, "PAYROLL AUG"),
            tx("e1", "2026-08-05T12:00:00Z", -1_200_000, "JOLLIBEE KATIPUNAN"),
        ]);
        let notifier = RecordingNotifier::new();
        let engine = engine_over(&store, &notifier);

        engine.full_pass(now()).await.unwrap();
        let id = engine.active_alerts()[0].id;
        assert!(engine.acknowledge_alert(id));
        assert!(engine.active_alerts().is_empty());
    }
}
