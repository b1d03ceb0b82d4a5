//! Background analysis scheduler
//!
//! Two independent tokio tasks over one shared engine:
//!
//! - a full analysis pass at a slow cadence (default every 5 minutes)
//! - the rapid-spending fast path at a tight cadence (default every 60s)
//!
//! Each task is single-flight: the pass is awaited inside the tick loop
//! and missed ticks are skipped rather than queued, so a slow inference
//! call can never pile up overlapping passes. A failed pass is logged and
//! the cadence continues.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::engine::AnalysisEngine;

/// Handle to the running scheduler tasks
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    full_handle: JoinHandle<()>,
    fast_handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn both cadence tasks over a shared engine
    ///
    /// The first full pass runs on the first tick (immediately), so a fresh
    /// start produces alerts without waiting a full interval.
    pub fn start(engine: Arc<AnalysisEngine>) -> Self {
        let config = engine.config().scheduler.clone();
        info!(
            full_pass_secs = config.full_pass_interval_secs,
            fast_path_secs = config.fast_path_interval_secs,
            "starting analysis scheduler"
        );

        let (shutdown, rx) = watch::channel(false);

        let full_handle = {
            let engine = Arc::clone(&engine);
            let mut rx = rx.clone();
            tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(config.full_pass_interval_secs));
                // The pass is awaited inline, so a run that outlasts its
                // interval simply skips the ticks it missed.
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = engine.full_pass(Utc::now()).await {
                                error!(error = %e, "full analysis pass failed");
                            }
                        }
                        _ = rx.changed() => break,
                    }
                }
            })
        };

        let fast_handle = {
            let mut rx = rx.clone();
            tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(config.fast_path_interval_secs));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // Let the full pass own the initial tick; the fast path
                // waits one interval before its first run.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = engine.fast_pass(Utc::now()).await {
                                error!(error = %e, "fast path pass failed");
                            }
                        }
                        _ = rx.changed() => break,
                    }
                }
            })
        };

        Self {
            shutdown,
            full_handle,
            fast_handle,
        }
    }

    /// Signal shutdown and wait for both tasks to finish their current work
    pub async fn stop(self) {
        // Receivers only ever observe the flip to true
        let _ = self.shutdown.send(true);
        let _ = self.full_handle.await;
        let _ = self.fast_handle.await;
        info!("analysis scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, SchedulerConfig};
    use crate::models::{Transaction, TransactionKind};
    use crate::store::{MemoryStore, RecordingNotifier};

    fn engine_with(
        store: MemoryStore,
        notifier: RecordingNotifier,
        config: EngineConfig,
    ) -> Arc<AnalysisEngine> {
        Arc::new(AnalysisEngine::with_gateway(
            config,
            "u1",
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(notifier),
            None,
        ))
    }

    fn recent_expense(id: &str, minutes_ago: i64, amount_minor: i64) -> Transaction {
        Transaction {
            id: id.into(),
            timestamp: Utc::now() - chrono::Duration::minutes(minutes_ago),
            amount: -amount_minor,
            raw_description: "SHOP".into(),
            kind: TransactionKind::Expense,
            category: None,
            subcategory: None,
            category_confidence: None,
        }
    }

    #[tokio::test]
    async fn test_start_stop_is_clean() {
        let engine = engine_with(
            MemoryStore::new(),
            RecordingNotifier::new(),
            EngineConfig::default(),
        );
        let scheduler = Scheduler::start(engine);
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_initial_full_pass_runs() {
        let store = MemoryStore::with_transactions(vec![
            recent_expense("a", 5, 200_000),
            recent_expense("b", 10, 200_000),
            recent_expense("c", 15, 200_000),
        ]);
        let notifier = RecordingNotifier::new();
        let engine = engine_with(store, notifier.clone(), EngineConfig::default());

        let scheduler = Scheduler::start(engine);
        // The full pass fires on its immediate first tick; its rapid
        // spending rule sees the burst without waiting for the fast path.
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.stop().await;

        assert_eq!(notifier.created_count(), 1);
        assert_eq!(notifier.intervention_count(), 1);
    }

    #[tokio::test]
    async fn test_fast_path_fires_on_its_cadence() {
        let store = MemoryStore::with_transactions(vec![
            recent_expense("a", 5, 200_000),
            recent_expense("b", 10, 200_000),
            recent_expense("c", 15, 200_000),
        ]);
        let notifier = RecordingNotifier::new();
        let config = EngineConfig {
            scheduler: SchedulerConfig {
                // Full pass effectively never fires after its initial tick
                full_pass_interval_secs: 3600,
                fast_path_interval_secs: 1,
            },
            ..EngineConfig::default()
        };
        let engine = engine_with(store, notifier.clone(), config);

        let scheduler = Scheduler::start(engine);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        scheduler.stop().await;

        // Initial full pass creates the alert; the fast path tick refreshes
        // the same key instead of duplicating it.
        assert_eq!(notifier.created_count(), 1);
        assert_eq!(notifier.intervention_count(), 1);
        assert!(!notifier.refreshed.lock().unwrap().is_empty());
    }
}
