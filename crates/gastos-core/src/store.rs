//! External collaborator boundaries
//!
//! The engine does not own transactions, accounts, or notification delivery.
//! It reads from a `TransactionSource`, annotates through an
//! `AnnotationSink` (fire-and-forget, best-effort), and pushes alert and
//! intervention events to a `NotificationSink` that is agnostic to the
//! delivery mechanism.
//!
//! `MemoryStore` backs the CLI (after a CSV load) and tests with
//! copy-on-read semantics: readers get cloned snapshots, so a concurrent
//! annotation pass never invalidates a consumer's view.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Account, Alert, Intervention, Transaction};

/// Read-only, pull-based transaction source (the scheduler polls)
pub trait TransactionSource: Send + Sync {
    /// Transactions for a user at or after `since`
    fn list_transactions(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Transaction>>;

    fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>>;
}

/// Category annotation sink
///
/// A failure to persist one annotation must not abort the pass for other
/// transactions; call sites log and skip per item.
pub trait AnnotationSink: Send + Sync {
    fn save_categorization(
        &self,
        transaction_id: &str,
        category: &str,
        subcategory: Option<&str>,
        confidence: f64,
    ) -> Result<()>;
}

/// Receives alert and intervention events
pub trait NotificationSink: Send + Sync {
    fn alert_created(&self, alert: &Alert);
    fn alert_refreshed(&self, alert: &Alert);
    fn intervention_executed(&self, intervention: &Intervention);
}

/// In-memory store implementing both the source and the annotation sink
#[derive(Clone, Default)]
pub struct MemoryStore {
    transactions: Arc<RwLock<Vec<Transaction>>>,
    accounts: Arc<RwLock<Vec<Account>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        let store = Self::new();
        store.extend(transactions);
        store
    }

    pub fn extend(&self, transactions: Vec<Transaction>) {
        self.transactions.write().unwrap().extend(transactions);
    }

    pub fn add_account(&self, account: Account) {
        self.accounts.write().unwrap().push(account);
    }

    pub fn transaction(&self, id: &str) -> Option<Transaction> {
        self.transactions
            .read()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.transactions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().unwrap().is_empty()
    }
}

impl TransactionSource for MemoryStore {
    fn list_transactions(&self, _user_id: &str, since: DateTime<Utc>) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.timestamp >= since)
            .cloned()
            .collect())
    }

    fn list_accounts(&self, _user_id: &str) -> Result<Vec<Account>> {
        Ok(self.accounts.read().unwrap().clone())
    }
}

impl AnnotationSink for MemoryStore {
    fn save_categorization(
        &self,
        transaction_id: &str,
        category: &str,
        subcategory: Option<&str>,
        confidence: f64,
    ) -> Result<()> {
        let mut transactions = self.transactions.write().unwrap();
        let tx = transactions
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| Error::Store(format!("unknown transaction: {}", transaction_id)))?;

        // Annotation only narrows: category fields are set, nothing else
        // is touched, and the vector is never reordered.
        tx.category = Some(category.to_string());
        tx.subcategory = subcategory.map(|s| s.to_string());
        tx.category_confidence = Some(confidence);
        Ok(())
    }
}

/// Notification sink that writes structured log events
#[derive(Clone, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn alert_created(&self, alert: &Alert) {
        info!(
            alert_type = alert.alert_type.as_str(),
            category = %alert.category,
            severity = alert.severity.as_str(),
            message = %alert.message,
            "alert created"
        );
    }

    fn alert_refreshed(&self, alert: &Alert) {
        info!(
            alert_type = alert.alert_type.as_str(),
            category = %alert.category,
            "alert refreshed"
        );
    }

    fn intervention_executed(&self, intervention: &Intervention) {
        info!(
            action = %intervention.action,
            trigger = %intervention.triggering_pattern,
            "intervention executed"
        );
    }
}

/// Records every event for test assertions
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub created: Arc<Mutex<Vec<Alert>>>,
    pub refreshed: Arc<Mutex<Vec<Alert>>>,
    pub interventions: Arc<Mutex<Vec<Intervention>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn intervention_count(&self) -> usize {
        self.interventions.lock().unwrap().len()
    }
}

impl NotificationSink for RecordingNotifier {
    fn alert_created(&self, alert: &Alert) {
        self.created.lock().unwrap().push(alert.clone());
    }

    fn alert_refreshed(&self, alert: &Alert) {
        self.refreshed.lock().unwrap().push(alert.clone());
    }

    fn intervention_executed(&self, intervention: &Intervention) {
        self.interventions.lock().unwrap().push(intervention.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    fn tx(id: &str, ts: &str) -> Transaction {
        Transaction {
            id: id.into(),
            timestamp: ts.parse().unwrap(),
            amount: -5_000,
            raw_description: "TEST".into(),
            kind: TransactionKind::Expense,
            category: None,
            subcategory: None,
            category_confidence: None,
        }
    }

    #[test]
    fn test_since_filter() {
        let store = MemoryStore::with_transactions(vec![
            tx("a", "2026-07-01T00:00:00Z"),
            tx("b", "2026-08-15T00:00:00Z"),
        ]);
        let since: DateTime<Utc> = "2026-08-01T00:00:00Z".parse().unwrap();
        let txs = store.list_transactions("u1", since).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id, "b");
    }

    #[test]
    fn test_annotation_only_narrows() {
        let store = MemoryStore::with_transactions(vec![tx("a", "2026-08-01T00:00:00Z")]);
        store
            .save_categorization("a", "Food", Some("Dining"), 0.75)
            .unwrap();

        let updated = store.transaction("a").unwrap();
        assert_eq!(updated.category.as_deref(), Some("Food"));
        assert_eq!(updated.amount, -5_000);
        assert_eq!(updated.raw_description, "TEST");
    }

    #[test]
    fn test_accounts_listed() {
        let store = MemoryStore::new();
        store.add_account(Account {
            id: "acct-1".into(),
            name: "Payroll".into(),
            kind: crate::models::AccountKind::Checking,
        });
        let accounts = store.list_accounts("u1").unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Payroll");
    }

    #[test]
    fn test_annotation_unknown_id_errors() {
        let store = MemoryStore::new();
        assert!(store.save_categorization("nope", "Food", None, 0.6).is_err());
    }
}
