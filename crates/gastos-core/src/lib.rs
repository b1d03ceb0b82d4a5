//! Gastos Core Library
//!
//! Shared functionality for the Gastos transaction analysis engine:
//! - Domain models (transactions, patterns, budget plans, alerts)
//! - Hybrid rule/AI transaction categorization
//! - Statistical spending pattern detection
//! - Needs/wants/savings budget planning
//! - Deduplicated alert management with autonomous escalation
//! - Rate-limited, retrying inference gateway over pluggable backends
//! - Background scheduler driving full and fast analysis passes
//! - CSV import and in-memory store for CLI and test use

pub mod ai;
pub mod alerts;
pub mod budget;
pub mod categories;
pub mod categorize;
pub mod config;
pub mod engine;
pub mod error;
pub mod import;
pub mod models;
pub mod patterns;
pub mod scheduler;
pub mod store;

/// Test utilities including the mock inference server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AiClient, AiGateway, HttpBackend, InferenceBackend, MockBackend};
pub use alerts::{AlertEvaluation, AlertManager};
pub use budget::BudgetPlanner;
pub use categories::{CategoryCatalog, CategoryProfile};
pub use categorize::{Categorization, CategorizationSummary, Categorizer, CategorySource};
pub use config::EngineConfig;
pub use engine::{AnalysisEngine, PassReport};
pub use error::{Error, Result};
pub use models::{
    Account, AccountKind, Alert, AlertKey, AlertSeverity, AlertType, Bucket, BucketAllocation,
    BudgetPlan, Intervention, MonthlyAggregate, OverTarget, PatternKind, Severity,
    SpendingPattern, Transaction, TransactionKind,
};
pub use patterns::PatternDetector;
pub use scheduler::Scheduler;
pub use store::{
    AnnotationSink, LogNotifier, MemoryStore, NotificationSink, RecordingNotifier,
    TransactionSource,
};
