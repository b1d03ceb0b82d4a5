//! Domain models for Gastos
//!
//! Amounts are signed integers in minor currency units (centavos), so
//! ₱5,000.00 is stored as `500_000`. Expenses are negative, income positive;
//! aggregation code works with absolute values where noted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a transaction adds to or draws from the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single transaction from the external store
///
/// Owned by the transaction store; the engine only reads it and annotates
/// the category fields. A later categorization pass may overwrite
/// `category`/`subcategory`/`category_confidence`; everything else is
/// immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Signed amount in minor currency units (negative for expenses)
    pub amount: i64,
    pub raw_description: String,
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub category_confidence: Option<f64>,
}

impl Transaction {
    /// Absolute amount in minor units, for spend aggregation
    pub fn magnitude(&self) -> i64 {
        self.amount.abs()
    }

    /// Calendar month key (year, month) in UTC
    pub fn year_month(&self) -> (i32, u32) {
        use chrono::Datelike;
        (self.timestamp.year(), self.timestamp.month())
    }
}

/// Account kinds reported by the transaction store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Wallet,
}

/// An account from the external store (read-only collaborator data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
}

/// Per-category spend for one calendar month
///
/// Always recomputed from transactions, never persisted; treating it as
/// derived data avoids drift between the store and the analysis window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub category: String,
    pub year_month: (i32, u32),
    /// Total absolute spend in minor units
    pub total: i64,
    pub count: usize,
}

/// Kind of statistical deviation detected in a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Month-over-month total jumped past the spike threshold
    Spike,
    /// Sustained directional change (reserved; the detector currently
    /// classifies everything as spike or outlier)
    Trend,
    /// Single transaction far outside the category's recent distribution
    Outlier,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spike => "spike",
            Self::Trend => "trend",
            Self::Outlier => "outlier",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a detected spending pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A statistical deviation in a category's spending
///
/// Produced fresh each detector pass; the new list supersedes the previous
/// one rather than merging into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingPattern {
    pub category: String,
    pub kind: PatternKind,
    pub severity: Severity,
    /// Current window amount in minor units (for outliers, the flagged
    /// transaction's magnitude)
    pub current_amount: i64,
    /// Previous window amount in minor units (for outliers, the category
    /// mean rounded to minor units)
    pub previous_amount: i64,
    /// Fractional change, e.g. 1.5 for +150%
    pub percent_change: f64,
    pub detected_at: DateTime<Utc>,
}

/// The three budget groups categories roll up into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Needs,
    Wants,
    Savings,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Needs => "needs",
            Self::Wants => "wants",
            Self::Savings => "savings",
        }
    }

    pub fn all() -> [Bucket; 3] {
        [Bucket::Needs, Bucket::Wants, Bucket::Savings]
    }
}

impl std::str::FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "needs" => Ok(Self::Needs),
            "wants" => Ok(Self::Wants),
            "savings" => Ok(Self::Savings),
            _ => Err(format!("Unknown bucket: {}", s)),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One bucket's share of the recommended allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketAllocation {
    /// Allocated amount in minor units
    pub amount: i64,
    /// Fraction of income, renormalized so bucket ratios sum to 1.0
    pub ratio: f64,
    /// Categories assigned to this bucket
    pub categories: Vec<String>,
}

/// A category currently spending past its target plus tolerance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverTarget {
    pub category: String,
    /// Actual spend this month, minor units
    pub actual: i64,
    /// Budget target, minor units
    pub target: i64,
    /// Static tip, or advisory AI-generated prose when inference succeeded
    pub suggestion: String,
}

/// Recommended income allocation, recomputed in full every pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetPlan {
    /// Monthly income in minor units (declared override or observed)
    pub monthly_income: i64,
    pub allocations: std::collections::BTreeMap<Bucket, BucketAllocation>,
    pub per_category_targets: std::collections::BTreeMap<String, i64>,
    pub over_target: Vec<OverTarget>,
    pub generated_at: DateTime<Utc>,
}

/// Alert categories raised by the alert manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Category spend exceeded its budget target plus tolerance
    Overspending,
    /// High-severity spike or outlier pattern
    Pattern,
    /// Burst of expense transactions inside the trailing hour
    RapidSpending,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overspending => "overspending",
            Self::Pattern => "pattern",
            Self::RapidSpending => "rapid_spending",
        }
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overspending" => Ok(Self::Overspending),
            "pattern" => Ok(Self::Pattern),
            "rapid_spending" => Ok(Self::RapidSpending),
            _ => Err(format!("Unknown alert type: {}", s)),
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert urgency, one step wider than pattern severity to leave room for
/// the autonomous-intervention tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

impl From<Severity> for AlertSeverity {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Low => AlertSeverity::Low,
            Severity::Medium => AlertSeverity::Medium,
            Severity::High => AlertSeverity::High,
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deduplication key for alerts
pub type AlertKey = (AlertType, String);

/// A prioritized, deduplicated alert
///
/// Keyed by `(alert_type, category)`: a repeat detection of an ongoing
/// condition refreshes the existing unacknowledged alert in place instead
/// of appending a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub category: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub suggestion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
}

impl Alert {
    pub fn key(&self) -> AlertKey {
        (self.alert_type, self.category.clone())
    }
}

/// An autonomous action taken by the scheduler without user confirmation
///
/// Append-only audit record; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    pub id: u64,
    /// Summary of the alert/pattern that triggered the action
    pub triggering_pattern: String,
    pub action: String,
    pub reasoning: String,
    pub expected_impact: String,
    pub executed_at: DateTime<Utc>,
}
