//! Engine configuration
//!
//! Every analysis threshold lives here rather than in code: window lengths,
//! rate limits, spike/outlier thresholds, budget tolerance, bucket ratios,
//! and the rapid-spending trigger. Defaults match the values the engine was
//! tuned with, but none of them are domain truths; load a TOML file to
//! override any section.
//!
//! ```toml
//! [inference]
//! endpoint = "http://localhost:11434"
//! model = "llama3.2"
//! rate_limit = 10
//!
//! [alerts]
//! rapid_spending_amount = 500000   # centavos, ₱5,000
//!
//! [budget]
//! ratios = { needs = 0.5, wants = 0.3, savings = 0.2 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inference gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Whether AI-assisted passes run at all; rule-only when false
    pub enabled: bool,
    /// Base URL of the text-generation endpoint
    pub endpoint: String,
    pub model: String,
    /// Max requests per rate-limit window
    pub rate_limit: u32,
    /// Sliding window length in seconds
    pub rate_window_secs: u64,
    /// Retry attempts before giving up with an exhausted error
    pub max_retries: u32,
    /// Base backoff delay in milliseconds (grows as base * 1.5^attempt)
    pub backoff_base_ms: u64,
    /// Hard upper bound per call; a timeout counts as a transient error
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            rate_limit: 10,
            rate_window_secs: 60,
            max_retries: 3,
            backoff_base_ms: 500,
            timeout_secs: 30,
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

/// Categorizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerConfig {
    /// Transactions per AI prompt; bounds prompt size and cost
    pub batch_size: usize,
    /// Delay between consecutive AI batches, to stay under the rate limit
    pub inter_batch_delay_ms: u64,
    /// Absolute amount (minor units) above which a rule match gets a
    /// confidence floor; large transactions are less likely keyword noise
    pub material_amount: i64,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            inter_batch_delay_ms: 1000,
            material_amount: 100_000, // ₱1,000
        }
    }
}

/// Pattern detector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Month-over-month fractional change that counts as a spike
    pub spike_threshold: f64,
    /// Fractional change above which a spike is high severity
    pub spike_high_threshold: f64,
    /// Standard deviations from the category mean that flag an outlier
    pub outlier_stddev_multiplier: f64,
    /// Minimum transactions in a category before outlier stats apply
    pub outlier_min_samples: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            spike_threshold: 0.5,
            spike_high_threshold: 1.0,
            outlier_stddev_multiplier: 2.0,
            outlier_min_samples: 3,
        }
    }
}

/// Budget planner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// needs/wants/savings split; renormalized if it doesn't sum to 1.0
    pub ratios: BucketRatios,
    /// Tolerance band before a category is flagged over target (0.2 = 20%)
    pub tolerance: f64,
    /// Multiple of target at which an overspending alert is high severity
    pub high_multiple: f64,
    /// Declared monthly income in minor units; overrides observed income
    pub declared_income: Option<i64>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            ratios: BucketRatios::default(),
            tolerance: 0.2,
            high_multiple: 1.5,
            declared_income: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketRatios {
    pub needs: f64,
    pub wants: f64,
    pub savings: f64,
}

impl Default for BucketRatios {
    fn default() -> Self {
        // The classic 50/30/20 rule
        Self {
            needs: 0.5,
            wants: 0.3,
            savings: 0.2,
        }
    }
}

impl BucketRatios {
    pub fn sum(&self) -> f64 {
        self.needs + self.wants + self.savings
    }

    /// Scale so the three ratios sum to exactly 1.0. Guards against config
    /// drift when someone edits one bucket and forgets the others.
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            needs: self.needs / sum,
            wants: self.wants / sum,
            savings: self.savings / sum,
        }
    }
}

/// Alert manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minor-unit total that triggers the rapid-spending rule
    pub rapid_spending_amount: i64,
    /// Minimum expense transactions inside the window
    pub rapid_spending_count: usize,
    /// Trailing window in minutes
    pub rapid_spending_window_mins: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            rapid_spending_amount: 500_000, // ₱5,000
            rapid_spending_count: 3,
            rapid_spending_window_mins: 60,
        }
    }
}

/// Scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Full pipeline cadence in seconds
    pub full_pass_interval_secs: u64,
    /// Rapid-spending fast path cadence in seconds
    pub fast_path_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            full_pass_interval_secs: 300,
            fast_path_interval_secs: 60,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many months of history each analysis pass pulls
    pub analysis_window_months: AnalysisWindow,
    pub inference: InferenceConfig,
    pub categorizer: CategorizerConfig,
    pub patterns: PatternConfig,
    pub budget: BudgetConfig,
    pub alerts: AlertConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisWindow(pub u32);

impl Default for AnalysisWindow {
    fn default() -> Self {
        // Current plus previous month
        AnalysisWindow(2)
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.inference.rate_limit == 0 {
            return Err(Error::Config("inference.rate_limit must be > 0".into()));
        }
        if self.scheduler.full_pass_interval_secs == 0 || self.scheduler.fast_path_interval_secs == 0
        {
            return Err(Error::Config("scheduler intervals must be > 0".into()));
        }
        if self.categorizer.batch_size == 0 {
            return Err(Error::Config("categorizer.batch_size must be > 0".into()));
        }
        if self.patterns.spike_threshold < 0.0 || self.patterns.outlier_stddev_multiplier <= 0.0 {
            return Err(Error::Config("pattern thresholds must be non-negative".into()));
        }
        if self.budget.tolerance < 0.0 {
            return Err(Error::Config("budget.tolerance must be non-negative".into()));
        }
        if self.budget.ratios.sum() <= 0.0 {
            return Err(Error::Config("budget.ratios must sum to a positive value".into()));
        }
        if self.alerts.rapid_spending_count == 0 {
            return Err(Error::Config("alerts.rapid_spending_count must be > 0".into()));
        }
        Ok(())
    }
}
