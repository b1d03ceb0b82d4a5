//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Full pipeline pass and categorization listing
//! - `budget` - Budget plan display
//! - `alerts` - Alert display
//! - `run` - Background scheduler
//! - `ai` - Inference backend check

pub mod ai;
pub mod alerts;
pub mod analyze;
pub mod budget;
pub mod run;

// Re-export command functions for main.rs
pub use ai::*;
pub use alerts::*;
pub use analyze::*;
pub use budget::*;
pub use run::*;

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use gastos_core::import::parse_csv;
use gastos_core::{
    AiClient, AiGateway, AnalysisEngine, EngineConfig, LogNotifier, MemoryStore, Transaction,
};

/// Load engine config, falling back to defaults when no file is given
pub fn load_config(path: Option<&Path>, no_ai: bool) -> Result<EngineConfig> {
    let mut config = match path {
        Some(p) => EngineConfig::load(p)
            .with_context(|| format!("Failed to load config from {}", p.display()))?,
        None => EngineConfig::default(),
    };
    if no_ai {
        config.inference.enabled = false;
    }
    Ok(config)
}

/// Parse a CSV transaction file
pub fn load_transactions(file: &Path) -> Result<Vec<Transaction>> {
    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    parse_csv(reader).with_context(|| format!("Failed to parse {}", file.display()))
}

/// Build an engine over an in-memory store seeded from a CSV file
pub fn build_engine(config: EngineConfig, file: &Path) -> Result<(Arc<AnalysisEngine>, MemoryStore)> {
    let store = MemoryStore::with_transactions(load_transactions(file)?);
    let engine = Arc::new(AnalysisEngine::new(
        config,
        "local",
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(LogNotifier),
    ));
    Ok((engine, store))
}

/// Build the inference gateway, if enabled
///
/// `GASTOS_AI_*` environment variables take precedence over the config
/// endpoint.
pub fn build_gateway(config: &EngineConfig) -> Option<AiGateway> {
    if !config.inference.enabled {
        return None;
    }
    let client = AiClient::from_env().unwrap_or_else(|| {
        AiClient::http(&config.inference.endpoint, &config.inference.model)
    });
    Some(AiGateway::new(client, config.inference.clone()))
}

/// Resolve an optional YYYY-MM-DD override to an analysis moment
pub fn resolve_at(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        None => Ok(Utc::now()),
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("Invalid --at date '{}' (use YYYY-MM-DD)", raw))?;
            let noon = date
                .and_hms_opt(12, 0, 0)
                .context("Invalid --at date")?;
            Ok(Utc.from_utc_datetime(&noon))
        }
    }
}

/// Format minor units as pesos, e.g. `₱5,000.00`
pub fn peso(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let whole = abs / 100;
    let cents = abs % 100;

    let mut grouped = String::new();
    let digits = whole.to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}₱{}.{:02}", sign, grouped, cents)
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
