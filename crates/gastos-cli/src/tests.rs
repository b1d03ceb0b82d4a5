//! CLI command tests
//!
//! This module contains the tests for CLI helpers and commands.

use std::io::Write;

use chrono::{Datelike, Timelike};

use crate::commands::{self, peso, truncate};

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

fn sample_csv() -> &'static str {
    "date,description,amount,kind\n\
     2026-08-01,PAYROLL AUG,30000.00,income\n\
     2026-08-05,JOLLIBEE KATIPUNAN,-350.00,expense\n\
     2026-08-07,GRAB RIDE BGC,-180.00,expense\n"
}

// ========== Helper Tests ==========

#[test]
fn test_peso_formatting() {
    assert_eq!(peso(500_000), "₱5,000.00");
    assert_eq!(peso(-35_050), "-₱350.50");
    assert_eq!(peso(0), "₱0.00");
    assert_eq!(peso(123_456_789), "₱1,234,567.89");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a very long description", 10), "a very ...");
}

#[test]
fn test_resolve_at_date() {
    let at = commands::resolve_at(Some("2026-08-20")).unwrap();
    assert_eq!((at.year(), at.month(), at.day()), (2026, 8, 20));
    assert_eq!(at.hour(), 12);
}

#[test]
fn test_resolve_at_rejects_garbage() {
    assert!(commands::resolve_at(Some("not-a-date")).is_err());
}

#[test]
fn test_load_config_defaults() {
    let config = commands::load_config(None, false).unwrap();
    assert!(config.inference.enabled);
}

#[test]
fn test_load_config_no_ai_flag() {
    let config = commands::load_config(None, true).unwrap();
    assert!(!config.inference.enabled);
}

#[test]
fn test_load_transactions_from_csv() {
    let file = write_csv(sample_csv());
    let transactions = commands::load_transactions(file.path()).unwrap();
    assert_eq!(transactions.len(), 3);
}

#[test]
fn test_load_transactions_missing_file() {
    let err = commands::load_transactions(std::path::Path::new("/no/such/file.csv"));
    assert!(err.is_err());
}

// ========== Command Tests ==========

fn rule_only_config() -> gastos_core::EngineConfig {
    commands::load_config(None, true).unwrap()
}

#[tokio::test]
async fn test_cmd_analyze_runs() {
    let file = write_csv(sample_csv());
    let result = commands::cmd_analyze(rule_only_config(), file.path(), Some("2026-08-20")).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_categorize_runs() {
    let file = write_csv(sample_csv());
    let result = commands::cmd_categorize(rule_only_config(), file.path(), 10).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_budget_with_declared_income() {
    let file = write_csv(sample_csv());
    let result = commands::cmd_budget(rule_only_config(), file.path(), Some(50_000.0)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_budget_plan_aggregates_named_categories() {
    // Heavy Food month: the plan must attribute the spend to Food, not
    // lump everything into the fallback category.
    let csv = "date,description,amount,kind\n\
               2026-08-01,PAYROLL AUG,30000.00,income\n\
               2026-08-05,JOLLIBEE KATIPUNAN,-6000.00,expense\n\
               2026-08-12,GRABFOOD ORDER,-6000.00,expense\n";
    let file = write_csv(csv);
    let now: chrono::DateTime<chrono::Utc> = "2026-08-20T12:00:00Z".parse().unwrap();
    let plan = commands::build_plan(rule_only_config(), file.path(), None, now)
        .await
        .unwrap();

    let over: Vec<&str> = plan
        .over_target
        .iter()
        .map(|o| o.category.as_str())
        .collect();
    assert!(over.contains(&"Food"), "over target: {:?}", over);
    assert!(!over.contains(&"Other"));
}

#[tokio::test]
async fn test_cmd_alerts_runs() {
    let file = write_csv(sample_csv());
    let result = commands::cmd_alerts(rule_only_config(), file.path()).await;
    assert!(result.is_ok());
}
