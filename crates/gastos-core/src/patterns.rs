//! Statistical spending pattern detection
//!
//! Works on expense transactions for the current and previous calendar
//! month. Two signals:
//!
//! - month-over-month spikes in a category's total
//! - single-transaction outliers against the category's running
//!   mean/stddev (catches one-off large purchases even when monthly totals
//!   stay flat because of offsetting reductions elsewhere)
//!
//! Zero-division and empty-category cases produce no pattern; absence of
//! data is not anomalous.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::config::PatternConfig;
use crate::models::{
    MonthlyAggregate, PatternKind, Severity, SpendingPattern, Transaction, TransactionKind,
};

/// Calendar month before (year, month)
pub fn previous_month(year_month: (i32, u32)) -> (i32, u32) {
    let (year, month) = year_month;
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Rebuild per-category aggregates for one calendar month
///
/// Derived data only: always recomputed from transactions so the aggregates
/// can never drift from the store.
pub fn monthly_aggregates(
    transactions: &[Transaction],
    year_month: (i32, u32),
) -> Vec<MonthlyAggregate> {
    let mut totals: BTreeMap<String, (i64, usize)> = BTreeMap::new();

    for tx in transactions {
        if tx.kind != TransactionKind::Expense || tx.year_month() != year_month {
            continue;
        }
        let category = tx.category.clone().unwrap_or_else(|| "Other".to_string());
        let entry = totals.entry(category).or_insert((0, 0));
        entry.0 += tx.magnitude();
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(category, (total, count))| MonthlyAggregate {
            category,
            year_month,
            total,
            count,
        })
        .collect()
}

/// Detects spikes and outliers in categorized expense history
pub struct PatternDetector {
    config: PatternConfig,
}

impl PatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Run detection for the month containing `now`
    ///
    /// Returns a fresh pattern list that replaces the previous pass's
    /// output entirely.
    pub fn detect(&self, transactions: &[Transaction], now: DateTime<Utc>) -> Vec<SpendingPattern> {
        let current_ym = (now.year(), now.month());
        let previous_ym = previous_month(current_ym);

        let mut patterns = Vec::new();
        patterns.extend(self.detect_spikes(transactions, current_ym, previous_ym, now));
        patterns.extend(self.detect_outliers(transactions, now));

        debug!(count = patterns.len(), "pattern detection complete");
        patterns
    }

    fn detect_spikes(
        &self,
        transactions: &[Transaction],
        current_ym: (i32, u32),
        previous_ym: (i32, u32),
        now: DateTime<Utc>,
    ) -> Vec<SpendingPattern> {
        let current = monthly_aggregates(transactions, current_ym);
        let previous = monthly_aggregates(transactions, previous_ym);

        let previous_totals: BTreeMap<&str, i64> = previous
            .iter()
            .map(|a| (a.category.as_str(), a.total))
            .collect();

        let mut patterns = Vec::new();
        for aggregate in &current {
            let previous_total = match previous_totals.get(aggregate.category.as_str()) {
                // Division guard: no previous-month data means no spike
                Some(&t) if t > 0 => t,
                _ => continue,
            };

            let percent_change =
                (aggregate.total - previous_total) as f64 / previous_total as f64;
            if percent_change <= self.config.spike_threshold {
                continue;
            }

            let severity = if percent_change > self.config.spike_high_threshold {
                Severity::High
            } else {
                Severity::Medium
            };

            patterns.push(SpendingPattern {
                category: aggregate.category.clone(),
                kind: PatternKind::Spike,
                severity,
                current_amount: aggregate.total,
                previous_amount: previous_total,
                percent_change,
                detected_at: now,
            });
        }
        patterns
    }

    /// Flag the single worst deviation per category, if any transaction sits
    /// beyond `outlier_stddev_multiplier` standard deviations from the mean
    fn detect_outliers(
        &self,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Vec<SpendingPattern> {
        let mut by_category: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for tx in transactions {
            if tx.kind != TransactionKind::Expense {
                continue;
            }
            let category = tx.category.clone().unwrap_or_else(|| "Other".to_string());
            by_category.entry(category).or_default().push(tx.magnitude() as f64);
        }

        let mut patterns = Vec::new();
        for (category, amounts) in by_category {
            if amounts.len() < self.config.outlier_min_samples {
                continue;
            }

            let n = amounts.len() as f64;
            let mean = amounts.iter().sum::<f64>() / n;
            let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
            let stddev = variance.sqrt();
            if stddev <= f64::EPSILON || mean <= 0.0 {
                continue;
            }

            let threshold = self.config.outlier_stddev_multiplier * stddev;
            let worst = amounts
                .iter()
                .copied()
                .filter(|a| (a - mean).abs() > threshold)
                .max_by(|a, b| {
                    (a - mean)
                        .abs()
                        .partial_cmp(&(b - mean).abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

            if let Some(amount) = worst {
                let deviation = (amount - mean).abs();
                let severity = if deviation > threshold * 1.5 {
                    Severity::High
                } else {
                    Severity::Medium
                };

                patterns.push(SpendingPattern {
                    category,
                    kind: PatternKind::Outlier,
                    severity,
                    current_amount: amount as i64,
                    previous_amount: mean.round() as i64,
                    percent_change: (amount - mean) / mean,
                    detected_at: now,
                });
            }
        }
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(id: &str, ts: &str, amount_minor: i64, category: &str) -> Transaction {
        Transaction {
            id: id.into(),
            timestamp: ts.parse().unwrap(),
            amount: -amount_minor,
            raw_description: "TEST".into(),
            kind: TransactionKind::Expense,
            category: Some(category.into()),
            subcategory: None,
            category_confidence: Some(0.75),
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-08-20T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_transport_spike_scenario() {
        // Previous month ₱2,000, current month ₱5,000: +150%, high severity
        let transactions = vec![
            expense("p1", "2026-07-05T00:00:00Z", 200_000, "Transport"),
            expense("c1", "2026-08-03T00:00:00Z", 250_000, "Transport"),
            expense("c2", "2026-08-10T00:00:00Z", 250_000, "Transport"),
        ];

        let detector = PatternDetector::new(PatternConfig::default());
        let patterns = detector.detect(&transactions, now());

        let spike = patterns
            .iter()
            .find(|p| p.kind == PatternKind::Spike)
            .unwrap();
        assert_eq!(spike.category, "Transport");
        assert!((spike.percent_change - 1.5).abs() < 1e-9);
        assert_eq!(spike.severity, Severity::High);
    }

    #[test]
    fn test_moderate_spike_is_medium() {
        // +80%: above the 0.5 threshold, below the 1.0 high threshold
        let transactions = vec![
            expense("p1", "2026-07-05T00:00:00Z", 100_000, "Food"),
            expense("c1", "2026-08-03T00:00:00Z", 180_000, "Food"),
        ];

        let detector = PatternDetector::new(PatternConfig::default());
        let patterns = detector.detect(&transactions, now());
        let spike = patterns
            .iter()
            .find(|p| p.kind == PatternKind::Spike)
            .unwrap();
        assert_eq!(spike.severity, Severity::Medium);
    }

    #[test]
    fn test_zero_previous_month_produces_no_spike() {
        let transactions = vec![
            expense("c1", "2026-08-03T00:00:00Z", 500_000, "Shopping"),
            expense("c2", "2026-08-10T00:00:00Z", 100_000, "Shopping"),
        ];

        let detector = PatternDetector::new(PatternConfig::default());
        let patterns = detector.detect(&transactions, now());
        assert!(patterns.iter().all(|p| p.kind != PatternKind::Spike));
    }

    #[test]
    fn test_outlier_single_large_purchase() {
        let mut transactions: Vec<Transaction> = (0..10)
            .map(|i| {
                expense(
                    &format!("c{}", i),
                    "2026-08-05T00:00:00Z",
                    20_000,
                    "Food",
                )
            })
            .collect();
        transactions.push(expense("big", "2026-08-15T00:00:00Z", 500_000, "Food"));

        let detector = PatternDetector::new(PatternConfig::default());
        let patterns = detector.detect(&transactions, now());

        let outlier = patterns
            .iter()
            .find(|p| p.kind == PatternKind::Outlier)
            .unwrap();
        assert_eq!(outlier.category, "Food");
        assert_eq!(outlier.current_amount, 500_000);
    }

    #[test]
    fn test_uniform_amounts_produce_no_outlier() {
        let transactions: Vec<Transaction> = (0..5)
            .map(|i| expense(&format!("c{}", i), "2026-08-05T00:00:00Z", 20_000, "Food"))
            .collect();

        let detector = PatternDetector::new(PatternConfig::default());
        let patterns = detector.detect(&transactions, now());
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let detector = PatternDetector::new(PatternConfig::default());
        assert!(detector.detect(&[], now()).is_empty());
    }

    #[test]
    fn test_monthly_aggregates_rebuilt_from_scratch() {
        let transactions = vec![
            expense("a", "2026-08-01T00:00:00Z", 10_000, "Food"),
            expense("b", "2026-08-02T00:00:00Z", 15_000, "Food"),
            expense("c", "2026-07-02T00:00:00Z", 99_000, "Food"),
        ];
        let aggregates = monthly_aggregates(&transactions, (2026, 8));
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].total, 25_000);
        assert_eq!(aggregates[0].count, 2);
    }

    #[test]
    fn test_previous_month_wraps_year() {
        assert_eq!(previous_month((2026, 1)), (2025, 12));
        assert_eq!(previous_month((2026, 8)), (2026, 7));
    }
}
