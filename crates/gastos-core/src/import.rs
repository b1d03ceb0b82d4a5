//! CSV import for transaction history
//!
//! Expected columns: `date,description,amount[,kind]`
//!
//! - `date`: `YYYY-MM-DD` or an RFC 3339 timestamp
//! - `amount`: decimal major units, negative for expenses (converted to
//!   signed minor units)
//! - `kind`: optional `income`/`expense`; inferred from the amount sign
//!   when absent

use std::io::Read;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Transaction, TransactionKind};

/// Parse CSV data into transactions
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut transactions = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let row = idx + 2; // 1-based, after the header

        let date_str = record
            .get(0)
            .ok_or_else(|| Error::InvalidData(format!("row {}: missing date", row)))?;
        let timestamp = parse_timestamp(date_str)
            .ok_or_else(|| Error::InvalidData(format!("row {}: bad date '{}'", row, date_str)))?;

        let description = record
            .get(1)
            .ok_or_else(|| Error::InvalidData(format!("row {}: missing description", row)))?
            .trim()
            .to_string();

        let amount_str = record
            .get(2)
            .ok_or_else(|| Error::InvalidData(format!("row {}: missing amount", row)))?;
        let amount_major: f64 = amount_str
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| Error::InvalidData(format!("row {}: bad amount '{}'", row, amount_str)))?;
        let amount = (amount_major * 100.0).round() as i64;

        let kind = match record.get(3).map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<TransactionKind>()
                .map_err(|e| Error::InvalidData(format!("row {}: {}", row, e)))?,
            None if amount >= 0 => TransactionKind::Income,
            None => TransactionKind::Expense,
        };

        transactions.push(Transaction {
            id: format!("csv-{:06}", idx + 1),
            timestamp,
            amount,
            raw_description: description,
            kind,
            category: None,
            subcategory: None,
            category_confidence: None,
        });
    }

    debug!(count = transactions.len(), "parsed transactions from CSV");
    Ok(transactions)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Some(ts);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Utc.from_local_datetime(&date.and_hms_opt(12, 0, 0)?).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_csv() {
        let data = "date,description,amount,kind\n\
                    2026-08-01,JOLLIBEE BGC,-350.50,expense\n\
                    2026-08-05,PAYROLL AUG,30000.00,income\n";
        let txs = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, -35_050);
        assert_eq!(txs[0].kind, TransactionKind::Expense);
        assert_eq!(txs[1].amount, 3_000_000);
        assert_eq!(txs[1].kind, TransactionKind::Income);
    }

    #[test]
    fn test_kind_inferred_from_sign() {
        let data = "date,description,amount\n2026-08-01,GRAB RIDE,-180.00\n";
        let txs = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(txs[0].kind, TransactionKind::Expense);
    }

    #[test]
    fn test_rfc3339_timestamp_preserved() {
        let data = "date,description,amount\n2026-08-01T09:30:00Z,COFFEE,-120.00\n";
        let txs = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(
            txs[0].timestamp,
            "2026-08-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_bad_amount_reports_row() {
        let data = "date,description,amount\n2026-08-01,X,abc\n";
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }
}
