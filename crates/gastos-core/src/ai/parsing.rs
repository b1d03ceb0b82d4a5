//! JSON parsing helpers for inference responses
//!
//! Models often wrap the JSON payload in extra prose. These helpers extract
//! the outermost object and validate structure strictly; any mismatch is a
//! `MalformedResponse`, which callers treat as "keep the rule-pass result".

use serde::Deserialize;

use crate::error::{Error, Result};

/// Extract the outermost JSON object from a model response
pub fn extract_json(response: &str) -> Result<&str> {
    let response = response.trim();

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::MalformedResponse(format!(
            "No JSON found in response | Raw: {}",
            truncate(response)
        ))),
    }
}

fn truncate(raw: &str) -> String {
    if raw.len() > 200 {
        format!("{}...", &raw[..200])
    } else {
        raw.to_string()
    }
}

/// Structured batch-categorization response, positionally aligned with the
/// input batch
#[derive(Debug, Clone, Deserialize)]
pub struct BatchCategorization {
    pub categories: Vec<String>,
    pub confidence: Vec<f64>,
    #[serde(default)]
    pub subcategories: Vec<Option<String>>,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

/// Parse and validate a batch-categorization response
///
/// Positional alignment is never trusted blindly: array lengths must match
/// the input batch exactly or the whole response is rejected and the
/// deterministic rule-pass result stands.
pub fn parse_batch_categorization(response: &str, expected: usize) -> Result<BatchCategorization> {
    let json_str = extract_json(response)?;

    let parsed: BatchCategorization = serde_json::from_str(json_str).map_err(|e| {
        Error::MalformedResponse(format!(
            "Invalid batch JSON: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    if parsed.categories.len() != expected {
        return Err(Error::MalformedResponse(format!(
            "Expected {} categories, got {}",
            expected,
            parsed.categories.len()
        )));
    }
    if parsed.confidence.len() != expected {
        return Err(Error::MalformedResponse(format!(
            "Expected {} confidence values, got {}",
            expected,
            parsed.confidence.len()
        )));
    }
    if !parsed.subcategories.is_empty() && parsed.subcategories.len() != expected {
        return Err(Error::MalformedResponse(format!(
            "Expected {} subcategories, got {}",
            expected,
            parsed.subcategories.len()
        )));
    }
    if parsed.confidence.iter().any(|c| !(0.0..=1.0).contains(c)) {
        return Err(Error::MalformedResponse(
            "Confidence values outside [0, 1]".into(),
        ));
    }

    Ok(parsed)
}

#[derive(Debug, Deserialize)]
struct TipResponse {
    tip: String,
}

/// Parse a budget tip response; plain `{"tip": "..."}`
pub fn parse_tip(response: &str) -> Result<String> {
    let json_str = extract_json(response)?;
    let parsed: TipResponse = serde_json::from_str(json_str)
        .map_err(|e| Error::MalformedResponse(format!("Invalid tip JSON: {}", e)))?;

    let tip = parsed.tip.trim();
    if tip.is_empty() {
        return Err(Error::MalformedResponse("Empty tip".into()));
    }
    Ok(tip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_with_surrounding_prose() {
        let raw = "Sure! Here you go:\n{\"tip\": \"Cook at home\"}\nHope that helps.";
        assert_eq!(extract_json(raw).unwrap(), "{\"tip\": \"Cook at home\"}");
    }

    #[test]
    fn test_extract_json_missing() {
        assert!(extract_json("no structure here").is_err());
    }

    #[test]
    fn test_parse_batch_ok() {
        let raw = r#"{"categories": ["Food", "Transport"], "confidence": [0.9, 0.8],
                      "subcategories": ["Dining", null], "reasoning": ["fast food", "ride hail"]}"#;
        let parsed = parse_batch_categorization(raw, 2).unwrap();
        assert_eq!(parsed.categories, vec!["Food", "Transport"]);
        assert_eq!(parsed.subcategories[1], None);
    }

    #[test]
    fn test_parse_batch_length_mismatch_rejected() {
        let raw = r#"{"categories": ["Food"], "confidence": [0.9, 0.8]}"#;
        let err = parse_batch_categorization(raw, 2).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_batch_confidence_out_of_range_rejected() {
        let raw = r#"{"categories": ["Food"], "confidence": [1.7]}"#;
        assert!(parse_batch_categorization(raw, 1).is_err());
    }

    #[test]
    fn test_parse_tip() {
        assert_eq!(
            parse_tip(r#"{"tip": "Try meal prepping on Sundays"}"#).unwrap(),
            "Try meal prepping on Sundays"
        );
        assert!(parse_tip(r#"{"tip": "  "}"#).is_err());
    }
}
