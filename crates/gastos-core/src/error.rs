//! Error types for Gastos

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Network-level or rate-limit failure on an inference call. Retried by
    /// the gateway; callers never see this unless retries are disabled.
    #[error("Transient inference error: {0}")]
    InferenceTransient(String),

    /// Gateway gave up after its configured retry budget. Callers must fall
    /// back to their deterministic path; this is never surfaced as a failure
    /// to the user.
    #[error("Inference retries exhausted after {attempts} attempts")]
    InferenceExhausted { attempts: u32 },

    /// The model returned something that is not the structure we asked for
    /// (invalid JSON, wrong shape, or positionally incomplete).
    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// True for errors the gateway is allowed to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::InferenceTransient(_) | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
