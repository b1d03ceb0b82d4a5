//! HTTP inference backend
//!
//! Client for an Ollama-style text-generation API: `POST /api/generate`
//! with a JSON body, non-streaming. The engine must tolerate this endpoint
//! being completely unavailable for extended periods; all errors map to the
//! transient/exhausted taxonomy and callers fall back to rule-based output.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{GenerateOptions, InferenceBackend};

/// Inference backend over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("GASTOS_AI_ENDPOINT").ok()?;
        let model =
            std::env::var("GASTOS_AI_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&endpoint, &model))
    }
}

/// Request to the generate API
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    num_predict: u32,
    temperature: f64,
}

/// Response from the generate API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    async fn generate(&self, prompt: &str, opts: GenerateOptions) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: RequestOptions {
                num_predict: opts.max_tokens,
                temperature: opts.temperature,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::InferenceTransient("server rate limited".into()));
        }
        if !status.is_success() {
            return Err(Error::InferenceTransient(format!(
                "generate returned {}",
                status
            )));
        }

        let body: GenerateResponse = response.json().await?;
        debug!(model = %self.model, chars = body.response.len(), "inference response");

        Ok(body.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
