//! Pluggable inference backend abstraction
//!
//! The engine needs exactly one external AI operation: turn a prompt into
//! text. Everything structured (batch categorization, budget tips) is built
//! on top of that single call plus strict JSON parsing with deterministic
//! fallbacks.
//!
//! - `InferenceBackend` trait: the raw generate call
//! - `AiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - `AiGateway`: rate limiting, timeouts, and retries around a client
//!
//! # Configuration
//!
//! Environment variables (used by `AiClient::from_env`):
//! - `GASTOS_AI_ENDPOINT`: inference server URL
//! - `GASTOS_AI_MODEL`: model name (default: llama3.2)
//! - `GASTOS_AI_BACKEND`: `http` (default) or `mock`

mod gateway;
mod http;
mod mock;
pub mod parsing;

pub use gateway::AiGateway;
pub use http::HttpBackend;
pub use mock::MockBackend;

use async_trait::async_trait;

use crate::error::Result;

/// Options carried on every generate call
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

/// The single operation every backend must provide
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Generate text for a prompt
    async fn generate(&self, prompt: &str, opts: GenerateOptions) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete inference client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AiClient {
    /// HTTP backend (Ollama-style generate API)
    Http(HttpBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AiClient {
    /// Create a client from environment variables
    ///
    /// Returns None when `GASTOS_AI_ENDPOINT` is unset and the backend is
    /// not `mock`; the engine then runs rule-only.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("GASTOS_AI_BACKEND").unwrap_or_else(|_| "http".to_string());

        match backend.to_lowercase().as_str() {
            "mock" => Some(AiClient::Mock(MockBackend::new())),
            "http" => HttpBackend::from_env().map(AiClient::Http),
            _ => {
                tracing::warn!(backend = %backend, "Unknown GASTOS_AI_BACKEND, falling back to http");
                HttpBackend::from_env().map(AiClient::Http)
            }
        }
    }

    /// Create an HTTP backend directly
    pub fn http(endpoint: &str, model: &str) -> Self {
        AiClient::Http(HttpBackend::new(endpoint, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AiClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl InferenceBackend for AiClient {
    async fn generate(&self, prompt: &str, opts: GenerateOptions) -> Result<String> {
        match self {
            AiClient::Http(b) => b.generate(prompt, opts).await,
            AiClient::Mock(b) => b.generate(prompt, opts).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AiClient::Http(b) => b.health_check().await,
            AiClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AiClient::Http(b) => b.model(),
            AiClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AiClient::Http(b) => b.host(),
            AiClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AiClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    // Sole test touching the GASTOS_AI_* variables; process env is shared
    // across test threads, so both branches are checked here.
    #[test]
    fn test_from_env_selects_backend() {
        std::env::remove_var("GASTOS_AI_ENDPOINT");
        std::env::remove_var("GASTOS_AI_BACKEND");
        assert!(AiClient::from_env().is_none());

        std::env::set_var("GASTOS_AI_BACKEND", "mock");
        assert!(matches!(AiClient::from_env(), Some(AiClient::Mock(_))));
        std::env::remove_var("GASTOS_AI_BACKEND");

        std::env::set_var("GASTOS_AI_ENDPOINT", "http://localhost:11434");
        let client = AiClient::from_env().unwrap();
        assert_eq!(client.host(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
        std::env::remove_var("GASTOS_AI_ENDPOINT");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AiClient::mock();
        assert!(client.health_check().await);
    }
}
