//! Test utilities for gastos-core
//!
//! Provides a mock inference server speaking the Ollama-style generate API,
//! for integration tests and local development without a real model. The
//! server inspects the prompt to decide which canned response shape to
//! return, mirroring how the engine's prompts are structured.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock inference server for testing and development
pub struct MockInferenceServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockInferenceServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockInferenceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Tags endpoint (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Generate endpoint: picks a canned response shape from the prompt
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let response = if request.prompt.contains("Classify each transaction") {
        handle_categorization_mock(&request.prompt)
    } else if request.prompt.contains("money-saving tip") {
        r#"{"tip": "Set a weekly cash envelope for this category"}"#.to_string()
    } else {
        "{}".to_string()
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// Build a positionally complete batch categorization response
///
/// Input lines look like `1. "JOLLIBEE BGC" | amount: -350.00 | date: ...`;
/// the mock counts them and classifies each by description keyword.
fn handle_categorization_mock(prompt: &str) -> String {
    let descriptions: Vec<String> = prompt
        .lines()
        .filter(|line| {
            line.trim_start()
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
                && line.contains(" | amount: ")
        })
        .map(|line| {
            let start = line.find('"').map(|i| i + 1).unwrap_or(0);
            let end = line.rfind('"').unwrap_or(line.len());
            line[start..end].to_uppercase()
        })
        .collect();

    let mut categories = Vec::new();
    let mut confidence = Vec::new();
    let mut subcategories: Vec<Option<&str>> = Vec::new();
    let mut reasoning = Vec::new();

    for description in &descriptions {
        let (category, subcategory) = classify_description_mock(description);
        categories.push(category);
        subcategories.push(subcategory);
        confidence.push(0.92);
        reasoning.push("merchant name match");
    }

    serde_json::json!({
        "categories": categories,
        "confidence": confidence,
        "subcategories": subcategories,
        "reasoning": reasoning,
    })
    .to_string()
}

fn classify_description_mock(description: &str) -> (&'static str, Option<&'static str>) {
    if description.contains("JOLLIBEE")
        || description.contains("MCDO")
        || description.contains("GRABFOOD")
    {
        ("Food", Some("Dining"))
    } else if description.contains("GROCERY") || description.contains("SUPERMARKET") {
        ("Food", Some("Groceries"))
    } else if description.contains("GRAB") || description.contains("ANGKAS") {
        ("Transport", None)
    } else if description.contains("MERALCO") || description.contains("PLDT") {
        ("Utilities", None)
    } else if description.contains("NETFLIX") || description.contains("SPOTIFY") {
        ("Entertainment", None)
    } else if description.contains("LAZADA") || description.contains("SHOPEE") {
        ("Shopping", None)
    } else {
        ("Other", None)
    }
}

// Request/response types for the mock server

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenerateOptions, HttpBackend, InferenceBackend};

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockInferenceServer::start().await;
        let client = HttpBackend::new(&server.url(), "test-model");
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_batch_categorization() {
        let server = MockInferenceServer::start().await;
        let client = HttpBackend::new(&server.url(), "test-model");

        let prompt = "Classify each transaction into exactly one of these categories: Food, Transport.\n\
                      Transactions:\n\
                      1. \"JOLLIBEE BGC\" | amount: -350.00 | date: 2026-08-01\n\
                      2. \"GRAB RIDE\" | amount: -180.00 | date: 2026-08-02\n";
        let response = client
            .generate(prompt, GenerateOptions::default())
            .await
            .unwrap();
        let parsed =
            crate::ai::parsing::parse_batch_categorization(&response, 2).unwrap();
        assert_eq!(parsed.categories, vec!["Food", "Transport"]);
    }

    #[tokio::test]
    async fn test_mock_server_tip() {
        let server = MockInferenceServer::start().await;
        let client = HttpBackend::new(&server.url(), "test-model");

        let response = client
            .generate(
                "Give one short, practical money-saving tip for this category.",
                GenerateOptions::default(),
            )
            .await
            .unwrap();
        let tip = crate::ai::parsing::parse_tip(&response).unwrap();
        assert!(!tip.is_empty());
    }
}
