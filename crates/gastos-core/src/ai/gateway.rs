//! Rate-limited, retrying inference gateway
//!
//! Every component that needs natural-language reasoning goes through one
//! `AiGateway`. The gateway owns all the unreliability handling so callers
//! only ever see success or `InferenceExhausted`, and every caller carries
//! a deterministic non-AI fallback for the latter — this gateway is
//! explicitly allowed to fail closed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::error::{Error, Result};

use super::{AiClient, GenerateOptions, InferenceBackend};

/// Gateway wrapping an inference client with a sliding-window rate limit,
/// per-call timeout, and exponential-backoff retries
///
/// Request-window state is owned by the gateway instance; there is no
/// ambient/static mutable state. Clone shares the window, so all clones
/// count against the same limit.
#[derive(Clone)]
pub struct AiGateway {
    client: AiClient,
    config: InferenceConfig,
    window: Arc<Mutex<VecDeque<Instant>>>,
}

impl AiGateway {
    pub fn new(client: AiClient, config: InferenceConfig) -> Self {
        Self {
            client,
            config,
            window: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Generate text with the configured token/temperature defaults
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let opts = GenerateOptions {
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        self.generate_with(prompt, opts).await
    }

    /// Generate text, retrying transient failures
    ///
    /// Retries cover rate-limit rejections (local window full or remote 429),
    /// network errors, and timeouts. Backoff grows as `base * 1.5^attempt`.
    /// On exhausting the retry budget this returns
    /// `Error::InferenceExhausted`; it never panics and is never fatal to
    /// the caller.
    pub async fn generate_with(&self, prompt: &str, opts: GenerateOptions) -> Result<String> {
        let attempts = self.config.max_retries + 1;

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = self.backoff_delay(attempt - 1);
                debug!(attempt, delay_ms = backoff.as_millis() as u64, "retrying inference");
                tokio::time::sleep(backoff).await;
            }

            if !self.try_acquire_slot() {
                warn!(
                    limit = self.config.rate_limit,
                    window_secs = self.config.rate_window_secs,
                    "inference rate limit window full"
                );
                continue;
            }

            let call = self.client.generate(prompt, opts);
            let timeout = Duration::from_secs(self.config.timeout_secs);

            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) if e.is_transient() => {
                    warn!(attempt, error = %e, "transient inference failure");
                }
                Ok(Err(e)) => return Err(e),
                // A timeout is treated identically to a transient error
                Err(_) => {
                    warn!(attempt, timeout_secs = self.config.timeout_secs, "inference call timed out");
                }
            }
        }

        Err(Error::InferenceExhausted { attempts })
    }

    pub async fn health_check(&self) -> bool {
        self.client.health_check().await
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Claim a slot in the sliding window; false when the window is full
    fn try_acquire_slot(&self) -> bool {
        let now = Instant::now();
        let window_len = Duration::from_secs(self.config.rate_window_secs);

        let mut window = self.window.lock().unwrap();
        while let Some(front) = window.front() {
            if now.duration_since(*front) > window_len {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < self.config.rate_limit as usize {
            window.push_back(now);
            true
        } else {
            false
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base_ms as f64;
        Duration::from_millis((base * 1.5f64.powi(attempt as i32)) as u64)
    }
}
