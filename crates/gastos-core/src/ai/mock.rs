//! Mock inference backend for testing
//!
//! Replies are scripted: push responses (or failures) onto a queue and the
//! backend pops them in order. An empty queue falls back to the default
//! canned text. Call counts are tracked so tests can assert retry behavior.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{GenerateOptions, InferenceBackend};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text
    Text(String),
    /// Fail with a transient error (gateway will retry)
    Transient,
}

/// Scriptable mock backend
#[derive(Clone)]
pub struct MockBackend {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<AtomicUsize>,
    /// When set, every call fails transiently regardless of the queue
    fail_all: Arc<std::sync::atomic::AtomicBool>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_all: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Mock that fails every call with a transient error
    pub fn failing() -> Self {
        let backend = Self::new();
        backend.fail_all.store(true, Ordering::SeqCst);
        backend
    }

    /// Queue a text reply
    pub fn push_text(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Text(text.into()));
    }

    /// Queue a transient failure
    pub fn push_transient(&self) {
        self.replies.lock().unwrap().push_back(MockReply::Transient);
    }

    /// Number of generate calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn generate(&self, _prompt: &str, _opts: GenerateOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(Error::InferenceTransient("mock: scripted failure".into()));
        }

        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Transient) => {
                Err(Error::InferenceTransient("mock: scripted failure".into()))
            }
            None => Ok("{}".to_string()),
        }
    }

    async fn health_check(&self) -> bool {
        !self.fail_all.load(Ordering::SeqCst)
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockBackend::new();
        mock.push_text("first");
        mock.push_transient();
        mock.push_text("second");

        let opts = GenerateOptions::default();
        assert_eq!(mock.generate("p", opts).await.unwrap(), "first");
        assert!(mock.generate("p", opts).await.is_err());
        assert_eq!(mock.generate("p", opts).await.unwrap(), "second");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_mock_always_fails() {
        let mock = MockBackend::failing();
        let opts = GenerateOptions::default();
        for _ in 0..5 {
            assert!(mock.generate("p", opts).await.is_err());
        }
        assert!(!mock.health_check().await);
    }
}
