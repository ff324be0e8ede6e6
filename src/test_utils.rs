//! Test utilities for raynna-bot
//!
//! This module provides a scripted provider, temporary config files and
//! assertion helpers shared by the unit tests.

use crate::clock::ManualClock;
use crate::error::{BotError, Result};
use crate::providers::{CompletionRequest, CompletionResponse, Message, Provider, TokenUsage};
use crate::session::{SessionConfig, SessionStore};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Write `content` to `name` inside `dir` and return its path
///
/// # Panics
///
/// Panics if writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error's message contains `expected`
///
/// # Panics
///
/// Panics if the result is Ok or if the message doesn't match
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A session store on a manual clock, plus the clock
pub fn manual_store(idle_timeout: Duration) -> (Arc<SessionStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let store = SessionStore::new(SessionConfig { idle_timeout }, clock.clone());
    (Arc::new(store), clock)
}

/// Provider that replays queued replies and records every request
///
/// When the queue runs dry it answers `"reply N"` with an increasing N.
/// Every reply reports one completion token per call.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Provider that answers with `replies` in order
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    /// Provider whose first call fails with a generation error
    pub fn failing(message: &str) -> Self {
        let provider = Self::default();
        provider
            .replies
            .lock()
            .unwrap()
            .push_back(Err(BotError::Generation(message.to_string()).into()));
        provider
    }

    /// Sleep for `delay` before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of completion calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => format!("reply {}", call),
        };
        let usage = TokenUsage::new(request.messages.len(), 1);
        Ok(CompletionResponse::with_usage(Message::assistant(text), usage))
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[tokio::test]
    async fn test_scripted_provider_replays_then_counts() {
        let provider = ScriptedProvider::new(["first"]);
        let request = CompletionRequest {
            messages: vec![Message::user("hi")],
            max_tokens: 70,
            temperature: 0.6,
        };

        assert_eq!(provider.complete(&request).await.unwrap().text(), "first");
        assert_eq!(provider.complete(&request).await.unwrap().text(), "reply 2");
        assert_eq!(provider.call_count(), 2);
    }
}
