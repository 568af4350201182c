//! Mock translation provider for testing
//!
//! Provides a configurable provider that can simulate failures on chosen
//! calls and deterministic translations on the rest.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, TranslateError};
use crate::provider::{TranslateProvider, TranslateRequest, TranslateResponse};

/// What a successful mock call returns
#[derive(Debug, Clone)]
enum MockReply {
    /// Always the same text
    Fixed(String),
    /// The input text with a marker prepended
    Prefixed(String),
}

/// A mock provider for testing fallback behavior
pub struct MockProvider {
    /// Zero-based call numbers that fail
    failing_calls: Vec<usize>,
    /// Fail every call regardless of `failing_calls`
    fail_always: bool,
    /// Current call count
    call_count: AtomicUsize,
    /// Texts received, in call order
    received: Mutex<Vec<String>>,
    reply: MockReply,
    name: &'static str,
}

impl MockProvider {
    fn build(failing_calls: Vec<usize>, fail_always: bool, reply: MockReply) -> Self {
        Self {
            failing_calls,
            fail_always,
            call_count: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            reply,
            name: "mock",
        }
    }

    /// Create a provider that always answers with `response`
    pub fn always_succeeds(response: &str) -> Self {
        Self::build(Vec::new(), false, MockReply::Fixed(response.to_string()))
    }

    /// Create a provider that always fails
    pub fn always_fails() -> Self {
        Self::build(Vec::new(), true, MockReply::Fixed(String::new()))
    }

    /// Create a provider that "translates" by prepending `prefix`
    pub fn prefixing(prefix: &str) -> Self {
        Self::build(Vec::new(), false, MockReply::Prefixed(prefix.to_string()))
    }

    /// Create a prefixing provider that fails on the given zero-based calls
    pub fn fails_on_calls(calls: &[usize], prefix: &str) -> Self {
        Self::build(
            calls.to_vec(),
            false,
            MockReply::Prefixed(prefix.to_string()),
        )
    }

    /// Get the number of times translate() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts passed to translate(), in call order
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Set a custom provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl TranslateProvider for MockProvider {
    async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(request.text.clone());
        }

        if self.fail_always || self.failing_calls.contains(&call_num) {
            return Err(TranslateError::ApiError {
                message: format!("mock failure on call {}", call_num),
                status_code: Some(503),
            });
        }

        let text = match &self.reply {
            MockReply::Fixed(text) => text.clone(),
            MockReply::Prefixed(prefix) => format!("{}{}", prefix, request.text),
        };

        Ok(TranslateResponse {
            text,
            detected_lang: None,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}
