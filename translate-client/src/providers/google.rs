//! Google Translate provider
//!
//! Uses the public `translate_a/single` web endpoint (`client=gtx`), the same
//! one browser extensions use. No API key is needed.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::{Result, TranslateError};
use crate::provider::{TranslateProvider, TranslateRequest, TranslateResponse};

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Provider for the Google Translate web endpoint
pub struct GoogleProvider {
    base_url: String,
    client: Client,
}

impl GoogleProvider {
    /// Create a new Google provider
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client,
        })
    }
}

/// Pull the translated text out of a `translate_a/single` response.
///
/// The payload is a nested array: element 0 holds one entry per sentence with
/// the translation at index 0, element 2 holds the detected source language.
fn parse_response(value: &Value) -> Result<TranslateResponse> {
    let sentences = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::InvalidResponse("missing sentence array".into()))?;

    let mut text = String::new();
    for sentence in sentences {
        if let Some(part) = sentence.get(0).and_then(Value::as_str) {
            text.push_str(part);
        }
    }

    if text.is_empty() {
        return Err(TranslateError::InvalidResponse(
            "response contained no translated text".into(),
        ));
    }

    let detected_lang = value.get(2).and_then(Value::as_str).map(str::to_string);

    Ok(TranslateResponse {
        text,
        detected_lang,
    })
}

#[async_trait]
impl TranslateProvider for GoogleProvider {
    async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        let url = format!("{}/translate_a/single", self.base_url);

        log::debug!(
            "google translate: {} chars {} -> {}",
            request.text.chars().count(),
            request.source_lang,
            request.target_lang
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", request.source_lang.as_str()),
                ("tl", request.target_lang.as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TranslateError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TranslateError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslateError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let value: Value = response.json().await.map_err(|e| TranslateError::ApiError {
            message: format!("Failed to parse response: {}", e),
            status_code: None,
        })?;

        parse_response(&value)
    }

    fn name(&self) -> &'static str {
        "Google Translate"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}
