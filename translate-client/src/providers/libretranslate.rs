//! LibreTranslate provider
//!
//! Works against the public instance (API key required) or any self-hosted
//! server given by `base_url`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TranslateError};
use crate::provider::{TranslateProvider, TranslateRequest, TranslateResponse};

const PUBLIC_BASE_URL: &str = "https://libretranslate.com";

/// Provider for the LibreTranslate REST API
pub struct LibreTranslateProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl LibreTranslateProvider {
    /// Create a new LibreTranslate provider
    pub fn new(base_url: Option<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url
                .as_deref()
                .unwrap_or(PUBLIC_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateReply {
    translated_text: String,
    detected_language: Option<DetectedLanguage>,
}

#[derive(Debug, Deserialize)]
struct DetectedLanguage {
    language: String,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

#[async_trait]
impl TranslateProvider for LibreTranslateProvider {
    async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        let body = TranslateBody {
            q: &request.text,
            source: &request.source_lang,
            target: &request.target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let url = format!("{}/translate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
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
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorReply>(&error_text) {
                Ok(reply) => reply.error,
                Err(_) => error_text,
            };
            return Err(TranslateError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let reply: TranslateReply = response.json().await.map_err(|e| TranslateError::ApiError {
            message: format!("Failed to parse response: {}", e),
            status_code: None,
        })?;

        Ok(TranslateResponse {
            text: reply.translated_text,
            detected_lang: reply.detected_language.map(|d| d.language),
        })
    }

    fn name(&self) -> &'static str {
        "LibreTranslate"
    }

    fn is_available(&self) -> Result<()> {
        if self.base_url == PUBLIC_BASE_URL && self.api_key.is_none() {
            return Err(TranslateError::MissingApiKey {
                provider: "LibreTranslate".to_string(),
                env_var: "LIBRETRANSLATE_API_KEY".to_string(),
            });
        }
        Ok(())
    }
}
