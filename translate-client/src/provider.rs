use async_trait::async_trait;

use crate::error::Result;

/// Language hint meaning "let the service detect the source language"
pub const AUTO_DETECT: &str = "auto";

/// Request to send to a translation provider
#[derive(Debug, Clone)]
pub struct TranslateRequest {
    pub text: String,
    /// Source language code, or `auto`
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, source_lang: &str, target_lang: &str) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }
}

/// Response from a translation provider
#[derive(Debug, Clone)]
pub struct TranslateResponse {
    pub text: String,
    /// Source language reported by the service, if it detected one
    pub detected_lang: Option<String>,
}

/// Trait for translation providers
#[async_trait]
pub trait TranslateProvider: Send + Sync {
    /// Translate one piece of text
    async fn translate(&self, request: TranslateRequest) -> Result<TranslateResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is usable (API key set, base URL configured, etc.)
    fn is_available(&self) -> Result<()>;
}
