//! Translation provider implementations

mod google;
mod libretranslate;
pub mod mock;

pub use google::GoogleProvider;
pub use libretranslate::LibreTranslateProvider;
pub use mock::MockProvider;

use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{Result, TranslateError};
use crate::provider::TranslateProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    LibreTranslate,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" | "gtx" => Ok(Self::Google),
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            _ => Err(TranslateError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Key used for this provider in the `[providers]` config table
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::LibreTranslate => "libretranslate",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::Google => None,
            Self::LibreTranslate => Some("LIBRETRANSLATE_API_KEY"),
        }
    }
}

/// Create a provider instance from its kind and optional config
pub fn get_provider(
    kind: ProviderKind,
    provider_config: Option<&ProviderConfig>,
    timeout: Duration,
) -> Result<Box<dyn TranslateProvider>> {
    let base_url = provider_config.and_then(|c| c.base_url.clone());

    match kind {
        ProviderKind::Google => Ok(Box::new(GoogleProvider::new(base_url, timeout)?)),
        ProviderKind::LibreTranslate => {
            let api_key = get_api_key(provider_config, kind);
            let provider = LibreTranslateProvider::new(base_url, api_key, timeout)?;
            provider.is_available()?;
            Ok(Box::new(provider))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(config: Option<&ProviderConfig>, kind: ProviderKind) -> Option<String> {
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Some(key);
    }

    kind.env_var().and_then(|var| std::env::var(var).ok())
}
