use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, TranslateError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider used when the caller doesn't name one
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "google".to_string()
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (self-hosted instances, proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| TranslateError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/translate.toml"))
    }

    /// Provider to use: `requested` when given, otherwise `default_provider`
    pub fn provider_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.default_provider)
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_provider, "google");
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.providers.insert(
            "libretranslate".to_string(),
            ProviderConfig {
                api_key: Some("secret".to_string()),
                base_url: Some("http://localhost:5000".to_string()),
            },
        );
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);

        let libre = parsed.get_provider_config("libretranslate").unwrap();
        assert_eq!(libre.api_key.as_deref(), Some("secret"));
        assert_eq!(libre.base_url.as_deref(), Some("http://localhost:5000"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.default_provider, "google");
        assert!(config.get_provider_config("google").is_none());
    }

    #[test]
    fn test_provider_name_falls_back_to_default() {
        let config: Config = toml::from_str("default_provider = \"libretranslate\"").unwrap();
        assert_eq!(config.provider_name(None), "libretranslate");
        assert_eq!(config.provider_name(Some("google")), "google");
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(
            path.to_string_lossy()
                .contains(".config/cli-programs/translate.toml")
        );
    }
}
