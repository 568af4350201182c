//! pdf-audio configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_VOICE: &str = "es-ES-AlvaroNeural";
const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Which speech synthesis service to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Google Translate's public TTS endpoint (MP3)
    #[default]
    Google,
    /// Microsoft Edge neural voices through the `edge-tts` CLI (MP3)
    Edge,
}

/// What to do when one chunk fails to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the job at the first failed chunk
    #[default]
    Abort,
    /// Log the failure and leave the chunk out of the output
    Skip,
}

/// How segments get joined into the final file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssemblerKind {
    /// FFmpeg when it is installed, otherwise stream concatenation
    #[default]
    Auto,
    /// FFmpeg concat demuxer with stream copy
    Ffmpeg,
    /// Append encoded frames directly (MP3 only)
    Stream,
}

/// Whether translation runs per chunk or once over the whole text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TranslateScope {
    #[default]
    Chunk,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfAudioConfig {
    /// Voice identifier passed to the synthesis backend
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default)]
    pub backend: BackendKind,

    /// Characters per synthesis request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Source language hint for translation ("auto" to detect)
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Translation target. None means the voice's language.
    #[serde(default)]
    pub target_lang: Option<String>,

    /// Translation provider name (google, libretranslate). None defers to
    /// `default_provider` in translate.toml.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_provider: Option<String>,

    #[serde(default)]
    pub translate_scope: TranslateScope,

    /// Upper bound for each external call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub on_synthesis_failure: FailurePolicy,

    #[serde(default)]
    pub assembler: AssemblerKind,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_source_lang() -> String {
    "auto".to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for PdfAudioConfig {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            backend: BackendKind::default(),
            chunk_size: default_chunk_size(),
            source_lang: default_source_lang(),
            target_lang: None,
            translate_provider: None,
            translate_scope: TranslateScope::default(),
            request_timeout_secs: default_request_timeout_secs(),
            on_synthesis_failure: FailurePolicy::default(),
            assembler: AssemblerKind::default(),
        }
    }
}

impl PdfAudioConfig {
    /// Get the config file path: ~/.config/cli-programs/pdf-audio.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("pdf-audio.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: PdfAudioConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be at least 1");
        }
        if self.voice.trim().is_empty() {
            anyhow::bail!("voice must not be empty");
        }
        Ok(())
    }

    /// Translation target, falling back to the voice's language.
    pub fn effective_target_lang(&self) -> String {
        self.target_lang
            .clone()
            .unwrap_or_else(|| voice_language(&self.voice).to_string())
    }
}

/// Language prefix of a voice identifier: `es-ES-AlvaroNeural` -> `es`.
///
/// Plain language codes pass through unchanged.
pub fn voice_language(voice: &str) -> &str {
    voice.split(['-', '_']).next().unwrap_or(voice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PdfAudioConfig::default();
        assert_eq!(config.voice, "es-ES-AlvaroNeural");
        assert_eq!(config.backend, BackendKind::Google);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.source_lang, "auto");
        assert!(config.target_lang.is_none());
        assert_eq!(config.on_synthesis_failure, FailurePolicy::Abort);
        assert_eq!(config.assembler, AssemblerKind::Auto);
        assert_eq!(config.translate_scope, TranslateScope::Chunk);
    }

    #[test]
    fn test_config_path() {
        let path = PdfAudioConfig::config_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.ends_with("cli-programs/pdf-audio.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
voice = "en-US-GuyNeural"
backend = "edge"
chunk_size = 300
target_lang = "en"
on_synthesis_failure = "skip"
assembler = "stream"
translate_scope = "document"
translate_provider = "libretranslate"
"#;
        let config: PdfAudioConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.voice, "en-US-GuyNeural");
        assert_eq!(config.backend, BackendKind::Edge);
        assert_eq!(config.chunk_size, 300);
        assert_eq!(config.target_lang, Some("en".to_string()));
        assert_eq!(config.on_synthesis_failure, FailurePolicy::Skip);
        assert_eq!(config.assembler, AssemblerKind::Stream);
        assert_eq!(config.translate_scope, TranslateScope::Document);
        assert_eq!(config.translate_provider.as_deref(), Some("libretranslate"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: PdfAudioConfig = toml::from_str("").unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.request_timeout_secs, 60);
        assert!(config.translate_provider.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = PdfAudioConfig {
            chunk_size: 0,
            ..PdfAudioConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_voice_language() {
        assert_eq!(voice_language("es-ES-AlvaroNeural"), "es");
        assert_eq!(voice_language("en_US"), "en");
        assert_eq!(voice_language("fr"), "fr");
    }

    #[test]
    fn test_effective_target_lang() {
        let mut config = PdfAudioConfig::default();
        assert_eq!(config.effective_target_lang(), "es");

        config.target_lang = Some("en".to_string());
        assert_eq!(config.effective_target_lang(), "en");
    }
}
