//! TTS backend trait and types.

pub mod edge;
pub mod google;

use crate::config::{BackendKind, voice_language};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Voice selection for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsOptions {
    /// Backend voice identifier (e.g. `es-ES-AlvaroNeural`)
    pub voice: String,
    /// Language code for backends that select by language only
    pub language: String,
}

impl TtsOptions {
    /// Options for `voice`, with the language taken from its prefix.
    pub fn new(voice: impl Into<String>) -> Self {
        let voice = voice.into();
        let language = voice_language(&voice).to_string();
        Self { voice, language }
    }
}

/// TTS backend trait - all TTS engines implement this.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize text to an audio file at `output_path`.
    async fn synthesize(&self, text: &str, output_path: &Path, options: &TtsOptions)
    -> Result<()>;

    /// Backend name for logs.
    fn name(&self) -> &str;

    /// File extension of the audio this backend writes.
    fn extension(&self) -> &'static str;
}

/// Create a TTS backend.
///
/// `timeout` bounds each call to the external service.
pub fn create_backend(kind: BackendKind, timeout: Duration) -> Result<Arc<dyn TtsBackend>> {
    Ok(match kind {
        BackendKind::Google => Arc::new(google::GoogleTtsBackend::new(timeout)?),
        BackendKind::Edge => Arc::new(edge::EdgeTtsBackend::new(None, timeout)?),
    })
}
