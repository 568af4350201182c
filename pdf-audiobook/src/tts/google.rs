//! Google Translate TTS backend.
//!
//! Calls the public `translate_tts` endpoint, which speaks at most 100
//! characters per request and answers with MP3 data. Longer chunks are sent
//! as several requests whose MP3 frames are appended to the same file.

use super::{TtsBackend, TtsOptions};
use crate::text::split_for_requests;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest text the endpoint accepts in one request.
pub const MAX_REQUEST_CHARS: usize = 100;

pub struct GoogleTtsBackend {
    client: Client,
    url: String,
}

impl GoogleTtsBackend {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: TTS_URL.to_string(),
        })
    }

    /// Fetch the audio for one piece and append it to `file`.
    async fn fetch_piece(
        &self,
        piece: &str,
        idx: usize,
        total: usize,
        language: &str,
        file: &mut tokio::fs::File,
    ) -> Result<()> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = piece.chars().count().to_string();

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", piece),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .context("TTS request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("TTS request returned HTTP {}", status.as_u16());
        }

        let mut stream = response.bytes_stream();
        let mut written = 0usize;
        while let Some(bytes) = stream.next().await {
            let bytes = bytes.context("Failed reading TTS response")?;
            written += bytes.len();
            file.write_all(&bytes).await?;
        }

        if written == 0 {
            anyhow::bail!("TTS response was empty");
        }

        Ok(())
    }
}

#[async_trait]
impl TtsBackend for GoogleTtsBackend {
    async fn synthesize(
        &self,
        text: &str,
        output_path: &Path,
        options: &TtsOptions,
    ) -> Result<()> {
        let pieces = split_for_requests(text, MAX_REQUEST_CHARS);
        if pieces.is_empty() {
            anyhow::bail!("No text to speak");
        }

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(output_path)
            .await
            .with_context(|| format!("Failed to create {}", output_path.display()))?;

        for (idx, piece) in pieces.iter().enumerate() {
            self.fetch_piece(piece, idx, pieces.len(), &options.language, &mut file)
                .await
                .with_context(|| format!("piece {}/{}", idx + 1, pieces.len()))?;
        }

        file.flush().await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "google"
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}
