//! Microsoft Edge neural voices through the `edge-tts` command line tool.

use super::{TtsBackend, TtsOptions};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

pub struct EdgeTtsBackend {
    cli_path: PathBuf,
    timeout: Duration,
}

impl EdgeTtsBackend {
    /// Create a new edge-tts backend.
    ///
    /// Returns an error if the CLI is not found.
    pub fn new(cli_path: Option<PathBuf>, timeout: Duration) -> Result<Self> {
        let cli_path = match cli_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("edge-tts not found at specified path: {}", path.display());
                }
                path
            }
            None => which::which("edge-tts").map_err(|_| {
                anyhow::anyhow!("edge-tts not found. Install it with 'pip install edge-tts'")
            })?,
        };

        Ok(Self { cli_path, timeout })
    }
}

/// Command line for one synthesis call.
///
/// The text goes in `--text=` form so a chunk starting with `-` isn't read
/// as a flag.
fn build_args(text: &str, output_path: &Path, voice: &str) -> Vec<OsString> {
    let mut media = OsString::from("--write-media=");
    media.push(output_path.as_os_str());

    vec![
        OsString::from(format!("--voice={}", voice)),
        OsString::from(format!("--text={}", text)),
        media,
    ]
}

#[async_trait]
impl TtsBackend for EdgeTtsBackend {
    async fn synthesize(
        &self,
        text: &str,
        output_path: &Path,
        options: &TtsOptions,
    ) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("No text to speak");
        }

        let mut cmd = Command::new(&self.cli_path);
        cmd.args(build_args(text, output_path, &options.voice))
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| anyhow::anyhow!("edge-tts timed out after {:?}", self.timeout))?
            .context("Failed to run edge-tts")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("edge-tts failed: {}", stderr.trim());
        }

        let size = tokio::fs::metadata(output_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            anyhow::bail!("edge-tts produced no audio");
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "edge"
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}
