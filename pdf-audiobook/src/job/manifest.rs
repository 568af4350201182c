//! Multi-job manifests.
//!
//! ```toml
//! [[job]]
//! pdf = "libro1.pdf"
//! output_dir = "Libro1_Audiolibro"
//! start_page = 9
//! end_page = 12
//!
//! [[job]]
//! pdf = "libro2.pdf"
//! output_dir = "Libro2_Audiolibro"
//! translate = true
//! target_lang = "en"
//! voice = "en-US-GuyNeural"
//! ```
//!
//! Omitted fields take their values from the base `JobSpec` built out of the
//! config and command line flags. Relative paths are resolved against the
//! manifest's directory.

use super::JobSpec;
use crate::config::voice_language;
use crate::pdf::PageRange;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobEntry>,
}

/// One `[[job]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobEntry {
    pub pdf: PathBuf,
    pub output_dir: PathBuf,
    pub start_page: Option<usize>,
    pub end_page: Option<usize>,
    pub chunk_size: Option<usize>,
    pub translate: Option<bool>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub voice: Option<String>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job manifest {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid job manifest {}", path.display()))
    }

    /// Turn every entry into a job, filling gaps from `base`.
    pub fn into_specs(self, base: &JobSpec, base_dir: &Path) -> Result<Vec<JobSpec>> {
        if self.jobs.is_empty() {
            anyhow::bail!("Job manifest contains no [[job]] entries");
        }

        self.jobs
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                entry
                    .into_spec(base, base_dir)
                    .with_context(|| format!("job #{}", i + 1))
            })
            .collect()
    }
}

impl JobEntry {
    fn into_spec(self, base: &JobSpec, base_dir: &Path) -> Result<JobSpec> {
        let chunk_size = self.chunk_size.unwrap_or(base.chunk_size);
        if chunk_size == 0 {
            anyhow::bail!("chunk_size must be at least 1");
        }

        let voice_overridden = self.voice.as_ref().is_some_and(|v| *v != base.voice);
        let voice = self.voice.unwrap_or_else(|| base.voice.clone());
        if voice.trim().is_empty() {
            anyhow::bail!("voice must not be empty");
        }

        // A voice override without a target language speaks in the voice's language
        let target_lang = match self.target_lang {
            Some(lang) => lang,
            None if voice_overridden => voice_language(&voice).to_string(),
            None => base.target_lang.clone(),
        };

        Ok(JobSpec {
            source_path: resolve(base_dir, self.pdf),
            output_dir: resolve(base_dir, self.output_dir),
            pages: PageRange::new(
                self.start_page.or(base.pages.start),
                self.end_page.or(base.pages.end),
            ),
            chunk_size,
            translate: self.translate.unwrap_or(base.translate),
            source_lang: self.source_lang.unwrap_or_else(|| base.source_lang.clone()),
            target_lang,
            voice,
        })
    }
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdfAudioConfig;
    use tempfile::TempDir;

    fn base() -> JobSpec {
        JobSpec::from_config("", "", &PdfAudioConfig::default())
    }

    #[test]
    fn test_parse_two_jobs() {
        let manifest = Manifest::parse(
            r#"
[[job]]
pdf = "libro1.pdf"
output_dir = "Libro1_Audiolibro"
start_page = 9
end_page = 12

[[job]]
pdf = "/books/libro2.pdf"
output_dir = "Libro2_Audiolibro"
chunk_size = 250
translate = true
"#,
        )
        .unwrap();

        let specs = manifest.into_specs(&base(), Path::new("/work")).unwrap();
        assert_eq!(specs.len(), 2);

        assert_eq!(specs[0].source_path, PathBuf::from("/work/libro1.pdf"));
        assert_eq!(specs[0].output_dir, PathBuf::from("/work/Libro1_Audiolibro"));
        assert_eq!(specs[0].pages, PageRange::new(Some(9), Some(12)));
        assert_eq!(specs[0].chunk_size, 500);
        assert!(!specs[0].translate);

        assert_eq!(specs[1].source_path, PathBuf::from("/books/libro2.pdf"));
        assert_eq!(specs[1].pages, PageRange::default());
        assert_eq!(specs[1].chunk_size, 250);
        assert!(specs[1].translate);
        assert_eq!(specs[1].target_lang, "es");
    }

    #[test]
    fn test_voice_override_sets_target_language() {
        let manifest = Manifest::parse(
            r#"
[[job]]
pdf = "a.pdf"
output_dir = "a"
voice = "en-US-GuyNeural"

[[job]]
pdf = "b.pdf"
output_dir = "b"
voice = "en-US-GuyNeural"
target_lang = "fr"
"#,
        )
        .unwrap();

        let specs = manifest.into_specs(&base(), Path::new(".")).unwrap();
        assert_eq!(specs[0].voice, "en-US-GuyNeural");
        assert_eq!(specs[0].target_lang, "en");
        assert_eq!(specs[1].target_lang, "fr");
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let manifest = Manifest::parse(
            r#"
[[job]]
pdf = "a.pdf"
output_dir = "a"
chunk_size = 0
"#,
        )
        .unwrap();
        let err = manifest.into_specs(&base(), Path::new(".")).unwrap_err();
        assert!(format!("{:#}", err).contains("chunk_size"));
    }

    #[test]
    fn test_rejects_empty_manifest() {
        let manifest = Manifest::parse("").unwrap();
        assert!(manifest.into_specs(&base(), Path::new(".")).is_err());
    }

    #[test]
    fn test_rejects_unknown_field() {
        let result = Manifest::parse(
            r#"
[[job]]
pdf = "a.pdf"
output_dir = "a"
pages = 3
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jobs.toml");
        std::fs::write(&path, "[[job]]\npdf = \"x.pdf\"\noutput_dir = \"out\"\n").unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.jobs.len(), 1);
        assert!(Manifest::load(&temp_dir.path().join("missing.toml")).is_err());
    }
}
