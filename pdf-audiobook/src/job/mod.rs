//! Conversion jobs: one PDF page range in, one audio file out.

pub mod driver;
pub mod manifest;
pub mod runner;

use crate::config::PdfAudioConfig;
use crate::pdf::{ExtractionError, PageRange};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use driver::run_all;
pub use runner::{JobServices, run_job};

/// Everything one job needs to know about its input and output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub pages: PageRange,
    /// Characters per chunk, at least 1
    pub chunk_size: usize,
    pub translate: bool,
    pub source_lang: String,
    pub target_lang: String,
    pub voice: String,
}

impl JobSpec {
    /// A job over every page, with settings taken from `config`.
    pub fn from_config(
        source_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        config: &PdfAudioConfig,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_dir: output_dir.into(),
            pages: PageRange::default(),
            chunk_size: config.chunk_size,
            translate: false,
            source_lang: config.source_lang.clone(),
            target_lang: config.effective_target_lang(),
            voice: config.voice.clone(),
        }
    }

    pub fn with_pages(mut self, start: Option<usize>, end: Option<usize>) -> Self {
        self.pages = PageRange::new(start, end);
        self
    }
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Extraction,
    Translation,
    Synthesis,
    Assembly,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Extraction => "extraction",
            Stage::Translation => "translation",
            Stage::Synthesis => "synthesis",
            Stage::Assembly => "assembly",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

fn chunk_label(chunk_id: &Option<usize>) -> String {
    match chunk_id {
        Some(id) => format!("chunk {}", id),
        None => "document text".to_string(),
    }
}

/// Errors raised inside a job.
///
/// Translation and cleanup errors are only ever logged; the others end the
/// job at their stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not prepare scratch directory: {0}")]
    Scratch(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("translation of {} failed: {reason}", chunk_label(.chunk_id))]
    Translation {
        chunk_id: Option<usize>,
        reason: String,
    },

    #[error("synthesis of chunk {chunk_id} failed: {reason}")]
    Synthesis { chunk_id: usize, reason: String },

    #[error("{0}")]
    Assembly(String),

    #[error("could not delete {0}")]
    Cleanup(String),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Scratch(_) => Stage::Setup,
            PipelineError::Extraction(_) => Stage::Extraction,
            PipelineError::Translation { .. } => Stage::Translation,
            PipelineError::Synthesis { .. } => Stage::Synthesis,
            PipelineError::Assembly(_) => Stage::Assembly,
            PipelineError::Cleanup(_) => Stage::Cleanup,
        }
    }
}

/// Job identifier used for logs and scratch file names.
///
/// `<source hash>_<timestamp>_j<ordinal>`. Ids are not unique across
/// processes; each job's scratch directory adds a random suffix to its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn for_source(source_path: &Path, ordinal: usize) -> Self {
        let hash = compute_source_hash(source_path).unwrap_or_else(|_| {
            let digest = Sha256::digest(source_path.to_string_lossy().as_bytes());
            format!("{:x}", digest)[..16].to_string()
        });
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        Self(format!("{}_{}_j{:02}", hash, timestamp, ordinal))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scratch file name for one chunk's segment.
    pub fn segment_name(&self, chunk_id: usize, ext: &str) -> String {
        format!("{}_ck{:04}.{}", self.0, chunk_id, ext)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute a hash of the source file for job identification.
///
/// Uses SHA256 of the first 1MB for speed with large files.
pub fn compute_source_hash(source_path: &Path) -> std::io::Result<String> {
    let file = File::open(source_path)?;
    let mut reader = BufReader::new(file);

    let mut buffer = Vec::with_capacity(1024 * 1024);
    reader.by_ref().take(1024 * 1024).read_to_end(&mut buffer)?;

    let mut hasher = Sha256::new();
    hasher.update(&buffer);
    let result = hasher.finalize();

    // Return first 16 hex characters
    Ok(format!("{:x}", result)[..16].to_string())
}

/// Why a job stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    /// None when the job's task died before it could report a stage
    pub stage: Option<Stage>,
    pub reason: String,
}

impl From<PipelineError> for JobFailure {
    fn from(err: PipelineError) -> Self {
        Self {
            stage: Some(err.stage()),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{} failed: {}", stage, self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

/// Details of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub output_path: PathBuf,
    /// Chunks the text was split into
    pub chunks: usize,
    /// Chunks synthesized into the output
    pub segments: usize,
    /// Chunks left out under the skip policy
    pub skipped_chunks: usize,
    /// Translations that fell back to the original text
    pub translation_fallbacks: usize,
}

/// Outcome of one job, success or failure.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: Option<JobId>,
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub outcome: Result<JobReport, JobFailure>,
    /// Scratch files that could not be deleted
    pub cleanup_failures: Vec<String>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(|r| r.output_path.as_path())
    }
}
