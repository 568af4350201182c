//! Runs one job through extraction, chunking, translation, synthesis and
//! assembly.

use super::{JobFailure, JobId, JobReport, JobResult, JobSpec, PipelineError};
use crate::audio::{Concatenator, assemble, cleanup_segments};
use crate::config::{FailurePolicy, TranslateScope};
use crate::pdf::{DocumentLoader, ExtractionError, extract_from_path};
use crate::text::process_text;
use crate::translate::ChunkTranslator;
use crate::tts::{TtsBackend, TtsOptions};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use translate_client::TranslateProvider;

/// Collaborators shared by every job. All of them are stateless clients.
#[derive(Clone)]
pub struct JobServices {
    pub loader: Arc<dyn DocumentLoader>,
    /// Required by jobs with `translate = true`
    pub translate_provider: Option<Arc<dyn TranslateProvider>>,
    pub tts: Arc<dyn TtsBackend>,
    pub concatenator: Arc<dyn Concatenator>,
    /// Each job keeps its segments in `<scratch_root>/<job id>/`
    pub scratch_root: PathBuf,
    pub failure_policy: FailurePolicy,
    pub translate_scope: TranslateScope,
}

impl JobServices {
    fn translator_for(&self, spec: &JobSpec, job_id: &JobId) -> ChunkTranslator {
        if !spec.translate {
            return ChunkTranslator::disabled();
        }
        match &self.translate_provider {
            Some(provider) => {
                ChunkTranslator::new(Arc::clone(provider), &spec.source_lang, &spec.target_lang)
            }
            None => {
                log::warn!(
                    "[{}] translation requested but no provider is configured; using original text",
                    job_id
                );
                ChunkTranslator::disabled()
            }
        }
    }
}

/// Create `<scratch_root>/<job id>_<random>/` for one job's segments.
///
/// The random suffix keeps concurrent runs over the same document apart,
/// including runs in other processes.
pub(crate) async fn create_scratch_dir(
    scratch_root: &Path,
    job_id: &JobId,
) -> Result<TempDir, PipelineError> {
    tokio::fs::create_dir_all(scratch_root)
        .await
        .map_err(|e| PipelineError::Scratch(format!("{}: {}", scratch_root.display(), e)))?;

    tempfile::Builder::new()
        .prefix(&format!("{}_", job_id))
        .tempdir_in(scratch_root)
        .map_err(|e| PipelineError::Scratch(format!("{}: {}", scratch_root.display(), e)))
}

/// Run one job to completion.
///
/// Never returns an error: every failure is folded into the `JobResult`. The
/// job's scratch directory is removed whatever the outcome.
pub async fn run_job(
    spec: JobSpec,
    ordinal: usize,
    services: Arc<JobServices>,
    progress: ProgressBar,
) -> JobResult {
    let job_id = JobId::for_source(&spec.source_path, ordinal);
    progress.set_prefix(display_name(&spec.source_path));

    log::info!(
        "[{}] {} -> {}",
        job_id,
        spec.source_path.display(),
        spec.output_dir.display()
    );

    // The TempDir also removes the directory if this future is dropped early
    let mut segments = Vec::new();
    let (outcome, cleanup_failures) =
        match create_scratch_dir(&services.scratch_root, &job_id).await {
            Ok(scratch) => {
                let outcome = execute(
                    &spec,
                    &job_id,
                    &services,
                    scratch.path(),
                    &mut segments,
                    &progress,
                )
                .await;
                let failures = cleanup_segments(&segments, scratch.path()).await;
                (outcome, failures)
            }
            Err(err) => (Err(err), Vec::new()),
        };

    let outcome = match outcome {
        Ok(report) => {
            log::info!("[{}] saved {}", job_id, report.output_path.display());
            progress.finish_with_message("done");
            Ok(report)
        }
        Err(err) => {
            log::error!("[{}] {} stage: {}", job_id, err.stage(), err);
            progress.abandon_with_message(format!("{} failed", err.stage()));
            Err(JobFailure::from(err))
        }
    };

    JobResult {
        job_id: Some(job_id),
        source_path: spec.source_path,
        output_dir: spec.output_dir,
        outcome,
        cleanup_failures,
    }
}

async fn execute(
    spec: &JobSpec,
    job_id: &JobId,
    services: &JobServices,
    scratch_dir: &Path,
    segments: &mut Vec<PathBuf>,
    progress: &ProgressBar,
) -> Result<JobReport, PipelineError> {
    // Extraction
    progress.set_message("extracting");
    let loader = Arc::clone(&services.loader);
    let source_path = spec.source_path.clone();
    let pages = spec.pages;
    let text = tokio::task::spawn_blocking(move || {
        extract_from_path(loader.as_ref(), &source_path, pages)
    })
    .await
    .map_err(|e| ExtractionError::Open {
        path: spec.source_path.clone(),
        reason: format!("extraction task failed: {}", e),
    })??;

    log::debug!("[{}] extracted {} characters", job_id, text.chars().count());

    let translator = services.translator_for(spec, job_id);
    let mut translation_fallbacks = 0;

    let text = if translator.is_enabled() && services.translate_scope == TranslateScope::Document {
        progress.set_message("translating");
        let (translated, fell_back) = translator.translate(&text, None).await;
        translation_fallbacks += usize::from(fell_back);
        translated
    } else {
        text
    };

    // Chunking
    let chunks = process_text(&text, spec.chunk_size);
    let total_chunks = chunks.len();
    log::info!(
        "[{}] {} chunks of up to {} characters",
        job_id,
        total_chunks,
        spec.chunk_size
    );

    let chunks = if services.translate_scope == TranslateScope::Chunk {
        progress.set_message("translating");
        let (translated, fallbacks) = translator.translate_chunks(chunks).await;
        translation_fallbacks += fallbacks;
        translated
    } else {
        chunks
    };

    // Synthesis, one chunk at a time in order
    progress.set_length(total_chunks as u64);
    progress.set_message("synthesizing");

    let options = TtsOptions::new(spec.voice.clone());
    let ext = services.tts.extension();
    let mut skipped_chunks = 0;

    for chunk in &chunks {
        if chunk.text.trim().is_empty() {
            log::debug!("[{}] chunk {} is blank, nothing to speak", job_id, chunk.chunk_id);
            progress.inc(1);
            continue;
        }

        let segment_path = scratch_dir.join(job_id.segment_name(chunk.chunk_id, ext));
        match services
            .tts
            .synthesize(&chunk.text, &segment_path, &options)
            .await
        {
            Ok(()) => segments.push(segment_path),
            Err(e) => {
                let err = PipelineError::Synthesis {
                    chunk_id: chunk.chunk_id,
                    reason: format!("{:#}", e),
                };
                match services.failure_policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Skip => {
                        log::warn!("[{}] {}; leaving it out", job_id, err);
                        skipped_chunks += 1;
                    }
                }
            }
        }
        progress.inc(1);
    }

    // Assembly
    progress.set_message("assembling");
    let output_path = assemble(
        segments,
        &spec.output_dir,
        ext,
        services.concatenator.as_ref(),
    )
    .await
    .map_err(|e| PipelineError::Assembly(format!("{:#}", e)))?;

    Ok(JobReport {
        output_path,
        chunks: total_chunks,
        segments: segments.len(),
        skipped_chunks,
        translation_fallbacks,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
