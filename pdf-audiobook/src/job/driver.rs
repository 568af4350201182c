//! Runs a batch of jobs side by side.

use super::{JobFailure, JobResult, JobServices, JobSpec, run_job};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;

fn job_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:20!} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Run every job concurrently, one task per job.
///
/// Results come back in submission order whatever order the jobs finish
/// in. A job that fails, or whose task panics, is reported as failed without
/// affecting the others.
pub async fn run_all(
    specs: Vec<JobSpec>,
    services: Arc<JobServices>,
    progress: Option<&MultiProgress>,
) -> Vec<JobResult> {
    let mut handles = Vec::with_capacity(specs.len());

    for (ordinal, spec) in specs.into_iter().enumerate() {
        let bar = match progress {
            Some(multi) => {
                let bar = multi.add(ProgressBar::new(0));
                bar.set_style(job_style());
                bar
            }
            None => ProgressBar::hidden(),
        };

        let source_path = spec.source_path.clone();
        let output_dir = spec.output_dir.clone();
        let services = Arc::clone(&services);
        let handle = tokio::spawn(run_job(spec, ordinal, services, bar));
        handles.push((source_path, output_dir, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (source_path, output_dir, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                let reason = if e.is_panic() {
                    "job task panicked".to_string()
                } else {
                    "job task was cancelled".to_string()
                };
                log::error!("{} for {}", reason, source_path.display());
                // Scratch files went with the task's TempDir when it was dropped
                JobResult {
                    job_id: None,
                    source_path,
                    output_dir,
                    outcome: Err(JobFailure {
                        stage: None,
                        reason,
                    }),
                    cleanup_failures: Vec::new(),
                }
            }
        };
        results.push(result);
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    log::info!("{} of {} jobs succeeded", results.len() - failed, results.len());

    results
}
