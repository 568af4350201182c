//! pdf-audio - Turn page ranges of PDF documents into spoken audiobooks

mod audio;
mod config;
mod job;
mod pdf;
mod playback;
mod text;
mod translate;
mod tts;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{AssemblerKind, BackendKind, FailurePolicy, PdfAudioConfig, TranslateScope};
use indicatif::MultiProgress;
use job::manifest::Manifest;
use job::{JobResult, JobServices, JobSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use translate_client::{ProviderKind, TranslateProvider};

#[derive(Parser, Debug)]
#[command(name = "pdf-audio")]
#[command(about = "Convert PDF page ranges to audiobooks with optional translation", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file
    #[arg(conflicts_with = "jobs")]
    pdf: Option<PathBuf>,

    /// Output directory (default: <pdf-name>_audiolibro)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Run every [[job]] in a TOML manifest concurrently
    #[arg(long)]
    jobs: Option<PathBuf>,

    /// First page to read, 0-based
    #[arg(long)]
    start_page: Option<usize>,

    /// Page to stop before, 0-based (default: end of document)
    #[arg(long)]
    end_page: Option<usize>,

    /// Characters per synthesis request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Translate the text before speaking it
    #[arg(short, long, default_value_t = false)]
    translate: bool,

    /// Source language for translation (default: auto-detect)
    #[arg(long)]
    source_lang: Option<String>,

    /// Target language for translation (default: the voice's language)
    #[arg(long)]
    target_lang: Option<String>,

    /// Translation provider (google, libretranslate)
    #[arg(long)]
    translate_provider: Option<String>,

    /// Translate per chunk or the whole text at once
    #[arg(long, value_enum)]
    translate_scope: Option<TranslateScope>,

    /// Voice identifier, e.g. es-ES-AlvaroNeural
    #[arg(long)]
    voice: Option<String>,

    /// Speech synthesis backend
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// How to join the audio segments
    #[arg(long, value_enum)]
    assembler: Option<AssemblerKind>,

    /// What to do when a chunk fails to synthesize
    #[arg(long, value_enum)]
    on_synthesis_failure: Option<FailurePolicy>,

    /// Open each finished audiobook with the default player
    #[arg(long, default_value_t = false)]
    play: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice
    SetVoice {
        /// Voice identifier
        voice: String,
    },
    /// Set default synthesis backend
    SetBackend {
        #[arg(value_enum)]
        backend: BackendKind,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Characters per chunk (at least 1)
        value: usize,
    },
    /// Set default translation target language
    SetTargetLang {
        /// Language code, e.g. en
        lang: String,
    },
    /// Set what happens when a chunk fails to synthesize
    SetFailurePolicy {
        #[arg(value_enum)]
        policy: FailurePolicy,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let mut config = PdfAudioConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let specs = build_specs(&args, &config)?;

    if args.debug {
        eprintln!("Backend: {:?}", config.backend);
        eprintln!("Voice: {}", config.voice);
        eprintln!("Chunk size: {}", config.chunk_size);
        eprintln!("Assembler: {:?}", config.assembler);
        eprintln!("Failure policy: {:?}", config.on_synthesis_failure);
        for spec in &specs {
            eprintln!("Job: {:?}", spec);
        }
    }

    let services = Arc::new(build_services(&config, &specs)?);

    eprintln!("Converting {} document(s)...", specs.len());
    let multi = MultiProgress::new();
    let results = job::run_all(specs, services, Some(&multi)).await;

    print_summary(&results);

    if args.play {
        playback::play_all(results.iter().filter_map(JobResult::output_path));
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} job(s) failed", failed, results.len());
    }

    Ok(())
}

/// Command line flags take precedence over the config file for this run.
fn apply_overrides(config: &mut PdfAudioConfig, args: &Args) {
    if let Some(voice) = &args.voice {
        config.voice = voice.clone();
        if args.target_lang.is_none() {
            config.target_lang = None;
        }
    }
    if let Some(lang) = &args.target_lang {
        config.target_lang = Some(lang.clone());
    }
    if let Some(lang) = &args.source_lang {
        config.source_lang = lang.clone();
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(provider) = &args.translate_provider {
        config.translate_provider = Some(provider.clone());
    }
    if let Some(scope) = args.translate_scope {
        config.translate_scope = scope;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(assembler) = args.assembler {
        config.assembler = assembler;
    }
    if let Some(policy) = args.on_synthesis_failure {
        config.on_synthesis_failure = policy;
    }
}

fn build_specs(args: &Args, config: &PdfAudioConfig) -> Result<Vec<JobSpec>> {
    let mut base = JobSpec::from_config(PathBuf::new(), PathBuf::new(), config)
        .with_pages(args.start_page, args.end_page);
    base.translate = args.translate;

    if let Some(manifest_path) = &args.jobs {
        let base_dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        return Manifest::load(manifest_path)?.into_specs(&base, &base_dir);
    }

    let pdf = args.pdf.clone().ok_or_else(|| {
        anyhow::anyhow!("PDF file path is required. Run 'pdf-audio --help' for usage.")
    })?;

    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        let stem = pdf.file_stem().unwrap_or_default();
        PathBuf::from(format!("{}_audiolibro", stem.to_string_lossy()))
    });

    Ok(vec![JobSpec {
        source_path: pdf,
        output_dir,
        ..base
    }])
}

fn build_services(config: &PdfAudioConfig, specs: &[JobSpec]) -> Result<JobServices> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let translate_provider = if specs.iter().any(|s| s.translate) {
        build_translate_provider(config, timeout)
    } else {
        None
    };

    let tts = tts::create_backend(config.backend, timeout)
        .with_context(|| format!("Failed to set up {:?} speech backend", config.backend))?;
    let concatenator = audio::create_concatenator(config.assembler)?;

    let scratch_root = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pdf-audio")
        .join("temp");

    log::debug!(
        "tts={} assembler={} scratch={}",
        tts.name(),
        concatenator.name(),
        scratch_root.display()
    );

    Ok(JobServices {
        loader: Arc::new(pdf::LopdfLoader),
        translate_provider,
        tts,
        concatenator,
        scratch_root,
        failure_policy: config.on_synthesis_failure,
        translate_scope: config.translate_scope,
    })
}

/// A provider that can't be set up leaves translation off rather than
/// stopping the run.
fn build_translate_provider(
    config: &PdfAudioConfig,
    timeout: Duration,
) -> Option<Arc<dyn TranslateProvider>> {
    let result = translate_client::Config::load().and_then(|client_config| {
        let kind = ProviderKind::from_str(
            client_config.provider_name(config.translate_provider.as_deref()),
        )?;
        translate_client::get_provider(
            kind,
            client_config.get_provider_config(kind.config_key()),
            timeout,
        )
    });

    match result {
        Ok(provider) => {
            log::info!("translating with {}", provider.name());
            Some(Arc::from(provider))
        }
        Err(e) => {
            log::warn!("translation provider unavailable, speaking original text: {}", e);
            None
        }
    }
}

fn print_summary(results: &[JobResult]) {
    eprintln!();
    for result in results {
        match &result.outcome {
            Ok(report) => {
                let size_mb = std::fs::metadata(&report.output_path)
                    .map(|m| m.len() as f64 / 1_000_000.0)
                    .unwrap_or(0.0);
                let duration = audio::assembler::get_audio_duration_ms(&report.output_path)
                    .map(|ms| format!(", {}", format_duration(ms)))
                    .unwrap_or_default();
                eprintln!(
                    "OK   {} -> {} ({:.1} MB{})",
                    result.source_path.display(),
                    report.output_path.display(),
                    size_mb,
                    duration
                );
                if report.skipped_chunks > 0 || report.translation_fallbacks > 0 {
                    eprintln!(
                        "     {} of {} chunks skipped, {} untranslated",
                        report.skipped_chunks, report.chunks, report.translation_fallbacks
                    );
                }
            }
            Err(failure) => {
                eprintln!("FAIL {}: {}", result.source_path.display(), failure);
            }
        }
        if !result.cleanup_failures.is_empty() {
            eprintln!(
                "     {} scratch file(s) left behind",
                result.cleanup_failures.len()
            );
        }
    }
}

fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PdfAudioConfig::load()?;
            println!("Configuration file: {:?}", PdfAudioConfig::config_path()?);
            println!();
            println!("voice = \"{}\"", config.voice);
            println!("backend = {:?}", config.backend);
            println!("chunk_size = {}", config.chunk_size);
            println!("source_lang = \"{}\"", config.source_lang);
            match &config.target_lang {
                Some(lang) => println!("target_lang = \"{}\"", lang),
                None => println!(
                    "target_lang = (voice language: {})",
                    config.effective_target_lang()
                ),
            }
            match &config.translate_provider {
                Some(provider) => println!("translate_provider = \"{}\"", provider),
                None => println!("translate_provider = (translate.toml default)"),
            }
            println!("translate_scope = {:?}", config.translate_scope);
            println!("request_timeout_secs = {}", config.request_timeout_secs);
            println!("on_synthesis_failure = {:?}", config.on_synthesis_failure);
            println!("assembler = {:?}", config.assembler);
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = PdfAudioConfig::load()?;
            config.voice = voice.clone();
            config.save()?;
            println!("Default voice set to: {}", config.voice);
        }
        ConfigAction::SetBackend { backend } => {
            let mut config = PdfAudioConfig::load()?;
            config.backend = *backend;
            config.save()?;
            println!("Default backend set to: {:?}", config.backend);
        }
        ConfigAction::SetChunkSize { value } => {
            let mut config = PdfAudioConfig::load()?;
            config.chunk_size = *value;
            config.save()?;
            println!("Default chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetTargetLang { lang } => {
            let mut config = PdfAudioConfig::load()?;
            config.target_lang = Some(lang.clone());
            config.save()?;
            println!("Default target language set to: {}", lang);
        }
        ConfigAction::SetFailurePolicy { policy } => {
            let mut config = PdfAudioConfig::load()?;
            config.on_synthesis_failure = *policy;
            config.save()?;
            println!("Synthesis failure policy set to: {:?}", config.on_synthesis_failure);
        }
    }
    Ok(())
}
