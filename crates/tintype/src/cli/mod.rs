//! The single `tintype` run: validate inputs, discover files, dispatch, report.

mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use tintype_core::pipeline::FileDiscovery;
use tintype_core::{BatchStats, Config, Dispatcher, FilePipeline, RunConfig, RunRequest};

use crate::logging::LogWriter;
pub use report::print_elapsed;
use report::{print_summary, BatchProgress};

/// Positional inputs and run options.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Directory containing the .tif files to process
    pub source_dir: PathBuf,

    /// ICC profile (.icc) to convert into or embed
    pub profile: PathBuf,

    /// Barrel distortion coefficients "a, b, c" (comma and/or space separated)
    #[arg(allow_hyphen_values = true)]
    pub lens: Option<String>,

    /// Ignored extra arguments
    #[arg(hide = true)]
    pub extra: Vec<String>,

    /// Maximum number of files processed at once (defaults to CPU count)
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

impl RunArgs {
    fn request(&self) -> RunRequest {
        RunRequest {
            source_dir: self.source_dir.clone(),
            profile_path: self.profile.clone(),
            lens_params: self.lens.clone(),
        }
    }
}

/// Execute one run.
///
/// Fatal problems are logged and end the run early; the elapsed time since
/// `start` is always printed and the process exits normally.
pub async fn execute(
    args: RunArgs,
    config: Config,
    logs: LogWriter,
    start: Instant,
) -> anyhow::Result<()> {
    match run(&args, &config, logs).await {
        Ok(stats) => print_summary(&stats),
        Err(e) => tracing::error!("{e:#}"),
    }
    print_elapsed(start.elapsed());
    Ok(())
}

/// Validate, discover and dispatch. `Err` is a fatal problem: nothing was
/// processed.
async fn run(args: &RunArgs, config: &Config, logs: LogWriter) -> anyhow::Result<BatchStats> {
    config.validate().context("Invalid configuration")?;

    if !args.extra.is_empty() {
        tracing::warn!(
            "Ignoring {} extra argument(s): {}",
            args.extra.len(),
            args.extra.join(" ")
        );
    }

    let run_config = RunConfig::from_request(&args.request())?;

    match run_config.profile.description() {
        Some(description) => tracing::info!("Target profile: {description}"),
        None => tracing::info!("Target profile: {}", run_config.profile.path().display()),
    }
    if let Some(lens) = &run_config.lens {
        tracing::info!("Lens correction: a={} b={} c={} d={}", lens.a, lens.b, lens.c, lens.d());
    }

    let pipeline = Arc::new(FilePipeline::new(config));
    let files = pipeline.discover(&run_config.source_dir);
    tracing::info!(
        "Found {} file(s) in {:?} ({:.1} MB)",
        files.len(),
        run_config.source_dir,
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0
    );
    if files.is_empty() {
        return Ok(BatchStats::default());
    }

    let workers = config.processing.parallel_workers;
    tracing::debug!("Processing with {} worker(s)", workers);

    let progress = Arc::new(BatchProgress::new(files.len() as u64, logs));
    let sink = progress.clone();
    let dispatcher = Dispatcher::new(pipeline, Arc::new(run_config), workers);
    let stats = dispatcher
        .run_all(files, move |outcome| sink.record(outcome))
        .await;
    progress.finish();

    Ok(stats)
}
