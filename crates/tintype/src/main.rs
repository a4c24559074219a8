//! tintype CLI - apply an ICC profile to every TIFF in a directory.
//!
//! Each `name.tif` produces `name_icc.tif` (converted into, or tagged with,
//! the target profile and optionally lens-corrected) and `name.exif.json`.
//!
//! # Usage
//!
//! ```bash
//! # Tag or convert every TIFF in ./scans
//! tintype ./scans ./AdobeRGB1998.icc
//!
//! # Also correct barrel distortion
//! tintype ./scans ./AdobeRGB1998.icc "0.0, -0.02, 0.0"
//!
//! # Cap concurrency and emit JSON logs
//! tintype -p 2 --json-logs ./scans ./AdobeRGB1998.icc
//! ```

use std::ffi::OsString;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;
use tintype_core::config::LoggingConfig;

mod cli;
mod logging;

/// tintype - batch ICC profiling and lens correction for TIFF scans.
#[derive(Parser, Debug)]
#[command(name = "tintype")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,

    #[command(flatten)]
    run: cli::RunArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run(std::env::args_os()).await
}

/// Parse arguments and execute the run.
///
/// Argument errors are fatal-tier like any other: logged, followed by the
/// elapsed time, with a normal exit. `--help` and `--version` still print and
/// exit through clap.
async fn run<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let start = Instant::now();
    let logs = logging::LogWriter::default();

    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            logging::init(&LoggingConfig::default(), logs);
            tracing::error!("{}", e.to_string().trim_end());
            cli::print_elapsed(start.elapsed());
            return Ok(());
        }
    };

    let mut config = tintype_core::Config::with_parallel(cli.run.parallel);
    config.apply_log_flags(cli.verbose, cli.json_logs);
    logging::init(&config.logging, logs.clone());

    tracing::debug!("tintype v{}", tintype_core::VERSION);

    cli::execute(cli.run, config, logs, start).await
}
