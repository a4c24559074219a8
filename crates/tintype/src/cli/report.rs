//! Progress display, per-file result lines and the final summary.

use std::io::{self, Write};
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use tintype_core::{BatchStats, FileOutcome};

use crate::logging::LogWriter;

/// Progress bar fed by dispatcher outcomes.
///
/// indicatif hides the bar when stderr is not a terminal. While the bar is
/// alive, log lines are routed around it through the [`LogWriter`].
pub struct BatchProgress {
    bar: ProgressBar,
    logs: LogWriter,
}

impl BatchProgress {
    pub fn new(total: u64, logs: LogWriter) -> Self {
        let bar = create_progress_bar(total);
        logs.attach(&bar);
        Self { bar, logs }
    }

    /// Report one finished file and advance the bar.
    pub fn record(&self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Completed(report) => {
                tracing::info!("Wrote {}", report.image_path.display());
                tracing::info!("Wrote metadata {}", report.sidecar_path.display());
                tracing::debug!(
                    "Finished {} in {:?} (lens corrected: {})",
                    report.source.display(),
                    report.elapsed,
                    report.lens_corrected
                );
            }
            FileOutcome::Failed { path, error } => {
                tracing::error!("Failed {}: {}", path.display(), error);
            }
        }
        if let Some(name) = outcome.path().file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
        self.logs.detach();
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print the end-of-run table to stderr.
pub fn print_summary(stats: &BatchStats) {
    let label = Style::new().for_stderr().bold();
    let warn = Style::new().for_stderr().yellow();
    let fail = Style::new().for_stderr().red();

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               {}", label.apply_to("Summary"));
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.unconverted > 0 {
        eprintln!(
            "    {}  {:>8}",
            warn.apply_to("Unconverted:"),
            stats.unconverted
        );
    }
    if stats.failed > 0 {
        eprintln!("    {}       {:>8}", fail.apply_to("Failed:"), stats.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total());
    eprintln!("  ====================================");
}

/// Print the elapsed-time line to stderr.
pub fn print_elapsed(elapsed: Duration) {
    let _ = write_elapsed(&mut io::stderr().lock(), elapsed);
}

fn write_elapsed<W: Write>(out: &mut W, elapsed: Duration) -> io::Result<()> {
    writeln!(out, "Elapsed: {}", format_elapsed(elapsed))
}

/// Format a duration as `<m>m <ss>s`, truncated to whole seconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {:02}s", secs / 60, secs % 60)
}
