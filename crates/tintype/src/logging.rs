//! Logging initialization.
//!
//! Log lines go to stderr, which is also where the progress bar draws. Every
//! line is written through [`LogWriter`], which hides an attached bar while
//! the line is printed so the two never interleave.

use std::io::{self, Write};
use std::sync::{Arc, RwLock};

use indicatif::ProgressBar;
use tintype_core::config::LoggingConfig;
use tracing_subscriber::{fmt, fmt::MakeWriter, prelude::*, EnvFilter};

/// Shared stderr sink that cooperates with the active progress bar.
#[derive(Clone, Default)]
pub struct LogWriter {
    bar: Arc<RwLock<Option<ProgressBar>>>,
}

impl LogWriter {
    /// Route subsequent log lines around `bar`.
    pub fn attach(&self, bar: &ProgressBar) {
        if let Ok(mut slot) = self.bar.write() {
            *slot = Some(bar.clone());
        }
    }

    pub fn detach(&self) {
        if let Ok(mut slot) = self.bar.write() {
            *slot = None;
        }
    }

    fn active_bar(&self) -> Option<ProgressBar> {
        self.bar.read().ok().and_then(|slot| slot.clone())
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogLine;

    fn make_writer(&'a self) -> Self::Writer {
        LogLine {
            buf: Vec::with_capacity(256),
            bar: self.active_bar(),
        }
    }
}

/// One formatted event, flushed to stderr when dropped.
pub struct LogLine {
    buf: Vec<u8>,
    bar: Option<ProgressBar>,
}

impl Write for LogLine {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogLine {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let emit = |buf: &[u8]| {
            let _ = io::stderr().lock().write_all(buf);
        };
        match &self.bar {
            Some(bar) if !bar.is_hidden() => bar.suspend(|| emit(&self.buf)),
            _ => emit(&self.buf),
        }
    }
}

/// Initialize the logging subsystem from the logging config.
///
/// `RUST_LOG` overrides `config.level` when set. Calling this twice keeps the
/// first subscriber.
pub fn init(config: &LoggingConfig, writer: LogWriter) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(writer)
                    .with_ansi(console::colors_enabled_stderr()),
            )
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Logging already initialized: {e}");
    }
}
