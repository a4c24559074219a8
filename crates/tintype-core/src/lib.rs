//! tintype core - batch ICC profiling for directories of TIFF images.
//!
//! Every `.tif` in a directory gets the target ICC profile (converted into
//! when the image already carries a profile, attached otherwise), an optional
//! barrel lens correction, and a JSON sidecar of its attributes.
//!
//! # Architecture
//!
//! ```text
//! RunRequest → RunConfig → discover → Dispatcher ─┬─ FilePipeline (file 1)
//!                                                 ├─ FilePipeline (file 2)
//!                                                 └─ ...
//! FilePipeline: validate → decode → lens → color → export → sidecar
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tintype_core::{Config, Dispatcher, FilePipeline, RunConfig, RunRequest};
//!
//! #[tokio::main]
//! async fn main() -> tintype_core::Result<()> {
//!     let config = Config::default();
//!     let run = RunConfig::from_request(&RunRequest {
//!         source_dir: "./scans".into(),
//!         profile_path: "./AdobeRGB1998.icc".into(),
//!         lens_params: Some("0.0 -0.02 0.0".into()),
//!     })?;
//!
//!     let pipeline = Arc::new(FilePipeline::new(&config));
//!     let files = pipeline.discover(&run.source_dir);
//!     let dispatcher = Dispatcher::new(pipeline, Arc::new(run), config.processing.parallel_workers);
//!     let stats = dispatcher.run_all(files, |outcome| println!("{:?}", outcome.path())).await;
//!     println!("{} ok, {} failed", stats.succeeded, stats.failed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod run;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, TintypeError, ValidationError};
pub use pipeline::{DiscoveredFile, Dispatcher, FilePipeline, FileTask, LensCorrection};
pub use run::{RunConfig, RunRequest, TargetProfile};
pub use types::{BatchStats, ColorOutcome, ExifRecord, FileOutcome, FileReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
