//! Error types for the tintype batch pipeline.
//!
//! Errors are split by tier: validation and configuration errors abort the
//! whole run before any file is touched, while pipeline errors are scoped to a
//! single file and never leave its task.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for tintype operations.
#[derive(Error, Debug)]
pub enum TintypeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid command-line input
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Fatal input errors, raised before any file is processed.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Source directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("ICC profile not found: {0}")]
    ProfileNotFound(PathBuf),

    #[error("ICC profile must have a .icc extension, got {extension:?}: {path}")]
    InvalidProfileExtension { path: PathBuf, extension: String },

    #[error("Failed to load ICC profile {path}: {message}")]
    ProfileLoad { path: PathBuf, message: String },

    #[error("Lens parameters need exactly 3 values (a, b, c), got {count} in {raw:?}")]
    InvalidLensParams { count: usize, raw: String },

    #[error("Lens parameter {token:?} in {raw:?} is not a finite number")]
    LensParamParse { token: String, raw: String },
}

/// Per-file pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Writing the processed image failed
    #[error("Export failed for {path}: {message}")]
    Export { path: PathBuf, message: String },

    /// Metadata extraction or sidecar write failed
    #[error("Metadata extraction failed for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// The worker running this file died before reporting back
    #[error("Worker for {path} aborted: {message}")]
    Worker { path: PathBuf, message: String },
}

/// Convenience type alias for tintype results.
pub type Result<T> = std::result::Result<T, TintypeError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
