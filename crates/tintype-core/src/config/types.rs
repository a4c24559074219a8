//! Sub-configuration structs with their defaults.

/// Processing settings.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Maximum number of files processed at the same time
    pub parallel_workers: usize,

    /// Extension of input images (without the dot)
    pub input_extension: String,

    /// Suffix inserted between the stem and extension of generated images
    pub output_suffix: String,

    /// Suffix appended to the stem for the metadata sidecar
    pub sidecar_suffix: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: default_parallel_workers(),
            input_extension: "tif".to_string(),
            output_suffix: "_icc".to_string(),
            sidecar_suffix: ".exif.json".to_string(),
        }
    }
}

/// Number of cores available to this process, or 4 if unknown.
pub fn default_parallel_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 4096,
            max_image_dimension: 65535,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
