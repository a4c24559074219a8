//! Runtime configuration for tintype.
//!
//! There is no configuration file: every run starts from [`Config::default`]
//! and the CLI applies its overrides before calling [`Config::validate`].

mod types;
mod validate;

pub use types::*;

/// Root configuration structure.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Default configuration with an optional worker-count override.
    pub fn with_parallel(parallel: Option<usize>) -> Self {
        let mut config = Self::default();
        if let Some(workers) = parallel {
            config.processing.parallel_workers = workers;
        }
        config
    }

    /// Apply the `--verbose` / `--json-logs` flags to the logging section.
    pub fn apply_log_flags(&mut self, verbose: bool, json: bool) {
        if verbose {
            self.logging.level = "debug".to_string();
        }
        if json {
            self.logging.format = "json".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.processing.parallel_workers > 0);
        assert_eq!(config.processing.input_extension, "tif");
        assert_eq!(config.processing.output_suffix, "_icc");
        assert_eq!(config.processing.sidecar_suffix, ".exif.json");
        assert_eq!(config.limits.max_file_size_mb, 4096);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_with_parallel_override() {
        let config = Config::with_parallel(Some(3));
        assert_eq!(config.processing.parallel_workers, 3);

        let config = Config::with_parallel(None);
        assert_eq!(
            config.processing.parallel_workers,
            default_parallel_workers()
        );
    }

    #[test]
    fn test_apply_log_flags() {
        let mut config = Config::default();
        config.apply_log_flags(false, false);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");

        config.apply_log_flags(true, true);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }
}
