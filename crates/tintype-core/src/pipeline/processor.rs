//! Per-file pipeline: decode, correct, apply profile, export, write metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, ProcessingConfig};
use crate::error::PipelineError;
use crate::run::RunConfig;
use crate::types::{ColorOutcome, FileOutcome, FileReport};

use super::color::apply_profile;
use super::decode::ImageDecoder;
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::export::{write_tiff, OutputPaths};
use super::metadata::MetadataExtractor;
use super::validate::Validator;

/// One unit of work: a source file and the run it belongs to.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    pub run: Arc<RunConfig>,
}

/// Runs the per-file stages. Shared by every worker of a batch.
pub struct FilePipeline {
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    naming: ProcessingConfig,
}

impl FilePipeline {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            naming: config.processing.clone(),
        }
    }

    /// Discover input files in a directory.
    pub fn discover(&self, dir: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(dir)
    }

    /// Output paths for a source file.
    pub fn output_paths(&self, source: &Path) -> OutputPaths {
        OutputPaths::for_source(source, &self.naming)
    }

    /// Process one file. Never fails: errors become [`FileOutcome::Failed`].
    ///
    /// The written paths are reported through the returned [`FileReport`].
    ///
    /// Blocking; the dispatcher runs it on the blocking pool.
    pub fn process(&self, task: &FileTask) -> FileOutcome {
        match self.run_stages(task) {
            Ok(report) => FileOutcome::Completed(report),
            Err(e) => FileOutcome::Failed {
                path: task.path.clone(),
                error: e.to_string(),
            },
        }
    }

    fn run_stages(&self, task: &FileTask) -> Result<FileReport, PipelineError> {
        let start = Instant::now();
        let path = task.path.as_path();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        tracing::info!("Processing {}", file_name);

        self.validator.validate(path)?;

        let decode_start = Instant::now();
        let decoded = self.decoder.decode(path)?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let mut image = decoded.image;
        let lens_corrected = match &task.run.lens {
            Some(lens) => {
                let lens_start = Instant::now();
                image = lens.apply(&image);
                tracing::trace!("  Barrel correction: {:?}", lens_start.elapsed());
                true
            }
            None => false,
        };

        let color_start = Instant::now();
        let applied = apply_profile(&mut image, decoded.icc_profile.as_deref(), &task.run.profile);
        tracing::trace!("  Color: {:?}", color_start.elapsed());
        if let ColorOutcome::Unconverted { reason } = &applied.outcome {
            tracing::warn!(
                "Color transform skipped for {}: {} (writing original pixels)",
                file_name,
                reason
            );
        }

        let outputs = self.output_paths(path);
        write_tiff(&outputs.image, &image, Some(&applied.profile))?;

        let record = MetadataExtractor::extract(path, &image, Some(&applied.profile));
        MetadataExtractor::write_sidecar(&outputs.sidecar, &record)?;

        let elapsed = start.elapsed();
        tracing::debug!(
            "Processed {} in {:?} ({}x{}, {} bytes)",
            file_name,
            elapsed,
            decoded.width,
            decoded.height,
            decoded.file_size
        );

        Ok(FileReport {
            source: path.to_path_buf(),
            image_path: outputs.image,
            sidecar_path: outputs.sidecar,
            lens_corrected,
            color: applied.outcome,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::LensCorrection;
    use crate::run::TargetProfile;
    use image::{DynamicImage, Rgb, RgbImage};

    fn run_config(dir: &Path, lens: Option<LensCorrection>) -> Arc<RunConfig> {
        let profile_path = dir.join("target.icc");
        std::fs::write(&profile_path, lcms2::Profile::new_srgb().icc().unwrap()).unwrap();
        Arc::new(RunConfig {
            source_dir: dir.to_path_buf(),
            profile: TargetProfile::load(&profile_path).unwrap(),
            lens,
        })
    }

    #[test]
    fn test_process_writes_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.tif");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([90, 80, 70])))
            .save(&source)
            .unwrap();

        let pipeline = FilePipeline::new(&Config::default());
        let task = FileTask {
            path: source.clone(),
            run: run_config(dir.path(), Some(LensCorrection::new(0.0, 0.0, 0.0))),
        };

        match pipeline.process(&task) {
            FileOutcome::Completed(report) => {
                assert_eq!(report.color, ColorOutcome::Embedded);
                assert!(report.lens_corrected);
                assert_eq!(report.image_path, dir.path().join("scan_icc.tif"));
                assert_eq!(report.sidecar_path, dir.path().join("scan.exif.json"));
                assert!(report.image_path.is_file());
                assert!(report.sidecar_path.is_file());
            }
            FileOutcome::Failed { error, .. } => panic!("processing failed: {error}"),
        }
    }

    #[test]
    fn test_process_reports_failure_without_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.tif");
        std::fs::write(&source, b"II*\0not really a tiff").unwrap();

        let pipeline = FilePipeline::new(&Config::default());
        let task = FileTask {
            path: source.clone(),
            run: run_config(dir.path(), None),
        };

        let outcome = pipeline.process(&task);
        assert!(!outcome.is_success());
        assert_eq!(outcome.path(), source.as_path());
        assert!(!dir.path().join("broken_icc.tif").exists());
        assert!(!dir.path().join("broken.exif.json").exists());
    }

    #[test]
    fn test_process_rejects_oversized_image() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("wide.tif");
        DynamicImage::new_rgb8(32, 2).save(&source).unwrap();

        let mut config = Config::default();
        config.limits.max_image_dimension = 16;
        let pipeline = FilePipeline::new(&config);
        let task = FileTask {
            path: source,
            run: run_config(dir.path(), None),
        };

        match pipeline.process(&task) {
            FileOutcome::Failed { error, .. } => assert!(error.contains("Image too large")),
            FileOutcome::Completed(_) => panic!("expected a size failure"),
        }
    }
}
