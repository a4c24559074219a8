//! Concurrent fan-out of per-file work.
//!
//! One tokio task per file, bounded by a semaphore. Pixel work runs on the
//! blocking pool. Outcomes are delivered through a callback as they complete
//! and the dispatcher returns only after every task has finished.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::run::RunConfig;
use crate::types::{BatchStats, FileOutcome};

use super::discovery::DiscoveredFile;
use super::processor::{FilePipeline, FileTask};

/// Runs a batch of files through a shared [`FilePipeline`].
pub struct Dispatcher {
    pipeline: Arc<FilePipeline>,
    run: Arc<RunConfig>,
    parallel: usize,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<FilePipeline>, run: Arc<RunConfig>, parallel: usize) -> Self {
        Self {
            pipeline,
            run,
            parallel: parallel.max(1),
        }
    }

    /// Process every file and wait for all of them.
    ///
    /// `on_outcome` is called once per file, in completion order. A panicking
    /// worker is reported as a failed file; it never aborts the batch.
    pub async fn run_all<F>(&self, files: Vec<DiscoveredFile>, on_outcome: F) -> BatchStats
    where
        F: Fn(&FileOutcome) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let on_outcome = Arc::new(on_outcome);
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Dispatch semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };

            let task = FileTask {
                path: file.path,
                run: self.run.clone(),
            };
            let pipeline = self.pipeline.clone();
            let on_outcome = on_outcome.clone();

            let handle = tokio::spawn(async move {
                let path = task.path.clone();
                let outcome = match tokio::task::spawn_blocking(move || pipeline.process(&task)).await {
                    Ok(outcome) => outcome,
                    Err(e) => FileOutcome::Failed {
                        path,
                        error: format!("worker aborted: {e}"),
                    },
                };
                drop(permit); // Release concurrency permit before callback
                on_outcome(&outcome);
                outcome
            });

            handles.push(handle);
        }

        let mut stats = BatchStats::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => stats.record(&outcome),
                Err(e) => {
                    tracing::error!("Dispatch task panicked: {e}");
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::run::TargetProfile;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    fn setup(dir: &Path) -> (Arc<FilePipeline>, Arc<RunConfig>) {
        let profile_path = dir.join("target.icc");
        std::fs::write(&profile_path, lcms2::Profile::new_srgb().icc().unwrap()).unwrap();
        let run = RunConfig {
            source_dir: dir.to_path_buf(),
            profile: TargetProfile::load(&profile_path).unwrap(),
            lens: None,
        };
        (
            Arc::new(FilePipeline::new(&Config::default())),
            Arc::new(run),
        )
    }

    fn write_tif(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([5, 6, 7])))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_run_all_reports_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, run) = setup(dir.path());
        for name in ["a.tif", "b.tif", "c.tif", "d.tif", "e.tif"] {
            write_tif(dir.path(), name);
        }
        std::fs::write(dir.path().join("bad.tif"), b"MM\0*truncated").unwrap();

        let files = pipeline.discover(dir.path());
        assert_eq!(files.len(), 6);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let dispatcher = Dispatcher::new(pipeline, run, 2);
        let stats = dispatcher
            .run_all(files, move |outcome| {
                sink.lock()
                    .unwrap()
                    .push((outcome.path().to_path_buf(), outcome.is_success()))
            })
            .await;

        assert_eq!(stats.succeeded, 5);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total(), 6);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        let failed: Vec<_> = seen.iter().filter(|(_, ok)| !ok).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].0.ends_with("bad.tif"));
    }

    #[tokio::test]
    async fn test_run_all_with_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, run) = setup(dir.path());

        let stats = Dispatcher::new(pipeline, run, 4)
            .run_all(Vec::new(), |_| {})
            .await;
        assert_eq!(stats, BatchStats::default());
    }

    #[test]
    fn test_parallel_is_at_least_one() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, run) = setup(dir.path());
        let dispatcher = Dispatcher::new(pipeline, run, 0);
        assert_eq!(dispatcher.parallel, 1);
    }
}
