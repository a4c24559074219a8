//! Core data types for the tintype pipeline.
//!
//! These types describe what a single file produced and how a batch went.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// Image attributes extracted for the sidecar file.
///
/// Keys are unique and keep their insertion order, which is also the order
/// of the serialized JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifRecord {
    entries: Vec<(String, String)>,
}

impl ExifRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for ExifRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// What the color stage did to an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorOutcome {
    /// Pixels were transformed from the embedded profile into the target
    Converted,
    /// The image had no profile; the target was attached without touching pixels
    Embedded,
    /// The transform could not run; pixels and source profile were left as-is
    Unconverted { reason: String },
}

/// Summary of one successfully processed file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Input image
    pub source: PathBuf,
    /// Generated `<stem>_icc.<ext>` image
    pub image_path: PathBuf,
    /// Generated `<stem>.exif.json` sidecar
    pub sidecar_path: PathBuf,
    /// Whether barrel correction ran
    pub lens_corrected: bool,
    /// Result of the color stage
    pub color: ColorOutcome,
    /// Wall-clock time spent on this file
    pub elapsed: Duration,
}

/// Tagged per-file result handed from a worker to the reporter.
#[derive(Debug)]
pub enum FileOutcome {
    Completed(FileReport),
    Failed { path: PathBuf, error: String },
}

impl FileOutcome {
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileOutcome::Completed(report) => &report.source,
            FileOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Completed(_))
    }
}

/// Counts collected over one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Files whose outputs were written (includes `unconverted`)
    pub succeeded: usize,
    /// Written files whose color transform did not run
    pub unconverted: usize,
    /// Files that produced no output
    pub failed: usize,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Completed(report) => {
                self.succeeded += 1;
                if matches!(report.color, ColorOutcome::Unconverted { .. }) {
                    self.unconverted += 1;
                }
            }
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
