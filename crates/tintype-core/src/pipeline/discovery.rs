//! File discovery for finding input TIFFs in a directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers input images directly inside a directory.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover all input images in `dir` (non-recursive).
    ///
    /// Files generated by an earlier run (`<stem>_icc.tif`) are skipped so a
    /// directory can be processed again without feeding outputs back in.
    pub fn discover(&self, dir: &Path) -> Vec<DiscoveredFile> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if self.is_generated(entry_path) {
                tracing::debug!("Skipping generated file {:?}", entry_path);
                continue;
            }
            if self.is_input(entry_path) {
                if let Ok(meta) = entry.metadata() {
                    files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                    });
                }
            }
        }

        // Sort by path so logs are reproducible; processing order is still concurrent.
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has the input extension.
    fn is_input(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.config.input_extension))
            .unwrap_or(false)
    }

    /// Check if a file name carries the output marker, e.g. `scan_icc.tif`.
    fn is_generated(&self, path: &Path) -> bool {
        let marker = format!(
            "{}.{}",
            self.config.output_suffix, self.config.input_extension
        )
        .to_lowercase();
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| name.to_lowercase().ends_with(&marker))
            .unwrap_or(false)
    }

    /// Total size of all discovered files, in bytes.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery() -> FileDiscovery {
        FileDiscovery::new(ProcessingConfig::default())
    }

    #[test]
    fn test_is_input() {
        let discovery = discovery();

        assert!(discovery.is_input(Path::new("scan.tif")));
        assert!(discovery.is_input(Path::new("scan.TIF")));
        assert!(!discovery.is_input(Path::new("scan.tiff")));
        assert!(!discovery.is_input(Path::new("scan.jpg")));
        assert!(!discovery.is_input(Path::new("scan.exif.json")));
        assert!(!discovery.is_input(Path::new("tif")));
    }

    #[test]
    fn test_is_generated() {
        let discovery = discovery();

        assert!(discovery.is_generated(Path::new("scan_icc.tif")));
        assert!(discovery.is_generated(Path::new("scan_ICC.TIF")));
        assert!(!discovery.is_generated(Path::new("scan.tif")));
        assert!(!discovery.is_generated(Path::new("icc_scan.tif")));
    }

    #[test]
    fn test_discover_filters_outputs_and_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "b.tif",
            "a.TIF",
            "a_icc.tif",
            "c_ICC.tif",
            "notes.txt",
            "a.exif.json",
            "d.tiff",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.tif")).unwrap();
        std::fs::write(dir.path().join("nested.tif").join("deep.tif"), b"x").unwrap();

        let files = discovery().discover(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.TIF", "b.tif"]);
        assert_eq!(FileDiscovery::total_size(&files), 2);
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discovery().discover(dir.path()).is_empty());
    }

    #[test]
    fn test_total_size() {
        let files = vec![
            DiscoveredFile {
                path: PathBuf::from("a.tif"),
                size: 100,
            },
            DiscoveredFile {
                path: PathBuf::from("b.tif"),
                size: 200,
            },
        ];

        assert_eq!(FileDiscovery::total_size(&files), 300);
    }
}
