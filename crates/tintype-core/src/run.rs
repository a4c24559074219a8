//! Run setup: turns raw command-line input into an immutable [`RunConfig`].
//!
//! Everything here runs before the first file is touched, so any error is
//! fatal for the whole batch.

use lcms2::{InfoType, Locale, Profile};
use std::path::{Path, PathBuf};

use crate::error::ValidationError;
use crate::pipeline::LensCorrection;

/// Required extension of the target profile file.
pub const PROFILE_EXTENSION: &str = "icc";

/// Raw, unvalidated input for one run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Directory containing the TIFF images
    pub source_dir: PathBuf,
    /// Path to the target ICC profile
    pub profile_path: PathBuf,
    /// Optional barrel coefficients, e.g. `"0.1, -0.2, 0.3"`
    pub lens_params: Option<String>,
}

/// A validated ICC profile, kept as raw bytes.
///
/// `lcms2::Profile` is not `Sync`, so workers re-open these bytes instead of
/// sharing a handle.
#[derive(Debug, Clone)]
pub struct TargetProfile {
    path: PathBuf,
    bytes: Vec<u8>,
    description: Option<String>,
}

impl TargetProfile {
    /// Read and parse a profile from disk.
    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let bytes = std::fs::read(path).map_err(|e| ValidationError::ProfileLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let profile = Profile::new_icc(&bytes).map_err(|e| ValidationError::ProfileLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let description = profile.info(InfoType::Description, Locale::none());

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            description,
        })
    }

    /// Open a fresh lcms2 handle on the profile bytes.
    pub fn open(&self) -> lcms2::LCMSResult<Profile> {
        Profile::new_icc(&self.bytes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Immutable settings shared by every worker in a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_dir: PathBuf,
    pub profile: TargetProfile,
    pub lens: Option<LensCorrection>,
}

impl RunConfig {
    /// Validate a request and load its profile.
    ///
    /// Checks run cheapest first: directory, profile existence, profile
    /// extension, lens parameters, and finally the profile contents.
    pub fn from_request(request: &RunRequest) -> Result<Self, ValidationError> {
        if !request.source_dir.is_dir() {
            return Err(ValidationError::DirectoryNotFound(
                request.source_dir.clone(),
            ));
        }

        let profile_path = &request.profile_path;
        if !profile_path.is_file() {
            return Err(ValidationError::ProfileNotFound(profile_path.clone()));
        }

        let extension = profile_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if !extension.eq_ignore_ascii_case(PROFILE_EXTENSION) {
            return Err(ValidationError::InvalidProfileExtension {
                path: profile_path.clone(),
                extension: extension.to_string(),
            });
        }

        let lens = request
            .lens_params
            .as_deref()
            .map(str::parse::<LensCorrection>)
            .transpose()?;

        let profile = TargetProfile::load(profile_path)?;
        tracing::debug!(
            "Loaded target profile {:?} ({} bytes, {})",
            profile_path,
            profile.bytes().len(),
            profile.description().unwrap_or("no description")
        );

        Ok(Self {
            source_dir: request.source_dir.clone(),
            profile,
            lens,
        })
    }
}
