//! Image attribute extraction and the `.exif.json` sidecar.

use exif::{In, Reader};
use image::DynamicImage;
use lcms2::{InfoType, Locale, Profile};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::decode::color_type_to_string;
use crate::error::PipelineError;
use crate::types::ExifRecord;

/// TIFF tag number of the embedded ICC profile; summarized as `icc:description` instead.
const ICC_TAG_NUMBER: u16 = 34675;

/// Extracts image attributes into an [`ExifRecord`].
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Build the attribute record for a processed image.
    ///
    /// Order: decoded image properties, the applied ICC profile description,
    /// then every primary-IFD field of the source file as `exif:<Tag>`.
    /// EXIF reading is lenient: a file without readable EXIF still yields the
    /// image properties.
    pub fn extract(source: &Path, image: &DynamicImage, profile: Option<&[u8]>) -> ExifRecord {
        let mut record = ExifRecord::new();
        record.insert("image:width", image.width().to_string());
        record.insert("image:height", image.height().to_string());
        record.insert("image:color-type", color_type_to_string(image.color()));

        if let Some(description) = profile.and_then(Self::profile_description) {
            record.insert("icc:description", description);
        }

        for (key, value) in Self::read_exif(source) {
            record.insert(key, value);
        }
        record
    }

    /// Serialize a record as pretty JSON, replacing any existing sidecar.
    pub fn write_sidecar(path: &Path, record: &ExifRecord) -> Result<(), PipelineError> {
        let metadata_err = |message: String| PipelineError::Metadata {
            path: path.to_path_buf(),
            message,
        };

        let file = File::create(path).map_err(|e| metadata_err(format!("Cannot create sidecar: {}", e)))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record).map_err(|e| metadata_err(e.to_string()))?;
        writeln!(writer).map_err(|e| metadata_err(e.to_string()))?;
        writer.flush().map_err(|e| metadata_err(e.to_string()))
    }

    fn read_exif(path: &Path) -> Vec<(String, String)> {
        let Ok(file) = File::open(path) else {
            return Vec::new();
        };
        let mut reader = BufReader::new(file);
        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(e) => {
                tracing::debug!("No EXIF in {:?}: {}", path, e);
                return Vec::new();
            }
        };

        exif.fields()
            .filter(|f| f.ifd_num == In::PRIMARY && f.tag.number() != ICC_TAG_NUMBER)
            .map(|f| {
                let value = f.display_value().with_unit(&exif).to_string();
                (
                    format!("exif:{}", f.tag),
                    value.trim_matches('"').to_string(),
                )
            })
            .collect()
    }

    fn profile_description(bytes: &[u8]) -> Option<String> {
        Profile::new_icc(bytes)
            .ok()?
            .info(InfoType::Description, Locale::none())
    }
}
