//! TIFF decoding with embedded ICC profile capture and dimension limits.

use image::codecs::tiff::TiffDecoder;
use image::{ColorType, DynamicImage, ImageDecoder as _, Limits};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Embedded ICC profile, if the file carries a non-empty one
    pub icc_profile: Option<Vec<u8>>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Original file size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode a TIFF file.
    ///
    /// Dimensions are checked from the header before any pixel data is read.
    /// Blocking; callers run it on the blocking pool.
    pub fn decode(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        let decode_err = |message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| decode_err(format!("Cannot open file: {}", e)))?;
        let file_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        let mut decoder = TiffDecoder::new(BufReader::new(file))
            .map_err(|e| decode_err(format!("Cannot read TIFF header: {}", e)))?;

        let (width, height) = decoder.dimensions();
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }

        // Size is bounded by max_image_dimension above; lift the allocation cap.
        decoder
            .set_limits(Limits::no_limits())
            .map_err(|e| decode_err(e.to_string()))?;

        let icc_profile = decoder
            .icc_profile()
            .map_err(|e| decode_err(format!("Cannot read ICC profile: {}", e)))?
            .filter(|bytes| !bytes.is_empty());

        let image = DynamicImage::from_decoder(decoder).map_err(|e| decode_err(e.to_string()))?;

        Ok(DecodedImage {
            image,
            icc_profile,
            width,
            height,
            file_size,
        })
    }
}

/// Short name of a pixel layout, as written to the sidecar.
pub fn color_type_to_string(color: ColorType) -> String {
    match color {
        ColorType::L8 => "gray8".to_string(),
        ColorType::La8 => "gray-alpha8".to_string(),
        ColorType::Rgb8 => "rgb8".to_string(),
        ColorType::Rgba8 => "rgba8".to_string(),
        ColorType::L16 => "gray16".to_string(),
        ColorType::La16 => "gray-alpha16".to_string(),
        ColorType::Rgb16 => "rgb16".to_string(),
        ColorType::Rgba16 => "rgba16".to_string(),
        ColorType::Rgb32F => "rgb32f".to_string(),
        ColorType::Rgba32F => "rgba32f".to_string(),
        _ => "unknown".to_string(),
    }
}
