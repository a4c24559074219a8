//! Output naming and TIFF export with an embedded ICC profile.

use image::DynamicImage;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::{Tag, Type};
use tiff::TiffResult;

use crate::config::ProcessingConfig;
use crate::error::PipelineError;

/// TIFF tag holding an ICC profile (`InterColorProfile`).
pub const TAG_ICC_PROFILE: Tag = Tag::Unknown(34675);

/// Paths of the two files generated for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `<stem><suffix>.<ext>` next to the source
    pub image: PathBuf,
    /// `<stem><sidecar_suffix>` next to the source
    pub sidecar: PathBuf,
}

impl OutputPaths {
    /// Derive output paths from a source path, e.g. `scan.tif` gives
    /// `scan_icc.tif` and `scan.exif.json`.
    pub fn for_source(source: &Path, config: &ProcessingConfig) -> Self {
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let image_name = match source.extension() {
            Some(ext) => format!("{stem}{}.{}", config.output_suffix, ext.to_string_lossy()),
            None => format!("{stem}{}", config.output_suffix),
        };

        Self {
            image: dir.join(image_name),
            sidecar: dir.join(format!("{stem}{}", config.sidecar_suffix)),
        }
    }
}

/// ICC bytes written with the TIFF `UNDEFINED` field type.
struct UndefinedBytes<'a>(&'a [u8]);

impl TiffValue for UndefinedBytes<'_> {
    const BYTE_LEN: u8 = 1;
    const FIELD_TYPE: Type = Type::UNDEFINED;

    fn count(&self) -> usize {
        self.0.len()
    }

    fn data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.0)
    }
}

/// Write `image` as a TIFF at `path`, embedding `icc` when given.
///
/// Gray, RGB and RGBA images keep their bit depth; other layouts are widened
/// to RGBA16.
pub fn write_tiff(path: &Path, image: &DynamicImage, icc: Option<&[u8]>) -> Result<(), PipelineError> {
    let export_err = |message: String| PipelineError::Export {
        path: path.to_path_buf(),
        message,
    };

    let file = File::create(path).map_err(|e| export_err(format!("Cannot create file: {}", e)))?;
    let mut encoder =
        TiffEncoder::new(BufWriter::new(file)).map_err(|e| export_err(e.to_string()))?;

    let (w, h) = (image.width(), image.height());
    let result = match image {
        DynamicImage::ImageLuma8(buf) => {
            encode::<_, colortype::Gray8>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        DynamicImage::ImageLuma16(buf) => {
            encode::<_, colortype::Gray16>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        DynamicImage::ImageRgb8(buf) => {
            encode::<_, colortype::RGB8>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        DynamicImage::ImageRgb16(buf) => {
            encode::<_, colortype::RGB16>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        DynamicImage::ImageRgba8(buf) => {
            encode::<_, colortype::RGBA8>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        DynamicImage::ImageRgba16(buf) => {
            encode::<_, colortype::RGBA16>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        DynamicImage::ImageRgb32F(buf) => {
            encode::<_, colortype::RGB32Float>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        DynamicImage::ImageRgba32F(buf) => {
            encode::<_, colortype::RGBA32Float>(&mut encoder, w, h, buf.as_raw(), icc)
        }
        other => {
            let widened = other.to_rgba16();
            encode::<_, colortype::RGBA16>(&mut encoder, w, h, widened.as_raw(), icc)
        }
    };

    result.map_err(|e| export_err(e.to_string()))
}

fn encode<W: Write + Seek, C: colortype::ColorType>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    icc: Option<&[u8]>,
) -> TiffResult<()>
where
    [C::Inner]: TiffValue,
{
    let mut image = encoder.new_image::<C>(width, height)?;
    if let Some(icc) = icc {
        image
            .encoder()
            .write_tag(TAG_ICC_PROFILE, UndefinedBytes(icc))?;
    }
    image.write_data(data)
}
