//! Barrel lens-distortion correction.
//!
//! Uses the same polynomial as ImageMagick's `-distort Barrel a b c`: for a
//! destination pixel at normalized radius `r`, the source is sampled at
//! `r * (a*r^3 + b*r^2 + c*r + d)` with `d = 1 - (a + b + c)`. The radius is
//! normalized by half of the smaller image dimension, so `r = 1` is a fixed
//! circle for every choice of coefficients.

use image::{DynamicImage, Luma, LumaA, Rgb, Rgba};
use imageproc::geometric_transformations::{warp_with, Interpolation};
use std::str::FromStr;

use crate::error::ValidationError;

/// Barrel distortion coefficients `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensCorrection {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LensCorrection {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// The implied fourth coefficient that keeps the unit radius fixed.
    pub fn d(&self) -> f64 {
        1.0 - (self.a + self.b + self.c)
    }

    /// Build the destination-to-source mapping for an image of this size.
    pub fn mapping(&self, width: u32, height: u32) -> BarrelMapping {
        let half = (width.min(height).max(1) as f64) / 2.0;
        BarrelMapping {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d(),
            cx: (width as f64 - 1.0) / 2.0,
            cy: (height as f64 - 1.0) / 2.0,
            half,
        }
    }

    /// Warp an image, keeping its dimensions and, where possible, its pixel layout.
    ///
    /// Samples falling outside the source are black (transparent for RGBA).
    /// Every layout the decoder produces is warped as-is; anything else is
    /// widened to RGBA16.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        let mapping = self.mapping(image.width(), image.height());
        let map = move |x: f32, y: f32| mapping.source(x, y);
        let bilinear = Interpolation::Bilinear;

        match image {
            DynamicImage::ImageLuma8(buf) => {
                DynamicImage::ImageLuma8(warp_with(buf, map, bilinear, Luma([0u8])))
            }
            DynamicImage::ImageLuma16(buf) => {
                DynamicImage::ImageLuma16(warp_with(buf, map, bilinear, Luma([0u16])))
            }
            DynamicImage::ImageLumaA8(buf) => {
                DynamicImage::ImageLumaA8(warp_with(buf, map, bilinear, LumaA([0u8; 2])))
            }
            DynamicImage::ImageLumaA16(buf) => {
                DynamicImage::ImageLumaA16(warp_with(buf, map, bilinear, LumaA([0u16; 2])))
            }
            DynamicImage::ImageRgb8(buf) => {
                DynamicImage::ImageRgb8(warp_with(buf, map, bilinear, Rgb([0u8; 3])))
            }
            DynamicImage::ImageRgb16(buf) => {
                DynamicImage::ImageRgb16(warp_with(buf, map, bilinear, Rgb([0u16; 3])))
            }
            DynamicImage::ImageRgba8(buf) => {
                DynamicImage::ImageRgba8(warp_with(buf, map, bilinear, Rgba([0u8; 4])))
            }
            DynamicImage::ImageRgba16(buf) => {
                DynamicImage::ImageRgba16(warp_with(buf, map, bilinear, Rgba([0u16; 4])))
            }
            DynamicImage::ImageRgb32F(buf) => {
                DynamicImage::ImageRgb32F(warp_with(buf, map, bilinear, Rgb([0f32; 3])))
            }
            DynamicImage::ImageRgba32F(buf) => {
                DynamicImage::ImageRgba32F(warp_with(buf, map, bilinear, Rgba([0f32; 4])))
            }
            other => {
                tracing::debug!(
                    "Widening {:?} to RGBA16 for barrel correction",
                    other.color()
                );
                let widened = other.to_rgba16();
                DynamicImage::ImageRgba16(warp_with(&widened, map, bilinear, Rgba([0u16; 4])))
            }
        }
    }
}

impl FromStr for LensCorrection {
    type Err = ValidationError;

    /// Parse `"a, b, c"`, `"a b c"` or any mix of commas and spaces.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let values = raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ValidationError::LensParamParse {
                        token: token.to_string(),
                        raw: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        match values.as_slice() {
            [a, b, c] => Ok(Self::new(*a, *b, *c)),
            _ => Err(ValidationError::InvalidLensParams {
                count: values.len(),
                raw: raw.to_string(),
            }),
        }
    }
}

/// Destination-to-source coordinate mapping for one image size.
#[derive(Debug, Clone, Copy)]
pub struct BarrelMapping {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    cx: f64,
    cy: f64,
    half: f64,
}

impl BarrelMapping {
    /// Source coordinates sampled for destination pixel `(x, y)`.
    pub fn source(&self, x: f32, y: f32) -> (f32, f32) {
        let dx = x as f64 - self.cx;
        let dy = y as f64 - self.cy;
        let r = (dx * dx + dy * dy).sqrt() / self.half;
        let scale = ((self.a * r + self.b) * r + self.c) * r + self.d;
        (
            (self.cx + dx * scale) as f32,
            (self.cy + dy * scale) as f32,
        )
    }
}
