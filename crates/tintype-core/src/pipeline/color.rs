//! ICC color management: transform into the target profile or embed it.

use image::{ColorType, DynamicImage};
use lcms2::{ColorSpaceSignature, Flags, Intent, PixelFormat, Pod, Profile, Transform};
use rgb::FromSlice;

use crate::run::TargetProfile;
use crate::types::ColorOutcome;

/// Result of the color stage: what happened and which profile the output carries.
#[derive(Debug, Clone)]
pub struct AppliedColor {
    pub outcome: ColorOutcome,
    /// ICC bytes to embed in the exported image
    pub profile: Vec<u8>,
}

/// Apply the target profile to a decoded image.
///
/// With an embedded profile the pixels are converted into the target. Without
/// one, the target is only attached. A conversion that cannot run leaves the
/// pixels untouched and reports `Unconverted`. The output keeps the embedded
/// profile when it still describes the pixels, and gets the target otherwise
/// (e.g. a CMYK profile on samples the decoder already turned into RGB).
pub fn apply_profile(
    image: &mut DynamicImage,
    embedded: Option<&[u8]>,
    target: &TargetProfile,
) -> AppliedColor {
    let Some(source_icc) = embedded else {
        return AppliedColor {
            outcome: ColorOutcome::Embedded,
            profile: target.bytes().to_vec(),
        };
    };

    let source = match Profile::new_icc(source_icc) {
        Ok(source) => source,
        Err(e) => {
            return AppliedColor {
                outcome: ColorOutcome::Unconverted {
                    reason: format!("embedded profile unreadable: {e}"),
                },
                profile: source_icc.to_vec(),
            }
        }
    };

    let space = source.color_space();
    if !describes_layout(space, image.color()) {
        return AppliedColor {
            outcome: ColorOutcome::Unconverted {
                reason: format!(
                    "embedded {:?} profile does not describe {:?} pixels",
                    space,
                    image.color()
                ),
            },
            profile: target.bytes().to_vec(),
        };
    }

    match transform_image(image, &source, target) {
        Ok(()) => AppliedColor {
            outcome: ColorOutcome::Converted,
            profile: target.bytes().to_vec(),
        },
        Err(reason) => AppliedColor {
            outcome: ColorOutcome::Unconverted { reason },
            profile: source_icc.to_vec(),
        },
    }
}

/// Whether a profile's data color space matches a decoded pixel layout.
fn describes_layout(space: ColorSpaceSignature, color: ColorType) -> bool {
    match color {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            matches!(space, ColorSpaceSignature::GrayData)
        }
        _ => matches!(space, ColorSpaceSignature::RgbData),
    }
}

fn transform_image(
    image: &mut DynamicImage,
    source: &Profile,
    target: &TargetProfile,
) -> Result<(), String> {
    let target = target
        .open()
        .map_err(|e| format!("target profile unreadable: {e}"))?;

    match image {
        DynamicImage::ImageLuma8(buf) => {
            transform_in_place(source, &target, PixelFormat::GRAY_8, &mut **buf)
        }
        DynamicImage::ImageLuma16(buf) => {
            transform_in_place(source, &target, PixelFormat::GRAY_16, &mut **buf)
        }
        DynamicImage::ImageLumaA8(buf) => transform_in_place(
            source,
            &target,
            PixelFormat::GRAYA_8,
            (**buf).as_gray_alpha_mut(),
        ),
        DynamicImage::ImageLumaA16(buf) => transform_in_place(
            source,
            &target,
            PixelFormat::GRAYA_16,
            (**buf).as_gray_alpha_mut(),
        ),
        DynamicImage::ImageRgb8(buf) => {
            transform_in_place(source, &target, PixelFormat::RGB_8, (**buf).as_rgb_mut())
        }
        DynamicImage::ImageRgb16(buf) => {
            transform_in_place(source, &target, PixelFormat::RGB_16, (**buf).as_rgb_mut())
        }
        DynamicImage::ImageRgba8(buf) => {
            transform_in_place(source, &target, PixelFormat::RGBA_8, (**buf).as_rgba_mut())
        }
        DynamicImage::ImageRgba16(buf) => {
            transform_in_place(source, &target, PixelFormat::RGBA_16, (**buf).as_rgba_mut())
        }
        DynamicImage::ImageRgb32F(buf) => {
            transform_in_place(source, &target, PixelFormat::RGB_FLT, (**buf).as_rgb_mut())
        }
        DynamicImage::ImageRgba32F(buf) => {
            transform_in_place(source, &target, PixelFormat::RGBA_FLT, (**buf).as_rgba_mut())
        }
        other => Err(format!(
            "pixel layout {:?} is not supported by the color transform",
            other.color()
        )),
    }
}

/// Build a high-precision transform between two profiles and run it over `pixels`.
fn transform_in_place<T: Copy + Pod>(
    source: &Profile,
    target: &Profile,
    format: PixelFormat,
    pixels: &mut [T],
) -> Result<(), String> {
    let transform = Transform::<T, T>::new_flags(
        source,
        format,
        target,
        format,
        Intent::Perceptual,
        Flags::HIGHRES_PRECALC,
    )
    .map_err(|e| format!("cannot build transform: {e}"))?;
    transform.transform_in_place(pixels);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, LumaA, Rgb, RgbImage, Rgba};
    use lcms2::{CIExyY, CIExyYTRIPLE, ToneCurve};

    const D65: CIExyY = CIExyY {
        x: 0.3127,
        y: 0.3290,
        Y: 1.0,
    };

    fn gray_icc(gamma: f64) -> Vec<u8> {
        Profile::new_gray(&D65, &ToneCurve::new(gamma))
            .unwrap()
            .icc()
            .unwrap()
    }

    fn gray_target(gamma: f64) -> TargetProfile {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.icc");
        std::fs::write(&path, gray_icc(gamma)).unwrap();
        TargetProfile::load(&path).unwrap()
    }

    fn srgb_target() -> TargetProfile {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srgb.icc");
        std::fs::write(&path, Profile::new_srgb().icc().unwrap()).unwrap();
        TargetProfile::load(&path).unwrap()
    }

    /// sRGB primaries with a linear (gamma 1.0) transfer curve.
    fn linear_rgb_icc() -> Vec<u8> {
        let white = CIExyY {
            x: 0.3127,
            y: 0.3290,
            Y: 1.0,
        };
        let primaries = CIExyYTRIPLE {
            Red: CIExyY {
                x: 0.64,
                y: 0.33,
                Y: 1.0,
            },
            Green: CIExyY {
                x: 0.30,
                y: 0.60,
                Y: 1.0,
            },
            Blue: CIExyY {
                x: 0.15,
                y: 0.06,
                Y: 1.0,
            },
        };
        let linear = ToneCurve::new(1.0);
        Profile::new_rgb(&white, &primaries, &[&linear, &linear, &linear])
            .unwrap()
            .icc()
            .unwrap()
    }

    #[test]
    fn embeds_target_when_image_has_no_profile() {
        let target = srgb_target();
        let mut image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([128, 64, 32])));
        let before = image.clone();

        let applied = apply_profile(&mut image, None, &target);

        assert_eq!(applied.outcome, ColorOutcome::Embedded);
        assert_eq!(applied.profile, target.bytes());
        assert_eq!(image, before);
    }

    #[test]
    fn converts_from_linear_profile_into_srgb() {
        let target = srgb_target();
        let source = linear_rgb_icc();
        let mut image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([128, 128, 128])));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert_eq!(applied.outcome, ColorOutcome::Converted);
        assert_eq!(applied.profile, target.bytes());
        // Linear mid-gray is much lighter once encoded with the sRGB curve.
        let px = image.as_rgb8().unwrap().get_pixel(0, 0);
        assert!(px.0[0] > 160, "expected lighter gray, got {:?}", px);
        assert!(px.0[0].abs_diff(px.0[1]) <= 2 && px.0[1].abs_diff(px.0[2]) <= 2);
    }

    #[test]
    fn converts_16_bit_images() {
        let target = srgb_target();
        let source = linear_rgb_icc();
        let mut image = DynamicImage::ImageRgb16(image::ImageBuffer::from_pixel(
            2,
            2,
            Rgb([32768u16, 32768, 32768]),
        ));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert_eq!(applied.outcome, ColorOutcome::Converted);
        let px = image.as_rgb16().unwrap().get_pixel(1, 1);
        assert!(px.0[0] > 40000, "expected lighter gray, got {:?}", px);
    }

    #[test]
    fn unreadable_embedded_profile_leaves_image_untouched() {
        let target = srgb_target();
        let garbage = b"not an icc profile".to_vec();
        let mut image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        let before = image.clone();

        let applied = apply_profile(&mut image, Some(&garbage), &target);

        assert!(matches!(applied.outcome, ColorOutcome::Unconverted { .. }));
        assert_eq!(applied.profile, garbage);
        assert_eq!(image, before);
    }

    #[test]
    fn rgb_profile_on_gray_pixels_is_replaced_by_target() {
        let target = srgb_target();
        let source = Profile::new_srgb().icc().unwrap();
        let mut image = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([100])));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert!(matches!(applied.outcome, ColorOutcome::Unconverted { .. }));
        assert_eq!(applied.profile, target.bytes());
        assert_eq!(image.as_luma8().unwrap().get_pixel(0, 0), &Luma([100]));
    }

    #[test]
    fn gray_profile_on_rgb_pixels_is_not_reembedded() {
        // Stands in for a CMYK scan the decoder has already turned into RGB.
        let target = srgb_target();
        let source = gray_icc(2.2);
        let mut image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([10, 20, 30])));
        let before = image.clone();

        let applied = apply_profile(&mut image, Some(&source), &target);

        match &applied.outcome {
            ColorOutcome::Unconverted { reason } => assert!(reason.contains("does not describe")),
            other => panic!("expected unconverted, got {other:?}"),
        }
        assert_eq!(applied.profile, target.bytes());
        assert_eq!(image, before);
    }

    #[test]
    fn gray_source_with_rgb_target_keeps_source_profile() {
        let target = srgb_target();
        let source = gray_icc(2.2);
        let mut image = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([100])));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert!(matches!(applied.outcome, ColorOutcome::Unconverted { .. }));
        assert_eq!(applied.profile, source);
        assert_eq!(image.as_luma8().unwrap().get_pixel(0, 0), &Luma([100]));
    }

    #[test]
    fn converts_gray_alpha_images() {
        let target = gray_target(1.0);
        let source = gray_icc(2.2);
        let mut image = DynamicImage::ImageLumaA8(image::ImageBuffer::from_pixel(
            2,
            2,
            LumaA([128u8, 200]),
        ));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert_eq!(applied.outcome, ColorOutcome::Converted);
        let px = image.as_luma_alpha8().unwrap().get_pixel(0, 0);
        assert!(px.0[0] < 100, "expected darker linear gray, got {:?}", px);
        assert_eq!(px.0[1], 200);
    }

    #[test]
    fn converts_gray_alpha_16_bit_images() {
        let target = gray_target(1.0);
        let source = gray_icc(2.2);
        let mut image = DynamicImage::ImageLumaA16(image::ImageBuffer::from_pixel(
            2,
            2,
            LumaA([32768u16, 65535]),
        ));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert_eq!(applied.outcome, ColorOutcome::Converted);
        let px = image.as_luma_alpha16().unwrap().get_pixel(1, 0);
        assert!(px.0[0] < 25000, "expected darker linear gray, got {:?}", px);
    }

    #[test]
    fn converts_float_rgb_images() {
        let target = srgb_target();
        let source = linear_rgb_icc();
        let mut image = DynamicImage::ImageRgb32F(image::ImageBuffer::from_pixel(
            2,
            2,
            Rgb([0.5f32, 0.5, 0.5]),
        ));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert_eq!(applied.outcome, ColorOutcome::Converted);
        let px = image.as_rgb32f().unwrap().get_pixel(0, 1);
        assert!(px.0[0] > 0.6, "expected lighter gray, got {:?}", px);
    }

    #[test]
    fn converts_float_rgba_images() {
        let target = srgb_target();
        let source = linear_rgb_icc();
        let mut image = DynamicImage::ImageRgba32F(image::ImageBuffer::from_pixel(
            2,
            2,
            Rgba([0.5f32, 0.5, 0.5, 0.25]),
        ));

        let applied = apply_profile(&mut image, Some(&source), &target);

        assert_eq!(applied.outcome, ColorOutcome::Converted);
        let px = image.as_rgba32f().unwrap().get_pixel(1, 1);
        assert!(px.0[0] > 0.6, "expected lighter gray, got {:?}", px);
        assert_eq!(px.0[3], 0.25);
    }
}
