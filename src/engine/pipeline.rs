// src/engine/pipeline.rs
//
// Scale computation and the fast_image_resize backed resize primitive.

use crate::engine::common::EngineResult;
use crate::engine::decoder::check_dimensions;
use crate::engine::MAX_DIMENSION;
use crate::error::CimgresError;
use fast_image_resize::{self as fir, PixelType, ResizeOptions};
use image::{imageops::FilterType, DynamicImage, RgbImage, RgbaImage};

/// Target dimensions for a uniform scale: round per axis, never below 1 pixel.
pub fn scaled_dimensions(orig_w: u32, orig_h: u32, scale: f64) -> EngineResult<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(CimgresError::invalid_argument(
            "scale",
            scale.to_string(),
            "must be a finite number greater than zero",
        ));
    }
    let w = (orig_w as f64 * scale).round().max(1.0);
    let h = (orig_h as f64 * scale).round().max(1.0);
    if w > MAX_DIMENSION as f64 || h > MAX_DIMENSION as f64 {
        let dimension = w.max(h).min(u32::MAX as f64) as u32;
        return Err(CimgresError::dimension_exceeds_limit(dimension, MAX_DIMENSION));
    }
    let (w, h) = (w as u32, h as u32);
    check_dimensions(w, h)?;
    Ok((w, h))
}

/// Scale `img` uniformly by `scale`. Returns the input untouched when the
/// target size equals the source size.
pub fn resize_by(img: DynamicImage, scale: f64) -> EngineResult<DynamicImage> {
    let (src_w, src_h) = (img.width(), img.height());
    let (dst_w, dst_h) = scaled_dimensions(src_w, src_h, scale)?;
    if (dst_w, dst_h) == (src_w, src_h) {
        return Ok(img);
    }
    if is_high_depth(&img) {
        return Ok(resize_high_depth(&img, dst_w, dst_h));
    }
    fast_resize_owned(img, dst_w, dst_h)
        .map_err(|reason| CimgresError::resize_failed((src_w, src_h), (dst_w, dst_h), reason))
}

/// 16-bit and float images; the 8-bit fir path would clamp their range.
fn is_high_depth(img: &DynamicImage) -> bool {
    matches!(
        img,
        DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_)
    )
}

// resize_exact keeps the DynamicImage variant, so HDR stays Rgb32F
fn resize_high_depth(img: &DynamicImage, dst_width: u32, dst_height: u32) -> DynamicImage {
    img.resize_exact(dst_width, dst_height, FilterType::Lanczos3)
}

fn default_resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// Fast resize with owned DynamicImage (no copy for RGB8/RGBA8)
pub fn fast_resize_owned(
    img: DynamicImage,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let src_width = img.width();
    let src_height = img.height();

    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err("invalid dimensions for resize".to_string());
    }

    // Select pixel layout without forcing RGBA when not needed
    let (pixel_type, mut src_pixels): (PixelType, Vec<u8>) = match img {
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.into_raw()),
        other if other.color().has_alpha() => (PixelType::U8x4, other.to_rgba8().into_raw()),
        other => (PixelType::U8x3, other.to_rgb8().into_raw()),
    };

    let primary = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => resize_with_source_image(src_image, pixel_type, dst_width, dst_height),
        Err(e) => Err(format!("fir source image error: {e:?}")),
    };

    match primary {
        Ok(img) => Ok(img),
        Err(err) => resize_with_image_crate_fallback(
            src_pixels,
            src_width,
            src_height,
            pixel_type,
            dst_width,
            dst_height,
        )
        .map_err(|fallback_err| format!("{err}; image crate fallback failed: {fallback_err}")),
    }
}

fn resize_with_source_image(
    src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    // Alpha is premultiplied/unpremultiplied by the resizer itself for U8x4
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &default_resize_options())
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    let dst_pixels = dst_image.into_vec();
    match pixel_type {
        PixelType::U8x3 => RgbImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "failed to create rgb image from resized data".to_string()),
        PixelType::U8x4 => RgbaImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| "failed to create rgba image from resized data".to_string()),
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}

fn resize_with_image_crate_fallback(
    src_pixels: Vec<u8>,
    src_width: u32,
    src_height: u32,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let filter = FilterType::Lanczos3;
    match pixel_type {
        PixelType::U8x3 => {
            let rgb = RgbImage::from_raw(src_width, src_height, src_pixels)
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgb8(image::imageops::resize(
                &rgb, dst_width, dst_height, filter,
            )))
        }
        PixelType::U8x4 => {
            let rgba = RgbaImage::from_raw(src_width, src_height, src_pixels)
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgba8(image::imageops::resize(
                &rgba, dst_width, dst_height, filter,
            )))
        }
        _ => Err("fallback resize supports only U8x3/U8x4 pixel types".to_string()),
    }
}
