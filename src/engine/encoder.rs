// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg), PNG (image + oxipng), WebP (libwebp),
// GIF/TIFF/HDR (image). Every encoder returns a Vec owned by the caller;
// codec-owned scratch buffers are dropped before returning.

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::engine::MAX_DIMENSION;
use crate::error::CimgresError;
use crate::ops::{FormatToken, OutputFormat};
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;
use std::io::Cursor;

/// oxipng preset: 2 keeps encode time predictable on large inputs
const OXIPNG_PRESET: u8 = 2;

/// Tokens that have an encoder. Generic output is lossless PNG.
pub const ENCODABLE_FORMATS: [FormatToken; 7] = [
    FormatToken::Jpg,
    FormatToken::Png,
    FormatToken::Webp,
    FormatToken::Gif,
    FormatToken::Tif,
    FormatToken::Hdr,
    FormatToken::Generic,
];

/// Encode `img` in the requested format.
pub fn encode(img: &DynamicImage, format: OutputFormat) -> EngineResult<Vec<u8>> {
    if img.width() == 0 || img.height() == 0 {
        return Err(CimgresError::encode_failed(
            format.token.as_str(),
            "image has a zero dimension",
        ));
    }
    match format.token {
        FormatToken::Jpg => encode_jpeg(img, format.quality),
        FormatToken::Png | FormatToken::Generic => encode_png(img),
        FormatToken::Webp => encode_webp(img, format.quality),
        FormatToken::Gif => encode_gif(img),
        FormatToken::Tif => encode_tiff(img),
        FormatToken::Hdr => encode_hdr(img),
        FormatToken::Heif
        | FormatToken::Jxl
        | FormatToken::Jp2
        | FormatToken::Pdf
        | FormatToken::Svg => Err(CimgresError::encode_failed(
            format.token.as_str(),
            "no encoder is available for this format",
        )),
    }
}

/// Encode to JPEG using mozjpeg with web-optimized settings
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let quality = quality.clamp(1, 100);

        // Avoid conversion if already RGB8
        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
            _ => Cow::Owned(img.to_rgb8()),
        };
        let (w, h) = rgb.dimensions();
        let pixels: &[u8] = rgb.as_raw();

        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(CimgresError::dimension_exceeds_limit(
                w.max(h),
                MAX_DIMENSION,
            ));
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        // Runs jpeg_set_defaults, so it must come before every other setting
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(quality as f32);
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);

        let smoothing = if quality >= 90 {
            0
        } else if quality >= 70 {
            5
        } else if quality >= 60 {
            10
        } else {
            18
        };
        comp.set_smoothing_factor(smoothing);

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);
        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                CimgresError::encode_failed(
                    "jpg",
                    format!("mozjpeg: failed to start compress: {e:?}"),
                )
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    CimgresError::encode_failed(
                        "jpg",
                        format!("mozjpeg: failed to write scanlines: {e:?}"),
                    )
                })?;
            }

            writer.finish().map_err(|e| {
                CimgresError::encode_failed("jpg", format!("mozjpeg: failed to finish: {e:?}"))
            })?;
        }

        Ok(output)
    })
}

/// Encode to PNG using image crate, then losslessly recompress with oxipng
pub fn encode_png(img: &DynamicImage) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| CimgresError::encode_failed("png", format!("PNG encode failed: {e}")))?;

        let mut options = oxipng::Options::from_preset(OXIPNG_PRESET);
        options.strip = oxipng::StripChunks::None;

        oxipng::optimize_from_memory(&buf, &options).map_err(|e| {
            CimgresError::encode_failed("png", format!("oxipng optimization failed: {e}"))
        })
    })
}

/// Encode to lossy WebP using libwebp
pub fn encode_webp(img: &DynamicImage, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        let quality = quality.clamp(1, 100) as f32;
        let memory = match img {
            DynamicImage::ImageRgb8(rgb) => {
                webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode(quality)
            }
            DynamicImage::ImageRgba8(rgba) => {
                webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode(quality)
            }
            other if other.color().has_alpha() => {
                let rgba = other.to_rgba8();
                webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode(quality)
            }
            other => {
                let rgb = other.to_rgb8();
                webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode(quality)
            }
        };

        if memory.is_empty() {
            return Err(CimgresError::encode_failed("webp", "libwebp produced no output"));
        }
        // Copy out of libwebp's allocation; WebPMemory frees it on drop.
        Ok(memory.to_vec())
    })
}

pub fn encode_gif(img: &DynamicImage) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:gif", || {
        let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
        write_with_image_crate(&rgba, ImageFormat::Gif, "gif")
    })
}

pub fn encode_tiff(img: &DynamicImage) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:tiff", || {
        let normalized: Cow<'_, DynamicImage> = match img {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(img),
            other if other.color().has_alpha() => {
                Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
            }
            other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        };
        write_with_image_crate(&normalized, ImageFormat::Tiff, "tif")
    })
}

/// Radiance RGBE; the encoder only accepts 32-bit float RGB
pub fn encode_hdr(img: &DynamicImage) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:hdr", || {
        let rgb32f = DynamicImage::ImageRgb32F(img.to_rgb32f());
        write_with_image_crate(&rgb32f, ImageFormat::Hdr, "hdr")
    })
}

fn write_with_image_crate(
    img: &DynamicImage,
    format: ImageFormat,
    token: &'static str,
) -> EngineResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| CimgresError::encode_failed(token, e.to_string()))?;
    Ok(buf)
}
