// src/engine.rs
//
// The core of cimgres:
// 1. Resolve loosely typed options into one TransformRequest
// 2. Decode, scale and re-encode in a single pass
// 3. Run inline, or on a worker pool behind a one-shot Deferred handle
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height), for decoded and
/// resized images alike. Larger images are rejected to prevent
/// decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

#[cfg(feature = "napi")]
mod api;
mod codec;
mod common;
mod decoder;
mod deferred;
mod detect;
mod encoder;
mod options;
mod pipeline;
mod pool;
mod scheduler;
mod tasks;
mod transform;

pub use codec::{ImageCodec, NativeCodec};
pub use decoder::{check_dimensions, decode_image};
pub use deferred::{channel, Completer, Deferred, TaskState};
pub use detect::{detect, sniff_loader, token_for_loader, CodecDescriptor, CODECS};
pub use encoder::{encode, encode_jpeg, encode_png, encode_webp, ENCODABLE_FORMATS};
pub use options::resolve;
pub use pipeline::{resize_by, scaled_dimensions};
pub use scheduler::{init, resize, resize_sync, shared_transformer, Scheduler};
pub use transform::Transformer;

#[cfg(feature = "napi")]
pub use api::{detect_format, resize as resize_js, resize_sync as resize_sync_js};
#[cfg(feature = "napi")]
pub use tasks::ResizeTask;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ops::{FormatToken, OutputFormat};
    use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
    use serde_json::json;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn transformer() -> Transformer {
        Transformer::native(EngineConfig::default())
    }

    #[test]
    fn test_detect_round_trip_for_encodable_formats() {
        let img = create_test_image(24, 16);
        for token in ENCODABLE_FORMATS {
            let bytes = encode(&img, OutputFormat::new(token, 80)).unwrap();
            let expected = match token {
                // generic is written as PNG
                FormatToken::Generic => FormatToken::Png,
                other => other,
            };
            assert_eq!(detect(&bytes), Some(expected), "token {token}");
        }
    }

    #[test]
    fn test_every_encodable_format_survives_a_transform() {
        let mut input = Vec::new();
        create_test_image(40, 20)
            .write_to(
                &mut std::io::Cursor::new(&mut input),
                image::ImageFormat::Png,
            )
            .unwrap();
        let t = transformer();
        for token in ENCODABLE_FORMATS {
            let request = resolve(&json!({ "percent": 50, "format": token.as_str() })).unwrap();
            let out = t.transform(&input, &request).unwrap();
            let decoded = image::load_from_memory(&out).unwrap();
            assert_eq!(decoded.dimensions(), (20, 10), "token {token}");
        }
    }

    #[test]
    fn test_transparent_png_stays_transparent() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, image::Rgba([0, 0, 0, 0])));
        let mut input = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut input),
            image::ImageFormat::Png,
        )
        .unwrap();
        let request = resolve(&json!({ "scale": 2 })).unwrap();
        let out = transformer().transform(&input, &request).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (20, 20));
        assert_eq!(decoded.to_rgba8().get_pixel(5, 5).0[3], 0);
    }

    #[test]
    fn test_upscale_past_limits_is_rejected() {
        let mut input = Vec::new();
        create_test_image(100, 100)
            .write_to(
                &mut std::io::Cursor::new(&mut input),
                image::ImageFormat::Png,
            )
            .unwrap();
        let request = resolve(&json!({ "scale": 500 })).unwrap();
        let err = transformer().transform(&input, &request).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::ResourceLimit);
    }
}
