// src/engine/codec.rs
//
// The codec capability consumed by the transform engine.

use crate::engine::{decoder, encoder, pipeline};
use crate::error::Result;
use crate::ops::OutputFormat;
use image::DynamicImage;

/// Decode, scale and encode primitives.
///
/// Implementations must be shareable across worker threads and must not keep
/// per-request state between calls.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage>;

    /// Scale both axes by `scale`, rounding each to the nearest pixel.
    fn resize_by(&self, img: DynamicImage, scale: f64) -> Result<DynamicImage>;

    /// Encode into a buffer owned by the caller.
    fn encode(&self, img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>>;
}

/// Default codec: mozjpeg / zune-png / libwebp / image for decode,
/// fast_image_resize for scaling, mozjpeg / oxipng / libwebp / image for encode.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeCodec;

impl ImageCodec for NativeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        decoder::decode_image(bytes)
    }

    fn resize_by(&self, img: DynamicImage, scale: f64) -> Result<DynamicImage> {
        pipeline::resize_by(img, scale)
    }

    fn encode(&self, img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        encoder::encode(img, format)
    }
}
