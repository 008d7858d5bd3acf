#![no_main]

//! Fuzz target for image encoding to every output token.
//! Exercises mozjpeg, oxipng, libwebp and the image crate encoders.

use arbitrary::{Arbitrary, Unstructured};
use cimgres::engine::encode;
use cimgres::ops::{FormatToken, OutputFormat};
use image::{DynamicImage, RgbaImage};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct EncodeSeed {
    format: u8,
    quality: u8,
    width: u8,
    height: u8,
}

fn build_image(data: &[u8], width: u8, height: u8) -> DynamicImage {
    // Limit dimensions to avoid OOM (max 128x128 = 64KB RGBA)
    let w = (width as u32 % 128).max(1);
    let h = (height as u32 % 128).max(1);
    let pixel_count = (w * h * 4) as usize;

    let mut buffer = vec![0u8; pixel_count];
    for (i, byte) in buffer.iter_mut().enumerate() {
        *byte = data.get(i % data.len().max(1)).copied().unwrap_or(128);
    }

    let rgba = RgbaImage::from_raw(w, h, buffer)
        .unwrap_or_else(|| RgbaImage::from_raw(1, 1, vec![0, 0, 0, 255]).unwrap());
    DynamicImage::ImageRgba8(rgba)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let mut unstructured = Unstructured::new(data);
    let Ok(seed) = EncodeSeed::arbitrary(&mut unstructured) else {
        return;
    };
    let img = build_image(unstructured.take_rest(), seed.width, seed.height);

    let token = FormatToken::ALL[seed.format as usize % FormatToken::ALL.len()];
    let format = OutputFormat::new(token, seed.quality);
    if let Ok(bytes) = encode(&img, format) {
        assert!(!bytes.is_empty(), "{token} produced an empty buffer");
    }
});
