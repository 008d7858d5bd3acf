// src/engine/detect.rs
//
// Source-format detection from raw bytes.
//
// Detection runs in two steps: sniff a leading signature to find which loader
// would accept the bytes, then map that loader to a canonical output token
// through a static table. Loaders that are recognized but not listed map to
// the generic token.

use crate::ops::FormatToken;
use image::ImageFormat;

/// Static mapping from loader identifier to canonical output token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecDescriptor {
    pub loader: &'static str,
    pub token: FormatToken,
}

/// Loaders with a dedicated output token. Read-only, shared by all threads.
pub static CODECS: &[CodecDescriptor] = &[
    CodecDescriptor { loader: "jpeg", token: FormatToken::Jpg },
    CodecDescriptor { loader: "png", token: FormatToken::Png },
    CodecDescriptor { loader: "webp", token: FormatToken::Webp },
    CodecDescriptor { loader: "tiff", token: FormatToken::Tif },
    CodecDescriptor { loader: "heif", token: FormatToken::Heif },
    CodecDescriptor { loader: "jxl", token: FormatToken::Jxl },
    CodecDescriptor { loader: "gif", token: FormatToken::Gif },
    CodecDescriptor { loader: "jp2k", token: FormatToken::Jp2 },
    CodecDescriptor { loader: "pdf", token: FormatToken::Pdf },
    CodecDescriptor { loader: "svg", token: FormatToken::Svg },
    CodecDescriptor { loader: "radiance", token: FormatToken::Hdr },
];

/// How far into the input we look for an SVG root element
const SVG_SNIFF_LIMIT: usize = 1024;

/// ISOBMFF brands that identify HEIF-family still images (HEIC, AVIF, ...)
const HEIF_BRANDS: [&[u8; 4]; 8] = [
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"avif",
];

/// Detect the canonical output token for `bytes`. Returns None when no loader
/// recognizes the signature. Never fails.
pub fn detect(bytes: &[u8]) -> Option<FormatToken> {
    let loader = sniff_loader(bytes)?;
    Some(token_for_loader(loader))
}

/// Map a loader identifier to its token, falling back to the generic token.
pub fn token_for_loader(loader: &str) -> FormatToken {
    CODECS
        .iter()
        .find(|descriptor| descriptor.loader == loader)
        .map(|descriptor| descriptor.token)
        .unwrap_or(FormatToken::Generic)
}

/// Identify the loader that would accept `bytes`.
pub fn sniff_loader(bytes: &[u8]) -> Option<&'static str> {
    // Checked before image::guess_format, which claims some ISOBMFF files as AVIF
    if is_heif(bytes) {
        return Some("heif");
    }
    if let Ok(format) = image::guess_format(bytes) {
        return Some(image_loader_name(format));
    }
    if is_jxl(bytes) {
        Some("jxl")
    } else if is_jp2(bytes) {
        Some("jp2k")
    } else if bytes.starts_with(b"%PDF-") {
        Some("pdf")
    } else if is_svg(bytes) {
        Some("svg")
    } else if bytes.starts_with(b"#?RADIANCE") || bytes.starts_with(b"#?RGBE") {
        Some("radiance")
    } else {
        None
    }
}

fn image_loader_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Gif => "gif",
        ImageFormat::Hdr => "radiance",
        ImageFormat::Avif => "heif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Ico => "ico",
        ImageFormat::Pnm => "pnm",
        ImageFormat::Qoi => "qoi",
        ImageFormat::OpenExr => "openexr",
        ImageFormat::Dds => "dds",
        ImageFormat::Farbfeld => "farbfeld",
        ImageFormat::Tga => "tga",
        _ => "other",
    }
}

fn is_heif(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return false;
    }
    let box_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = box_len.clamp(12, bytes.len());
    // major brand at 8..12, compatible brands after the minor version
    std::iter::once(&bytes[8..12])
        .chain(bytes.get(16..end).unwrap_or(&[]).chunks_exact(4))
        .any(|brand| HEIF_BRANDS.iter().any(|known| brand == &known[..]))
}

fn is_jxl(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0x0A])
        || bytes.starts_with(&[
            0x00, 0x00, 0x00, 0x0C, b'J', b'X', b'L', b' ', 0x0D, 0x0A, 0x87, 0x0A,
        ])
}

fn is_jp2(bytes: &[u8]) -> bool {
    bytes.starts_with(&[
        0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' ', 0x0D, 0x0A, 0x87, 0x0A,
    ]) || bytes.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
}

fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_SNIFF_LIMIT)];
    // The limit may split a multi-byte character; keep the valid prefix
    let valid = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or(""),
    };
    looks_like_svg(valid)
}

fn looks_like_svg(text: &str) -> bool {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with('<') {
        return false;
    }
    trimmed.contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn encode_with(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn detects_formats_written_by_image_crate() {
        assert_eq!(detect(&encode_with(ImageFormat::Png)), Some(FormatToken::Png));
        assert_eq!(detect(&encode_with(ImageFormat::Jpeg)), Some(FormatToken::Jpg));
        assert_eq!(detect(&encode_with(ImageFormat::Gif)), Some(FormatToken::Gif));
        assert_eq!(detect(&encode_with(ImageFormat::Tiff)), Some(FormatToken::Tif));
        assert_eq!(detect(&encode_with(ImageFormat::Bmp)), Some(FormatToken::Generic));
    }

    #[test]
    fn detects_signatures_without_decoders() {
        assert_eq!(detect(b"%PDF-1.7\n%..."), Some(FormatToken::Pdf));
        assert_eq!(
            detect(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
            Some(FormatToken::Svg)
        );
        assert_eq!(detect(b"<svg width=\"10\" height=\"10\"></svg>"), Some(FormatToken::Svg));
        assert_eq!(detect(&[0xFF, 0x0A, 0x00]), Some(FormatToken::Jxl));
        assert_eq!(
            detect(&[0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' ', 0x0D, 0x0A, 0x87, 0x0A]),
            Some(FormatToken::Jp2)
        );
        assert_eq!(detect(&[0xFF, 0x4F, 0xFF, 0x51, 0x00]), Some(FormatToken::Jp2));
        assert_eq!(detect(b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n"), Some(FormatToken::Hdr));
    }

    #[test]
    fn detects_heif_brands() {
        let mut heic = vec![0x00, 0x00, 0x00, 0x18];
        heic.extend_from_slice(b"ftypheic");
        heic.extend_from_slice(&[0, 0, 0, 0]);
        heic.extend_from_slice(b"mif1heic");
        assert_eq!(detect(&heic), Some(FormatToken::Heif));

        let mut mp4 = vec![0x00, 0x00, 0x00, 0x14];
        mp4.extend_from_slice(b"ftypisom");
        mp4.extend_from_slice(&[0, 0, 0, 0]);
        mp4.extend_from_slice(b"isom");
        assert_eq!(detect(&mp4), None);
    }

    #[test]
    fn unknown_or_short_input_is_none() {
        assert_eq!(detect(&[]), None);
        assert_eq!(detect(&[0xFF]), None);
        assert_eq!(detect(b"hello world, not an image"), None);
        assert_eq!(detect(b"<html><body></body></html>"), None);
    }

    #[test]
    fn tga_has_no_signature() {
        assert_eq!(detect(&encode_with(ImageFormat::Tga)), None);
    }

    #[test]
    fn table_lookup_falls_back_to_generic() {
        assert_eq!(token_for_loader("jpeg"), FormatToken::Jpg);
        assert_eq!(token_for_loader("radiance"), FormatToken::Hdr);
        assert_eq!(token_for_loader("qoi"), FormatToken::Generic);
    }

    #[test]
    fn every_enumerated_token_is_in_the_table_once() {
        for token in FormatToken::ALL {
            let count = CODECS.iter().filter(|d| d.token == token).count();
            let expected = if token == FormatToken::Generic { 0 } else { 1 };
            assert_eq!(count, expected, "{token}");
        }
    }
}
