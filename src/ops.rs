// src/ops.rs
//
// Canonical transform requests and output format tokens.
// Cheap to build and move across threads - all the work happens in the engine.

use std::fmt;

/// The single geometric transform applied to an image.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
    /// Width-driven, aspect-preserving resize. `height` is validated but advisory.
    Resize { width: u32, height: u32 },

    /// Uniform linear scale factor
    ScaleFactor { factor: f64 },

    /// Percentage scale (scale = percent / 100)
    ScalePercent { percent: u32 },
}

impl Transform {
    /// Linear scale factor to apply to an image of `source_width` pixels.
    pub fn scale_for(&self, source_width: u32) -> f64 {
        match *self {
            Transform::Resize { width, .. } => width as f64 / source_width.max(1) as f64,
            Transform::ScaleFactor { factor } => factor,
            Transform::ScalePercent { percent } => percent as f64 / 100.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Resize { .. } => "resize",
            Transform::ScaleFactor { .. } => "scale",
            Transform::ScalePercent { .. } => "percent",
        }
    }
}

/// A validated request: one transform plus encoding overrides.
///
/// Only the option resolver builds these from untrusted input, so every
/// numeric field is already known to be strictly positive.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformRequest {
    pub transform: Transform,
    /// Explicit output format override (never empty)
    pub format: Option<String>,
    /// Lossy encoder quality (1-100)
    pub quality: Option<u8>,
}

impl TransformRequest {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            format: None,
            quality: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        self.format = if format.is_empty() { None } else { Some(format) };
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Canonical output-format token (a normalized file extension).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatToken {
    Jpg,
    Png,
    Webp,
    Tif,
    Heif,
    Jxl,
    Gif,
    Jp2,
    Pdf,
    Svg,
    Hdr,
    /// Recognized by a loader that is not individually enumerated
    Generic,
}

impl FormatToken {
    pub const ALL: [FormatToken; 12] = [
        FormatToken::Jpg,
        FormatToken::Png,
        FormatToken::Webp,
        FormatToken::Tif,
        FormatToken::Heif,
        FormatToken::Jxl,
        FormatToken::Gif,
        FormatToken::Jp2,
        FormatToken::Pdf,
        FormatToken::Svg,
        FormatToken::Hdr,
        FormatToken::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatToken::Jpg => "jpg",
            FormatToken::Png => "png",
            FormatToken::Webp => "webp",
            FormatToken::Tif => "tif",
            FormatToken::Heif => "heif",
            FormatToken::Jxl => "jxl",
            FormatToken::Gif => "gif",
            FormatToken::Jp2 => "jp2",
            FormatToken::Pdf => "pdf",
            FormatToken::Svg => "svg",
            FormatToken::Hdr => "hdr",
            FormatToken::Generic => "generic",
        }
    }

    /// Parse a user-supplied token. Case-insensitive, a leading '.' is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let token = trimmed.strip_prefix('.').unwrap_or(trimmed);
        match token.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => Some(FormatToken::Jpg),
            "png" => Some(FormatToken::Png),
            "webp" => Some(FormatToken::Webp),
            "tif" | "tiff" => Some(FormatToken::Tif),
            "heif" | "heic" | "avif" => Some(FormatToken::Heif),
            "jxl" => Some(FormatToken::Jxl),
            "gif" => Some(FormatToken::Gif),
            "jp2" | "j2k" | "jpf" => Some(FormatToken::Jp2),
            "pdf" => Some(FormatToken::Pdf),
            "svg" => Some(FormatToken::Svg),
            "hdr" => Some(FormatToken::Hdr),
            "generic" => Some(FormatToken::Generic),
            _ => None,
        }
    }
}

impl fmt::Display for FormatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputFormat {
    pub token: FormatToken,
    pub quality: u8,
}

impl OutputFormat {
    pub fn new(token: FormatToken, quality: u8) -> Self {
        Self {
            token,
            quality: quality.clamp(1, 100),
        }
    }
}
