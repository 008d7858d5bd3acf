// src/error.rs
//
// Unified error handling for cimgres
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Malformed options, rejected before any decode work
// - CodecError: Decode/format/encode issues
// - ResourceLimit: Input size and dimension limits
// - InternalBug: Library bugs and broken configuration

#[cfg(feature = "napi")]
use napi::bindgen_prelude::*;
use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy exposed to callers (and to JavaScript as `error.category`).
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "napi", napi)]
#[cfg_attr(not(feature = "napi"), derive(Clone, Copy))]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid options, recoverable by the caller
    UserError,
    /// Decode/format/encode issues
    CodecError,
    /// Input size and dimension limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

/// cimgres error types
#[derive(Clone, Debug, Error)]
pub enum CimgresError {
    // Validation Errors
    #[error("Invalid options: {reason}")]
    InvalidOptions { reason: Cow<'static, str> },

    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    #[error("No transform selected: expected width + height, scale, or percent")]
    MissingTransform,

    // Codec Errors
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    #[error("Input of {len} bytes exceeds maximum {max}")]
    InputTooLarge { len: usize, max: usize },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },

    #[error("Invalid configuration for {key}: {message}")]
    Config {
        key: Cow<'static, str>,
        message: Cow<'static, str>,
    },
}

// Constructor Helpers
impl CimgresError {
    pub fn invalid_options(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_transform() -> Self {
        Self::MissingTransform
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn input_too_large(len: usize, max: usize) -> Self {
        Self::InputTooLarge { len, max }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    pub fn config(
        key: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True for errors raised while resolving options, before any decode work.
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::UserError
    }

    /// Check if this error is recoverable (caller can fix it)
    ///
    /// Consistent with category():
    /// - UserError and ResourceLimit errors are recoverable
    /// - CodecError and InternalBug errors are not
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidOptions { .. }
            | Self::InvalidArgument { .. }
            | Self::MissingTransform => ErrorCategory::UserError,

            Self::DecodeFailed { .. }
            | Self::UnsupportedFormat { .. }
            | Self::EncodeFailed { .. }
            | Self::ResizeFailed { .. } => ErrorCategory::CodecError,

            Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::InputTooLarge { .. } => ErrorCategory::ResourceLimit,

            Self::InternalPanic { .. } | Self::Config { .. } => ErrorCategory::InternalBug,
        }
    }
}

impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }

    /// Get the CIMGRES_* error code string for this category
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "CIMGRES_USER_ERROR",
            ErrorCategory::CodecError => "CIMGRES_CODEC_ERROR",
            ErrorCategory::ResourceLimit => "CIMGRES_RESOURCE_LIMIT",
            ErrorCategory::InternalBug => "CIMGRES_INTERNAL_BUG",
        }
    }
}

/// Build a JS error object carrying `code` and `category` properties.
#[cfg(feature = "napi")]
pub fn create_napi_error_with_code(env: &Env, err: CimgresError) -> napi::Result<napi::JsObject> {
    let category = err.category();
    let err_msg = err.to_string();
    let mut error_obj = env.create_error(napi::Error::new(
        match category {
            ErrorCategory::UserError => Status::InvalidArg,
            ErrorCategory::CodecError => Status::InvalidArg,
            ErrorCategory::ResourceLimit => Status::GenericFailure,
            ErrorCategory::InternalBug => Status::GenericFailure,
        },
        err_msg.clone(),
    ))?;

    // napi::Error::new() may prefix the Status, so set message directly
    error_obj.set_named_property("message", env.create_string(&err_msg)?)?;
    error_obj.set_named_property("code", env.create_string(category.code())?)?;
    error_obj.set_named_property("category", env.create_uint32(category as u32)?)?;

    Ok(error_obj)
}

/// Convert CimgresError to napi::Error with code/category attached.
#[cfg(feature = "napi")]
pub fn napi_error_with_code(env: &Env, err: CimgresError) -> napi::Result<napi::Error> {
    let error_obj = create_napi_error_with_code(env, err)?;
    let js_unknown = error_obj.into_unknown();
    Ok(napi::Error::from(js_unknown))
}

// Fallback conversion without code/category properties.
// Use napi_error_with_code() when Env is available.
#[cfg(feature = "napi")]
impl From<CimgresError> for napi::Error {
    fn from(err: CimgresError) -> Self {
        let status = match err.category() {
            ErrorCategory::UserError | ErrorCategory::CodecError => Status::InvalidArg,
            ErrorCategory::ResourceLimit | ErrorCategory::InternalBug => Status::GenericFailure,
        };
        napi::Error::new(status, err.to_string())
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, CimgresError>;
