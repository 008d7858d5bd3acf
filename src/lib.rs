// lib.rs
//
// cimgres: resize and re-encode in-memory images
//
// - One transform per call: explicit size, scale factor or percentage
// - Output format chosen by the caller or detected from the input bytes
// - Synchronous, or on a background worker pool behind a one-shot handle
// - Optional Node.js binding (feature "napi")

#[cfg(feature = "napi")]
#[macro_use]
extern crate napi_derive;

// Memory allocator optimization - jemalloc for better performance
// Note: jemalloc is not supported on Windows/MSVC, so we exclude it on that platform
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub mod config;
pub mod engine;
pub mod error;
pub mod ops;

pub use config::EngineConfig;
pub use engine::{detect, init, resize, resize_sync, Deferred, Scheduler, TaskState, Transformer};
pub use error::{CimgresError, ErrorCategory, Result};
pub use ops::{FormatToken, Transform, TransformRequest};

#[cfg(feature = "napi")]
/// Get library version
#[napi]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(feature = "napi")]
/// Get the output format tokens that can be passed as `format`
#[napi]
pub fn supported_output_formats() -> Vec<String> {
    engine::ENCODABLE_FORMATS
        .iter()
        .map(|token| token.as_str().to_string())
        .collect()
}
