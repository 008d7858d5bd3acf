// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::CimgresError;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub(crate) type EngineResult<T> = std::result::Result<T, CimgresError>;

/// Run a codec call, turning a panic into `InternalPanic`.
///
/// mozjpeg reports libjpeg errors by unwinding, and a panic must never reach
/// a worker thread's completion path.
pub(crate) fn run_with_panic_policy<T, F>(stage: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(target: "cimgres::engine", stage, %message, "codec panicked");
            Err(CimgresError::internal_panic(format!("{stage}: {message}")))
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
