// src/engine/api.rs
//
// NAPI entry points.
//
// Usage:
// ```js
// const { resize, resizeSync, detectFormat } = require('cimgres');
// const thumb = await resize(buffer, { width: 320, height: 240 });
// const half = resizeSync(buffer, { percent: 50, format: 'webp', quality: 70 });
// ```
//
// Options are resolved before anything is scheduled, so a bad options object
// throws synchronously from `resize` instead of rejecting the promise.

use crate::engine::detect;
use crate::engine::options::resolve;
use crate::engine::scheduler::shared_transformer;
use crate::engine::tasks::ResizeTask;
use crate::engine::transform::Transformer;
use crate::error::{napi_error_with_code, CimgresError};
use napi::bindgen_prelude::*;
use std::sync::Arc;

// Both entry points run on threads Node already owns, so only the transformer
// is needed; the rayon pool is never started from JS.
fn transformer(env: &Env) -> Result<&'static Arc<Transformer>> {
    shared_transformer().map_err(|err| throw(env, err))
}

fn throw(env: &Env, err: CimgresError) -> napi::Error {
    napi_error_with_code(env, err.clone()).unwrap_or_else(|_| napi::Error::from(err))
}

/// Resize on the calling thread and return the encoded image.
#[napi(js_name = "resizeSync")]
pub fn resize_sync(env: Env, input: Buffer, options: serde_json::Value) -> Result<Buffer> {
    let request = resolve(&options).map_err(|err| throw(&env, err))?;
    transformer(&env)?
        .transform(input.as_ref(), &request)
        .map(Buffer::from)
        .map_err(|err| throw(&env, err))
}

/// Resize on a libuv worker thread. Resolves with the encoded image.
#[napi(ts_return_type = "Promise<Buffer>")]
pub fn resize(env: Env, input: Buffer, options: serde_json::Value) -> Result<AsyncTask<ResizeTask>> {
    let request = resolve(&options).map_err(|err| throw(&env, err))?;
    let transformer = Arc::clone(transformer(&env)?);
    Ok(AsyncTask::new(ResizeTask::new(
        transformer,
        input.to_vec(),
        request,
    )))
}

/// Canonical output format detected from the input signature, or null.
#[napi(js_name = "detectFormat")]
pub fn detect_format(input: Buffer) -> Option<String> {
    detect::detect(input.as_ref()).map(|token| token.as_str().to_string())
}
