// src/engine/tasks.rs
//
// Async task for NAPI. `compute` runs on a libuv worker thread, so the JS
// thread never blocks on decode/encode.

use crate::engine::common::run_with_panic_policy;
use crate::engine::transform::Transformer;
use crate::error::CimgresError;
use crate::ops::TransformRequest;
#[cfg(feature = "napi")]
use napi::bindgen_prelude::*;
#[cfg(feature = "napi")]
use napi::{Env, JsBuffer, Task};
use std::sync::Arc;

/// One resize request, owned by the task for its whole lifetime.
#[cfg_attr(not(feature = "napi"), allow(dead_code))]
pub struct ResizeTask {
    pub(crate) transformer: Arc<Transformer>,
    /// Copied out of the JS Buffer before scheduling; V8 may collect the
    /// original while the task is queued.
    pub(crate) input: Vec<u8>,
    pub(crate) request: TransformRequest,
    pub(crate) last_error: Option<CimgresError>,
}

#[cfg_attr(not(feature = "napi"), allow(dead_code))]
impl ResizeTask {
    pub(crate) fn new(transformer: Arc<Transformer>, input: Vec<u8>, request: TransformRequest) -> Self {
        Self {
            transformer,
            input,
            request,
            last_error: None,
        }
    }

    /// Run the transform and release the input, keeping the error for reject().
    pub(crate) fn run(&mut self) -> std::result::Result<Vec<u8>, CimgresError> {
        let input = std::mem::take(&mut self.input);
        let transformer = &self.transformer;
        let request = &self.request;
        let result = run_with_panic_policy("transform", || transformer.transform(&input, request));
        match result {
            Ok(output) => {
                self.last_error = None;
                Ok(output)
            }
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

#[cfg(feature = "napi")]
#[napi]
impl Task for ResizeTask {
    type Output = Vec<u8>;
    type JsValue = JsBuffer;

    fn compute(&mut self) -> Result<Self::Output> {
        self.run().map_err(napi::Error::from)
    }

    fn resolve(&mut self, env: Env, output: Self::Output) -> Result<Self::JsValue> {
        // The Vec moves into the JS buffer; no copy on the way out
        env.create_buffer_with_data(output).map(|b| b.into_raw())
    }

    fn reject(&mut self, env: Env, err: napi::Error) -> Result<Self::JsValue> {
        // Use stored error if available, otherwise fall back to the napi message
        let cimgres_err = self
            .last_error
            .take()
            .unwrap_or_else(|| CimgresError::internal_panic(err.to_string()));
        Err(crate::error::napi_error_with_code(&env, cimgres_err)?)
    }
}
