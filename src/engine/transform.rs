// src/engine/transform.rs
//
// The transform engine: decode -> scale -> resolve output format -> encode.

use crate::config::EngineConfig;
use crate::engine::codec::{ImageCodec, NativeCodec};
use crate::engine::detect;
use crate::error::{CimgresError, Result};
use crate::ops::{FormatToken, OutputFormat, TransformRequest};
use std::sync::Arc;
use std::time::Instant;

/// Runs one request end to end on the calling thread.
///
/// Holds only immutable state, so one instance is shared by every worker.
#[derive(Clone)]
pub struct Transformer {
    codec: Arc<dyn ImageCodec>,
    config: EngineConfig,
}

impl Transformer {
    pub fn new(codec: Arc<dyn ImageCodec>, config: EngineConfig) -> Self {
        Self { codec, config }
    }

    pub fn native(config: EngineConfig) -> Self {
        Self::new(Arc::new(NativeCodec), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Transform `input` according to `request` and return the encoded bytes.
    pub fn transform(&self, input: &[u8], request: &TransformRequest) -> Result<Vec<u8>> {
        let started = Instant::now();
        if let Some(max) = self.config.max_input_bytes {
            if input.len() > max {
                return Err(CimgresError::input_too_large(input.len(), max));
            }
        }

        let decoded = self.codec.decode(input)?;
        let (src_w, src_h) = (decoded.width(), decoded.height());

        let scale = request.transform.scale_for(src_w);
        let resized = self.codec.resize_by(decoded, scale)?;

        let token = self.output_token(input, request)?;
        let quality = request.quality.unwrap_or(self.config.default_quality);
        let output = self
            .codec
            .encode(&resized, OutputFormat::new(token, quality))?;

        tracing::debug!(
            target: "cimgres::engine",
            transform = request.transform.name(),
            scale,
            src_w,
            src_h,
            dst_w = resized.width(),
            dst_h = resized.height(),
            format = token.as_str(),
            bytes_in = input.len(),
            bytes_out = output.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "transform complete"
        );
        Ok(output)
    }

    /// Explicit override first, then detection on the original input bytes.
    fn output_token(&self, input: &[u8], request: &TransformRequest) -> Result<FormatToken> {
        match request.format.as_deref() {
            Some(raw) => FormatToken::parse(raw).ok_or_else(|| {
                CimgresError::encode_failed(raw.to_string(), "no encoder is registered for this format")
            }),
            None => detect::detect(input).ok_or_else(|| {
                CimgresError::unsupported_format(
                    "input signature not recognized; pass `format` to choose an output format",
                )
            }),
        }
    }
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
