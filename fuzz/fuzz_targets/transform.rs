#![no_main]

//! End-to-end fuzz target: arbitrary bytes through decode -> scale -> encode.

use arbitrary::{Arbitrary, Unstructured};
use cimgres::engine::Transformer;
use cimgres::ops::{FormatToken, Transform, TransformRequest};
use cimgres::EngineConfig;
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

#[derive(Arbitrary, Debug)]
struct RequestSeed {
    kind: u8,
    a: u16,
    b: u16,
    format: Option<u8>,
}

fn transformer() -> &'static Transformer {
    static TRANSFORMER: OnceLock<Transformer> = OnceLock::new();
    // Small input cap keeps each run fast
    TRANSFORMER.get_or_init(|| {
        Transformer::native(EngineConfig::default().with_max_input_bytes(1 << 20))
    })
}

fn build_request(seed: &RequestSeed) -> TransformRequest {
    // Keep targets small so the fuzzer spends its time in the decoders
    let transform = match seed.kind % 3 {
        0 => Transform::Resize {
            width: u32::from(seed.a % 256).max(1),
            height: u32::from(seed.b % 256).max(1),
        },
        1 => Transform::ScaleFactor {
            factor: (f64::from(seed.a % 400) + 1.0) / 100.0,
        },
        _ => Transform::ScalePercent {
            percent: u32::from(seed.a % 400).max(1),
        },
    };
    let mut request = TransformRequest::new(transform);
    if let Some(index) = seed.format {
        let token = FormatToken::ALL[index as usize % FormatToken::ALL.len()];
        request = request.with_format(token.as_str());
    }
    request
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let Ok(seed) = RequestSeed::arbitrary(&mut unstructured) else {
        return;
    };
    let request = build_request(&seed);
    let _ = transformer().transform(unstructured.take_rest(), &request);
});
