#![no_main]

use cimgres::engine::resolve;
use cimgres::Transform;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(options) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(request) = resolve(&options) else {
        return;
    };
    // Anything that resolves must be usable without further checks
    match request.transform {
        Transform::Resize { width, height } => assert!(width > 0 && height > 0),
        Transform::ScaleFactor { factor } => assert!(factor.is_finite() && factor > 0.0),
        Transform::ScalePercent { percent } => assert!(percent > 0),
    }
    if let Some(format) = &request.format {
        assert!(!format.is_empty());
    }
    if let Some(quality) = request.quality {
        assert!((1..=100).contains(&quality));
    }
});
