#![no_main]

use cimgres::engine::{decode_image, detect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Detection is total; decode may fail but must not panic or abort
    let _ = detect(data);
    let _ = decode_image(data);
});
