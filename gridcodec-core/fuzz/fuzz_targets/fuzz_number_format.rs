#![no_main]

//! Fuzz target for number format codes.
//!
//! Parsing any code must not panic, and a parsed code must be a fixed point:
//! writing it back out and parsing again gives the same format.

use gridcodec_core::number_format::DataFormat;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(code) = std::str::from_utf8(data) else {
        return;
    };
    if code.len() > 256 {
        return;
    }

    let format = DataFormat::from_pattern(code);
    let pattern = format.to_pattern();
    let reparsed = DataFormat::from_pattern(&pattern);
    assert_eq!(reparsed.to_pattern(), pattern, "{:?} is not stable", code);

    for value in [0.0, -5.0, 1234.5678, 45306.75, -0.001] {
        let _ = format.render_number(value);
    }
});
