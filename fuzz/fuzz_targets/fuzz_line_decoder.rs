//! Fuzz target: `LineDecoder::feed`
//!
//! Drives arbitrary byte sequences into the serial line decoder and
//! asserts that it never panics and never yields a line longer than its
//! buffer or than the bytes fed since the previous newline.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use focuser::bindings::line::{LineDecoder, MAX_LINE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();
    let mut since_newline = 0usize;

    for &byte in data {
        since_newline += 1;
        if let Some(result) = decoder.feed(byte) {
            assert_eq!(byte, b'\n', "lines only complete on a newline");
            if let Ok(line) = result {
                assert!(line.len() <= MAX_LINE);
                assert!(line.len() < since_newline);
            }
            since_newline = 0;
            assert!(!decoder.in_progress());
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    assert!(!decoder.in_progress());
    assert!(matches!(decoder.feed(b'\n'), Some(Ok(line)) if line.is_empty()));
});
