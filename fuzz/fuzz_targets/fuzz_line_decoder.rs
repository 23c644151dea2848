//! Fuzz target: `LineDecoder::feed` + `next_frame`
//!
//! Drives arbitrary byte sequences into the streaming line decoder and
//! asserts that it never panics, never yields an empty or oversized
//! frame, and always drains its buffer once the input ends in a newline.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use nursery_agv::rpc::codec::{LineDecoder, MAX_FRAME_LEN};

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    let mut rest = data;
    while !rest.is_empty() {
        let n = decoder.feed(rest);
        rest = &rest[n..];
        while let Some(frame) = decoder.next_frame() {
            if let Ok(line) = frame {
                assert!(line.len() <= MAX_FRAME_LEN, "frame exceeds MAX_FRAME_LEN");
                assert!(!line.is_empty(), "decoder must not yield empty frames");
                assert!(!line.contains(&b'\n'), "frame must not contain a newline");
            }
        }
        if n == 0 && decoder.spare().is_empty() {
            break;
        }
    }

    decoder.feed(b"\n");
    while decoder.next_frame().is_some() {}
    assert_eq!(decoder.buffered(), 0);
});
