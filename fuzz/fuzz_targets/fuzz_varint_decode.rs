//! Fuzz harness for the varint32 codec.
//!
//! Decodes arbitrary bytes both through the stream reader and the slice
//! cursor, and checks that anything that decodes successfully re-encodes to
//! a decodable value. No input may cause a panic.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use otel_spool::varint::{read_varint32, read_varint32_buf, write_varint32};

fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let mut cursor = Cursor::new(rest);
    let stream_result = read_varint32(first, &mut cursor);

    let mut pos = 0;
    let buf_result = read_varint32_buf(data, &mut pos);

    if let (Ok(a), Ok(b)) = (stream_result, buf_result) {
        assert_eq!(a, b, "stream and slice decoders must agree");
        let mut reencoded = Vec::new();
        write_varint32(a, &mut reencoded);
        let mut pos = 0;
        assert_eq!(
            read_varint32_buf(&reencoded, &mut pos).expect("round trip"),
            a
        );
    }
});
