//! Fuzz harness for the protobuf field scanner.
//!
//! Feeds arbitrary byte buffers to `count_repeated_field`, which walks the
//! tag/wire-type stream of untrusted on-disk data. The scanner must never
//! panic; malformed input may only surface as a typed error or a
//! best-effort count.

#![no_main]

use libfuzzer_sys::fuzz_target;
use otel_spool::scan::count_repeated_field;

fuzz_target!(|data: &[u8]| {
    for field_number in [0u32, 1, 2, 7, 1_000, u32::MAX >> 3] {
        let _ = count_repeated_field(data, field_number);
    }
});
