//! Minimal protobuf field scanner.
//!
//! Walks the tag/wire-type stream of a serialized message without
//! constructing any message objects, counting top-level occurrences of one
//! field number. Used on the binary deserialize path to validate and size a
//! payload before handing it to a full decoder.
//!
//! The count is best-effort by design: a length-delimited field that claims
//! more bytes than remain terminates the scan with the count gathered so
//! far. Genuinely malformed input (a truncated varint, or the deprecated
//! group wire types) is a hard error.

use thiserror::Error;

use crate::varint::{self, VarintError};

/// Maximum encoded size of a varint-encoded 64-bit scalar value.
const MAX_VARINT64_LEN: usize = 10;

/// Errors from scanning a serialized message buffer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScanError {
    /// A tag, length, or varint-typed value ended mid-encoding.
    #[error("truncated varint in message buffer")]
    TruncatedVarint,

    /// The buffer uses a wire type this scanner does not support.
    /// Wire types 3 and 4 (group start/end) are deprecated; values above 5
    /// are not defined by the protobuf encoding.
    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u32),
}

impl From<VarintError> for ScanError {
    fn from(e: VarintError) -> Self {
        match e {
            VarintError::Truncated | VarintError::Io(_) => Self::TruncatedVarint,
            // A >5-byte tag or length does not fit 32 bits; the buffer is
            // not a message this scanner understands.
            VarintError::Overflow => Self::TruncatedVarint,
        }
    }
}

/// Counts top-level occurrences of `field_number` in `buf`.
///
/// Returns the exact occurrence count for varint, fixed32, fixed64, and
/// length-delimited fields. Fields nested inside length-delimited payloads
/// are not visited.
pub fn count_repeated_field(buf: &[u8], field_number: u32) -> Result<usize, ScanError> {
    let mut count = 0usize;
    let mut pos = 0usize;

    while pos < buf.len() {
        let tag = varint::read_varint32_buf(buf, &mut pos)?;
        let current_field = tag >> 3;
        let wire_type = tag & 0x7;

        if current_field == field_number {
            count += 1;
        }

        match wire_type {
            // Varint scalar: skip continuation bytes (64-bit allowance).
            0 => skip_varint64(buf, &mut pos)?,
            // 64-bit scalar.
            1 => {
                if buf.len() - pos < 8 {
                    return Ok(count);
                }
                pos += 8;
            },
            // Length-delimited: a claimed length beyond the remaining bytes
            // terminates the scan with the best-effort count.
            2 => {
                let len = varint::read_varint32_buf(buf, &mut pos)? as usize;
                if buf.len() - pos < len {
                    return Ok(count);
                }
                pos += len;
            },
            // 32-bit scalar.
            5 => {
                if buf.len() - pos < 4 {
                    return Ok(count);
                }
                pos += 4;
            },
            other => return Err(ScanError::UnsupportedWireType(other)),
        }
    }

    Ok(count)
}

/// Skips one varint-encoded scalar, allowing the full 64-bit range.
fn skip_varint64(buf: &[u8], pos: &mut usize) -> Result<(), ScanError> {
    for i in 0..MAX_VARINT64_LEN {
        let byte = *buf.get(*pos + i).ok_or(ScanError::TruncatedVarint)?;
        if byte & 0x80 == 0 {
            *pos += i + 1;
            return Ok(());
        }
    }
    Err(ScanError::TruncatedVarint)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::varint::write_varint32;

    fn tag(field: u32, wire_type: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_varint32((field << 3) | wire_type, &mut out);
        out
    }

    fn varint_field(field: u32, value: u32) -> Vec<u8> {
        let mut out = tag(field, 0);
        write_varint32(value, &mut out);
        out
    }

    fn len_delimited_field(field: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = tag(field, 2);
        write_varint32(payload.len() as u32, &mut out);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn counts_varint_fields() {
        let mut buf = varint_field(1, 42);
        buf.extend(varint_field(2, 7));
        buf.extend(varint_field(1, 300));

        assert_eq!(count_repeated_field(&buf, 1).unwrap(), 2);
        assert_eq!(count_repeated_field(&buf, 2).unwrap(), 1);
        assert_eq!(count_repeated_field(&buf, 3).unwrap(), 0);
    }

    #[test]
    fn counts_fixed_width_fields() {
        let mut buf = tag(4, 1);
        buf.extend_from_slice(&42u64.to_le_bytes());
        buf.extend(tag(4, 5));
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend(tag(9, 5));
        buf.extend_from_slice(&1u32.to_le_bytes());

        assert_eq!(count_repeated_field(&buf, 4).unwrap(), 2);
        assert_eq!(count_repeated_field(&buf, 9).unwrap(), 1);
    }

    #[test]
    fn counts_length_delimited_fields() {
        let mut buf = len_delimited_field(1, b"hello");
        buf.extend(len_delimited_field(1, b""));
        buf.extend(len_delimited_field(3, b"other"));

        assert_eq!(count_repeated_field(&buf, 1).unwrap(), 2);
        assert_eq!(count_repeated_field(&buf, 3).unwrap(), 1);
    }

    #[test]
    fn nested_messages_are_not_visited() {
        // Field 5 occurs inside a field-1 submessage; only the top level
        // is scanned.
        let inner = varint_field(5, 1);
        let buf = len_delimited_field(1, &inner);

        assert_eq!(count_repeated_field(&buf, 5).unwrap(), 0);
        assert_eq!(count_repeated_field(&buf, 1).unwrap(), 1);
    }

    #[test]
    fn truncated_length_delimited_stops_gracefully() {
        let mut buf = len_delimited_field(2, b"ok");
        // Claims 100 bytes, provides 3.
        buf.extend(tag(2, 2));
        write_varint32(100, &mut buf);
        buf.extend_from_slice(b"abc");

        assert_eq!(count_repeated_field(&buf, 2).unwrap(), 2);
    }

    #[test]
    fn truncated_varint_value_is_an_error() {
        let mut buf = tag(1, 0);
        buf.push(0x80); // continuation bit set, nothing follows

        let err = count_repeated_field(&buf, 1).unwrap_err();
        assert!(matches!(err, ScanError::TruncatedVarint));
    }

    #[test]
    fn truncated_tag_is_an_error() {
        let err = count_repeated_field(&[0x80], 1).unwrap_err();
        assert!(matches!(err, ScanError::TruncatedVarint));
    }

    #[test]
    fn group_wire_types_are_rejected() {
        for wire_type in [3u32, 4] {
            let buf = tag(1, wire_type);
            let err = count_repeated_field(&buf, 1).unwrap_err();
            assert!(
                matches!(err, ScanError::UnsupportedWireType(w) if w == wire_type),
                "wire type {wire_type} must be rejected by name"
            );
        }
    }

    #[test]
    fn wire_type_six_is_rejected() {
        let buf = tag(1, 6);
        let err = count_repeated_field(&buf, 1).unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedWireType(6)));
    }

    #[test]
    fn empty_buffer_counts_zero() {
        assert_eq!(count_repeated_field(&[], 1).unwrap(), 0);
    }

    #[test]
    fn real_prost_message_counts_match() {
        use prost::Message;

        // Three resource_spans-shaped entries under field 1.
        let payload = crate::proto::trace::TracesData {
            resource_spans: vec![
                crate::proto::trace::ResourceSpans::default(),
                crate::proto::trace::ResourceSpans::default(),
                crate::proto::trace::ResourceSpans::default(),
            ],
        }
        .encode_to_vec();

        assert_eq!(count_repeated_field(&payload, 1).unwrap(), 3);
    }

    proptest! {
        #[test]
        fn never_panics_on_arbitrary_bytes(
            bytes in proptest::collection::vec(any::<u8>(), 0..256),
            field in 1u32..16,
        ) {
            let _ = count_repeated_field(&bytes, field);
        }

        #[test]
        fn count_matches_constructed_occurrences(n in 0usize..8, m in 0usize..8) {
            let mut buf = Vec::new();
            for _ in 0..n {
                buf.extend(len_delimited_field(1, b"payload"));
            }
            for _ in 0..m {
                buf.extend(varint_field(2, 9));
            }
            prop_assert_eq!(count_repeated_field(&buf, 1).unwrap(), n);
            prop_assert_eq!(count_repeated_field(&buf, 2).unwrap(), m);
        }
    }
}
