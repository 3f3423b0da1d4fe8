//! Protobuf-style varint32 codec used for length-prefix record framing.
//!
//! Values are encoded in base-128 groups, least-significant first, with the
//! continuation bit (`0x80`) set on every byte except the last. A 32-bit
//! value occupies at most five bytes.

use std::io::{self, Read};

use thiserror::Error;

/// Maximum encoded size of a varint32.
pub const MAX_VARINT32_LEN: usize = 5;

/// Errors from varint decoding.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VarintError {
    /// The stream ended before a byte without the continuation bit was found.
    #[error("truncated varint: stream ended before terminating byte")]
    Truncated,

    /// More than five bytes were consumed without a terminating byte.
    #[error("varint overflow: exceeds 32-bit range after {MAX_VARINT32_LEN} bytes")]
    Overflow,

    /// I/O error while reading continuation bytes.
    #[error("I/O error while reading varint: {0}")]
    Io(#[from] io::Error),
}

/// Appends the varint encoding of `value` to `sink`.
pub fn write_varint32(value: u32, sink: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let mut byte = (v & 0x7F) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        sink.push(byte);
        if v == 0 {
            break;
        }
    }
}

/// Returns the encoded size of `value` in bytes (1..=5).
pub fn varint32_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Decodes a varint32 whose first byte has already been read from `source`.
///
/// Additional bytes are pulled from `source` as needed. Fails with
/// [`VarintError::Truncated`] if the stream ends mid-value and with
/// [`VarintError::Overflow`] if no terminating byte appears within five
/// bytes.
pub fn read_varint32<R: Read>(first_byte: u8, source: &mut R) -> Result<u32, VarintError> {
    let mut value = u32::from(first_byte & 0x7F);
    if first_byte & 0x80 == 0 {
        return Ok(value);
    }
    let mut shift = 7u32;
    for _ in 1..MAX_VARINT32_LEN {
        let byte = read_one(source)?;
        value |= u32::from(byte & 0x7F).wrapping_shl(shift);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(VarintError::Overflow)
}

/// Decodes a varint32 from `buf` starting at `*pos`, advancing `*pos` past
/// the encoded bytes. Slice-based twin of [`read_varint32`] used by the
/// field scanner.
pub fn read_varint32_buf(buf: &[u8], pos: &mut usize) -> Result<u32, VarintError> {
    let mut value = 0u32;
    let mut shift = 0u32;
    for i in 0..MAX_VARINT32_LEN {
        let byte = *buf.get(*pos + i).ok_or(VarintError::Truncated)?;
        value |= u32::from(byte & 0x7F).wrapping_shl(shift);
        if byte & 0x80 == 0 {
            *pos += i + 1;
            return Ok(value);
        }
        shift += 7;
    }
    Err(VarintError::Overflow)
}

fn read_one<R: Read>(source: &mut R) -> Result<u8, VarintError> {
    let mut byte = [0u8; 1];
    match source.read_exact(&mut byte) {
        Ok(()) => Ok(byte[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(VarintError::Truncated),
        Err(e) => Err(VarintError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;

    fn decode(bytes: &[u8]) -> Result<u32, VarintError> {
        let mut cursor = Cursor::new(&bytes[1..]);
        read_varint32(bytes[0], &mut cursor)
    }

    #[test]
    fn known_vectors() {
        let cases: &[(u32, &[u8])] = &[
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (300, &[0xAC, 0x02]),
            (16_384, &[0x80, 0x80, 0x01]),
            (u32::MAX, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];
        for (value, encoded) in cases {
            let mut sink = Vec::new();
            write_varint32(*value, &mut sink);
            assert_eq!(&sink, encoded, "encoding of {value}");
            assert_eq!(decode(encoded).unwrap(), *value, "decoding of {value}");
            assert_eq!(varint32_len(*value), encoded.len());
        }
    }

    #[test]
    fn truncated_stream_is_an_error() {
        // Continuation bit set, but no further bytes available.
        let err = decode(&[0x80]).unwrap_err();
        assert!(matches!(err, VarintError::Truncated));
    }

    #[test]
    fn six_byte_varint_overflows() {
        let err = decode(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]).unwrap_err();
        assert!(matches!(err, VarintError::Overflow));
    }

    #[test]
    fn buf_variant_advances_position() {
        let mut buf = Vec::new();
        write_varint32(300, &mut buf);
        write_varint32(7, &mut buf);

        let mut pos = 0;
        assert_eq!(read_varint32_buf(&buf, &mut pos).unwrap(), 300);
        assert_eq!(pos, 2);
        assert_eq!(read_varint32_buf(&buf, &mut pos).unwrap(), 7);
        assert_eq!(pos, 3);
        assert!(matches!(
            read_varint32_buf(&buf, &mut pos),
            Err(VarintError::Truncated)
        ));
    }

    proptest! {
        #[test]
        fn round_trips_any_u32(value: u32) {
            let mut sink = Vec::new();
            write_varint32(value, &mut sink);
            prop_assert_eq!(sink.len(), varint32_len(value));
            prop_assert_eq!(decode(&sink).unwrap(), value);

            let mut pos = 0;
            prop_assert_eq!(read_varint32_buf(&sink, &mut pos).unwrap(), value);
            prop_assert_eq!(pos, sink.len());
        }

        #[test]
        fn never_panics_on_arbitrary_bytes(bytes in proptest::collection::vec(any::<u8>(), 1..16)) {
            let _ = decode(&bytes);
            let mut pos = 0;
            let _ = read_varint32_buf(&bytes, &mut pos);
        }
    }
}
