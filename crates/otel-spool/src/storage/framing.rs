//! Record framing: the byte-level convention delimiting one record from the
//! next within a buffer file.

use std::io::{self, BufRead};

use crate::serialize::WireFormat;
use crate::varint::{self, VarintError};

use super::readable::ReadError;

/// How records are delimited on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One record per line; used by the JSON wire format.
    NewlineDelimited,
    /// `<varint32 length><payload>`; used by the protobuf wire format.
    LengthPrefixed,
}

impl From<WireFormat> for Framing {
    fn from(format: WireFormat) -> Self {
        match format {
            WireFormat::Json => Self::NewlineDelimited,
            WireFormat::Protobuf => Self::LengthPrefixed,
        }
    }
}

/// One record read back from a file, with the number of file bytes its
/// framed form occupied.
#[derive(Debug)]
pub(crate) struct Frame {
    pub record: Vec<u8>,
    pub framed_len: u64,
}

impl Framing {
    /// Returns the framed encoding of `record`.
    pub(crate) fn frame(self, record: &[u8]) -> Vec<u8> {
        match self {
            Self::NewlineDelimited => {
                let mut out = Vec::with_capacity(record.len() + 1);
                out.extend_from_slice(record);
                out.push(b'\n');
                out
            },
            Self::LengthPrefixed => {
                let len = record.len() as u32;
                let mut out = Vec::with_capacity(record.len() + varint::varint32_len(len));
                varint::write_varint32(len, &mut out);
                out.extend_from_slice(record);
                out
            },
        }
    }

    /// Reads the next framed record, or `None` at end of stream.
    pub(crate) fn read_frame<R: BufRead>(self, reader: &mut R) -> Result<Option<Frame>, ReadError> {
        match self {
            Self::NewlineDelimited => {
                let mut line = Vec::new();
                let read = reader.read_until(b'\n', &mut line)?;
                if read == 0 {
                    return Ok(None);
                }
                let framed_len = line.len() as u64;
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                Ok(Some(Frame {
                    record: line,
                    framed_len,
                }))
            },
            Self::LengthPrefixed => {
                let mut first = [0u8; 1];
                match reader.read_exact(&mut first) {
                    Ok(()) => {},
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                    Err(e) => return Err(ReadError::Io(e)),
                }
                let len = varint::read_varint32(first[0], reader)? as usize;
                let mut record = vec![0u8; len];
                reader.read_exact(&mut record).map_err(|e| {
                    if e.kind() == io::ErrorKind::UnexpectedEof {
                        ReadError::Framing(VarintError::Truncated)
                    } else {
                        ReadError::Io(e)
                    }
                })?;
                Ok(Some(Frame {
                    record,
                    framed_len: (varint::varint32_len(len as u32) + len) as u64,
                }))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn newline_frames_round_trip() {
        let framing = Framing::NewlineDelimited;
        let mut bytes = framing.frame(b"first");
        bytes.extend(framing.frame(b"second"));

        let mut cursor = Cursor::new(bytes);
        let one = framing.read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(one.record, b"first");
        assert_eq!(one.framed_len, 6);
        let two = framing.read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(two.record, b"second");
        assert!(framing.read_frame(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn length_prefixed_frames_round_trip() {
        let framing = Framing::LengthPrefixed;
        let payload = vec![0xAAu8; 300];
        let mut bytes = framing.frame(&payload);
        bytes.extend(framing.frame(b""));

        let mut cursor = Cursor::new(bytes);
        let one = framing.read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(one.record, payload);
        assert_eq!(one.framed_len, 302, "two length bytes plus payload");
        let two = framing.read_frame(&mut cursor).unwrap().unwrap();
        assert!(two.record.is_empty());
        assert!(framing.read_frame(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn torn_length_prefixed_tail_is_a_framing_error() {
        let framing = Framing::LengthPrefixed;
        let mut bytes = framing.frame(b"whole");
        bytes.extend_from_slice(&framing.frame(b"torn record")[..5]);

        let mut cursor = Cursor::new(bytes);
        assert!(framing.read_frame(&mut cursor).unwrap().is_some());
        let err = framing.read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ReadError::Framing(_)));
    }
}
