//! Buffer file opened for consuming reads.
//!
//! A readable file never touches the original directly while reading:
//! opening makes a private temporary copy, and reads advance through that
//! copy. When the caller accepts a record, the original is rewritten to the
//! not-yet-consumed suffix, so accepted records are durably removed while a
//! rejected record is simply redelivered on the next call.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::varint::VarintError;

use super::framing::Framing;

/// Errors from consuming reads.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// The file was already closed.
    #[error("buffer file is closed")]
    Closed,

    /// The record framing is corrupt (torn frame, bad length prefix).
    #[error("corrupted record framing: {0}")]
    Framing(#[from] VarintError),

    /// Disk read or truncation failed.
    #[error("I/O error on buffer file: {0}")]
    Io(#[from] io::Error),
}

/// The result of one [`ReadableFile::consume_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The acceptance check took the record; it is now removed from the
    /// original file.
    Accepted,
    /// The acceptance check declined; the same record will be returned on
    /// the next call.
    Rejected,
    /// No records remain.
    Exhausted,
}

struct PendingRecord {
    record: Vec<u8>,
    framed_len: u64,
}

struct ReaderState {
    reader: Option<BufReader<File>>,
    /// Bytes already consumed and removed from the original.
    read_bytes: u64,
    /// A record delivered but not yet accepted.
    pending: Option<PendingRecord>,
}

/// A buffer file opened for consuming reads.
///
/// Consumption is serialized behind a mutex; at most one record is in
/// flight per file instance.
pub struct ReadableFile {
    original_path: PathBuf,
    temp_path: PathBuf,
    framing: Framing,
    inner: Mutex<ReaderState>,
}

impl std::fmt::Debug for ReadableFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadableFile")
            .field("original_path", &self.original_path)
            .field("temp_path", &self.temp_path)
            .finish_non_exhaustive()
    }
}

impl ReadableFile {
    /// Opens `path` for consumption by copying it to a private `.tmp`
    /// sibling and reading from the copy.
    pub(crate) fn open(path: &Path, framing: Framing) -> io::Result<Self> {
        let mut temp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        fs::copy(path, &temp_path)?;
        let reader = BufReader::new(File::open(&temp_path)?);
        Ok(Self {
            original_path: path.to_path_buf(),
            temp_path,
            framing,
            inner: Mutex::new(ReaderState {
                reader: Some(reader),
                read_bytes: 0,
                pending: None,
            }),
        })
    }

    /// Hands the next record to `accept`. A `true` return durably removes
    /// the record from the original file; `false` leaves the file unchanged
    /// and redelivers the same record next time.
    pub fn consume_next<F>(&self, accept: F) -> Result<ReadOutcome, ReadError>
    where
        F: FnOnce(&[u8]) -> bool,
    {
        let mut state = self.inner.lock().expect("lock poisoned");
        if state.reader.is_none() {
            return Err(ReadError::Closed);
        }

        let (record, framed_len) = match state.pending.take() {
            Some(pending) => (pending.record, pending.framed_len),
            None => {
                let frame = match state.reader.as_mut() {
                    Some(reader) => self.framing.read_frame(reader)?,
                    None => return Err(ReadError::Closed),
                };
                match frame {
                    Some(frame) => (frame.record, frame.framed_len),
                    None => return Ok(ReadOutcome::Exhausted),
                }
            },
        };

        if accept(&record) {
            state.read_bytes += framed_len;
            self.rewrite_original(state.read_bytes)?;
            Ok(ReadOutcome::Accepted)
        } else {
            state.pending = Some(PendingRecord { record, framed_len });
            Ok(ReadOutcome::Rejected)
        }
    }

    /// Path of the file being consumed.
    pub fn path(&self) -> &Path {
        &self.original_path
    }

    /// Releases the handle and deletes the temporary copy. Never deletes
    /// the original. Safe to call repeatedly.
    pub fn close(&self) -> io::Result<()> {
        let mut state = self.inner.lock().expect("lock poisoned");
        if state.reader.take().is_some() {
            match fs::remove_file(&self.temp_path) {
                Ok(()) => {},
                Err(e) if e.kind() == io::ErrorKind::NotFound => {},
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Rewrites the original file to the suffix of the temp copy starting
    /// at `read_bytes`, durably removing everything consumed so far.
    fn rewrite_original(&self, read_bytes: u64) -> io::Result<()> {
        let mut src = File::open(&self.temp_path)?;
        src.seek(SeekFrom::Start(read_bytes))?;
        let mut dst = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.original_path)?;
        io::copy(&mut src, &mut dst)?;
        dst.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::super::writable::WritableFile;
    use super::*;
    use crate::clock::test_support::ManualClock;

    fn write_records(dir: &TempDir, framing: Framing, records: &[&[u8]]) -> PathBuf {
        let clock = Arc::new(ManualClock::new(1_000));
        let file = WritableFile::create(
            dir.path().join("00000000000000001000"),
            1_000,
            60_000,
            1_000,
            framing,
            clock,
        )
        .unwrap();
        for record in records {
            file.append(record).unwrap();
        }
        file.close().unwrap();
        file.path().to_path_buf()
    }

    #[test]
    fn consume_removes_accepted_records() {
        let dir = TempDir::new().unwrap();
        let path = write_records(&dir, Framing::NewlineDelimited, &[b"First line", b"Second line"]);

        let reader = ReadableFile::open(&path, Framing::NewlineDelimited).unwrap();
        let outcome = reader
            .consume_next(|record| {
                assert_eq!(record, b"First line");
                true
            })
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Accepted);
        reader.close().unwrap();

        let remaining = std::fs::read_to_string(&path).unwrap();
        assert_eq!(remaining, "Second line\n");
    }

    #[test]
    fn rejected_record_is_redelivered_and_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_records(&dir, Framing::NewlineDelimited, &[b"only", b"next"]);
        let before = std::fs::read(&path).unwrap();

        let reader = ReadableFile::open(&path, Framing::NewlineDelimited).unwrap();
        for _ in 0..3 {
            let outcome = reader
                .consume_next(|record| {
                    assert_eq!(record, b"only");
                    false
                })
                .unwrap();
            assert_eq!(outcome, ReadOutcome::Rejected);
        }
        assert_eq!(std::fs::read(&path).unwrap(), before, "no truncation");

        // Acceptance after rejections consumes that same record.
        let outcome = reader
            .consume_next(|record| {
                assert_eq!(record, b"only");
                true
            })
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Accepted);
        reader.close().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "next\n");
    }

    #[test]
    fn durable_consumption_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = write_records(&dir, Framing::NewlineDelimited, &[b"r1", b"r2", b"r3"]);

        let reader = ReadableFile::open(&path, Framing::NewlineDelimited).unwrap();
        assert_eq!(
            reader.consume_next(|_| true).unwrap(),
            ReadOutcome::Accepted
        );
        assert_eq!(
            reader.consume_next(|_| true).unwrap(),
            ReadOutcome::Accepted
        );
        reader.close().unwrap();

        // Reopen: only the record after the two consumed ones remains.
        let reader = ReadableFile::open(&path, Framing::NewlineDelimited).unwrap();
        let outcome = reader
            .consume_next(|record| {
                assert_eq!(record, b"r3");
                true
            })
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Accepted);
        assert_eq!(
            reader.consume_next(|_| true).unwrap(),
            ReadOutcome::Exhausted
        );
        reader.close().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn length_prefixed_records_round_trip_through_consumption() {
        let dir = TempDir::new().unwrap();
        let payload = vec![0x42u8; 200];
        let path = write_records(&dir, Framing::LengthPrefixed, &[&payload, b"tail"]);

        let reader = ReadableFile::open(&path, Framing::LengthPrefixed).unwrap();
        reader
            .consume_next(|record| {
                assert_eq!(record, payload.as_slice());
                true
            })
            .unwrap();
        reader
            .consume_next(|record| {
                assert_eq!(record, b"tail");
                true
            })
            .unwrap();
        assert_eq!(
            reader.consume_next(|_| true).unwrap(),
            ReadOutcome::Exhausted
        );
        reader.close().unwrap();
    }

    #[test]
    fn close_deletes_temp_copy_but_not_original() {
        let dir = TempDir::new().unwrap();
        let path = write_records(&dir, Framing::NewlineDelimited, &[b"keep me"]);

        let reader = ReadableFile::open(&path, Framing::NewlineDelimited).unwrap();
        let temp_path = path.with_file_name("00000000000000001000.tmp");
        assert!(temp_path.exists());

        reader.close().unwrap();
        reader.close().unwrap(); // idempotent
        assert!(!temp_path.exists());
        assert!(path.exists());

        let err = reader.consume_next(|_| true).unwrap_err();
        assert!(matches!(err, ReadError::Closed));
    }

    #[test]
    fn torn_binary_tail_is_a_framing_error() {
        let dir = TempDir::new().unwrap();
        let path = write_records(&dir, Framing::LengthPrefixed, &[b"whole"]);
        // Append a torn frame: claims 60 bytes, provides 2.
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&[60, 0xAA, 0xBB]);
        std::fs::write(&path, &bytes).unwrap();

        let reader = ReadableFile::open(&path, Framing::LengthPrefixed).unwrap();
        assert_eq!(
            reader.consume_next(|_| true).unwrap(),
            ReadOutcome::Accepted
        );
        let err = reader.consume_next(|_| true).unwrap_err();
        assert!(matches!(err, ReadError::Framing(_)));
        reader.close().unwrap();
    }
}
