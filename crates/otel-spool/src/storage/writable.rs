//! Append-only, size- and age-bounded buffer file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::clock::Clock;

use super::framing::Framing;

/// Errors from appending to a [`WritableFile`]. The capacity variants
/// (`Expired`, `NoSpace`) are expected rotation signals, not faults; both
/// close the file as a side effect.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppendError {
    /// The file was already closed.
    #[error("buffer file is closed")]
    Closed,

    /// The write window elapsed; the file is closed and must be rotated.
    #[error("buffer file write window expired at {expire_at_ms} ms")]
    Expired { expire_at_ms: u64 },

    /// The framed record would push the file past its size bound; the file
    /// is closed and must be rotated.
    #[error("framed record of {needed} bytes does not fit: {size} of {max_file_size} bytes used")]
    NoSpace {
        needed: u64,
        size: u64,
        max_file_size: u64,
    },

    /// Disk write failed; the file is closed to avoid appending after a
    /// partially written frame.
    #[error("I/O error on buffer file: {0}")]
    Io(#[from] std::io::Error),
}

struct WriterState {
    file: Option<File>,
    size: u64,
}

/// A single append-only buffer file.
///
/// All mutation is serialized behind one mutex, so concurrent callers
/// observe a consistent (`size`, closed) pair; at most one append proceeds
/// at a time.
pub struct WritableFile {
    path: PathBuf,
    created_at_ms: u64,
    expire_at_ms: u64,
    max_file_size: u64,
    framing: Framing,
    clock: Arc<dyn Clock>,
    inner: Mutex<WriterState>,
}

impl std::fmt::Debug for WritableFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritableFile")
            .field("path", &self.path)
            .field("size", &self.size())
            .field("expire_at_ms", &self.expire_at_ms)
            .finish_non_exhaustive()
    }
}

impl WritableFile {
    /// Creates a fresh buffer file at `path`.
    pub(crate) fn create(
        path: PathBuf,
        created_at_ms: u64,
        max_file_age_for_write_ms: u64,
        max_file_size: u64,
        framing: Framing,
        clock: Arc<dyn Clock>,
    ) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            created_at_ms,
            expire_at_ms: created_at_ms.saturating_add(max_file_age_for_write_ms),
            max_file_size,
            framing,
            clock,
            inner: Mutex::new(WriterState {
                file: Some(file),
                size: 0,
            }),
        })
    }

    /// Appends one framed record.
    pub fn append(&self, record: &[u8]) -> Result<(), AppendError> {
        let mut state = self.inner.lock().expect("lock poisoned");
        if state.file.is_none() {
            return Err(AppendError::Closed);
        }

        if self.clock.now_ms() >= self.expire_at_ms {
            Self::close_state(&mut state);
            return Err(AppendError::Expired {
                expire_at_ms: self.expire_at_ms,
            });
        }

        let framed = self.framing.frame(record);
        let future_size = state.size + framed.len() as u64;
        if future_size > self.max_file_size {
            Self::close_state(&mut state);
            return Err(AppendError::NoSpace {
                needed: framed.len() as u64,
                size: state.size,
                max_file_size: self.max_file_size,
            });
        }

        let write_result = match state.file.as_mut() {
            Some(file) => file.write_all(&framed),
            None => return Err(AppendError::Closed),
        };
        if let Err(e) = write_result {
            Self::close_state(&mut state);
            return Err(AppendError::Io(e));
        }
        state.size = future_size;
        Ok(())
    }

    /// Bytes appended so far, framing included.
    pub fn size(&self) -> u64 {
        self.inner.lock().expect("lock poisoned").size
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().expect("lock poisoned").file.is_none()
    }

    /// Whether the write window has elapsed.
    pub fn has_expired(&self) -> bool {
        self.clock.now_ms() >= self.expire_at_ms
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    /// Flushes and releases the handle. Safe to call repeatedly; only the
    /// first call has an effect.
    pub fn close(&self) -> std::io::Result<()> {
        let mut state = self.inner.lock().expect("lock poisoned");
        if let Some(file) = state.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }

    fn close_state(state: &mut WriterState) {
        if let Some(file) = state.file.take() {
            let _ = file.sync_all();
        }
    }
}
