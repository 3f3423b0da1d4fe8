//! Directory-level storage manager: owns the buffer files of one signal,
//! rotates the active writable file, and selects the oldest cooled file for
//! consuming reads.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::model::SignalKind;
use crate::serialize::{DeserializeError, SerializeError, SignalSerializer};

use super::config::StorageConfig;
use super::framing::Framing;
use super::readable::{ReadError, ReadOutcome, ReadableFile};
use super::writable::{AppendError, WritableFile};

/// Errors surfaced by the storage manager. Capacity conditions are handled
/// internally (rotation, `Ok(false)` from writes) and never appear here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Serializing the batch failed.
    #[error("failed to serialize batch: {0}")]
    Serialize(#[from] SerializeError),

    /// Disk I/O failed.
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The manager was closed.
    #[error("storage is closed")]
    Closed,
}

/// The write-side seam between the spooling exporter and its storage, kept
/// narrow so exporter policy can be tested against a mock store.
pub trait RecordStore: Send + Sync {
    /// The telemetry record type this store accepts.
    type Record;

    /// Spools one batch. `Ok(false)` means no file could accept the write
    /// within policy (buffer full or unavailable); a signal, not a fault.
    fn write(&self, records: &[Self::Record]) -> Result<bool, StorageError>;

    /// Flushes and releases all open files.
    fn close(&self) -> Result<(), StorageError>;
}

struct WriterSlot {
    current: Option<WritableFile>,
    last_created_ms: u64,
}

/// Manages the buffer-file directory of one signal kind.
///
/// Rotation decisions are serialized behind the writer mutex, so two
/// threads writing concurrently agree on the current file; read-side
/// selection is serialized behind the reader mutex.
pub struct Storage<S: SignalSerializer> {
    serializer: S,
    config: StorageConfig,
    clock: Arc<dyn Clock>,
    dir: PathBuf,
    framing: Framing,
    writer: Mutex<WriterSlot>,
    reader: Mutex<Option<ReadableFile>>,
    closed: AtomicBool,
}

impl<S: SignalSerializer> Storage<S> {
    /// Opens (creating if needed) the buffer directory for `signal` under
    /// the configured root, and removes temp copies left behind by an
    /// earlier crash.
    pub fn new(
        signal: SignalKind,
        serializer: S,
        config: StorageConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        let dir = config.root_dir().join(signal.dir_name());
        fs::create_dir_all(&dir)?;

        let framing = Framing::from(serializer.format());
        let storage = Self {
            serializer,
            config,
            clock,
            dir,
            framing,
            writer: Mutex::new(WriterSlot {
                current: None,
                last_created_ms: 0,
            }),
            reader: Mutex::new(None),
            closed: AtomicBool::new(false),
        };
        storage.remove_stale_temp_copies();
        Ok(storage)
    }

    /// Serializes `records` and spools the payload. Returns `Ok(false)`
    /// when no file could accept the write within policy.
    pub fn write(&self, records: &[S::Record]) -> Result<bool, StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        let payload = self.serializer.serialize(records)?;
        self.write_payload(&payload)
    }

    pub(crate) fn write_payload(&self, payload: &[u8]) -> Result<bool, StorageError> {
        let mut slot = self.writer.lock().expect("lock poisoned");

        // Rotate-and-retry-once: one attempt against the current file, one
        // against a fresh one.
        for _ in 0..2 {
            if slot.current.is_none() {
                let file = self.create_writable(&mut slot.last_created_ms)?;
                debug!(path = %file.path().display(), "rotated in new buffer file");
                slot.current = Some(file);
            }
            let Some(file) = slot.current.as_ref() else {
                continue;
            };
            match file.append(payload) {
                Ok(()) => return Ok(true),
                Err(AppendError::Closed | AppendError::Expired { .. })
                | Err(AppendError::NoSpace { .. }) => {
                    let _ = file.close();
                    slot.current = None;
                },
                Err(AppendError::Io(e)) => {
                    let _ = file.close();
                    slot.current = None;
                    return Err(StorageError::Io(e));
                },
            }
        }
        Ok(false)
    }

    /// Hands the next spooled payload to `accept`, selecting the oldest
    /// file whose age is inside the read window. Acceptance durably removes
    /// the payload; rejection redelivers it on the next call. `Exhausted`
    /// means nothing is currently eligible.
    pub fn consume_next<F>(&self, accept: F) -> Result<ReadOutcome, StorageError>
    where
        F: FnOnce(&[u8]) -> bool,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        let mut reader_slot = self.reader.lock().expect("lock poisoned");
        let mut accept_slot = Some(accept);

        loop {
            if reader_slot.is_none() {
                match self.open_next_readable()? {
                    Some(reader) => *reader_slot = Some(reader),
                    None => return Ok(ReadOutcome::Exhausted),
                }
            }
            let Some(reader) = reader_slot.as_ref() else {
                return Ok(ReadOutcome::Exhausted);
            };

            let outcome = reader.consume_next(|record| match accept_slot.take() {
                Some(accept) => accept(record),
                None => false,
            });
            match outcome {
                Ok(ReadOutcome::Exhausted) => {
                    self.retire_reader(&mut reader_slot)?;
                },
                Ok(other) => return Ok(other),
                Err(ReadError::Framing(e)) => {
                    // A torn or corrupt tail wedges this file forever; treat
                    // the file as exhausted and drop what remains.
                    if let Some(reader) = reader_slot.take() {
                        warn!(
                            path = %reader.path().display(),
                            error = %e,
                            "corrupt record framing; discarding rest of buffer file"
                        );
                        let _ = reader.close();
                        let _ = fs::remove_file(reader.path());
                    }
                },
                Err(ReadError::Closed) => {
                    *reader_slot = None;
                },
                Err(ReadError::Io(e)) => {
                    if let Some(reader) = reader_slot.take() {
                        let _ = reader.close();
                    }
                    return Err(StorageError::Io(e));
                },
            }
        }
    }

    /// Decodes a spooled payload with this storage's serializer.
    pub fn deserialize(&self, payload: &[u8]) -> Result<Vec<S::Record>, DeserializeError> {
        self.serializer.deserialize(payload)
    }

    /// Flushes and releases the active writable file and any open readable
    /// file. Further writes and reads fail with [`StorageError::Closed`].
    pub fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);

        let mut first_error: Option<std::io::Error> = None;
        {
            let mut slot = self.writer.lock().expect("lock poisoned");
            if let Some(file) = slot.current.take() {
                if let Err(e) = file.close() {
                    first_error = Some(e);
                }
            }
        }
        {
            let mut reader_slot = self.reader.lock().expect("lock poisoned");
            if let Some(reader) = reader_slot.take() {
                if let Err(e) = reader.close() {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(StorageError::Io(e)),
            None => Ok(()),
        }
    }

    fn create_writable(&self, last_created_ms: &mut u64) -> Result<WritableFile, StorageError> {
        // File names are the creation timestamp, zero-padded so the oldest
        // file sorts first; bump on collision to keep names monotonic.
        let mut ts = self.clock.now_ms().max(*last_created_ms + 1);
        let mut path = self.dir.join(format!("{ts:020}"));
        while path.exists() {
            ts += 1;
            path = self.dir.join(format!("{ts:020}"));
        }
        *last_created_ms = ts;

        let file = WritableFile::create(
            path,
            ts,
            self.config.max_file_age_for_write_ms(),
            self.config.max_file_size(),
            self.framing,
            Arc::clone(&self.clock),
        )?;
        Ok(file)
    }

    /// Closes the current readable file, deleting its original when fully
    /// consumed.
    fn retire_reader(&self, reader_slot: &mut Option<ReadableFile>) -> Result<(), StorageError> {
        let Some(reader) = reader_slot.take() else {
            return Ok(());
        };
        reader.close()?;
        let fully_consumed = fs::metadata(reader.path()).map(|m| m.len() == 0)?;
        if fully_consumed {
            debug!(path = %reader.path().display(), "buffer file fully consumed; deleting");
            fs::remove_file(reader.path())?;
        }
        Ok(())
    }

    /// Selects the oldest file inside the read window and opens it.
    fn open_next_readable(&self) -> Result<Option<ReadableFile>, StorageError> {
        let now = self.clock.now_ms();
        let mut candidates: Vec<(u64, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.ends_with(".tmp") {
                continue;
            }
            match name.parse::<u64>() {
                Ok(ts) => candidates.push((ts, entry.path())),
                Err(_) => {
                    warn!(file = name, "foreign file in buffer directory; ignoring");
                },
            }
        }
        candidates.sort();

        for (created_ms, path) in candidates {
            let age = now.saturating_sub(created_ms);
            if age < self.config.min_file_age_for_read_ms() {
                // Sorted oldest-first: every later candidate is younger.
                break;
            }
            if age > self.config.max_file_age_for_read_ms() {
                warn!(path = %path.display(), age_ms = age, "stale buffer file; deleting unread");
                let _ = fs::remove_file(&path);
                continue;
            }
            self.rotate_out_writer_at(&path);
            match ReadableFile::open(&path, self.framing) {
                Ok(reader) => return Ok(Some(reader)),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "cannot open buffer file for reading; skipping"
                    );
                },
            }
        }
        Ok(None)
    }

    /// The age invariant makes a readable file un-writable under normal
    /// clocks; still, never offer the active writer's file to a reader.
    fn rotate_out_writer_at(&self, path: &std::path::Path) {
        let mut slot = self.writer.lock().expect("lock poisoned");
        if let Some(file) = slot.current.as_ref() {
            if file.path() == path {
                let _ = file.close();
                slot.current = None;
            }
        }
    }
}

impl<S: SignalSerializer> RecordStore for Storage<S> {
    type Record = S::Record;

    fn write(&self, records: &[S::Record]) -> Result<bool, StorageError> {
        Storage::write(self, records)
    }

    fn close(&self) -> Result<(), StorageError> {
        Storage::close(self)
    }
}

impl<S: SignalSerializer> Storage<S> {
    fn remove_stale_temp_copies(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_str().is_some_and(|n| n.ends_with(".tmp")) {
                warn!(path = %entry.path().display(), "removing stale temp copy");
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}
