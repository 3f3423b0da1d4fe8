//! On-disk buffer file lifecycle: bounded append-only files, consuming
//! reads, and the directory-level manager that rotates between them.
//!
//! # File lifecycle
//!
//! A buffer file is created by the manager when a batch needs a writable
//! destination, named by its creation timestamp so the oldest-eligible
//! selection is a plain sort. It accepts appends until it outgrows
//! `max_file_size` or its write window expires, then cools for
//! `min_file_age_for_read` milliseconds before a reader may open it. The
//! configuration invariant `max_file_age_for_write < min_file_age_for_read`
//! guarantees no file is ever readable while still eligible for writes.
//! Consumed records are durably removed; a fully consumed file is deleted.
//!
//! There is no cross-process locking: a storage directory must be owned by
//! at most one live [`Storage`] instance in one process.

mod config;
mod framing;
mod manager;
mod readable;
mod writable;

pub use config::{
    ConfigError, DEFAULT_MAX_FILE_AGE_FOR_READ_MS, DEFAULT_MAX_FILE_SIZE, StorageConfig,
};
pub use framing::Framing;
pub use manager::{RecordStore, Storage, StorageError};
pub use readable::{ReadError, ReadOutcome, ReadableFile};
pub use writable::{AppendError, WritableFile};
