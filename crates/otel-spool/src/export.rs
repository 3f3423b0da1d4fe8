//! Spooling exporter: spool-first persistence with direct-export fallback.
//!
//! [`SpoolingExporter`] wraps a delegate network exporter. Outgoing batches
//! are written to local storage first; only when the buffer cannot take the
//! batch (full, unwritable, or erroring) is the delegate invoked directly,
//! so telemetry is never silently dropped in either mode. Spooled batches
//! are replayed through the delegate by [`SpoolingExporter::drain_once`],
//! which the embedder calls on its own schedule; this crate runs no
//! background threads.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::serialize::SignalSerializer;
use crate::storage::{ReadOutcome, RecordStore, Storage, StorageError};

/// Result of an export or shutdown call.
pub type ExportResult = Result<(), ExportError>;

/// Errors surfaced by exporters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// The delegate exporter rejected or failed the batch.
    #[error("delegate exporter failed: {message}")]
    Delegate { message: String },

    /// Local storage failed outside the spool-fallback path (replay,
    /// shutdown).
    #[error("exporter storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Contract of the delegate exporter that ultimately sends batches
/// upstream.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// The telemetry record type this exporter sends.
    type Record: Send + Sync;

    /// Sends one batch upstream.
    async fn export(&self, batch: Vec<Self::Record>) -> ExportResult;

    /// Releases any resources held by the exporter.
    async fn shutdown(&self) -> ExportResult;
}

/// Wraps a delegate exporter with durable local spooling.
pub struct SpoolingExporter<D, St> {
    delegate: D,
    storage: St,
    /// Serializes replay: the peek/forward/commit sequence in
    /// [`Self::drain_once`] must not interleave across callers.
    drain_lock: tokio::sync::Mutex<()>,
}

/// Result of one [`SpoolingExporter::drain_once`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// One spooled batch was forwarded to the delegate and removed.
    Replayed,
    /// Nothing is currently eligible for replay.
    Empty,
}

impl<D, St> SpoolingExporter<D, St>
where
    D: Exporter,
    St: RecordStore<Record = D::Record>,
{
    pub fn new(delegate: D, storage: St) -> Self {
        Self {
            delegate,
            storage,
            drain_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Exports one batch: spool first, direct export as the fallback.
    ///
    /// A successful spool reports success immediately: the batch is now
    /// durably queued for later replay and the delegate is not invoked.
    pub async fn export(&self, batch: Vec<D::Record>) -> ExportResult {
        match self.storage.write(&batch) {
            Ok(true) => {
                debug!(records = batch.len(), "batch spooled for later export");
                Ok(())
            },
            Ok(false) => {
                debug!("buffer unavailable; exporting directly");
                self.delegate.export(batch).await
            },
            Err(e) => {
                warn!(error = %e, "spooling failed; exporting directly");
                self.delegate.export(batch).await
            },
        }
    }

    /// Closes the storage (releasing file handles), then shuts the
    /// delegate down.
    pub async fn shutdown(&self) -> ExportResult {
        self.storage.close()?;
        self.delegate.shutdown().await
    }
}

impl<D, S> SpoolingExporter<D, Storage<S>>
where
    D: Exporter,
    S: SignalSerializer<Record = D::Record>,
{
    /// Replays at most one spooled batch through the delegate.
    ///
    /// The batch is removed from disk only after the delegate reports
    /// success; a delegate failure leaves it spooled for the next drain. A
    /// batch that no longer deserializes is discarded with a warning rather
    /// than wedging the queue, and draining proceeds to the next one.
    pub async fn drain_once(&self) -> Result<DrainOutcome, ExportError> {
        let _guard = self.drain_lock.lock().await;

        loop {
            // Peek without consuming: a rejecting read hands the payload
            // out and keeps it first in line.
            let mut payload: Option<Vec<u8>> = None;
            let outcome = self.storage.consume_next(|bytes| {
                payload = Some(bytes.to_vec());
                false
            })?;
            if outcome == ReadOutcome::Exhausted {
                return Ok(DrainOutcome::Empty);
            }
            let Some(payload) = payload else {
                return Ok(DrainOutcome::Empty);
            };

            match self.storage.deserialize(&payload) {
                Ok(batch) => {
                    self.delegate.export(batch).await?;
                    // Delegate confirmed: the same record is redelivered
                    // and now accepted, removing it from disk.
                    self.storage.consume_next(|_| true)?;
                    return Ok(DrainOutcome::Replayed);
                },
                Err(e) => {
                    warn!(error = %e, "discarding malformed spooled batch");
                    self.storage.consume_next(|_| true)?;
                },
            }
        }
    }
}
