//! Disk-backed durable buffer for OpenTelemetry exporters.
//!
//! When an export destination is unreachable, serialized telemetry batches
//! (spans, metrics, or logs) are spooled to bounded, age-limited files under
//! a local directory and replayed later, giving at-least-once delivery with
//! bounded disk usage.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              SpoolingExporter               │
//! │  spool-first, direct-export fallback        │
//! │                                             │
//! │  ┌───────────────────────────────────┐      │
//! │  │        Storage (per signal)       │      │
//! │  │  rotation, oldest-first reads,    │      │
//! │  │  WritableFile / ReadableFile      │      │
//! │  └──────────────┬────────────────────┘      │
//! │                 │                           │
//! │  ┌──────────────▼────────────────────┐      │
//! │  │   SignalSerializer (per signal)   │      │
//! │  │  OTLP protobuf or OTLP-JSON       │      │
//! │  └───────────────────────────────────┘      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Records are framed on disk either as varint-length-prefixed protobuf
//! payloads or as newline-delimited JSON lines; a record, once appended, is
//! immutable and is removed only after a reader explicitly accepts it.
//!
//! # Concurrency
//!
//! The crate has no scheduler of its own. All operations are synchronous
//! disk I/O, safe to call from multiple threads; per-file mutation is
//! serialized behind a mutex. A given storage directory must be owned by a
//! single live [`storage::Storage`] instance in a single process.

pub mod clock;
pub mod export;
pub mod model;
pub mod proto;
pub mod scan;
pub mod serialize;
pub mod storage;
pub mod varint;

pub use clock::{Clock, SystemClock};
pub use export::{DrainOutcome, ExportError, ExportResult, Exporter, SpoolingExporter};
pub use model::SignalKind;
pub use serialize::{
    DeserializeError, LogSerializer, MetricSerializer, SerializeError, SignalSerializer,
    SpanSerializer, WireFormat,
};
pub use storage::{RecordStore, Storage, StorageConfig, StorageError};
