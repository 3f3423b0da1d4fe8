//! Signal serializers: typed telemetry records to wire bytes and back.
//!
//! One serializer strategy exists per signal kind (spans, metrics, logs),
//! each supporting two wire formats with an identical external contract:
//!
//! - [`WireFormat::Protobuf`]: compact binary, byte-compatible with the
//!   OTLP export request messages, framed on disk with a varint length
//!   prefix;
//! - [`WireFormat::Json`]: human-inspectable OTLP-JSON, one object per
//!   line on disk.
//!
//! Serialization groups records by (resource, instrumentation scope) in
//! encounter order, collapsing shared pairs into one container to match the
//! wire protocol's resource → scope → items nesting; deserialization
//! flattens the nesting back into standalone records.

mod convert;
mod logs;
mod metrics;
mod spans;

pub use logs::LogSerializer;
pub use metrics::MetricSerializer;
pub use spans::SpanSerializer;

use thiserror::Error;

use crate::scan::ScanError;

/// The on-disk encoding of one spooled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Length-delimited OTLP protobuf.
    Protobuf,
    /// Newline-delimited OTLP-JSON.
    Json,
}

/// Errors from encoding a batch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// JSON encoding failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from decoding a spooled payload. Always indicates corrupted
/// on-disk data or a protocol bug; never swallowed silently.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializeError {
    /// The payload is not a valid tag/wire-type stream.
    #[error("invalid message framing: {0}")]
    Framing(#[from] ScanError),

    /// Protobuf decoding failed.
    #[error("malformed protobuf payload: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// JSON parsing failed.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope decoded, but a field inside it is invalid.
    #[error("invalid field in payload: {0}")]
    InvalidField(String),
}

/// Converts a collection of typed telemetry records to a byte payload and
/// back. `deserialize(serialize(x))` reconstructs a collection equal to `x`
/// for either wire format.
pub trait SignalSerializer: Send + Sync {
    /// The telemetry record type this serializer handles.
    type Record;

    /// The wire format this serializer was configured with.
    fn format(&self) -> WireFormat;

    /// Encodes a batch into one wire payload.
    fn serialize(&self, records: &[Self::Record]) -> Result<Vec<u8>, SerializeError>;

    /// Decodes one wire payload back into a batch.
    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<Self::Record>, DeserializeError>;
}

/// Top-level field number of the resource-level grouping in every OTLP
/// envelope (`resource_spans` / `resource_metrics` / `resource_logs`).
pub(crate) const RESOURCE_GROUP_FIELD: u32 = 1;

/// Tag-level pre-validation of a binary payload: walks the tag/wire-type
/// stream counting resource-level groups, rejecting byte streams that are
/// not even a plausible protobuf message before the full decode allocates.
pub(crate) fn prevalidate_binary(bytes: &[u8]) -> Result<usize, DeserializeError> {
    Ok(crate::scan::count_repeated_field(bytes, RESOURCE_GROUP_FIELD)?)
}
