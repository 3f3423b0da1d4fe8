//! In-memory telemetry record types.
//!
//! These are the batch items the serializers persist and reconstruct. Each
//! record carries its own [`Resource`] and [`InstrumentationScope`]; the
//! wire formats collapse records sharing a (resource, scope) pair into one
//! container, and deserialization flattens them back out.

use std::fmt;

/// Telemetry signal kind, used to segregate buffer directories and select a
/// serializer strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Trace spans.
    Spans,
    /// Metric points.
    Metrics,
    /// Log records.
    Logs,
}

impl SignalKind {
    /// Subdirectory name under the storage root for this signal.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Spans => "spans",
            Self::Metrics => "metrics",
            Self::Logs => "logs",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// An attribute value. Mirrors the scalar, bytes, array, and key-value-list
/// shapes of the wire protocol's `AnyValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    KvList(Vec<KeyValue>),
}

/// A keyed attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// The entity producing telemetry (host, service, process).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

/// The instrumentation library that produced a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstrumentationScope {
    pub name: String,
    /// Absent for unversioned instrumentations.
    pub version: Option<String>,
    pub attributes: Vec<KeyValue>,
}

/// Accessors the buffering core needs from a telemetry record; everything
/// else about the record is opaque to storage and framing.
pub trait TelemetryRecord {
    fn resource(&self) -> &Resource;
    fn scope(&self) -> &InstrumentationScope;
}

// =============================================================================
// Spans
// =============================================================================

/// Span kind, matching the wire protocol's enumeration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum SpanKind {
    #[default]
    Unspecified = 0,
    Internal = 1,
    Server = 2,
    Client = 3,
    Producer = 4,
    Consumer = 5,
}

impl SpanKind {
    pub(crate) fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::Internal,
            2 => Self::Server,
            3 => Self::Client,
            4 => Self::Producer,
            5 => Self::Consumer,
            _ => Self::Unspecified,
        }
    }
}

/// Span status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum StatusCode {
    #[default]
    Unset = 0,
    Ok = 1,
    Error = 2,
}

impl StatusCode {
    pub(crate) fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::Ok,
            2 => Self::Error,
            _ => Self::Unset,
        }
    }
}

/// Span status; `message` is populated only for error statuses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanStatus {
    pub code: StatusCode,
    pub message: Option<String>,
}

/// A timed event attached to a span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanEvent {
    pub name: String,
    pub time_unix_nanos: u64,
    pub attributes: Vec<KeyValue>,
}

/// A link from one span to another.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanLink {
    pub trace_id: [u8; 16],
    pub span_id: [u8; 8],
    pub trace_state: Option<String>,
    pub attributes: Vec<KeyValue>,
}

/// One finished span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanRecord {
    pub resource: Resource,
    pub scope: InstrumentationScope,
    pub trace_id: [u8; 16],
    pub span_id: [u8; 8],
    /// Absent for root spans.
    pub parent_span_id: Option<[u8; 8]>,
    /// W3C tracestate header value, if any.
    pub trace_state: Option<String>,
    pub name: String,
    pub kind: SpanKind,
    pub start_unix_nanos: u64,
    pub end_unix_nanos: u64,
    pub attributes: Vec<KeyValue>,
    pub events: Vec<SpanEvent>,
    pub links: Vec<SpanLink>,
    pub status: SpanStatus,
}

impl TelemetryRecord for SpanRecord {
    fn resource(&self) -> &Resource {
        &self.resource
    }

    fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Aggregation temporality for sums and histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Temporality {
    #[default]
    Unspecified = 0,
    Delta = 1,
    Cumulative = 2,
}

impl Temporality {
    pub(crate) fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::Delta,
            2 => Self::Cumulative,
            _ => Self::Unspecified,
        }
    }
}

/// A gauge or sum sample value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Double(f64),
}

/// One gauge or sum data point.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberPoint {
    pub start_unix_nanos: u64,
    pub time_unix_nanos: u64,
    pub attributes: Vec<KeyValue>,
    pub value: NumberValue,
}

/// One histogram data point. `explicit_bounds` has one fewer entry than
/// `bucket_counts`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramPoint {
    pub start_unix_nanos: u64,
    pub time_unix_nanos: u64,
    pub attributes: Vec<KeyValue>,
    pub count: u64,
    pub sum: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub bucket_counts: Vec<u64>,
    pub explicit_bounds: Vec<f64>,
}

/// The aggregated data carried by one metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricData {
    Gauge {
        points: Vec<NumberPoint>,
    },
    Sum {
        points: Vec<NumberPoint>,
        temporality: Temporality,
        is_monotonic: bool,
    },
    Histogram {
        points: Vec<HistogramPoint>,
        temporality: Temporality,
    },
}

/// One metric stream with its identifying metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub resource: Resource,
    pub scope: InstrumentationScope,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub data: MetricData,
}

impl TelemetryRecord for MetricRecord {
    fn resource(&self) -> &Resource {
        &self.resource
    }

    fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }
}

// =============================================================================
// Logs
// =============================================================================

/// Trace correlation for a log record emitted inside a span.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTraceContext {
    pub trace_id: [u8; 16],
    pub span_id: [u8; 8],
    pub flags: u32,
}

/// One log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub resource: Resource,
    pub scope: InstrumentationScope,
    pub time_unix_nanos: u64,
    pub observed_time_unix_nanos: u64,
    /// Numeric severity (1..=24 per the wire protocol; 0 = unspecified).
    pub severity_number: i32,
    pub severity_text: Option<String>,
    pub body: Option<Value>,
    pub attributes: Vec<KeyValue>,
    pub trace_context: Option<LogTraceContext>,
}

impl TelemetryRecord for LogRecord {
    fn resource(&self) -> &Resource {
        &self.resource
    }

    fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }
}
