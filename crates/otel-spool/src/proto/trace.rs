//! Trace wire types: the `TracesData` envelope and its nesting
//! (resource → scope → spans).

use serde::{Deserialize, Serialize};

use super::common::{InstrumentationScope, KeyValue, Resource};

/// Top-level envelope, shaped like the trace export request.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TracesData {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_spans: Vec<ResourceSpans>,
}

/// Spans from one resource.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceSpans {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope_spans: Vec<ScopeSpans>,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub schema_url: String,
}

/// Spans from one instrumentation scope.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeSpans {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<InstrumentationScope>,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub schema_url: String,
}

/// One span.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Span {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "super::hex_bytes", skip_serializing_if = "Vec::is_empty")]
    pub trace_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    #[serde(with = "super::hex_bytes", skip_serializing_if = "Vec::is_empty")]
    pub span_id: Vec<u8>,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub trace_state: String,
    #[prost(bytes = "vec", tag = "4")]
    #[serde(with = "super::hex_bytes", skip_serializing_if = "Vec::is_empty")]
    pub parent_span_id: Vec<u8>,
    #[prost(string, tag = "5")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Span kind enumeration value.
    #[prost(int32, tag = "6")]
    #[serde(skip_serializing_if = "super::is_zero_i32")]
    pub kind: i32,
    #[prost(fixed64, tag = "7")]
    #[serde(with = "super::u64_string")]
    pub start_time_unix_nano: u64,
    #[prost(fixed64, tag = "8")]
    #[serde(with = "super::u64_string")]
    pub end_time_unix_nano: u64,
    #[prost(message, repeated, tag = "9")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<KeyValue>,
    #[prost(uint32, tag = "10")]
    #[serde(skip_serializing_if = "super::is_zero_u32")]
    pub dropped_attributes_count: u32,
    #[prost(message, repeated, tag = "11")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<span::Event>,
    #[prost(uint32, tag = "12")]
    #[serde(skip_serializing_if = "super::is_zero_u32")]
    pub dropped_events_count: u32,
    #[prost(message, repeated, tag = "13")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<span::Link>,
    #[prost(uint32, tag = "14")]
    #[serde(skip_serializing_if = "super::is_zero_u32")]
    pub dropped_links_count: u32,
    #[prost(message, optional, tag = "15")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// Nested types for [`Span`].
pub mod span {
    use serde::{Deserialize, Serialize};

    use super::KeyValue;

    /// A timed annotation on a span.
    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Event {
        #[prost(fixed64, tag = "1")]
        #[serde(with = "crate::proto::u64_string")]
        pub time_unix_nano: u64,
        #[prost(string, tag = "2")]
        #[serde(skip_serializing_if = "String::is_empty")]
        pub name: String,
        #[prost(message, repeated, tag = "3")]
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub attributes: Vec<KeyValue>,
        #[prost(uint32, tag = "4")]
        #[serde(skip_serializing_if = "crate::proto::is_zero_u32")]
        pub dropped_attributes_count: u32,
    }

    /// A pointer to a related span.
    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Link {
        #[prost(bytes = "vec", tag = "1")]
        #[serde(with = "crate::proto::hex_bytes", skip_serializing_if = "Vec::is_empty")]
        pub trace_id: Vec<u8>,
        #[prost(bytes = "vec", tag = "2")]
        #[serde(with = "crate::proto::hex_bytes", skip_serializing_if = "Vec::is_empty")]
        pub span_id: Vec<u8>,
        #[prost(string, tag = "3")]
        #[serde(skip_serializing_if = "String::is_empty")]
        pub trace_state: String,
        #[prost(message, repeated, tag = "4")]
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub attributes: Vec<KeyValue>,
        #[prost(uint32, tag = "5")]
        #[serde(skip_serializing_if = "crate::proto::is_zero_u32")]
        pub dropped_attributes_count: u32,
    }
}

/// Span status.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Status {
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Status code enumeration value.
    #[prost(int32, tag = "3")]
    #[serde(skip_serializing_if = "super::is_zero_i32")]
    pub code: i32,
}
