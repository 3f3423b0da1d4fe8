//! Span serializer strategy.

use prost::Message;

use crate::model::{SpanEvent, SpanKind, SpanLink, SpanRecord, SpanStatus, StatusCode};
use crate::proto::trace::{self, ResourceSpans, ScopeSpans, TracesData};

use super::convert::{
    attrs_from_proto, attrs_to_proto, group_records, resource_from_proto, resource_to_proto,
    scope_from_proto, scope_to_proto, span_id_from, trace_id_from,
};
use super::{DeserializeError, SerializeError, SignalSerializer, WireFormat, prevalidate_binary};

/// Serializer for batches of [`SpanRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct SpanSerializer {
    format: WireFormat,
}

impl SpanSerializer {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }
}

impl SignalSerializer for SpanSerializer {
    type Record = SpanRecord;

    fn format(&self) -> WireFormat {
        self.format
    }

    fn serialize(&self, records: &[SpanRecord]) -> Result<Vec<u8>, SerializeError> {
        let envelope = to_envelope(records);
        match self.format {
            WireFormat::Protobuf => Ok(envelope.encode_to_vec()),
            WireFormat::Json => Ok(serde_json::to_vec(&envelope)?),
        }
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<SpanRecord>, DeserializeError> {
        let envelope = match self.format {
            WireFormat::Protobuf => {
                prevalidate_binary(bytes)?;
                TracesData::decode(bytes)?
            },
            WireFormat::Json => serde_json::from_slice(bytes)?,
        };
        from_envelope(envelope)
    }
}

fn to_envelope(records: &[SpanRecord]) -> TracesData {
    let resource_spans = group_records(records)
        .into_iter()
        .map(|(resource, scopes)| ResourceSpans {
            resource: Some(resource_to_proto(resource)),
            scope_spans: scopes
                .into_iter()
                .map(|(scope, spans)| ScopeSpans {
                    scope: Some(scope_to_proto(scope)),
                    spans: spans.into_iter().map(span_to_proto).collect(),
                    schema_url: String::new(),
                })
                .collect(),
            schema_url: String::new(),
        })
        .collect();
    TracesData { resource_spans }
}

fn from_envelope(envelope: TracesData) -> Result<Vec<SpanRecord>, DeserializeError> {
    let mut records = Vec::new();
    for resource_spans in envelope.resource_spans {
        let resource = resource_from_proto(resource_spans.resource)?;
        for scope_spans in resource_spans.scope_spans {
            let scope = scope_from_proto(scope_spans.scope)?;
            for span in scope_spans.spans {
                records.push(span_from_proto(span, resource.clone(), scope.clone())?);
            }
        }
    }
    Ok(records)
}

fn span_to_proto(record: &SpanRecord) -> trace::Span {
    trace::Span {
        trace_id: record.trace_id.to_vec(),
        span_id: record.span_id.to_vec(),
        trace_state: record.trace_state.clone().unwrap_or_default(),
        parent_span_id: record
            .parent_span_id
            .map(|id| id.to_vec())
            .unwrap_or_default(),
        name: record.name.clone(),
        kind: record.kind as i32,
        start_time_unix_nano: record.start_unix_nanos,
        end_time_unix_nano: record.end_unix_nanos,
        attributes: attrs_to_proto(&record.attributes),
        dropped_attributes_count: 0,
        events: record
            .events
            .iter()
            .map(|event| trace::span::Event {
                time_unix_nano: event.time_unix_nanos,
                name: event.name.clone(),
                attributes: attrs_to_proto(&event.attributes),
                dropped_attributes_count: 0,
            })
            .collect(),
        dropped_events_count: 0,
        links: record
            .links
            .iter()
            .map(|link| trace::span::Link {
                trace_id: link.trace_id.to_vec(),
                span_id: link.span_id.to_vec(),
                trace_state: link.trace_state.clone().unwrap_or_default(),
                attributes: attrs_to_proto(&link.attributes),
                dropped_attributes_count: 0,
            })
            .collect(),
        dropped_links_count: 0,
        status: Some(trace::Status {
            message: record.status.message.clone().unwrap_or_default(),
            code: record.status.code as i32,
        }),
    }
}

fn span_from_proto(
    span: trace::Span,
    resource: crate::model::Resource,
    scope: crate::model::InstrumentationScope,
) -> Result<SpanRecord, DeserializeError> {
    let status = span.status.unwrap_or_default();
    Ok(SpanRecord {
        resource,
        scope,
        trace_id: trace_id_from(&span.trace_id)?,
        span_id: span_id_from(&span.span_id)?,
        parent_span_id: if span.parent_span_id.is_empty() {
            None
        } else {
            Some(span_id_from(&span.parent_span_id)?)
        },
        trace_state: (!span.trace_state.is_empty()).then_some(span.trace_state),
        name: span.name,
        kind: SpanKind::from_i32(span.kind),
        start_unix_nanos: span.start_time_unix_nano,
        end_unix_nanos: span.end_time_unix_nano,
        attributes: attrs_from_proto(span.attributes)?,
        events: span
            .events
            .into_iter()
            .map(|event| {
                Ok(SpanEvent {
                    name: event.name,
                    time_unix_nanos: event.time_unix_nano,
                    attributes: attrs_from_proto(event.attributes)?,
                })
            })
            .collect::<Result<_, DeserializeError>>()?,
        links: span
            .links
            .into_iter()
            .map(|link| {
                Ok(SpanLink {
                    trace_id: trace_id_from(&link.trace_id)?,
                    span_id: span_id_from(&link.span_id)?,
                    trace_state: (!link.trace_state.is_empty()).then_some(link.trace_state),
                    attributes: attrs_from_proto(link.attributes)?,
                })
            })
            .collect::<Result<_, DeserializeError>>()?,
        status: SpanStatus {
            code: StatusCode::from_i32(status.code),
            message: (!status.message.is_empty()).then_some(status.message),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstrumentationScope, KeyValue, Resource, Value};

    fn test_resource(service: &str) -> Resource {
        Resource {
            attributes: vec![KeyValue::new("service.name", Value::Str(service.to_string()))],
        }
    }

    fn test_scope(name: &str) -> InstrumentationScope {
        InstrumentationScope {
            name: name.to_string(),
            version: Some("1.2.0".to_string()),
            attributes: vec![],
        }
    }

    fn test_span(resource: Resource, scope: InstrumentationScope, name: &str) -> SpanRecord {
        SpanRecord {
            resource,
            scope,
            trace_id: [0xAB; 16],
            span_id: [0x01; 8],
            parent_span_id: Some([0x02; 8]),
            trace_state: Some("vendor=1".to_string()),
            name: name.to_string(),
            kind: SpanKind::Server,
            start_unix_nanos: 1_700_000_000_000_000_000,
            end_unix_nanos: 1_700_000_000_500_000_000,
            attributes: vec![
                KeyValue::new("http.status_code", Value::Int(200)),
                KeyValue::new("retry", Value::Bool(false)),
                KeyValue::new("latency_ms", Value::Double(12.5)),
                KeyValue::new(
                    "tags",
                    Value::Array(vec![
                        Value::Str("a".to_string()),
                        Value::Str("b".to_string()),
                    ]),
                ),
            ],
            events: vec![SpanEvent {
                name: "exception".to_string(),
                time_unix_nanos: 1_700_000_000_100_000_000,
                attributes: vec![KeyValue::new(
                    "exception.type",
                    Value::Str("IoError".to_string()),
                )],
            }],
            links: vec![SpanLink {
                trace_id: [0xCD; 16],
                span_id: [0x03; 8],
                trace_state: None,
                attributes: vec![],
            }],
            status: SpanStatus {
                code: StatusCode::Error,
                message: Some("upstream timeout".to_string()),
            },
        }
    }

    #[test]
    fn round_trips_in_both_formats() {
        let records = vec![
            test_span(test_resource("checkout"), test_scope("http"), "GET /cart"),
            test_span(test_resource("checkout"), test_scope("http"), "POST /pay"),
        ];
        for format in [WireFormat::Protobuf, WireFormat::Json] {
            let serializer = SpanSerializer::new(format);
            let bytes = serializer.serialize(&records).unwrap();
            let back = serializer.deserialize(&bytes).unwrap();
            assert_eq!(back, records, "round trip in {format:?}");
        }
    }

    #[test]
    fn round_trips_absent_optional_fields() {
        let mut record = test_span(Resource::default(), test_scope("db"), "query");
        record.parent_span_id = None;
        record.trace_state = None;
        record.status = SpanStatus::default();
        record.scope.version = None;
        record.events.clear();
        record.links.clear();

        for format in [WireFormat::Protobuf, WireFormat::Json] {
            let serializer = SpanSerializer::new(format);
            let bytes = serializer.serialize(std::slice::from_ref(&record)).unwrap();
            let back = serializer.deserialize(&bytes).unwrap();
            assert_eq!(back, vec![record.clone()], "round trip in {format:?}");
        }
    }

    #[test]
    fn shared_resource_and_scope_collapse_into_one_group() {
        let resource = test_resource("checkout");
        let scope = test_scope("http");
        let records = vec![
            test_span(resource.clone(), scope.clone(), "one"),
            test_span(resource.clone(), scope.clone(), "two"),
            test_span(test_resource("billing"), scope.clone(), "three"),
        ];

        let envelope = to_envelope(&records);
        assert_eq!(envelope.resource_spans.len(), 2);
        assert_eq!(envelope.resource_spans[0].scope_spans.len(), 1);
        assert_eq!(envelope.resource_spans[0].scope_spans[0].spans.len(), 2);
        assert_eq!(envelope.resource_spans[1].scope_spans[0].spans.len(), 1);
    }

    #[test]
    fn distinct_pairs_keep_encounter_order() {
        let records = vec![
            test_span(test_resource("b"), test_scope("s2"), "one"),
            test_span(test_resource("a"), test_scope("s1"), "two"),
            test_span(test_resource("b"), test_scope("s1"), "three"),
        ];
        for format in [WireFormat::Protobuf, WireFormat::Json] {
            let serializer = SpanSerializer::new(format);
            let bytes = serializer.serialize(&records).unwrap();
            let back = serializer.deserialize(&bytes).unwrap();
            // Flattening walks groups in encounter order; spans of the first
            // resource come back adjacent.
            let names: Vec<_> = back.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, ["one", "three", "two"], "order in {format:?}");
        }
    }

    #[test]
    fn json_uses_otlp_field_names() {
        let records = vec![test_span(
            test_resource("checkout"),
            test_scope("http"),
            "GET /",
        )];
        let bytes = SpanSerializer::new(WireFormat::Json)
            .serialize(&records)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains(r#""resourceSpans""#), "{text}");
        assert!(text.contains(r#""scopeSpans""#), "{text}");
        assert!(text.contains(r#""stringValue":"checkout""#), "{text}");
        assert!(text.contains(r#""intValue":"200""#), "{text}");
        assert!(
            text.contains(&format!(r#""traceId":"{}""#, "ab".repeat(16))),
            "{text}"
        );
        assert!(
            text.contains(r#""startTimeUnixNano":"1700000000000000000""#),
            "{text}"
        );
        assert!(!text.contains('\n'), "one JSON object per line: {text}");
    }

    #[test]
    fn malformed_input_is_a_typed_error() {
        let garbage = b"\xFF\xFF\xFF\xFF not a payload";
        assert!(SpanSerializer::new(WireFormat::Protobuf)
            .deserialize(garbage)
            .is_err());
        assert!(SpanSerializer::new(WireFormat::Json)
            .deserialize(garbage)
            .is_err());
    }

    #[test]
    fn truncated_binary_payload_is_rejected() {
        let records = vec![test_span(test_resource("c"), test_scope("s"), "x")];
        let serializer = SpanSerializer::new(WireFormat::Protobuf);
        let bytes = serializer.serialize(&records).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(serializer.deserialize(truncated).is_err());
    }

    #[test]
    fn wrong_id_length_is_an_invalid_field_error() {
        let envelope = TracesData {
            resource_spans: vec![ResourceSpans {
                resource: None,
                scope_spans: vec![ScopeSpans {
                    scope: None,
                    spans: vec![trace::Span {
                        trace_id: vec![1, 2, 3],
                        span_id: vec![1; 8],
                        ..Default::default()
                    }],
                    schema_url: String::new(),
                }],
                schema_url: String::new(),
            }],
        };
        let err = from_envelope(envelope).unwrap_err();
        assert!(matches!(err, DeserializeError::InvalidField(_)));
    }
}
