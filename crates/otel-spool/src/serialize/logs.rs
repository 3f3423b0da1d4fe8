//! Log serializer strategy.

use prost::Message;

use crate::model::{LogRecord, LogTraceContext};
use crate::proto::logs::{self, LogsData, ResourceLogs, ScopeLogs};

use super::convert::{
    attrs_from_proto, attrs_to_proto, group_records, resource_from_proto, resource_to_proto,
    scope_from_proto, scope_to_proto, span_id_from, trace_id_from, value_from_proto,
    value_to_proto,
};
use super::{DeserializeError, SerializeError, SignalSerializer, WireFormat, prevalidate_binary};

/// Serializer for batches of [`LogRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct LogSerializer {
    format: WireFormat,
}

impl LogSerializer {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }
}

impl SignalSerializer for LogSerializer {
    type Record = LogRecord;

    fn format(&self) -> WireFormat {
        self.format
    }

    fn serialize(&self, records: &[LogRecord]) -> Result<Vec<u8>, SerializeError> {
        let envelope = to_envelope(records);
        match self.format {
            WireFormat::Protobuf => Ok(envelope.encode_to_vec()),
            WireFormat::Json => Ok(serde_json::to_vec(&envelope)?),
        }
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<LogRecord>, DeserializeError> {
        let envelope = match self.format {
            WireFormat::Protobuf => {
                prevalidate_binary(bytes)?;
                LogsData::decode(bytes)?
            },
            WireFormat::Json => serde_json::from_slice(bytes)?,
        };
        from_envelope(envelope)
    }
}

fn to_envelope(records: &[LogRecord]) -> LogsData {
    let resource_logs = group_records(records)
        .into_iter()
        .map(|(resource, scopes)| ResourceLogs {
            resource: Some(resource_to_proto(resource)),
            scope_logs: scopes
                .into_iter()
                .map(|(scope, logs)| ScopeLogs {
                    scope: Some(scope_to_proto(scope)),
                    log_records: logs.into_iter().map(log_to_proto).collect(),
                    schema_url: String::new(),
                })
                .collect(),
            schema_url: String::new(),
        })
        .collect();
    LogsData { resource_logs }
}

fn from_envelope(envelope: LogsData) -> Result<Vec<LogRecord>, DeserializeError> {
    let mut records = Vec::new();
    for resource_logs in envelope.resource_logs {
        let resource = resource_from_proto(resource_logs.resource)?;
        for scope_logs in resource_logs.scope_logs {
            let scope = scope_from_proto(scope_logs.scope)?;
            for log in scope_logs.log_records {
                records.push(log_from_proto(log, resource.clone(), scope.clone())?);
            }
        }
    }
    Ok(records)
}

fn log_to_proto(record: &LogRecord) -> logs::LogRecord {
    let (trace_id, span_id, flags) = match &record.trace_context {
        Some(ctx) => (ctx.trace_id.to_vec(), ctx.span_id.to_vec(), ctx.flags),
        None => (Vec::new(), Vec::new(), 0),
    };
    logs::LogRecord {
        time_unix_nano: record.time_unix_nanos,
        observed_time_unix_nano: record.observed_time_unix_nanos,
        severity_number: record.severity_number,
        severity_text: record.severity_text.clone().unwrap_or_default(),
        body: record.body.as_ref().map(value_to_proto),
        attributes: attrs_to_proto(&record.attributes),
        dropped_attributes_count: 0,
        flags,
        trace_id,
        span_id,
    }
}

fn log_from_proto(
    log: logs::LogRecord,
    resource: crate::model::Resource,
    scope: crate::model::InstrumentationScope,
) -> Result<LogRecord, DeserializeError> {
    let trace_context = if log.trace_id.is_empty() {
        None
    } else {
        Some(LogTraceContext {
            trace_id: trace_id_from(&log.trace_id)?,
            span_id: span_id_from(&log.span_id)?,
            flags: log.flags,
        })
    };
    Ok(LogRecord {
        resource,
        scope,
        time_unix_nanos: log.time_unix_nano,
        observed_time_unix_nanos: log.observed_time_unix_nano,
        severity_number: log.severity_number,
        severity_text: (!log.severity_text.is_empty()).then_some(log.severity_text),
        body: log.body.map(value_from_proto).transpose()?,
        attributes: attrs_from_proto(log.attributes)?,
        trace_context,
    })
}
