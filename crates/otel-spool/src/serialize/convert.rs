//! Conversions between the in-memory record types and the wire messages,
//! shared by the per-signal serializers.

use crate::model::{InstrumentationScope, KeyValue, Resource, TelemetryRecord, Value};
use crate::proto::common;

use super::DeserializeError;

pub(crate) fn value_to_proto(value: &Value) -> common::AnyValue {
    use common::any_value::Value as P;

    let value = match value {
        Value::Bool(v) => P::BoolValue(*v),
        Value::Int(v) => P::IntValue(*v),
        Value::Double(v) => P::DoubleValue(*v),
        Value::Str(v) => P::StringValue(v.clone()),
        Value::Bytes(v) => P::BytesValue(v.clone()),
        Value::Array(items) => P::ArrayValue(common::ArrayValue {
            values: items.iter().map(value_to_proto).collect(),
        }),
        Value::KvList(entries) => P::KvlistValue(common::KeyValueList {
            values: entries.iter().map(key_value_to_proto).collect(),
        }),
    };
    common::AnyValue { value: Some(value) }
}

pub(crate) fn value_from_proto(value: common::AnyValue) -> Result<Value, DeserializeError> {
    use common::any_value::Value as P;

    let Some(value) = value.value else {
        return Err(DeserializeError::InvalidField(
            "attribute value with no kind set".to_string(),
        ));
    };
    Ok(match value {
        P::BoolValue(v) => Value::Bool(v),
        P::IntValue(v) => Value::Int(v),
        P::DoubleValue(v) => Value::Double(v),
        P::StringValue(v) => Value::Str(v),
        P::BytesValue(v) => Value::Bytes(v),
        P::ArrayValue(array) => Value::Array(
            array
                .values
                .into_iter()
                .map(value_from_proto)
                .collect::<Result<_, _>>()?,
        ),
        P::KvlistValue(list) => Value::KvList(
            list.values
                .into_iter()
                .map(key_value_from_proto)
                .collect::<Result<_, _>>()?,
        ),
    })
}

pub(crate) fn key_value_to_proto(kv: &KeyValue) -> common::KeyValue {
    common::KeyValue {
        key: kv.key.clone(),
        value: Some(value_to_proto(&kv.value)),
    }
}

pub(crate) fn key_value_from_proto(kv: common::KeyValue) -> Result<KeyValue, DeserializeError> {
    let Some(value) = kv.value else {
        return Err(DeserializeError::InvalidField(format!(
            "attribute {:?} with no value",
            kv.key
        )));
    };
    Ok(KeyValue {
        key: kv.key,
        value: value_from_proto(value)?,
    })
}

pub(crate) fn attrs_to_proto(attrs: &[KeyValue]) -> Vec<common::KeyValue> {
    attrs.iter().map(key_value_to_proto).collect()
}

pub(crate) fn attrs_from_proto(
    attrs: Vec<common::KeyValue>,
) -> Result<Vec<KeyValue>, DeserializeError> {
    attrs.into_iter().map(key_value_from_proto).collect()
}

pub(crate) fn resource_to_proto(resource: &Resource) -> common::Resource {
    common::Resource {
        attributes: attrs_to_proto(&resource.attributes),
        dropped_attributes_count: 0,
    }
}

pub(crate) fn resource_from_proto(
    resource: Option<common::Resource>,
) -> Result<Resource, DeserializeError> {
    Ok(Resource {
        attributes: attrs_from_proto(resource.unwrap_or_default().attributes)?,
    })
}

pub(crate) fn scope_to_proto(scope: &InstrumentationScope) -> common::InstrumentationScope {
    common::InstrumentationScope {
        name: scope.name.clone(),
        version: scope.version.clone().unwrap_or_default(),
        attributes: attrs_to_proto(&scope.attributes),
        dropped_attributes_count: 0,
    }
}

pub(crate) fn scope_from_proto(
    scope: Option<common::InstrumentationScope>,
) -> Result<InstrumentationScope, DeserializeError> {
    let scope = scope.unwrap_or_default();
    Ok(InstrumentationScope {
        name: scope.name,
        version: (!scope.version.is_empty()).then_some(scope.version),
        attributes: attrs_from_proto(scope.attributes)?,
    })
}

pub(crate) fn trace_id_from(bytes: &[u8]) -> Result<[u8; 16], DeserializeError> {
    bytes.try_into().map_err(|_| {
        DeserializeError::InvalidField(format!("trace id of {} bytes, expected 16", bytes.len()))
    })
}

pub(crate) fn span_id_from(bytes: &[u8]) -> Result<[u8; 8], DeserializeError> {
    bytes.try_into().map_err(|_| {
        DeserializeError::InvalidField(format!("span id of {} bytes, expected 8", bytes.len()))
    })
}

/// Groups records by (resource, scope), preserving the encounter order of
/// distinct pairs. Records carrying an identical resource collapse into one
/// group; within it, records carrying an identical scope collapse again.
pub(crate) type ScopeGroup<'a, R> = (&'a InstrumentationScope, Vec<&'a R>);

pub(crate) fn group_records<R: TelemetryRecord>(
    records: &[R],
) -> Vec<(&Resource, Vec<ScopeGroup<'_, R>>)> {
    let mut groups: Vec<(&Resource, Vec<ScopeGroup<'_, R>>)> = Vec::new();
    for record in records {
        let resource = record.resource();
        let scope = record.scope();

        let group_idx = match groups.iter().position(|(r, _)| *r == resource) {
            Some(i) => i,
            None => {
                groups.push((resource, Vec::new()));
                groups.len() - 1
            },
        };
        let scopes = &mut groups[group_idx].1;
        let scope_idx = match scopes.iter().position(|(s, _)| *s == scope) {
            Some(i) => i,
            None => {
                scopes.push((scope, Vec::new()));
                scopes.len() - 1
            },
        };
        scopes[scope_idx].1.push(record);
    }
    groups
}
