//! Common wire types shared by all signals: attribute values, resources,
//! and instrumentation scopes.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A dynamically typed attribute value; exactly one variant is set.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AnyValue {
    #[prost(oneof = "any_value::Value", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub value: Option<any_value::Value>,
}

/// Nested types for [`AnyValue`].
pub mod any_value {
    /// The set of representable value kinds.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(string, tag = "1")]
        StringValue(String),
        #[prost(bool, tag = "2")]
        BoolValue(bool),
        #[prost(int64, tag = "3")]
        IntValue(i64),
        #[prost(double, tag = "4")]
        DoubleValue(f64),
        #[prost(message, tag = "5")]
        ArrayValue(super::ArrayValue),
        #[prost(message, tag = "6")]
        KvlistValue(super::KeyValueList),
        #[prost(bytes, tag = "7")]
        BytesValue(Vec<u8>),
    }
}

/// A homogeneously framed list of values.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrayValue {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<AnyValue>,
}

/// A list of key-value pairs carried as an attribute value.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyValueList {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<KeyValue>,
}

/// One keyed attribute.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyValue {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AnyValue>,
}

/// The instrumentation library that produced a batch of telemetry.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstrumentationScope {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[prost(message, repeated, tag = "3")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<KeyValue>,
    #[prost(uint32, tag = "4")]
    #[serde(skip_serializing_if = "super::is_zero_u32")]
    pub dropped_attributes_count: u32,
}

/// The entity producing telemetry.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resource {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<KeyValue>,
    #[prost(uint32, tag = "2")]
    #[serde(skip_serializing_if = "super::is_zero_u32")]
    pub dropped_attributes_count: u32,
}

// =============================================================================
// OTLP-JSON encoding of AnyValue
// =============================================================================
//
// AnyValue renders as a single-key object naming the populated variant,
// e.g. `{"stringValue": "x"}` or `{"intValue": "42"}` (64-bit integers are
// strings). An unset value is an empty object. Hand-written rather than
// derived so the int/bytes payload encodings follow the OTLP-JSON rules.

const ANY_VALUE_FIELDS: &[&str] = &[
    "stringValue",
    "boolValue",
    "intValue",
    "doubleValue",
    "arrayValue",
    "kvlistValue",
    "bytesValue",
];

impl Serialize for AnyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use any_value::Value;

        let mut map = serializer.serialize_map(Some(usize::from(self.value.is_some())))?;
        match &self.value {
            None => {},
            Some(Value::StringValue(v)) => map.serialize_entry("stringValue", v)?,
            Some(Value::BoolValue(v)) => map.serialize_entry("boolValue", v)?,
            Some(Value::IntValue(v)) => map.serialize_entry("intValue", &v.to_string())?,
            Some(Value::DoubleValue(v)) => map.serialize_entry("doubleValue", v)?,
            Some(Value::ArrayValue(v)) => map.serialize_entry("arrayValue", v)?,
            Some(Value::KvlistValue(v)) => map.serialize_entry("kvlistValue", v)?,
            Some(Value::BytesValue(v)) => {
                use base64::Engine as _;
                let encoded = base64::engine::general_purpose::STANDARD.encode(v);
                map.serialize_entry("bytesValue", &encoded)?;
            },
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnyValueVisitor;

        impl<'de> Visitor<'de> for AnyValueVisitor {
            type Value = AnyValue;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an attribute value object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<AnyValue, A::Error> {
                use any_value::Value;

                let Some(key) = map.next_key::<String>()? else {
                    return Ok(AnyValue { value: None });
                };
                let value = match key.as_str() {
                    "stringValue" => Value::StringValue(map.next_value()?),
                    "boolValue" => Value::BoolValue(map.next_value()?),
                    "intValue" => Value::IntValue(map.next_value::<super::I64Repr>()?.0),
                    "doubleValue" => Value::DoubleValue(map.next_value()?),
                    "arrayValue" => Value::ArrayValue(map.next_value()?),
                    "kvlistValue" => Value::KvlistValue(map.next_value()?),
                    "bytesValue" => {
                        use base64::Engine as _;
                        let s = map.next_value::<String>()?;
                        let bytes = base64::engine::general_purpose::STANDARD
                            .decode(&s)
                            .map_err(|e| de::Error::custom(format!("invalid base64 value: {e}")))?;
                        Value::BytesValue(bytes)
                    },
                    other => return Err(de::Error::unknown_field(other, ANY_VALUE_FIELDS)),
                };
                if map.next_key::<String>()?.is_some() {
                    return Err(de::Error::custom("attribute value with more than one kind"));
                }
                Ok(AnyValue { value: Some(value) })
            }
        }

        deserializer.deserialize_map(AnyValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    fn any_str(s: &str) -> AnyValue {
        AnyValue {
            value: Some(any_value::Value::StringValue(s.to_string())),
        }
    }

    #[test]
    fn any_value_json_uses_otlp_field_names() {
        let rendered = serde_json::to_string(&any_str("hi")).unwrap();
        assert_eq!(rendered, r#"{"stringValue":"hi"}"#);

        let int = AnyValue {
            value: Some(any_value::Value::IntValue(42)),
        };
        assert_eq!(serde_json::to_string(&int).unwrap(), r#"{"intValue":"42"}"#);

        let array = AnyValue {
            value: Some(any_value::Value::ArrayValue(ArrayValue {
                values: vec![any_str("a"), any_str("b")],
            })),
        };
        assert_eq!(
            serde_json::to_string(&array).unwrap(),
            r#"{"arrayValue":{"values":[{"stringValue":"a"},{"stringValue":"b"}]}}"#
        );
    }

    #[test]
    fn any_value_json_round_trips() {
        let values = vec![
            AnyValue { value: None },
            any_str("text"),
            AnyValue {
                value: Some(any_value::Value::BoolValue(true)),
            },
            AnyValue {
                value: Some(any_value::Value::IntValue(i64::MIN)),
            },
            AnyValue {
                value: Some(any_value::Value::DoubleValue(2.5)),
            },
            AnyValue {
                value: Some(any_value::Value::BytesValue(vec![0, 1, 2, 255])),
            },
            AnyValue {
                value: Some(any_value::Value::KvlistValue(KeyValueList {
                    values: vec![KeyValue {
                        key: "k".to_string(),
                        value: Some(any_str("v")),
                    }],
                })),
            },
        ];
        for value in values {
            let json = serde_json::to_vec(&value).unwrap();
            let back: AnyValue = serde_json::from_slice(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn int_value_accepts_json_numbers() {
        let back: AnyValue = serde_json::from_str(r#"{"intValue":7}"#).unwrap();
        assert_eq!(back.value, Some(any_value::Value::IntValue(7)));
    }

    #[test]
    fn two_kinds_in_one_value_is_rejected() {
        let result =
            serde_json::from_str::<AnyValue>(r#"{"intValue":"1","boolValue":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn binary_round_trips() {
        let kv = KeyValue {
            key: "service.name".to_string(),
            value: Some(any_str("checkout")),
        };
        let bytes = kv.encode_to_vec();
        let back = KeyValue::decode(bytes.as_slice()).unwrap();
        assert_eq!(back, kv);
    }
}
