//! Wire-format message types mirroring the OTLP collector export requests.
//!
//! The structs are hand-derived [`prost::Message`] implementations with the
//! OTLP field numbers, so the compact binary format is byte-compatible with
//! the network export protocol. The same structs carry `serde` impls for the
//! structured-text format, following the OTLP-JSON mapping rules:
//!
//! - field names in camelCase (`stringValue`, `timeUnixNano`, ...);
//! - 64-bit integers encoded as JSON strings (accepted back as strings or
//!   numbers);
//! - trace/span ids hex-encoded, bytes-valued attributes base64-encoded;
//! - enumerations encoded as their integer values.

pub mod common;
pub mod logs;
pub mod metrics;
pub mod trace;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

pub(crate) fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

pub(crate) fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

pub(crate) fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

pub(crate) fn is_false(v: &bool) -> bool {
    !*v
}

/// A u64 deserialized from either a JSON string or a JSON number.
pub(crate) struct U64Repr(pub u64);

impl<'de> Deserialize<'de> for U64Repr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct U64Visitor;

        impl Visitor<'_> for U64Visitor {
            type Value = U64Repr;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an unsigned 64-bit integer or its string form")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<U64Repr, E> {
                Ok(U64Repr(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<U64Repr, E> {
                u64::try_from(v)
                    .map(U64Repr)
                    .map_err(|_| E::custom(format!("negative value {v} for u64 field")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<U64Repr, E> {
                v.parse::<u64>()
                    .map(U64Repr)
                    .map_err(|e| E::custom(format!("invalid u64 string {v:?}: {e}")))
            }
        }

        deserializer.deserialize_any(U64Visitor)
    }
}

/// An i64 deserialized from either a JSON string or a JSON number.
pub(crate) struct I64Repr(pub i64);

impl<'de> Deserialize<'de> for I64Repr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct I64Visitor;

        impl Visitor<'_> for I64Visitor {
            type Value = I64Repr;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a signed 64-bit integer or its string form")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<I64Repr, E> {
                Ok(I64Repr(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<I64Repr, E> {
                i64::try_from(v)
                    .map(I64Repr)
                    .map_err(|_| E::custom(format!("value {v} out of range for i64 field")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<I64Repr, E> {
                v.parse::<i64>()
                    .map(I64Repr)
                    .map_err(|e| E::custom(format!("invalid i64 string {v:?}: {e}")))
            }
        }

        deserializer.deserialize_any(I64Visitor)
    }
}

/// 64-bit unsigned fields as JSON strings.
pub(crate) mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        super::U64Repr::deserialize(deserializer).map(|v| v.0)
    }
}

/// Optional 64-bit signed fields as JSON strings.
pub(crate) mod i64_string_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Option::<super::I64Repr>::deserialize(deserializer).map(|v| v.map(|v| v.0))
    }
}

/// Repeated 64-bit unsigned fields as arrays of JSON strings.
pub(crate) mod u64_string_vec {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(v.len()))?;
        for item in v {
            seq.serialize_element(&item.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        let items = Vec::<super::U64Repr>::deserialize(deserializer)?;
        Ok(items.into_iter().map(|v| v.0).collect())
    }
}

/// Byte-string fields (trace/span ids) as lowercase hex.
pub(crate) mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&hex::encode(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(|e| D::Error::custom(format!("invalid hex id {s:?}: {e}")))
    }
}

/// Base64 encode/decode for bytes-valued attributes.
pub(crate) mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&STANDARD.encode(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(&s)
            .map_err(|e| D::Error::custom(format!("invalid base64 value: {e}")))
    }
}
