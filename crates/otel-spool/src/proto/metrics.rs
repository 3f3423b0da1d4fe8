//! Metric wire types: the `MetricsData` envelope, metric streams, and their
//! gauge/sum/histogram data points.
//!
//! The two oneof-bearing messages ([`Metric`], [`NumberDataPoint`]) map to
//! JSON through private shadow structs so the populated variant renders as a
//! plain keyed field (`"gauge"`, `"asInt"`), matching the OTLP-JSON layout.

use serde::{Deserialize, Serialize};

use super::common::{InstrumentationScope, KeyValue, Resource};

/// Top-level envelope, shaped like the metrics export request.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsData {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_metrics: Vec<ResourceMetrics>,
}

/// Metrics from one resource.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceMetrics {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scope_metrics: Vec<ScopeMetrics>,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub schema_url: String,
}

/// Metrics from one instrumentation scope.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeMetrics {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<InstrumentationScope>,
    #[prost(message, repeated, tag = "2")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub schema_url: String,
}

/// One metric stream.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(into = "MetricJson", from = "MetricJson")]
pub struct Metric {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(string, tag = "3")]
    pub unit: String,
    #[prost(oneof = "metric::Data", tags = "5, 7, 9")]
    pub data: Option<metric::Data>,
}

/// Nested types for [`Metric`].
pub mod metric {
    /// The aggregated data carried by a metric; exactly one variant is set.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "5")]
        Gauge(super::Gauge),
        #[prost(message, tag = "7")]
        Sum(super::Sum),
        #[prost(message, tag = "9")]
        Histogram(super::Histogram),
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MetricJson {
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gauge: Option<Gauge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sum: Option<Sum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    histogram: Option<Histogram>,
}

impl From<Metric> for MetricJson {
    fn from(m: Metric) -> Self {
        let mut json = Self {
            name: m.name,
            description: m.description,
            unit: m.unit,
            ..Self::default()
        };
        match m.data {
            Some(metric::Data::Gauge(g)) => json.gauge = Some(g),
            Some(metric::Data::Sum(s)) => json.sum = Some(s),
            Some(metric::Data::Histogram(h)) => json.histogram = Some(h),
            None => {},
        }
        json
    }
}

impl From<MetricJson> for Metric {
    fn from(json: MetricJson) -> Self {
        let data = if let Some(g) = json.gauge {
            Some(metric::Data::Gauge(g))
        } else if let Some(s) = json.sum {
            Some(metric::Data::Sum(s))
        } else {
            json.histogram.map(metric::Data::Histogram)
        };
        Self {
            name: json.name,
            description: json.description,
            unit: json.unit,
            data,
        }
    }
}

/// Instantaneous sampled values.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gauge {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_points: Vec<NumberDataPoint>,
}

/// Cumulative or delta sums.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sum {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_points: Vec<NumberDataPoint>,
    /// Aggregation temporality enumeration value.
    #[prost(int32, tag = "2")]
    #[serde(skip_serializing_if = "super::is_zero_i32")]
    pub aggregation_temporality: i32,
    #[prost(bool, tag = "3")]
    #[serde(skip_serializing_if = "super::is_false")]
    pub is_monotonic: bool,
}

/// Bucketed value distributions.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Histogram {
    #[prost(message, repeated, tag = "1")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_points: Vec<HistogramDataPoint>,
    /// Aggregation temporality enumeration value.
    #[prost(int32, tag = "2")]
    #[serde(skip_serializing_if = "super::is_zero_i32")]
    pub aggregation_temporality: i32,
}

/// One gauge or sum point.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(into = "NumberDataPointJson", from = "NumberDataPointJson")]
pub struct NumberDataPoint {
    #[prost(fixed64, tag = "2")]
    pub start_time_unix_nano: u64,
    #[prost(fixed64, tag = "3")]
    pub time_unix_nano: u64,
    #[prost(message, repeated, tag = "7")]
    pub attributes: Vec<KeyValue>,
    #[prost(oneof = "number_data_point::Value", tags = "4, 6")]
    pub value: Option<number_data_point::Value>,
}

/// Nested types for [`NumberDataPoint`].
pub mod number_data_point {
    /// The sampled value; exactly one variant is set.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(double, tag = "4")]
        AsDouble(f64),
        #[prost(sfixed64, tag = "6")]
        AsInt(i64),
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NumberDataPointJson {
    #[serde(with = "super::u64_string")]
    start_time_unix_nano: u64,
    #[serde(with = "super::u64_string")]
    time_unix_nano: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<KeyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    as_double: Option<f64>,
    #[serde(with = "super::i64_string_opt", skip_serializing_if = "Option::is_none")]
    as_int: Option<i64>,
}

impl From<NumberDataPoint> for NumberDataPointJson {
    fn from(p: NumberDataPoint) -> Self {
        let (as_double, as_int) = match p.value {
            Some(number_data_point::Value::AsDouble(v)) => (Some(v), None),
            Some(number_data_point::Value::AsInt(v)) => (None, Some(v)),
            None => (None, None),
        };
        Self {
            start_time_unix_nano: p.start_time_unix_nano,
            time_unix_nano: p.time_unix_nano,
            attributes: p.attributes,
            as_double,
            as_int,
        }
    }
}

impl From<NumberDataPointJson> for NumberDataPoint {
    fn from(json: NumberDataPointJson) -> Self {
        let value = match (json.as_double, json.as_int) {
            (Some(v), _) => Some(number_data_point::Value::AsDouble(v)),
            (None, Some(v)) => Some(number_data_point::Value::AsInt(v)),
            (None, None) => None,
        };
        Self {
            start_time_unix_nano: json.start_time_unix_nano,
            time_unix_nano: json.time_unix_nano,
            attributes: json.attributes,
            value,
        }
    }
}

/// One histogram point. `explicit_bounds` has one fewer entry than
/// `bucket_counts`.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistogramDataPoint {
    #[prost(fixed64, tag = "2")]
    #[serde(with = "super::u64_string")]
    pub start_time_unix_nano: u64,
    #[prost(fixed64, tag = "3")]
    #[serde(with = "super::u64_string")]
    pub time_unix_nano: u64,
    #[prost(fixed64, tag = "4")]
    #[serde(with = "super::u64_string", skip_serializing_if = "super::is_zero_u64")]
    pub count: u64,
    #[prost(double, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[prost(fixed64, repeated, tag = "6")]
    #[serde(with = "super::u64_string_vec", skip_serializing_if = "Vec::is_empty")]
    pub bucket_counts: Vec<u64>,
    #[prost(double, repeated, tag = "7")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_bounds: Vec<f64>,
    #[prost(message, repeated, tag = "9")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<KeyValue>,
    #[prost(double, optional, tag = "11")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[prost(double, optional, tag = "12")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}
