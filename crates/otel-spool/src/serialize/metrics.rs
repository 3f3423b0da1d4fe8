//! Metric serializer strategy.

use prost::Message;

use crate::model::{
    HistogramPoint, MetricData, MetricRecord, NumberPoint, NumberValue, Temporality,
};
use crate::proto::metrics::{
    self, Gauge, Histogram, HistogramDataPoint, MetricsData, NumberDataPoint, ResourceMetrics,
    ScopeMetrics, Sum, metric, number_data_point,
};

use super::convert::{
    attrs_from_proto, attrs_to_proto, group_records, resource_from_proto, resource_to_proto,
    scope_from_proto, scope_to_proto,
};
use super::{DeserializeError, SerializeError, SignalSerializer, WireFormat, prevalidate_binary};

/// Serializer for batches of [`MetricRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct MetricSerializer {
    format: WireFormat,
}

impl MetricSerializer {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }
}

impl SignalSerializer for MetricSerializer {
    type Record = MetricRecord;

    fn format(&self) -> WireFormat {
        self.format
    }

    fn serialize(&self, records: &[MetricRecord]) -> Result<Vec<u8>, SerializeError> {
        let envelope = to_envelope(records);
        match self.format {
            WireFormat::Protobuf => Ok(envelope.encode_to_vec()),
            WireFormat::Json => Ok(serde_json::to_vec(&envelope)?),
        }
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<MetricRecord>, DeserializeError> {
        let envelope = match self.format {
            WireFormat::Protobuf => {
                prevalidate_binary(bytes)?;
                MetricsData::decode(bytes)?
            },
            WireFormat::Json => serde_json::from_slice(bytes)?,
        };
        from_envelope(envelope)
    }
}

fn to_envelope(records: &[MetricRecord]) -> MetricsData {
    let resource_metrics = group_records(records)
        .into_iter()
        .map(|(resource, scopes)| ResourceMetrics {
            resource: Some(resource_to_proto(resource)),
            scope_metrics: scopes
                .into_iter()
                .map(|(scope, metrics)| ScopeMetrics {
                    scope: Some(scope_to_proto(scope)),
                    metrics: metrics.into_iter().map(metric_to_proto).collect(),
                    schema_url: String::new(),
                })
                .collect(),
            schema_url: String::new(),
        })
        .collect();
    MetricsData { resource_metrics }
}

fn from_envelope(envelope: MetricsData) -> Result<Vec<MetricRecord>, DeserializeError> {
    let mut records = Vec::new();
    for resource_metrics in envelope.resource_metrics {
        let resource = resource_from_proto(resource_metrics.resource)?;
        for scope_metrics in resource_metrics.scope_metrics {
            let scope = scope_from_proto(scope_metrics.scope)?;
            for m in scope_metrics.metrics {
                records.push(metric_from_proto(m, resource.clone(), scope.clone())?);
            }
        }
    }
    Ok(records)
}

fn metric_to_proto(record: &MetricRecord) -> metrics::Metric {
    let data = match &record.data {
        MetricData::Gauge { points } => metric::Data::Gauge(Gauge {
            data_points: points.iter().map(number_point_to_proto).collect(),
        }),
        MetricData::Sum {
            points,
            temporality,
            is_monotonic,
        } => metric::Data::Sum(Sum {
            data_points: points.iter().map(number_point_to_proto).collect(),
            aggregation_temporality: *temporality as i32,
            is_monotonic: *is_monotonic,
        }),
        MetricData::Histogram {
            points,
            temporality,
        } => metric::Data::Histogram(Histogram {
            data_points: points.iter().map(histogram_point_to_proto).collect(),
            aggregation_temporality: *temporality as i32,
        }),
    };
    metrics::Metric {
        name: record.name.clone(),
        description: record.description.clone().unwrap_or_default(),
        unit: record.unit.clone().unwrap_or_default(),
        data: Some(data),
    }
}

fn metric_from_proto(
    m: metrics::Metric,
    resource: crate::model::Resource,
    scope: crate::model::InstrumentationScope,
) -> Result<MetricRecord, DeserializeError> {
    let Some(data) = m.data else {
        return Err(DeserializeError::InvalidField(format!(
            "metric {:?} with no data",
            m.name
        )));
    };
    let data = match data {
        metric::Data::Gauge(g) => MetricData::Gauge {
            points: number_points_from_proto(g.data_points, &m.name)?,
        },
        metric::Data::Sum(s) => MetricData::Sum {
            points: number_points_from_proto(s.data_points, &m.name)?,
            temporality: Temporality::from_i32(s.aggregation_temporality),
            is_monotonic: s.is_monotonic,
        },
        metric::Data::Histogram(h) => MetricData::Histogram {
            points: h
                .data_points
                .into_iter()
                .map(histogram_point_from_proto)
                .collect::<Result<_, _>>()?,
            temporality: Temporality::from_i32(h.aggregation_temporality),
        },
    };
    Ok(MetricRecord {
        resource,
        scope,
        name: m.name,
        description: (!m.description.is_empty()).then_some(m.description),
        unit: (!m.unit.is_empty()).then_some(m.unit),
        data,
    })
}

fn number_point_to_proto(point: &NumberPoint) -> NumberDataPoint {
    NumberDataPoint {
        start_time_unix_nano: point.start_unix_nanos,
        time_unix_nano: point.time_unix_nanos,
        attributes: attrs_to_proto(&point.attributes),
        value: Some(match point.value {
            NumberValue::Int(v) => number_data_point::Value::AsInt(v),
            NumberValue::Double(v) => number_data_point::Value::AsDouble(v),
        }),
    }
}

fn number_points_from_proto(
    points: Vec<NumberDataPoint>,
    metric_name: &str,
) -> Result<Vec<NumberPoint>, DeserializeError> {
    points
        .into_iter()
        .map(|point| {
            let Some(value) = point.value else {
                return Err(DeserializeError::InvalidField(format!(
                    "data point of metric {metric_name:?} with no value"
                )));
            };
            Ok(NumberPoint {
                start_unix_nanos: point.start_time_unix_nano,
                time_unix_nanos: point.time_unix_nano,
                attributes: attrs_from_proto(point.attributes)?,
                value: match value {
                    number_data_point::Value::AsInt(v) => NumberValue::Int(v),
                    number_data_point::Value::AsDouble(v) => NumberValue::Double(v),
                },
            })
        })
        .collect()
}

fn histogram_point_to_proto(point: &HistogramPoint) -> HistogramDataPoint {
    HistogramDataPoint {
        start_time_unix_nano: point.start_unix_nanos,
        time_unix_nano: point.time_unix_nanos,
        count: point.count,
        sum: point.sum,
        bucket_counts: point.bucket_counts.clone(),
        explicit_bounds: point.explicit_bounds.clone(),
        attributes: attrs_to_proto(&point.attributes),
        min: point.min,
        max: point.max,
    }
}

fn histogram_point_from_proto(
    point: HistogramDataPoint,
) -> Result<HistogramPoint, DeserializeError> {
    Ok(HistogramPoint {
        start_unix_nanos: point.start_time_unix_nano,
        time_unix_nanos: point.time_unix_nano,
        attributes: attrs_from_proto(point.attributes)?,
        count: point.count,
        sum: point.sum,
        min: point.min,
        max: point.max,
        bucket_counts: point.bucket_counts,
        explicit_bounds: point.explicit_bounds,
    })
}
