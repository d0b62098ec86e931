//! Ingestion wire format
//!
//! Each item becomes one `MetricData` envelope; a request body is the
//! envelopes serialized as newline-delimited JSON.

use std::collections::BTreeMap;

use chrono::SecondsFormat;
use contracts::{Tags, TelemetryItem};
use serde::Serialize;

const SDK_VERSION: &str = concat!("rust-appinsights-output:", env!("CARGO_PKG_VERSION"));

/// Data point kind: a single measurement (not a pre-aggregated one)
const MEASUREMENT: u8 = 0;

/// Telemetry envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<'a> {
    name: String,
    time: String,
    i_key: &'a str,
    tags: BTreeMap<&'static str, &'static str>,
    data: Data<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Data<'a> {
    base_type: &'static str,
    base_data: MetricData<'a>,
}

#[derive(Debug, Serialize)]
struct MetricData<'a> {
    ver: u8,
    metrics: [DataPoint<'a>; 1],
    #[serde(skip_serializing_if = "no_properties")]
    properties: &'a Tags,
}

fn no_properties(properties: &&Tags) -> bool {
    properties.is_empty()
}

#[derive(Debug, Serialize)]
struct DataPoint<'a> {
    name: &'a str,
    kind: u8,
    value: f64,
    count: u32,
}

impl<'a> Envelope<'a> {
    /// Wrap one item for `instrumentation_key`
    pub fn metric(instrumentation_key: &'a str, item: &'a TelemetryItem) -> Self {
        Self {
            name: format!(
                "Microsoft.ApplicationInsights.{}.Metric",
                instrumentation_key.replace('-', "")
            ),
            time: item.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            i_key: instrumentation_key,
            tags: BTreeMap::from([("ai.internal.sdkVersion", SDK_VERSION)]),
            data: Data {
                base_type: "MetricData",
                base_data: MetricData {
                    ver: 2,
                    metrics: [DataPoint {
                        name: &item.name,
                        kind: MEASUREMENT,
                        value: item.value,
                        count: 1,
                    }],
                    properties: &item.properties,
                },
            },
        }
    }
}

/// Serialize a batch as newline-delimited envelopes
pub fn encode_batch(
    instrumentation_key: &str,
    items: &[TelemetryItem],
) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::with_capacity(items.len() * 256);
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            body.push(b'\n');
        }
        serde_json::to_writer(&mut body, &Envelope::metric(instrumentation_key, item))?;
    }
    Ok(body)
}
