//! Metric -> telemetry item translation
//!
//! Pure: no state, no I/O. One item per numeric field, named
//! `<metric>_<field>`, carrying the metric's tags and timestamp unchanged.

use contracts::{FieldValue, Metric, TelemetryItem};

use crate::error::TranslateError;

/// Outcome for a single field
pub type FieldResult = Result<TelemetryItem, TranslateError>;

/// Translate a metric into per-field results, in field-name order
///
/// # Errors
/// `AggregateUnsupported` when the metric is an aggregate; no field is
/// looked at in that case.
pub fn translate(metric: &Metric) -> Result<Vec<FieldResult>, TranslateError> {
    if metric.is_aggregate() {
        return Err(TranslateError::aggregate_unsupported(metric.name()));
    }

    Ok(metric
        .fields()
        .iter()
        .map(|(field, value)| translate_field(metric, field, value))
        .collect())
}

/// Backend name of a metric field
pub fn item_name(metric_name: &str, field_name: &str) -> String {
    format!("{metric_name}_{field_name}")
}

fn translate_field(metric: &Metric, field: &str, value: &FieldValue) -> FieldResult {
    let value = value
        .as_f64()
        .ok_or_else(|| TranslateError::non_numeric_field(metric.name(), field, value.kind()))?;

    Ok(TelemetryItem::new(
        item_name(metric.name(), field),
        value,
        metric.tags().clone(),
        metric.timestamp(),
    ))
}
