//! TelemetryItem - translator output
//!
//! Backend-native named measurement derived from exactly one metric field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Tags;

/// Single named numeric measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryItem {
    /// `<metric name>_<field name>`
    pub name: String,

    /// Numeric value
    pub value: f64,

    /// Copy of the source metric's tags
    pub properties: Tags,

    /// Source metric's timestamp
    pub timestamp: DateTime<Utc>,
}

impl TelemetryItem {
    /// Create a new item
    pub fn new(
        name: impl Into<String>,
        value: f64,
        properties: Tags,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            properties,
            timestamp,
        }
    }
}
