//! Metric - collector pipeline output
//!
//! Generic, already-collected measurement handed to the output in batches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag set (dimensions), ordered by key
pub type Tags = BTreeMap<String, String>;

/// Field set, ordered by key so iteration is stable
pub type Fields = BTreeMap<String, FieldValue>;

/// Value of a single metric field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Unsigned integer that does not fit `i64`
    Unsigned(u64),
    /// Floating point
    Float(f64),
    /// Free-form text
    String(String),
}

impl FieldValue {
    /// Numeric view of the value, if it has one
    ///
    /// Integers are widened to `f64`; strings, booleans and non-finite floats
    /// (NaN, ±inf, which have no JSON representation) have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) if v.is_finite() => Some(*v),
            Self::Float(_) => None,
            Self::Integer(v) => Some(*v as f64),
            Self::Unsigned(v) => Some(*v as f64),
            Self::Bool(_) | Self::String(_) => None,
        }
    }

    /// Short type name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Unsigned(_) => "unsigned",
            Self::Float(v) if v.is_finite() => "float",
            Self::Float(_) => "non_finite",
            Self::String(_) => "string",
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::Unsigned(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Collected metric
///
/// Immutable once received by the output; fields are private and exposed
/// through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    name: String,

    #[serde(default)]
    tags: Tags,

    fields: Fields,

    timestamp: DateTime<Utc>,

    /// Statistical summary (histogram etc.) rather than a point value
    #[serde(default)]
    aggregate: bool,
}

impl Metric {
    /// Create a point metric
    pub fn new(
        name: impl Into<String>,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            tags,
            fields,
            timestamp,
            aggregate: false,
        }
    }

    /// Create an aggregate metric
    pub fn aggregate(
        name: impl Into<String>,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            aggregate: true,
            ..Self::new(name, tags, fields, timestamp)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate
    }
}
