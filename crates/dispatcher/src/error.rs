//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Write called before connect
    #[error("telemetry client not connected: call connect before write")]
    NotConnected,

    /// Output name not registered
    #[error("unknown output '{name}'")]
    UnknownOutput { name: String },

    /// Telemetry client could not be created
    #[error("failed to create telemetry client: {0}")]
    ClientCreation(#[from] contracts::ContractError),
}

/// Translation refusals
///
/// Neither variant is fatal: an aggregate refusal covers one metric, a
/// non-numeric refusal covers one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// Aggregate metrics have no per-point representation
    #[error("aggregate metric '{metric}' is not supported")]
    AggregateUnsupported { metric: String },

    /// Field value has no numeric view
    #[error("field '{field}' of metric '{metric}' is not numeric ({kind})")]
    NonNumericField {
        metric: String,
        field: String,
        kind: &'static str,
    },
}

impl TranslateError {
    /// Create an aggregate refusal
    pub fn aggregate_unsupported(metric: impl Into<String>) -> Self {
        Self::AggregateUnsupported {
            metric: metric.into(),
        }
    }

    /// Create a non-numeric field refusal
    pub fn non_numeric_field(
        metric: impl Into<String>,
        field: impl Into<String>,
        kind: &'static str,
    ) -> Self {
        Self::NonNumericField {
            metric: metric.into(),
            field: field.into(),
            kind,
        }
    }
}
