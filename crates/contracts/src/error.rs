//! Layered error definitions
//!
//! Categorized by source: config / transport

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Batch delivery error
    #[error("transport '{transport}' send error: {message}")]
    TransportSend { transport: String, message: String },

    /// Backend rejected the batch
    #[error("transport '{transport}' rejected with status {status}: {message}")]
    TransportRejected {
        transport: String,
        status: u16,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transport send error
    pub fn transport_send(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportSend {
            transport: transport.into(),
            message: message.into(),
        }
    }
}
