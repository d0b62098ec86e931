//! Transport implementations
//!
//! Contains IngestionTransport (HTTP) and LogTransport.

mod envelope;
mod ingestion;
mod log;

pub use self::envelope::{encode_batch, Envelope};
pub use self::ingestion::IngestionTransport;
pub use self::log::LogTransport;
