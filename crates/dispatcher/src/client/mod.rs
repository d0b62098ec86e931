//! Telemetry client implementations
//!
//! `BufferedClient` queues items and delivers them in batches from a
//! background worker through a `TelemetryTransport`.

mod buffered;

pub use self::buffered::{BufferedClient, BufferedClientFactory};
