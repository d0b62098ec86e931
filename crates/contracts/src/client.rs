//! TelemetryClient trait - Dispatcher output interface
//!
//! Narrow contract the dispatcher needs from a telemetry SDK client.

use std::time::Duration;
use tokio::sync::oneshot;

use crate::{ContractError, TelemetryItem};

/// Fires once the client finished its shutdown drain
///
/// A dropped sender counts as completion as well: the client is gone either way.
pub type CompletionSignal = oneshot::Receiver<()>;

/// Asynchronous, buffered telemetry sender
///
/// Implementations own their send buffer and delivery worker. Neither method
/// may block on network I/O.
pub trait TelemetryClient: Send {
    /// Account identifier this client is bound to
    fn instrumentation_key(&self) -> &str;

    /// Submit an item for delivery (non-blocking, fire-and-forget)
    fn track(&self, item: TelemetryItem);

    /// Stop accepting items and begin draining
    ///
    /// `flush_budget` bounds how long the client itself spends draining;
    /// `Duration::ZERO` asks for a single pass over what is already buffered.
    /// Returns immediately; the signal resolves when the drain has finished.
    fn close(&mut self, flush_budget: Duration) -> CompletionSignal;
}

/// Creates client handles bound to an instrumentation key
pub trait ClientFactory: Send + Sync {
    /// Client type produced by this factory
    type Client: TelemetryClient + 'static;

    /// Create a client for `instrumentation_key`
    ///
    /// No network round-trip and no key validation. Fails only when local
    /// resources (HTTP client, worker task) cannot be set up.
    fn create(&self, instrumentation_key: &str) -> Result<Self::Client, ContractError>;
}
