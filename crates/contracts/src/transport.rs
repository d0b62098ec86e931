//! TelemetryTransport trait - client delivery interface
//!
//! Defines how a buffered client ships a batch of items to the backend.

use crate::{ContractError, TelemetryItem};

/// Batch delivery trait
///
/// All transports must implement this trait.
#[trait_variant::make(TelemetryTransport: Send)]
pub trait LocalTelemetryTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one batch of items
    ///
    /// # Errors
    /// Returns delivery error (should include context)
    async fn send(
        &mut self,
        instrumentation_key: &str,
        items: &[TelemetryItem],
    ) -> Result<(), ContractError>;

    /// Release transport resources
    async fn close(&mut self) -> Result<(), ContractError>;
}
