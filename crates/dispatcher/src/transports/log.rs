//! LogTransport - logs batch summaries via tracing

use contracts::{ContractError, TelemetryItem, TelemetryTransport};
use tracing::{debug, info, instrument};

/// Transport that logs batches instead of sending them
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TelemetryTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, instrumentation_key, items),
        fields(transport = %self.name, items = items.len())
    )]
    async fn send(
        &mut self,
        instrumentation_key: &str,
        items: &[TelemetryItem],
    ) -> Result<(), ContractError> {
        info!(
            transport = %self.name,
            items = items.len(),
            key_len = instrumentation_key.len(),
            "Telemetry batch"
        );
        for item in items {
            debug!(
                name = %item.name,
                value = item.value,
                timestamp = %item.timestamp,
                properties = ?item.properties,
                "Telemetry item"
            );
        }
        Ok(())
    }

    #[instrument(name = "log_transport_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(transport = %self.name, "LogTransport closed");
        Ok(())
    }
}
