//! IngestionTransport - HTTP POST to the telemetry ingestion endpoint

use contracts::{ClientConfig, ContractError, TelemetryItem, TelemetryTransport};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use super::envelope::encode_batch;

const CONTENT_TYPE_JSON_STREAM: &str = "application/x-json-stream";
const MAX_ERROR_BODY: usize = 512;

/// Transport that posts newline-delimited envelopes over HTTP
pub struct IngestionTransport {
    name: String,
    endpoint_url: String,
    http: reqwest::Client,
}

impl IngestionTransport {
    /// Create a transport from client settings
    ///
    /// Builds the HTTP client only; nothing is sent until the first batch.
    pub fn new(config: &ClientConfig) -> Result<Self, ContractError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ContractError::transport_send("ingestion", e.to_string()))?;

        Ok(Self {
            name: "ingestion".to_string(),
            endpoint_url: config.endpoint_url.clone(),
            http,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    fn rejected(&self, status: StatusCode, body: String) -> ContractError {
        let mut message = body;
        if message.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        ContractError::TransportRejected {
            transport: self.name.clone(),
            status: status.as_u16(),
            message,
        }
    }
}

impl TelemetryTransport for IngestionTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "ingestion_transport_send",
        skip(self, instrumentation_key, items),
        fields(transport = %self.name, items = items.len())
    )]
    async fn send(
        &mut self,
        instrumentation_key: &str,
        items: &[TelemetryItem],
    ) -> Result<(), ContractError> {
        if items.is_empty() {
            return Ok(());
        }

        let body = encode_batch(instrumentation_key, items)
            .map_err(|e| ContractError::transport_send(&self.name, format!("encode error: {e}")))?;

        let response = self
            .http
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON_STREAM)
            .body(body)
            .send()
            .await
            .map_err(|e| ContractError::transport_send(&self.name, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::PARTIAL_CONTENT {
            // Some envelopes were refused; there is no retry to hand them to.
            warn!(transport = %self.name, "Backend accepted the batch partially");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.rejected(status, body));
        }

        debug!(transport = %self.name, status = status.as_u16(), "Batch accepted");
        Ok(())
    }

    #[instrument(name = "ingestion_transport_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(transport = %self.name, "IngestionTransport closed");
        Ok(())
    }
}
