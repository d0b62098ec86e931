//! Output plugin boundary
//!
//! What the host collection agent sees: describe / sample config /
//! connect / write / close, driven by an `OutputConfig`.

use contracts::{ClientFactory, Metric, OutputConfig};
use tracing::{info, instrument};

use crate::client::BufferedClientFactory;
use crate::dispatcher::Dispatcher;
use crate::error::DispatcherError;
use crate::metrics::WriteReport;
use crate::shutdown::ShutdownOutcome;

/// Name the output is registered under
pub const OUTPUT_NAME: &str = "application_insights";

/// One-line description shown by the host
pub const DESCRIPTION: &str = "Send telegraf metrics to Azure Application Insights";

/// Annotated TOML sample with every option at its default
pub const SAMPLE_CONFIG: &str = r#"
## Instrumentation key of the Application Insights resource.
instrumentation_key = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxx"

## Timeout on close. If not provided, will default to 5s.
## "0s" means no timeout: close waits until every buffered item is sent.
# timeout = "5s"

## What to do with aggregate (histogram/summary) metrics, which cannot be sent:
##   "skip_metric" - skip the metric and keep writing the batch (default)
##   "abort_batch" - drop the rest of the batch at the first aggregate metric
# aggregate_policy = "skip_metric"

## Telemetry client settings.
# [client]
## "ingestion" posts to endpoint_url, "log" only logs batches.
# transport = "ingestion"
# endpoint_url = "https://dc.services.visualstudio.com/v2/track"
## Items buffered before new ones are dropped.
# queue_capacity = 8192
## A batch is sent when it holds max_batch_size items or is max_batch_interval old.
# max_batch_size = 1024
# max_batch_interval = "10s"
# request_timeout = "30s"
"#;

/// Application Insights output plugin
pub struct ApplicationInsightsOutput<F: ClientFactory = BufferedClientFactory> {
    config: OutputConfig,
    dispatcher: Dispatcher<F>,
}

impl ApplicationInsightsOutput {
    /// Create the output with the buffered client described by `config.client`
    pub fn new(config: OutputConfig) -> Self {
        let factory = BufferedClientFactory::new(config.client.clone());
        Self::with_factory(config, factory)
    }
}

impl<F: ClientFactory> ApplicationInsightsOutput<F> {
    /// Create the output with a custom client factory
    pub fn with_factory(config: OutputConfig, factory: F) -> Self {
        let dispatcher = Dispatcher::new(factory, config.aggregate_policy);
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher<F> {
        &self.dispatcher
    }

    /// One-line human description
    pub fn describe(&self) -> &'static str {
        DESCRIPTION
    }

    /// Annotated sample configuration (TOML)
    pub fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    /// Create the telemetry client for the configured key
    #[instrument(name = "output_connect", skip(self))]
    pub fn connect(&mut self) -> Result<(), DispatcherError> {
        self.dispatcher.connect(&self.config.instrumentation_key)
    }

    /// Forward a batch of metrics
    pub fn write(&mut self, batch: &[Metric]) -> Result<WriteReport, DispatcherError> {
        self.dispatcher.write(batch)
    }

    /// Flush and shut down within the configured timeout
    ///
    /// Never fails; the outcome is informational.
    #[instrument(name = "output_close", skip(self))]
    pub async fn close(&mut self) -> ShutdownOutcome {
        let outcome = self
            .dispatcher
            .close(self.config.shutdown_timeout())
            .await;
        info!(outcome = %outcome, "Application Insights output closed");
        outcome
    }
}

/// Registry lookup used by the host: build an output by its registered name
pub fn create_output(
    name: &str,
    config: OutputConfig,
) -> Result<ApplicationInsightsOutput, DispatcherError> {
    match name {
        OUTPUT_NAME => Ok(ApplicationInsightsOutput::new(config)),
        other => Err(DispatcherError::UnknownOutput {
            name: other.to_string(),
        }),
    }
}

/// Names of all registered outputs
pub fn registered_outputs() -> &'static [&'static str] {
    &[OUTPUT_NAME]
}
