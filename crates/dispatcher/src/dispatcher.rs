//! Dispatcher - connect / write / close over one telemetry client

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use contracts::{AggregatePolicy, ClientFactory, Metric, ShutdownTimeout, TelemetryClient};

use crate::error::{DispatcherError, TranslateError};
use crate::metrics::{DispatchMetrics, WriteReport};
use crate::shutdown::{ShutdownCoordinator, ShutdownOutcome};
use crate::translator::{self, FieldResult};

/// Owns the telemetry client and drives translation into it
///
/// The host calls `connect`, then `write` repeatedly, then `close`, never
/// concurrently; the `&mut self` receivers hold it to that.
pub struct Dispatcher<F: ClientFactory> {
    factory: F,
    client: Option<F::Client>,
    aggregate_policy: AggregatePolicy,
    metrics: Arc<DispatchMetrics>,
}

impl<F: ClientFactory> Dispatcher<F> {
    /// Create a disconnected dispatcher
    pub fn new(factory: F, aggregate_policy: AggregatePolicy) -> Self {
        Self {
            factory,
            client: None,
            aggregate_policy,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn aggregate_policy(&self) -> AggregatePolicy {
        self.aggregate_policy
    }

    /// Get cumulative write metrics
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Create the client handle bound to `instrumentation_key`
    ///
    /// Reconnecting replaces the live handle; items still buffered in the old
    /// one are not guaranteed to be delivered.
    #[instrument(name = "dispatcher_connect", skip_all)]
    pub fn connect(&mut self, instrumentation_key: &str) -> Result<(), DispatcherError> {
        let client = self.factory.create(instrumentation_key)?;

        if self.client.replace(client).is_some() {
            warn!("Replaced a live telemetry client, its buffered items may be lost");
        }

        info!(policy = ?self.aggregate_policy, "Telemetry client connected");
        Ok(())
    }

    /// Translate a batch and submit the items without waiting on delivery
    ///
    /// # Errors
    /// `NotConnected` for a non-empty batch before `connect`. Translation
    /// refusals never fail the call.
    #[instrument(name = "dispatcher_write", skip_all, fields(batch = batch.len()))]
    pub fn write(&mut self, batch: &[Metric]) -> Result<WriteReport, DispatcherError> {
        if batch.is_empty() {
            return Ok(WriteReport::default());
        }

        let client = self.client.as_ref().ok_or(DispatcherError::NotConnected)?;
        let mut report = WriteReport::default();

        for (idx, metric) in batch.iter().enumerate() {
            report.metrics_seen += 1;

            match translator::translate(metric) {
                Ok(fields) => submit_fields(client, fields, &mut report),
                Err(refusal) => {
                    report.aggregates_skipped += 1;

                    if self.aggregate_policy == AggregatePolicy::AbortBatch {
                        report.metrics_abandoned = batch.len() - idx - 1;
                        warn!(
                            metric = %metric.name(),
                            abandoned = report.metrics_abandoned,
                            error = %refusal,
                            "Aggregate metric is not supported, dropping the rest of the batch"
                        );
                        observability::record_aggregate_skipped(
                            metric.name(),
                            report.metrics_abandoned,
                        );
                        break;
                    }

                    warn!(
                        metric = %metric.name(),
                        error = %refusal,
                        "Aggregate metric is not supported, skipping"
                    );
                    observability::record_aggregate_skipped(metric.name(), 0);
                }
            }
        }

        self.metrics.record(&report);
        observability::record_items_submitted(report.items_submitted);
        observability::record_write_batch(batch.len(), report.items_submitted);
        debug!(
            submitted = report.items_submitted,
            rejected = report.fields_rejected,
            aggregates = report.aggregates_skipped,
            "Batch written"
        );

        Ok(report)
    }

    /// Shut the client down, waiting at most `timeout`
    ///
    /// Always succeeds. Without a live client this is a no-op reported as
    /// `ShutdownOutcome::NotConnected`.
    #[instrument(name = "dispatcher_close", skip(self))]
    pub async fn close(&mut self, timeout: ShutdownTimeout) -> ShutdownOutcome {
        match self.client.take() {
            Some(client) => ShutdownCoordinator::new(timeout).shutdown(client).await,
            None => {
                debug!("Close without a live telemetry client");
                ShutdownOutcome::NotConnected
            }
        }
    }
}

fn submit_fields<C: TelemetryClient>(client: &C, fields: Vec<FieldResult>, report: &mut WriteReport) {
    for field in fields {
        match field {
            Ok(item) => {
                client.track(item);
                report.items_submitted += 1;
            }
            Err(refusal) => {
                report.fields_rejected += 1;
                if let TranslateError::NonNumericField { metric, kind, .. } = &refusal {
                    observability::record_field_rejected(metric, kind);
                }
                warn!(error = %refusal, "Skipping non-numeric field");
            }
        }
    }
}
