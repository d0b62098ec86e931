//! Read → batch → write loop.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ClientFactory, Metric};
use dispatcher::ApplicationInsightsOutput;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, info, warn};

use super::input::{parse_metric_line, MetricInput};
use super::stats::RunStats;

/// Forwards parsed metrics to an output in fixed-size batches
pub struct Pipeline {
    batch_size: usize,
    batch: Vec<Metric>,
    stats: RunStats,
    started: Instant,
}

impl Pipeline {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            batch: Vec::with_capacity(batch_size),
            stats: RunStats::default(),
            started: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Read `input` to EOF, writing every full batch and the final partial one
    ///
    /// Malformed lines are logged and counted, never fatal.
    pub async fn forward<F: ClientFactory>(
        &mut self,
        output: &mut ApplicationInsightsOutput<F>,
        input: MetricInput,
    ) -> Result<()> {
        let mut lines = input.lines();
        let mut line_no: u64 = 0;

        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            line_no += 1;
            match parse_metric_line(&line) {
                Ok(Some(metric)) => {
                    self.stats.lines_read += 1;
                    self.batch.push(metric);
                    if self.batch.len() >= self.batch_size {
                        self.flush(output)?;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.lines_read += 1;
                    self.stats.lines_rejected += 1;
                    warn!(line = line_no, error = %e, "Skipping input line");
                }
            }
        }

        self.flush(output)?;
        info!(lines = line_no, "Input exhausted");
        Ok(())
    }

    /// Write whatever is buffered
    pub fn flush<F: ClientFactory>(
        &mut self,
        output: &mut ApplicationInsightsOutput<F>,
    ) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let report = output
            .write(&self.batch)
            .context("Failed to write metric batch")?;
        debug!(
            metrics = self.batch.len(),
            items = report.items_submitted,
            "Batch written"
        );
        self.stats.record_write(&report);
        self.batch.clear();
        Ok(())
    }

    /// Close the output and seal the stats
    pub async fn finish<F: ClientFactory>(
        mut self,
        output: &mut ApplicationInsightsOutput<F>,
    ) -> RunStats {
        if let Err(e) = self.flush(output) {
            warn!(error = %e, "Dropping buffered metrics");
        }
        self.stats.shutdown = Some(output.close().await);
        self.stats.duration = self.started.elapsed();
        self.stats
    }
}
