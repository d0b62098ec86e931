//! ShutdownCoordinator - bounded wait for the client drain
//!
//! Races the client's completion signal against a timer. Both waits run as
//! independently spawned tasks; whichever loses is detached, never aborted,
//! so a slow drain keeps going in the background after close returns.

use std::fmt;
use std::time::Duration;

use contracts::{ShutdownTimeout, TelemetryClient};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Flush budget handed to the client: drain what is buffered, no extra grace.
/// Bounding the wait is the coordinator's job.
pub const CLIENT_FLUSH_BUDGET: Duration = Duration::ZERO;

/// How close ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The client reported its drain finished
    Clean,
    /// The timer fired first; in-flight items were abandoned
    TimedOut,
    /// There was no live client to shut down
    NotConnected,
    /// The client went away without signalling completion (e.g. its worker
    /// panicked); the drain did not finish
    Interrupted,
}

impl ShutdownOutcome {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::TimedOut => "timed_out",
            Self::NotConnected => "not_connected",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for ShutdownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shuts a client down within a timeout
#[derive(Debug, Clone, Copy)]
pub struct ShutdownCoordinator {
    timeout: ShutdownTimeout,
}

impl ShutdownCoordinator {
    pub fn new(timeout: ShutdownTimeout) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> ShutdownTimeout {
        self.timeout
    }

    /// Begin the client's shutdown and wait for the first of drain or timer
    ///
    /// Never fails: a timeout is reported as an outcome, not an error.
    #[instrument(name = "shutdown_coordinator", skip(self, client), fields(timeout = ?self.timeout))]
    pub async fn shutdown<C: TelemetryClient>(&self, mut client: C) -> ShutdownOutcome {
        let started = Instant::now();
        let completion = client.close(CLIENT_FLUSH_BUDGET);
        drop(client);

        let drain = tokio::spawn(async move {
            match completion.await {
                Ok(()) => ShutdownOutcome::Clean,
                Err(_) => ShutdownOutcome::Interrupted,
            }
        });

        let outcome = match self.timeout {
            ShutdownTimeout::Unbounded => drain.await.unwrap_or(ShutdownOutcome::Interrupted),
            ShutdownTimeout::Bounded(limit) => {
                let timer = tokio::spawn(tokio::time::sleep(limit));
                tokio::select! {
                    biased;
                    drained = drain => drained.unwrap_or(ShutdownOutcome::Interrupted),
                    _ = timer => ShutdownOutcome::TimedOut,
                }
            }
        };

        let elapsed = started.elapsed();
        match outcome {
            ShutdownOutcome::TimedOut => warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Telemetry client shutdown timed out, abandoning in-flight items"
            ),
            ShutdownOutcome::Interrupted => warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Telemetry client stopped without completing its drain"
            ),
            _ => info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Telemetry client closed successfully"
            ),
        }
        observability::record_shutdown(outcome.as_str(), elapsed.as_secs_f64() * 1000.0);

        outcome
    }
}
