//! Run statistics.

use std::time::Duration;

use dispatcher::{ShutdownOutcome, WriteReport};
use observability::WriteStatsAggregator;

/// Statistics from one `run`
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Input lines read (blank lines excluded)
    pub lines_read: u64,

    /// Lines that did not parse as a metric
    pub lines_rejected: u64,

    /// Per-write aggregation
    pub writes: WriteStatsAggregator,

    /// How close ended, once it ran
    pub shutdown: Option<ShutdownOutcome>,

    /// Total duration of the run
    pub duration: Duration,
}

impl RunStats {
    /// Fold one write report in
    pub fn record_write(&mut self, report: &WriteReport) {
        self.writes.update(
            report.metrics_seen,
            report.items_submitted,
            report.fields_rejected,
            report.aggregates_skipped,
            report.metrics_abandoned,
        );
    }

    /// Items submitted per second
    pub fn items_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.writes.items_submitted as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Lines read: {}", self.lines_read);
        println!("Lines rejected: {}", self.lines_rejected);
        println!("Items/s: {:.2}", self.items_per_sec());
        print!("{}", self.writes.summary());
        if let Some(outcome) = self.shutdown {
            println!("Shutdown: {}", outcome);
        }
        println!();
    }
}
