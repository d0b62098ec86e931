//! JSON-lines metric input.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::Metric;
use tokio::io::{AsyncBufRead, BufReader};

/// Boxed line source: a file or stdin
pub type MetricInput = Box<dyn AsyncBufRead + Unpin + Send>;

/// Open the metric source; `None` or "-" reads stdin
pub async fn open_input(path: Option<&Path>) -> Result<MetricInput> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Parse one input line
///
/// Blank lines yield `Ok(None)`.
pub fn parse_metric_line(line: &str) -> Result<Option<Metric>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let metric = serde_json::from_str(line).context("Malformed metric line")?;
    Ok(Some(metric))
}
