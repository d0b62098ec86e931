//! OutputConfig - config_loader output
//!
//! Output plugin and telemetry client settings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Default ingestion endpoint of the backend
pub const DEFAULT_ENDPOINT_URL: &str = "https://dc.services.visualstudio.com/v2/track";

/// Output plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Backend account identifier (not validated)
    #[serde(alias = "instrumentationKey")]
    pub instrumentation_key: String,

    /// Upper bound on close's wait for the flush; zero waits indefinitely
    #[serde(default = "default_close_timeout", with = "humantime_duration")]
    pub timeout: Duration,

    /// What to do with aggregate metrics
    #[serde(default)]
    pub aggregate_policy: AggregatePolicy,

    /// Telemetry client settings
    #[serde(default)]
    pub client: ClientConfig,
}

impl OutputConfig {
    /// Config with defaults for everything but the key
    pub fn new(instrumentation_key: impl Into<String>) -> Self {
        Self {
            instrumentation_key: instrumentation_key.into(),
            timeout: default_close_timeout(),
            aggregate_policy: AggregatePolicy::default(),
            client: ClientConfig::default(),
        }
    }

    /// Close timeout with the zero sentinel resolved
    pub fn shutdown_timeout(&self) -> ShutdownTimeout {
        ShutdownTimeout::from_duration(self.timeout)
    }
}

fn default_close_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Aggregate metric handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatePolicy {
    /// Skip the aggregate metric and keep processing the batch
    #[default]
    SkipMetric,
    /// Stop processing the rest of the batch at the first aggregate metric
    AbortBatch,
}

/// How long close waits for the client drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTimeout {
    /// Give up waiting after this long
    Bounded(Duration),
    /// Wait for the drain to complete, however long it takes
    Unbounded,
}

impl ShutdownTimeout {
    /// Map a configured duration; zero means "no timeout"
    pub fn from_duration(timeout: Duration) -> Self {
        if timeout.is_zero() {
            Self::Unbounded
        } else {
            Self::Bounded(timeout)
        }
    }
}

/// Delivery transport used by the telemetry client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// HTTP POST to the ingestion endpoint
    #[default]
    Ingestion,
    /// Log batches locally (dry run)
    Log,
}

/// Telemetry client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Delivery transport
    pub transport: TransportKind,

    /// Ingestion endpoint
    pub endpoint_url: String,

    /// Items buffered before `track` starts dropping
    pub queue_capacity: usize,

    /// Items per delivered batch
    pub max_batch_size: usize,

    /// Longest time an item waits in a partial batch
    #[serde(with = "humantime_duration")]
    pub max_batch_interval: Duration,

    /// Per-request timeout of the ingestion transport
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            queue_capacity: 8192,
            max_batch_size: 1024,
            max_batch_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Serde adapter for human-readable durations ("5s", "250ms", "1m 30s")
pub mod humantime_duration {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config: OutputConfig = toml::from_str(r#"instrumentation_key = "abc""#).unwrap();
        assert_eq!(config.instrumentation_key, "abc");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.aggregate_policy, AggregatePolicy::SkipMetric);
        assert_eq!(config.client.transport, TransportKind::Ingestion);
        assert_eq!(config.client.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(config.client.max_batch_size, 1024);
    }

    #[test]
    fn test_camel_case_key_accepted() {
        let sample = r#"
## Instrumentation key of the Application Insights resource.
instrumentationKey = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxx"

## Timeout on close. If not provided, will default to 5s. 0s means no timeout (not recommended).
# timeout = "5s"
"#;
        let config: OutputConfig = toml::from_str(sample).unwrap();
        assert_eq!(config.instrumentation_key, "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxx");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let config: OutputConfig =
            serde_json::from_str(r#"{"instrumentationKey":"abc","timeout":"0s"}"#).unwrap();
        assert_eq!(config.instrumentation_key, "abc");
        assert_eq!(config.shutdown_timeout(), ShutdownTimeout::Unbounded);
    }

    #[test]
    fn test_humantime_fields() {
        let config: OutputConfig = toml::from_str(
            r#"
instrumentation_key = "abc"
timeout = "250ms"
aggregate_policy = "abort_batch"

[client]
transport = "log"
max_batch_interval = "1m 30s"
"#,
        )
        .unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.aggregate_policy, AggregatePolicy::AbortBatch);
        assert_eq!(config.client.transport, TransportKind::Log);
        assert_eq!(config.client.max_batch_interval, Duration::from_secs(90));
        assert_eq!(config.client.queue_capacity, 8192);
    }

    #[test]
    fn test_zero_timeout_waits_indefinitely() {
        let mut config = OutputConfig::new("abc");
        config.timeout = Duration::ZERO;
        assert_eq!(config.shutdown_timeout(), ShutdownTimeout::Unbounded);

        config.timeout = Duration::from_secs(2);
        assert_eq!(
            config.shutdown_timeout(),
            ShutdownTimeout::Bounded(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let result: Result<OutputConfig, _> =
            toml::from_str("instrumentation_key = \"abc\"\ntimeout = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trip_json() {
        let config = OutputConfig::new("abc");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"timeout\":\"5s\""));
        let back: OutputConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timeout, config.timeout);
    }
}
