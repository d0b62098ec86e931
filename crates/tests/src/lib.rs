//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 → 输出插件 → 缓冲客户端 → 传输 的完整链路
//! - 关闭超时行为（虚拟时间）
//! - 对 mock HTTP 接收端的真实投递

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use contracts::{
        ClientConfig, ClientFactory, ContractError, FieldValue, Fields, Metric, Tags,
        TelemetryItem, TelemetryTransport, TransportKind,
    };
    use dispatcher::BufferedClient;

    /// Transport that records delivered items, optionally slowly
    #[derive(Clone, Default)]
    pub struct CapturingTransport {
        pub items: Arc<Mutex<Vec<TelemetryItem>>>,
        pub closed: Arc<Mutex<bool>>,
        pub delay: Duration,
    }

    impl TelemetryTransport for CapturingTransport {
        fn name(&self) -> &str {
            "capture"
        }

        async fn send(
            &mut self,
            _instrumentation_key: &str,
            items: &[TelemetryItem],
        ) -> Result<(), ContractError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.items.lock().unwrap().extend_from_slice(items);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    /// Factory handing every client the same capturing transport
    #[derive(Clone, Default)]
    pub struct CapturingFactory {
        pub transport: CapturingTransport,
    }

    impl CapturingFactory {
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                transport: CapturingTransport {
                    delay,
                    ..CapturingTransport::default()
                },
            }
        }

        pub fn names(&self) -> Vec<String> {
            self.transport
                .items
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.name.clone())
                .collect()
        }
    }

    impl ClientFactory for CapturingFactory {
        type Client = BufferedClient;

        fn create(&self, instrumentation_key: &str) -> Result<BufferedClient, ContractError> {
            let config = ClientConfig {
                transport: TransportKind::Log,
                max_batch_size: 2,
                ..ClientConfig::default()
            };
            Ok(BufferedClient::spawn(
                instrumentation_key,
                self.transport.clone(),
                &config,
            ))
        }
    }

    pub fn metric(name: &str, fields: &[(&str, FieldValue)]) -> Metric {
        let fields: Fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let tags = Tags::from([("host".to_string(), "web-1".to_string())]);
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Metric::new(name, tags, fields, timestamp)
    }

    pub fn aggregate(name: &str) -> Metric {
        let timestamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Metric::aggregate(
            name,
            Tags::new(),
            Fields::from([("p99".to_string(), FieldValue::Float(1.0))]),
            timestamp,
        )
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{AggregatePolicy, FieldValue, OutputConfig};
    use dispatcher::plugin::SAMPLE_CONFIG;
    use dispatcher::{create_output, ApplicationInsightsOutput, ShutdownOutcome, OUTPUT_NAME};

    use crate::support::{aggregate, metric, CapturingFactory};

    /// End-to-end test: TOML config -> output plugin -> buffered client -> HTTP endpoint
    #[tokio::test]
    async fn test_e2e_delivery_to_ingestion_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/track")
            .match_header("content-type", "application/x-json-stream")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex("cpu_usage_idle".to_string()),
                mockito::Matcher::Regex("cpu_usage_user".to_string()),
                mockito::Matcher::Regex("0000aaaa".to_string()),
            ]))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let toml = format!(
            r#"
instrumentation_key = "0000aaaa-0000-0000-0000-000000000000"
timeout = "5s"

[client]
endpoint_url = "{}/v2/track"
max_batch_size = 100
"#,
            server.url()
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let mut output = create_output(OUTPUT_NAME, config).unwrap();
        output.connect().unwrap();

        let report = output
            .write(&[metric(
                "cpu",
                &[
                    ("usage_idle", FieldValue::Float(91.5)),
                    ("usage_user", FieldValue::Float(4.0)),
                    ("host_label", FieldValue::String("x".to_string())),
                ],
            )])
            .unwrap();
        assert_eq!(report.items_submitted, 2);
        assert_eq!(report.fields_rejected, 1);

        // Close drains the partial batch before the 10s interval would
        assert_eq!(output.close().await, ShutdownOutcome::Clean);
        mock.assert_async().await;
    }

    /// A rejected batch is neither retried nor turned into a close failure
    #[tokio::test]
    async fn test_e2e_rejected_batch_still_closes_clean() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/track")
            .with_status(400)
            .with_body("invalid instrumentation key")
            .expect(1)
            .create_async()
            .await;

        let mut config = OutputConfig::new("bogus");
        config.client.endpoint_url = format!("{}/v2/track", server.url());

        let mut output = ApplicationInsightsOutput::new(config);
        output.connect().unwrap();
        output
            .write(&[metric("mem", &[("used", FieldValue::Integer(512))])])
            .unwrap();

        assert_eq!(output.close().await, ShutdownOutcome::Clean);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_e2e_items_reach_transport_in_order() {
        let factory = CapturingFactory::default();
        let mut output =
            ApplicationInsightsOutput::with_factory(OutputConfig::new("k"), factory.clone());

        output.connect().unwrap();
        output
            .write(&[
                metric("cpu", &[("usage_idle", FieldValue::Float(90.0))]),
                metric("disk", &[("free", FieldValue::Unsigned(7))]),
            ])
            .unwrap();
        output
            .write(&[metric("net", &[("bytes_recv", FieldValue::Integer(3))])])
            .unwrap();

        assert_eq!(output.close().await, ShutdownOutcome::Clean);
        assert_eq!(
            factory.names(),
            ["cpu_usage_idle", "disk_free", "net_bytes_recv"]
        );
        assert!(*factory.transport.closed.lock().unwrap());

        let items = factory.transport.items.lock().unwrap().clone();
        assert_eq!(items[1].value, 7.0);
        assert_eq!(items[0].properties["host"], "web-1");
    }

    #[tokio::test]
    async fn test_e2e_skip_metric_policy() {
        let factory = CapturingFactory::default();
        let mut output =
            ApplicationInsightsOutput::with_factory(OutputConfig::new("k"), factory.clone());

        output.connect().unwrap();
        let report = output
            .write(&[
                metric("a", &[("v", FieldValue::Float(1.0))]),
                aggregate("latency"),
                metric("b", &[("v", FieldValue::Float(2.0))]),
            ])
            .unwrap();
        assert_eq!(report.aggregates_skipped, 1);

        output.close().await;
        assert_eq!(factory.names(), ["a_v", "b_v"]);
    }

    #[tokio::test]
    async fn test_e2e_abort_batch_policy() {
        let factory = CapturingFactory::default();
        let mut config = OutputConfig::new("k");
        config.aggregate_policy = AggregatePolicy::AbortBatch;
        let mut output = ApplicationInsightsOutput::with_factory(config, factory.clone());

        output.connect().unwrap();
        let report = output
            .write(&[
                metric("a", &[("v", FieldValue::Float(1.0))]),
                aggregate("latency"),
                metric("b", &[("v", FieldValue::Float(2.0))]),
            ])
            .unwrap();
        assert_eq!(report.metrics_abandoned, 1);

        output.close().await;
        assert_eq!(factory.names(), ["a_v"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_slow_transport_times_out() {
        let factory = CapturingFactory::with_delay(Duration::from_secs(10));
        let mut config = OutputConfig::new("k");
        config.timeout = Duration::from_secs(2);
        let mut output = ApplicationInsightsOutput::with_factory(config, factory.clone());

        output.connect().unwrap();
        output
            .write(&[metric("cpu", &[("usage_idle", FieldValue::Float(90.0))])])
            .unwrap();

        let started = tokio::time::Instant::now();
        assert_eq!(output.close().await, ShutdownOutcome::TimedOut);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2100));

        // The detached drain still finishes on its own
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(factory.names(), ["cpu_usage_idle"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_e2e_zero_timeout_waits_for_drain() {
        let factory = CapturingFactory::with_delay(Duration::from_secs(10));
        let mut config = OutputConfig::new("k");
        config.timeout = Duration::ZERO;
        let mut output = ApplicationInsightsOutput::with_factory(config, factory.clone());

        output.connect().unwrap();
        output
            .write(&[metric("cpu", &[("usage_idle", FieldValue::Float(90.0))])])
            .unwrap();

        let started = tokio::time::Instant::now();
        assert_eq!(output.close().await, ShutdownOutcome::Clean);
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(factory.names(), ["cpu_usage_idle"]);
    }

    #[tokio::test]
    async fn test_e2e_close_twice_is_noop() {
        let factory = CapturingFactory::default();
        let mut output =
            ApplicationInsightsOutput::with_factory(OutputConfig::new("k"), factory.clone());

        output.connect().unwrap();
        assert_eq!(output.close().await, ShutdownOutcome::Clean);
        assert_eq!(output.close().await, ShutdownOutcome::NotConnected);
    }

    #[test]
    fn test_sample_config_loads_and_validates() {
        let config = ConfigLoader::load_from_str(SAMPLE_CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.aggregate_policy, AggregatePolicy::SkipMetric);
    }
}
