//! BufferedClient - bounded queue plus batching delivery worker

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, instrument, warn};

use contracts::{
    ClientConfig, ClientFactory, CompletionSignal, ContractError, TelemetryClient, TelemetryItem,
    TelemetryTransport, TransportKind,
};

use crate::metrics::ClientMetrics;
use crate::transports::{IngestionTransport, LogTransport};

/// Close request handed to the worker
struct CloseRequest {
    flush_budget: Duration,
    done: oneshot::Sender<()>,
}

/// Batching settings the worker needs
#[derive(Debug, Clone, Copy)]
struct BatchSettings {
    max_batch_size: usize,
    max_batch_interval: Duration,
}

/// Handle to a running delivery worker
pub struct BufferedClient {
    instrumentation_key: String,
    /// Channel to send items to worker (`None` once closed)
    tx: Option<mpsc::Sender<TelemetryItem>>,
    /// Worker close request (`None` once closed)
    close_tx: Option<oneshot::Sender<CloseRequest>>,
    metrics: Arc<ClientMetrics>,
    worker_handle: JoinHandle<()>,
}

impl BufferedClient {
    /// Create a new client and spawn its worker task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<T: TelemetryTransport + 'static>(
        instrumentation_key: impl Into<String>,
        transport: T,
        config: &ClientConfig,
    ) -> Self {
        let instrumentation_key = instrumentation_key.into();
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (close_tx, close_rx) = oneshot::channel();
        let metrics = Arc::new(ClientMetrics::new());

        let worker = DeliveryWorker {
            transport,
            instrumentation_key: instrumentation_key.clone(),
            settings: BatchSettings {
                max_batch_size: config.max_batch_size.max(1),
                max_batch_interval: config.max_batch_interval,
            },
            metrics: Arc::clone(&metrics),
            buffer: Vec::new(),
        };

        let worker_handle = tokio::spawn(worker.run(rx, close_rx));

        Self {
            instrumentation_key,
            tx: Some(tx),
            close_tx: Some(close_tx),
            metrics,
            worker_handle,
        }
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    /// Whether the worker task has exited
    pub fn is_finished(&self) -> bool {
        self.worker_handle.is_finished()
    }
}

impl TelemetryClient for BufferedClient {
    fn instrumentation_key(&self) -> &str {
        &self.instrumentation_key
    }

    fn track(&self, item: TelemetryItem) {
        let Some(tx) = &self.tx else {
            self.metrics.add_dropped(1);
            debug!(item = %item.name, "Client closed, item dropped");
            return;
        };

        match tx.try_send(item) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(tx.max_capacity() - tx.capacity());
            }
            Err(mpsc::error::TrySendError::Full(item)) => {
                self.metrics.add_dropped(1);
                observability::record_client_items_dropped(1, tx.max_capacity());
                warn!(item = %item.name, "Client queue full, item dropped");
            }
            Err(mpsc::error::TrySendError::Closed(item)) => {
                self.metrics.add_dropped(1);
                error!(item = %item.name, "Delivery worker closed unexpectedly");
            }
        }
    }

    #[instrument(name = "buffered_client_close", skip(self))]
    fn close(&mut self, flush_budget: Duration) -> CompletionSignal {
        let (done_tx, done_rx) = oneshot::channel();

        // Stop intake first so nothing lands behind the drain.
        self.tx = None;

        match self.close_tx.take() {
            Some(close_tx) => {
                let request = CloseRequest {
                    flush_budget,
                    done: done_tx,
                };
                if close_tx.send(request).is_err() {
                    // Worker already gone; done_tx was dropped with the request.
                    debug!("Delivery worker already stopped");
                }
            }
            None => debug!("Client already closed"),
        }

        done_rx
    }
}

/// Worker task state: owns the transport and the partial batch
struct DeliveryWorker<T> {
    transport: T,
    instrumentation_key: String,
    settings: BatchSettings,
    metrics: Arc<ClientMetrics>,
    buffer: Vec<TelemetryItem>,
}

impl<T: TelemetryTransport> DeliveryWorker<T> {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<TelemetryItem>,
        mut close_rx: oneshot::Receiver<CloseRequest>,
    ) {
        debug!(transport = %self.transport.name(), "Delivery worker started");

        let period = self.settings.max_batch_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let request = loop {
            tokio::select! {
                biased;
                request = &mut close_rx => break request.ok(),
                item = rx.recv() => match item {
                    Some(item) => {
                        self.metrics.set_queue_len(rx.len());
                        self.buffer.push(item);
                        if self.buffer.len() >= self.settings.max_batch_size {
                            self.flush().await;
                        }
                    }
                    // Client dropped without close
                    None => break None,
                },
                _ = ticker.tick() => {
                    if !self.buffer.is_empty() {
                        self.flush().await;
                    }
                }
            }
        };

        rx.close();
        while let Ok(item) = rx.try_recv() {
            self.buffer.push(item);
        }
        self.metrics.set_queue_len(0);

        let budget = request
            .as_ref()
            .map(|r| r.flush_budget)
            .unwrap_or(Duration::ZERO);
        self.drain(budget).await;

        if let Err(e) = self.transport.close().await {
            error!(transport = %self.transport.name(), error = %e, "Transport close failed");
        }

        if let Some(request) = request {
            let _ = request.done.send(());
        }
        debug!(transport = %self.transport.name(), "Delivery worker stopped");
    }

    /// Deliver everything still buffered
    ///
    /// A zero budget makes a single pass; otherwise the pass is cut off when
    /// the budget runs out and the remainder is dropped.
    async fn drain(&mut self, budget: Duration) {
        if budget.is_zero() {
            self.flush_all().await;
            return;
        }

        if tokio::time::timeout(budget, self.flush_all()).await.is_err() {
            let remaining = self.buffer.len();
            self.buffer.clear();
            self.metrics.add_dropped(remaining);
            warn!(dropped = remaining, "Flush budget exhausted, dropping buffered items");
        }
    }

    async fn flush_all(&mut self) {
        while !self.buffer.is_empty() {
            self.flush().await;
        }
    }

    /// Send up to one batch from the front of the buffer
    async fn flush(&mut self) {
        let take = self.buffer.len().min(self.settings.max_batch_size);
        let batch: Vec<TelemetryItem> = self.buffer.drain(..take).collect();
        let transport = self.transport.name().to_string();

        match self.transport.send(&self.instrumentation_key, &batch).await {
            Ok(()) => {
                self.metrics.add_sent(batch.len());
                observability::record_client_batch_sent(&transport, batch.len(), true);
                debug!(transport = %transport, items = batch.len(), "Batch delivered");
            }
            Err(e) => {
                // No retry: delivery is best-effort.
                self.metrics.inc_failed_batches();
                self.metrics.add_dropped(batch.len());
                observability::record_client_batch_sent(&transport, batch.len(), false);
                error!(transport = %transport, items = batch.len(), error = %e, "Batch delivery failed");
            }
        }
    }
}

/// Creates `BufferedClient`s with the configured transport
#[derive(Debug, Clone)]
pub struct BufferedClientFactory {
    config: ClientConfig,
}

impl BufferedClientFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ClientFactory for BufferedClientFactory {
    type Client = BufferedClient;

    fn create(&self, instrumentation_key: &str) -> Result<BufferedClient, ContractError> {
        let client = match self.config.transport {
            TransportKind::Ingestion => BufferedClient::spawn(
                instrumentation_key,
                IngestionTransport::new(&self.config)?,
                &self.config,
            ),
            TransportKind::Log => {
                BufferedClient::spawn(instrumentation_key, LogTransport::new("log"), &self.config)
            }
        };
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::Tags;
    use std::sync::Mutex;
    use tokio::time::sleep;

    /// Mock transport for testing
    #[derive(Clone, Default)]
    struct MockTransport {
        batches: Arc<Mutex<Vec<Vec<String>>>>,
        keys: Arc<Mutex<Vec<String>>>,
        closed: Arc<Mutex<bool>>,
        should_fail: bool,
        delay: Duration,
    }

    impl TelemetryTransport for MockTransport {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send(
            &mut self,
            instrumentation_key: &str,
            items: &[TelemetryItem],
        ) -> Result<(), ContractError> {
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if self.should_fail {
                return Err(ContractError::transport_send("mock", "mock failure"));
            }
            self.keys.lock().unwrap().push(instrumentation_key.to_string());
            self.batches
                .lock()
                .unwrap()
                .push(items.iter().map(|i| i.name.clone()).collect());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    fn item(name: &str) -> TelemetryItem {
        TelemetryItem::new(name, 1.0, Tags::new(), Utc::now())
    }

    fn config(max_batch_size: usize, queue_capacity: usize) -> ClientConfig {
        ClientConfig {
            transport: TransportKind::Log,
            queue_capacity,
            max_batch_size,
            max_batch_interval: Duration::from_secs(10),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_close_drains_buffered_items() {
        let transport = MockTransport::default();
        let mut client = BufferedClient::spawn("key", transport.clone(), &config(2, 16));

        for i in 0..5 {
            client.track(item(&format!("m_{i}")));
        }

        client.close(Duration::ZERO).await.unwrap();

        let batches = transport.batches.lock().unwrap().clone();
        let sizes: Vec<_> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 5);
        assert!(sizes.iter().all(|&n| n <= 2), "sizes: {sizes:?}");
        assert_eq!(batches.concat(), ["m_0", "m_1", "m_2", "m_3", "m_4"]);
        assert!(*transport.closed.lock().unwrap());
        assert!(transport.keys.lock().unwrap().iter().all(|k| k == "key"));
        assert_eq!(client.metrics().sent_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_flushes_partial_batch() {
        let transport = MockTransport::default();
        let client = BufferedClient::spawn("key", transport.clone(), &config(100, 16));

        client.track(item("lonely"));
        sleep(Duration::from_secs(5)).await;
        assert!(transport.batches.lock().unwrap().is_empty());

        sleep(Duration::from_secs(6)).await;

        assert_eq!(transport.batches.lock().unwrap().concat(), ["lonely"]);
    }

    #[tokio::test]
    async fn test_track_after_close_is_dropped() {
        let transport = MockTransport::default();
        let mut client = BufferedClient::spawn("key", transport.clone(), &config(10, 16));

        client.close(Duration::ZERO).await.unwrap();
        client.track(item("late"));

        assert_eq!(client.metrics().dropped_count(), 1);
        assert!(transport.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let transport = MockTransport {
            delay: Duration::from_millis(200),
            ..MockTransport::default()
        };
        let mut client = BufferedClient::spawn("key", transport, &config(1, 2));

        let started = std::time::Instant::now();
        for i in 0..50 {
            client.track(item(&format!("m_{i}")));
        }
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(client.metrics().dropped_count() > 0);

        client.close(Duration::from_millis(10)).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_batches_counted_not_retried() {
        let transport = MockTransport {
            should_fail: true,
            ..MockTransport::default()
        };
        let mut client = BufferedClient::spawn("key", transport, &config(2, 16));

        for i in 0..4 {
            client.track(item(&format!("m_{i}")));
        }
        client.close(Duration::ZERO).await.unwrap();

        assert_eq!(client.metrics().failed_batches(), 2);
        assert_eq!(client.metrics().dropped_count(), 4);
        assert_eq!(client.metrics().sent_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_budget_bounds_drain() {
        let transport = MockTransport {
            delay: Duration::from_secs(1),
            ..MockTransport::default()
        };
        let mut client = BufferedClient::spawn("key", transport.clone(), &config(1, 16));

        for i in 0..10 {
            client.track(item(&format!("m_{i}")));
        }

        let started = Instant::now();
        client.close(Duration::from_millis(2500)).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(client.metrics().dropped_count() > 0);
        assert!(transport.batches.lock().unwrap().len() < 10);
    }

    #[tokio::test]
    async fn test_second_close_resolves_immediately() {
        let mut client = BufferedClient::spawn("key", MockTransport::default(), &config(1, 4));

        client.close(Duration::ZERO).await.unwrap();
        // Sender dropped without sending: the receiver reports an error.
        assert!(client.close(Duration::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn test_factory_log_transport() {
        let factory = BufferedClientFactory::new(config(10, 16));
        let mut client = factory.create("abc").unwrap();

        assert_eq!(client.instrumentation_key(), "abc");
        client.track(item("x"));
        client.close(Duration::ZERO).await.unwrap();
        assert_eq!(client.metrics().sent_count(), 1);
    }
}
