//! Mock telemetry client and factory shared by unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{ClientFactory, CompletionSignal, ContractError, TelemetryClient, TelemetryItem};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy)]
enum Drain {
    After(Duration),
    Never,
    DropSignal,
}

/// Records tracked items; completes its drain on a configurable schedule
pub struct MockClient {
    key: String,
    drain: Drain,
    tracked: Arc<Mutex<Vec<TelemetryItem>>>,
    close_budgets: Arc<Mutex<Vec<Duration>>>,
    drain_finished: Arc<AtomicBool>,
}

impl MockClient {
    fn with_drain(drain: Drain) -> Self {
        Self {
            key: "test-key".to_string(),
            drain,
            tracked: Arc::default(),
            close_budgets: Arc::default(),
            drain_finished: Arc::default(),
        }
    }

    pub fn completing_after(delay: Duration) -> Self {
        Self::with_drain(Drain::After(delay))
    }

    pub fn never_completing() -> Self {
        Self::with_drain(Drain::Never)
    }

    pub fn dropping_signal() -> Self {
        Self::with_drain(Drain::DropSignal)
    }

    pub fn close_budgets(&self) -> Arc<Mutex<Vec<Duration>>> {
        Arc::clone(&self.close_budgets)
    }

    pub fn drain_finished(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.drain_finished)
    }
}

impl TelemetryClient for MockClient {
    fn instrumentation_key(&self) -> &str {
        &self.key
    }

    fn track(&self, item: TelemetryItem) {
        self.tracked.lock().unwrap().push(item);
    }

    fn close(&mut self, flush_budget: Duration) -> CompletionSignal {
        self.close_budgets.lock().unwrap().push(flush_budget);
        let (tx, rx) = oneshot::channel();
        let finished = Arc::clone(&self.drain_finished);

        match self.drain {
            Drain::After(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    finished.store(true, Ordering::SeqCst);
                    let _ = tx.send(());
                });
            }
            Drain::Never => {
                tokio::spawn(async move {
                    std::future::pending::<()>().await;
                    drop(tx);
                });
            }
            Drain::DropSignal => drop(tx),
        }

        rx
    }
}

/// Factory handing out mock clients that share one item log
#[derive(Clone)]
pub struct MockFactory {
    drain_delay: Duration,
    tracked: Arc<Mutex<Vec<TelemetryItem>>>,
    keys: Arc<Mutex<Vec<String>>>,
    created: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn new(drain_delay: Duration) -> Self {
        Self {
            drain_delay,
            tracked: Arc::default(),
            keys: Arc::default(),
            created: Arc::default(),
        }
    }

    pub fn tracked(&self) -> Vec<TelemetryItem> {
        self.tracked.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockFactory {
    type Client = MockClient;

    fn create(&self, instrumentation_key: &str) -> Result<MockClient, ContractError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(instrumentation_key.to_string());

        let mut client = MockClient::completing_after(self.drain_delay);
        client.key = instrumentation_key.to_string();
        client.tracked = Arc::clone(&self.tracked);
        Ok(client)
    }
}
