//! Shared test harness: a scripted mock backend and bridge setup helpers

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use callbridge_core::backend::{BackendEvent, TelephonyBackend};
use callbridge_core::error::{BridgeError, BridgeResult};
use callbridge_core::events::{EventIterator, OutwardEvent};
use callbridge_core::{BridgeConfig, TelephonyBridge};

/// Scripted stand-in for the native telephony SDK
///
/// Records every call it receives. By default `initialize` immediately
/// pushes `InitCompleted` onto the notification channel; scripted failure
/// messages flip individual methods to return errors instead.
pub struct MockBackend {
    tx: mpsc::UnboundedSender<BackendEvent>,
    calls: Mutex<Vec<String>>,
    auto_complete_init: bool,
    fail_initialize: Option<String>,
    fail_create_device: Option<String>,
    fail_connect: Option<String>,
    fail_disconnect: Option<String>,
    fail_disconnect_all: Option<String>,
}

impl MockBackend {
    pub fn new(tx: mpsc::UnboundedSender<BackendEvent>) -> Self {
        Self {
            tx,
            calls: Mutex::new(Vec::new()),
            auto_complete_init: true,
            fail_initialize: None,
            fail_create_device: None,
            fail_connect: None,
            fail_disconnect: None,
            fail_disconnect_all: None,
        }
    }

    /// Don't push `InitCompleted` automatically; the test drives init
    /// completion itself
    pub fn with_manual_init(mut self) -> Self {
        self.auto_complete_init = false;
        self
    }

    pub fn with_initialize_failure(mut self, message: &str) -> Self {
        self.fail_initialize = Some(message.to_string());
        self
    }

    pub fn with_create_device_failure(mut self, message: &str) -> Self {
        self.fail_create_device = Some(message.to_string());
        self
    }

    pub fn with_connect_failure(mut self, message: &str) -> Self {
        self.fail_connect = Some(message.to_string());
        self
    }

    pub fn with_disconnect_failure(mut self, message: &str) -> Self {
        self.fail_disconnect = Some(message.to_string());
        self
    }

    pub fn with_disconnect_all_failure(mut self, message: &str) -> Self {
        self.fail_disconnect_all = Some(message.to_string());
        self
    }

    /// Every backend call recorded so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl TelephonyBackend for MockBackend {
    async fn initialize(&self) -> BridgeResult<()> {
        self.record("initialize");
        if let Some(message) = &self.fail_initialize {
            return Err(BridgeError::backend(message.clone()));
        }
        if self.auto_complete_init {
            let _ = self.tx.send(BackendEvent::InitCompleted);
        }
        Ok(())
    }

    async fn create_device(&self, token: &str) -> BridgeResult<()> {
        self.record(format!("create_device:{}", token));
        if let Some(message) = &self.fail_create_device {
            return Err(BridgeError::backend(message.clone()));
        }
        Ok(())
    }

    async fn connect(&self, parameters: &[(String, String)]) -> BridgeResult<()> {
        let rendered = parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        self.record(format!("connect:{}", rendered));
        if let Some(message) = &self.fail_connect {
            return Err(BridgeError::backend(message.clone()));
        }
        Ok(())
    }

    async fn accept(&self) -> BridgeResult<()> {
        self.record("accept");
        Ok(())
    }

    async fn disconnect(&self) -> BridgeResult<()> {
        self.record("disconnect");
        if let Some(message) = &self.fail_disconnect {
            return Err(BridgeError::backend(message.clone()));
        }
        Ok(())
    }

    async fn disconnect_all(&self) -> BridgeResult<()> {
        self.record("disconnect_all");
        if let Some(message) = &self.fail_disconnect_all {
            return Err(BridgeError::backend(message.clone()));
        }
        Ok(())
    }
}

/// A started bridge wired to a mock backend
pub struct TestBridge {
    pub bridge: TelephonyBridge,
    pub backend: Arc<MockBackend>,
    pub backend_tx: mpsc::UnboundedSender<BackendEvent>,
    pub events: EventIterator,
}

impl TestBridge {
    /// Push a backend notification as the SDK callback glue would
    pub fn notify(&self, event: BackendEvent) {
        self.backend_tx
            .send(event)
            .expect("normalizer should be alive");
    }

    /// Await the next outward event, failing the test after two seconds
    pub async fn next_event(&mut self) -> OutwardEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.next())
            .await
            .expect("timed out waiting for outward event")
            .expect("event stream ended unexpectedly")
    }

    /// Assert that no outward event arrives within a short window
    pub async fn expect_no_event(&mut self) {
        let result = tokio::time::timeout(Duration::from_millis(100), self.events.next()).await;
        assert!(result.is_err(), "unexpected outward event: {:?}", result);
    }

    /// Run deviceSetup to completion and consume the `ready` event
    pub async fn setup_ready(&mut self) {
        self.bridge
            .dispatch("deviceSetup", serde_json::json!("tok-test"))
            .await
            .expect("deviceSetup should be accepted");
        assert_eq!(self.next_event().await, OutwardEvent::Ready);
    }
}

/// Start a bridge over a customized mock backend
pub async fn start_bridge(customize: impl FnOnce(MockBackend) -> MockBackend) -> TestBridge {
    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(customize(MockBackend::new(backend_tx.clone())));
    let bridge = TelephonyBridge::new(backend.clone(), BridgeConfig::default());
    let events = bridge.subscribe_simple();
    bridge
        .start(backend_rx)
        .await
        .expect("bridge should start");
    TestBridge {
        bridge,
        backend,
        backend_tx,
        events,
    }
}
