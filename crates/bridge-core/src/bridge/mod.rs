//! Bridge session object and lifecycle
//!
//! [`TelephonyBridge`] is the explicit session object that owns the single
//! device and the single connection (`Option<Device>` / `Option<Connection>`),
//! replacing the ambient module-level singletons a naive SDK bridge keeps.
//! The backend is injected at construction; the backend's notification
//! channel is handed over at [`TelephonyBridge::start`], which spawns the
//! normalizer task.
//!
//! All state mutation goes through one `tokio::sync::Mutex` — commands and
//! backend callbacks never race on the same device/connection record.
//! Outward events are emitted on the broadcast stream while the lock is
//! still held, so subscribers observe them in state-transition order even
//! when the command path and the normalizer interleave; the registered
//! handler is awaited only after the lock is released, so it may issue
//! bridge commands without deadlocking.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use callbridge_core::{BridgeConfig, TelephonyBridge};
//! use callbridge_core::backend::{BackendEvent, TelephonyBackend};
//! use tokio::sync::mpsc;
//!
//! # async fn example(backend: Arc<dyn TelephonyBackend>) -> callbridge_core::BridgeResult<()> {
//! let (backend_tx, backend_rx) = mpsc::unbounded_channel::<BackendEvent>();
//! let bridge = TelephonyBridge::new(backend, BridgeConfig::default());
//! bridge.start(backend_rx).await?;
//!
//! let mut events = bridge.subscribe_simple();
//! bridge.dispatch("deviceSetup", serde_json::json!("tok123")).await?;
//! while let Some(event) = events.next().await {
//!     println!("{}", event.to_json());
//! }
//! # Ok(())
//! # }
//! ```

pub mod connections;
pub mod dispatcher;
pub mod normalizer;
pub mod session;


pub use dispatcher::DispatchOutcome;

use std::sync::{Arc, RwLock as StdRwLock};

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::{BackendEvent, TelephonyBackend};
use crate::connection::Connection;
use crate::device::{Device, DeviceState};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{BridgeEventHandler, EventEmitter, EventIterator, EventStream, OutwardEvent};

/// Configuration for a bridge session
///
/// # Examples
///
/// ```rust
/// use callbridge_core::BridgeConfig;
///
/// let config = BridgeConfig::new().with_event_capacity(512);
/// assert_eq!(config.event_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Capacity of the broadcast channel backing the outward event stream
    ///
    /// A subscriber that lags behind by more than this many events misses
    /// the overwritten ones; the registered event handler is never subject
    /// to this limit.
    pub event_capacity: usize,
}

impl BridgeConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self {
            event_capacity: 256,
        }
    }

    /// Set the outward event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable session state, serialized behind one mutex
pub(crate) struct SessionState {
    /// Top-level device session lifecycle
    pub(crate) device_state: DeviceState,
    /// The registered device, if setup has succeeded
    pub(crate) device: Option<Device>,
    /// Capability token stashed while backend init is in flight
    pub(crate) pending_setup: Option<String>,
    /// The single live connection, if any
    pub(crate) connection: Option<Connection>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            device_state: DeviceState::Uninitialized,
            device: None,
            pending_setup: None,
            connection: None,
        }
    }

    /// The live (non-terminal) connection, if one exists
    pub(crate) fn live_connection(&self) -> Option<&Connection> {
        self.connection.as_ref().filter(|c| !c.state.is_terminal())
    }
}

pub(crate) struct BridgeInner {
    pub(crate) backend: Arc<dyn TelephonyBackend>,
    pub(crate) state: Mutex<SessionState>,
    /// `None` once the session has been stopped; dropping the emitter
    /// closes every subscriber stream
    pub(crate) emitter: StdRwLock<Option<EventEmitter>>,
    pub(crate) event_handler: RwLock<Option<Arc<dyn BridgeEventHandler>>>,
    pub(crate) is_running: RwLock<bool>,
    normalizer_task: Mutex<Option<JoinHandle<()>>>,
}

/// The bridge session: command surface on one side, ordered outward events
/// on the other, a native telephony backend underneath
#[derive(Clone)]
pub struct TelephonyBridge {
    pub(crate) inner: Arc<BridgeInner>,
}

impl TelephonyBridge {
    /// Create a bridge over the given backend
    ///
    /// The bridge is inert until [`start`](Self::start) is called with the
    /// backend's notification channel.
    pub fn new(backend: Arc<dyn TelephonyBackend>, config: BridgeConfig) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                backend,
                state: Mutex::new(SessionState::new()),
                emitter: StdRwLock::new(Some(EventEmitter::new(config.event_capacity))),
                event_handler: RwLock::new(None),
                is_running: RwLock::new(false),
                normalizer_task: Mutex::new(None),
            }),
        }
    }

    /// Start the session and begin consuming backend notifications
    ///
    /// Spawns the normalizer task that translates every [`BackendEvent`]
    /// into at most one outward event, in arrival order.
    pub async fn start(
        &self,
        backend_events: mpsc::UnboundedReceiver<BackendEvent>,
    ) -> BridgeResult<()> {
        let mut running = self.inner.is_running.write().await;
        if *running {
            return Err(BridgeError::backend("bridge already started"));
        }
        *running = true;
        drop(running);

        let bridge = self.clone();
        let task = tokio::spawn(normalizer::run(bridge, backend_events));
        *self.inner.normalizer_task.lock().await = Some(task);

        info!("telephony bridge started");
        Ok(())
    }

    /// Tear the session down
    ///
    /// Stops the normalizer, drops the device and any connection, and
    /// closes the outward event channel: subscriber streams end once they
    /// drain, and no further events are delivered. The analogue of
    /// unregistering the host lifecycle listener on shutdown.
    pub async fn stop(&self) {
        let mut running = self.inner.is_running.write().await;
        if !*running {
            return;
        }
        *running = false;
        drop(running);

        if let Some(task) = self.inner.normalizer_task.lock().await.take() {
            task.abort();
        }

        let mut state = self.inner.state.lock().await;
        state.device = None;
        state.pending_setup = None;
        state.connection = None;
        state.device_state = DeviceState::Uninitialized;
        drop(state);

        self.inner
            .emitter
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        info!("telephony bridge stopped");
    }

    /// Whether the session is running
    pub async fn is_running(&self) -> bool {
        *self.inner.is_running.read().await
    }

    /// Register the handler that receives normalized events
    ///
    /// The handler is awaited inline by the normalizer, preserving event
    /// order; it may issue bridge commands.
    pub async fn set_event_handler(&self, handler: Arc<dyn BridgeEventHandler>) {
        *self.inner.event_handler.write().await = Some(handler);
    }

    /// Subscribe to the long-lived outward event stream
    ///
    /// The stream ends when the bridge is stopped; subscribing to an
    /// already-stopped bridge yields a stream that is immediately at its
    /// end.
    pub fn subscribe(&self) -> EventStream {
        let emitter = self.inner.emitter.read().unwrap_or_else(|e| e.into_inner());
        match emitter.as_ref() {
            Some(emitter) => emitter.subscribe(),
            None => crate::events::closed_stream(),
        }
    }

    /// Subscribe with a simple async iterator
    pub fn subscribe_simple(&self) -> EventIterator {
        EventIterator::new(self.subscribe())
    }

    /// Current top-level device session state
    pub async fn device_state(&self) -> DeviceState {
        self.inner.state.lock().await.device_state
    }

    /// Whether a device is registered and able to place/take calls
    pub async fn is_device_registered(&self) -> bool {
        let state = self.inner.state.lock().await;
        state.device.is_some() && state.device_state.is_ready()
    }

    /// Snapshot of the current connection, if any
    pub async fn active_connection(&self) -> Option<Connection> {
        self.inner.state.lock().await.connection.clone()
    }

    /// Emit outward events on the broadcast stream
    ///
    /// Called with the state lock still held, so two tasks can never
    /// interleave their emissions and subscribers observe events in
    /// state-transition order. Emission is synchronous and never blocks.
    pub(crate) fn publish(&self, events: &[OutwardEvent]) {
        if events.is_empty() {
            return;
        }
        let emitter = self.inner.emitter.read().unwrap_or_else(|e| e.into_inner());
        if let Some(emitter) = emitter.as_ref() {
            for event in events {
                debug!(event = event.name(), "publishing outward event");
                emitter.emit(event.clone());
            }
        }
    }

    /// Await the registered event handler for each event, in order
    ///
    /// Callers must not hold the state lock; the handler may re-enter the
    /// bridge.
    pub(crate) async fn notify_handler(&self, events: Vec<OutwardEvent>) {
        if events.is_empty() {
            return;
        }
        let Some(handler) = self.inner.event_handler.read().await.clone() else {
            return;
        };
        for event in events {
            handler.on_event(event).await;
        }
    }

    /// Fail fast on commands issued against a stopped session
    pub(crate) async fn ensure_running(&self) -> BridgeResult<()> {
        if self.is_running().await {
            Ok(())
        } else {
            Err(BridgeError::not_running("call start() first"))
        }
    }
}
