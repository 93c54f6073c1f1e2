//! Outward event system
//!
//! The normalizer reduces every backend notification to this fixed
//! vocabulary, preserving arrival order and delivering each event at most
//! once. Consumers can take events two ways, and both observe the same
//! ordering:
//!
//! - subscribe to a long-lived [`EventStream`] (broadcast-backed), or
//! - register a [`BridgeEventHandler`] that is awaited inline by the
//!   normalizer task before the next event is processed.
//!
//! # Wire shape
//!
//! Each event serializes to `{ "event": <name>, "data": <object>? }` for
//! delivery to a host scripting context:
//!
//! ```rust
//! use callbridge_core::events::OutwardEvent;
//!
//! let event = OutwardEvent::Error { message: "init failed".to_string() };
//! let json = event.to_json();
//! assert_eq!(json["event"], "error");
//! assert_eq!(json["data"]["message"], "init failed");
//! ```

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::connection::ConnectionId;

/// Normalized events delivered to the caller's event sink
///
/// The vocabulary is fixed; backend-specific callback names never leak
/// through. Events for a given connection are delivered in the order the
/// underlying state transitions occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutwardEvent {
    /// Device registered after setup; the session can place and take calls
    Ready,

    /// Inbound call detected, before any accept/reject decision
    Incoming {
        /// Connection created for the inbound leg
        connection_id: ConnectionId,
        /// Caller identity, if the backend provided one
        from: Option<String>,
        /// Caller parameters carried on the backend notification,
        /// forwarded verbatim
        parameters: Vec<(String, String)>,
    },

    /// The active call reached the connected state
    Connect {
        /// Connection that connected
        connection_id: ConnectionId,
    },

    /// An inbound call was accepted and connected
    ///
    /// Always emitted in addition to — and strictly after — `Connect` for
    /// the same connection.
    Accept {
        /// Connection that was accepted
        connection_id: ConnectionId,
    },

    /// The call ended (any side, any reason)
    ///
    /// Fires exactly once per connection lifecycle no matter how many
    /// disconnect-shaped notifications the backend raised.
    Disconnect {
        /// Connection that ended
        connection_id: ConnectionId,
        /// Teardown reason, if known
        reason: Option<String>,
    },

    /// Initialization or setup error
    Error {
        /// Human-readable failure description
        message: String,
    },
}

impl OutwardEvent {
    /// The event name as delivered on the wire
    pub fn name(&self) -> &'static str {
        match self {
            OutwardEvent::Ready => "ready",
            OutwardEvent::Incoming { .. } => "incoming",
            OutwardEvent::Connect { .. } => "connect",
            OutwardEvent::Accept { .. } => "accept",
            OutwardEvent::Disconnect { .. } => "disconnect",
            OutwardEvent::Error { .. } => "error",
        }
    }

    /// The connection this event relates to, if any
    pub fn connection_id(&self) -> Option<ConnectionId> {
        match self {
            OutwardEvent::Incoming { connection_id, .. } => Some(*connection_id),
            OutwardEvent::Connect { connection_id } => Some(*connection_id),
            OutwardEvent::Accept { connection_id } => Some(*connection_id),
            OutwardEvent::Disconnect { connection_id, .. } => Some(*connection_id),
            _ => None,
        }
    }

    /// Serialize to the `{ event, data? }` payload shape
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            OutwardEvent::Ready => json!({ "event": "ready" }),
            OutwardEvent::Incoming {
                connection_id,
                from,
                parameters,
            } => {
                let mut data = serde_json::Map::new();
                data.insert("connection".to_string(), json!(connection_id.to_string()));
                if let Some(from) = from {
                    data.insert("from".to_string(), json!(from));
                }
                if !parameters.is_empty() {
                    let parameters: serde_json::Map<String, serde_json::Value> = parameters
                        .iter()
                        .map(|(key, value)| (key.clone(), json!(value)))
                        .collect();
                    data.insert("parameters".to_string(), json!(parameters));
                }
                json!({ "event": "incoming", "data": data })
            }
            OutwardEvent::Connect { connection_id } => json!({
                "event": "connect",
                "data": { "connection": connection_id.to_string() },
            }),
            OutwardEvent::Accept { connection_id } => json!({
                "event": "accept",
                "data": { "connection": connection_id.to_string() },
            }),
            OutwardEvent::Disconnect {
                connection_id,
                reason,
            } => match reason {
                Some(reason) => json!({
                    "event": "disconnect",
                    "data": { "connection": connection_id.to_string(), "reason": reason },
                }),
                None => json!({
                    "event": "disconnect",
                    "data": { "connection": connection_id.to_string() },
                }),
            },
            OutwardEvent::Error { message } => json!({
                "event": "error",
                "data": { "message": message },
            }),
        }
    }
}

/// Handler for normalized bridge events
///
/// Register one via
/// [`TelephonyBridge::set_event_handler`](crate::bridge::TelephonyBridge::set_event_handler).
/// The normalizer awaits the handler inline, so a slow handler delays later
/// events rather than reordering them.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use callbridge_core::connection::ConnectionId;
/// use callbridge_core::events::BridgeEventHandler;
///
/// struct LoggingHandler;
///
/// #[async_trait]
/// impl BridgeEventHandler for LoggingHandler {
///     async fn on_incoming(
///         &self,
///         connection_id: ConnectionId,
///         from: Option<String>,
///         _parameters: Vec<(String, String)>,
///     ) {
///         println!("incoming call {} from {:?}", connection_id, from);
///     }
/// }
/// ```
#[async_trait]
pub trait BridgeEventHandler: Send + Sync {
    /// Device registered and ready for calls
    async fn on_ready(&self) {}

    /// Inbound call detected
    async fn on_incoming(
        &self,
        _connection_id: ConnectionId,
        _from: Option<String>,
        _parameters: Vec<(String, String)>,
    ) {
    }

    /// Call connected
    async fn on_connect(&self, _connection_id: ConnectionId) {}

    /// Inbound call accepted and connected (always after `on_connect`)
    async fn on_accept(&self, _connection_id: ConnectionId) {}

    /// Call ended
    async fn on_disconnect(&self, _connection_id: ConnectionId, _reason: Option<String>) {}

    /// Initialization or setup error
    async fn on_error(&self, _message: String) {}

    /// Unified dispatch; override only for custom routing
    async fn on_event(&self, event: OutwardEvent) {
        match event {
            OutwardEvent::Ready => self.on_ready().await,
            OutwardEvent::Incoming {
                connection_id,
                from,
                parameters,
            } => self.on_incoming(connection_id, from, parameters).await,
            OutwardEvent::Connect { connection_id } => self.on_connect(connection_id).await,
            OutwardEvent::Accept { connection_id } => self.on_accept(connection_id).await,
            OutwardEvent::Disconnect {
                connection_id,
                reason,
            } => self.on_disconnect(connection_id, reason).await,
            OutwardEvent::Error { message } => self.on_error(message).await,
        }
    }
}

/// Long-lived stream of outward events
pub type EventStream = BroadcastStream<OutwardEvent>;

/// Simple event iterator that doesn't require StreamExt at the call site
pub struct EventIterator {
    stream: EventStream,
}

impl EventIterator {
    /// Create a new event iterator from a stream
    pub fn new(stream: EventStream) -> Self {
        Self { stream }
    }

    /// Get the next event (async); `None` when the bridge shuts down
    pub async fn next(&mut self) -> Option<OutwardEvent> {
        use tokio_stream::StreamExt;
        match self.stream.next().await {
            Some(Ok(event)) => Some(event),
            _ => None,
        }
    }
}

/// A stream that is already at its end; handed to subscribers of a
/// stopped bridge
pub(crate) fn closed_stream() -> EventStream {
    let (sender, receiver) = broadcast::channel(1);
    drop(sender);
    BroadcastStream::new(receiver)
}

/// Broadcast-backed emitter for outward events
///
/// Dropping the emitter closes the channel; subscriber streams end after
/// draining whatever was already buffered.
pub struct EventEmitter {
    sender: broadcast::Sender<OutwardEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: OutwardEvent) {
        // No receivers is fine; the handler path still sees the event.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events from this point on
    pub fn subscribe(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Subscribe with a simple iterator
    pub fn subscribe_simple(&self) -> EventIterator {
        EventIterator::new(self.subscribe())
    }
}
