//! Backend event normalization
//!
//! One task owns this loop. Every backend notification is reduced to the
//! fixed outward vocabulary and emitted on the broadcast stream under the
//! session lock, so outward events are observed in exactly the order the
//! state transitions occurred, each at most once; the registered handler
//! is awaited after the lock is released.
//!
//! Mappings (the normalizer never invents event names per backend):
//!
//! | backend notification        | outward event                       |
//! |-----------------------------|-------------------------------------|
//! | `InitCompleted` (+ pending setup) | `ready` or `error`            |
//! | `InitFailed`                | `error`                             |
//! | `IncomingCall`              | `incoming`                          |
//! | `Connected` (outgoing leg)  | `connect`                           |
//! | `Connected` (incoming leg)  | `connect` then `accept`             |
//! | `Disconnected` (any number) | exactly one `disconnect`            |
//! | `ConnectionFailed`          | `error` then one `disconnect`       |
//!
//! Notifications that don't fit the session's current shape — an incoming
//! call with no registered device, a connected report with no live leg, a
//! repeat disconnect — are logged and dropped rather than surfaced as
//! invented events.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::backend::BackendEvent;
use crate::connection::{Connection, ConnectionDirection, ConnectionState};
use crate::device::DeviceState;
use crate::events::OutwardEvent;

use super::TelephonyBridge;

/// Normalizer task body; spawned by [`TelephonyBridge::start`]
pub(crate) async fn run(
    bridge: TelephonyBridge,
    mut backend_events: mpsc::UnboundedReceiver<BackendEvent>,
) {
    while let Some(event) = backend_events.recv().await {
        if !bridge.is_running().await {
            break;
        }
        bridge.handle_backend_event(event).await;
    }
    debug!("backend notification channel closed; normalizer exiting");
}

impl TelephonyBridge {
    /// Translate one backend notification into outward events and deliver
    /// them
    pub(crate) async fn handle_backend_event(&self, event: BackendEvent) {
        debug!(?event, "backend event");
        let mut state = self.inner.state.lock().await;

        let events = match event {
            BackendEvent::InitCompleted => {
                if state.device_state != DeviceState::Initializing {
                    warn!(
                        state = %state.device_state,
                        "init completion in unexpected state; ignoring"
                    );
                    Vec::new()
                } else {
                    state.device_state = DeviceState::Ready;
                    match state.pending_setup.take() {
                        Some(token) => self.register_device(&mut state, &token).await,
                        None => Vec::new(),
                    }
                }
            }

            BackendEvent::InitFailed { message } => {
                warn!("backend initialization failed: {}", message);
                state.device_state = DeviceState::Failed;
                state.pending_setup = None;
                vec![OutwardEvent::Error {
                    message: format!("initialization failed: {}", message),
                }]
            }

            BackendEvent::IncomingCall { from, parameters } => {
                if state.device.is_none() || !state.device_state.is_ready() {
                    warn!("incoming call with no registered device; ignoring");
                    Vec::new()
                } else if state.live_connection().is_some() {
                    // One live connection at a time; the backend is expected
                    // to have rejected the second leg itself.
                    warn!("incoming call while a connection is live; ignoring");
                    Vec::new()
                } else {
                    let connection = Connection::incoming(from.clone(), parameters.clone());
                    let connection_id = connection.id;
                    state.connection = Some(connection);
                    vec![OutwardEvent::Incoming {
                        connection_id,
                        from,
                        parameters,
                    }]
                }
            }

            BackendEvent::Connected => match state.connection.as_mut() {
                Some(conn) if conn.state == ConnectionState::Connecting => {
                    conn.state = ConnectionState::Connected;
                    let connection_id = conn.id;
                    let mut events = vec![OutwardEvent::Connect { connection_id }];
                    if conn.direction == ConnectionDirection::Incoming {
                        events.push(OutwardEvent::Accept { connection_id });
                    }
                    events
                }
                Some(conn) if conn.state == ConnectionState::Connected => {
                    debug!(connection_id = %conn.id, "duplicate connected report; ignoring");
                    Vec::new()
                }
                _ => {
                    warn!("connected report with no pending connection; ignoring");
                    Vec::new()
                }
            },

            BackendEvent::Disconnected { reason } => {
                Self::take_down_connection(&mut state, reason)
            }

            BackendEvent::ConnectionFailed { message } => {
                if state.connection.is_some() {
                    Self::fail_connection(&mut state, message)
                } else {
                    warn!("connection failure with no connection: {}", message);
                    Vec::new()
                }
            }
        };
        self.publish(&events);
        drop(state);

        self.notify_handler(events).await;
    }
}
