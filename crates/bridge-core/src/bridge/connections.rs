//! Connection tracker operations
//!
//! At most one connection is live at a time. A second `connect` while one
//! is active is rejected with `ConnectionAlreadyActive` — never a silent
//! replacement. Disconnect paths are callable at any time, including while
//! a connect is still pending; a pending connection is always driven to a
//! terminal state rather than left dangling.
//!
//! Backend failures on this path never propagate to the caller; they are
//! normalized into `error`/`disconnect` outward events (see
//! [`normalizer`](super::normalizer)).

use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionId, ConnectionState};
use crate::error::{BridgeError, BridgeResult};
use crate::events::OutwardEvent;

use super::{SessionState, TelephonyBridge};

impl TelephonyBridge {
    /// Start an outgoing call
    ///
    /// Parameters are forwarded verbatim, in order, to the backend. Fails
    /// with `DeviceNotReady` if no device is registered and with
    /// `ConnectionAlreadyActive` if a connection is still live. On success
    /// the new connection starts in Connecting; progress arrives as
    /// outward events.
    pub async fn connect(&self, parameters: Vec<(String, String)>) -> BridgeResult<ConnectionId> {
        self.ensure_running().await?;

        let mut state = self.inner.state.lock().await;
        if state.device.is_none() || !state.device_state.is_ready() {
            return Err(BridgeError::device_not_ready(
                "device setup has not completed",
            ));
        }
        if let Some(existing) = state.live_connection() {
            return Err(BridgeError::ConnectionAlreadyActive {
                connection_id: existing.id.to_string(),
            });
        }

        let connection = Connection::outgoing(parameters.clone());
        let connection_id = connection.id;
        info!(%connection_id, "starting outgoing connection");
        state.connection = Some(connection);

        let events = match self.inner.backend.connect(&parameters).await {
            Ok(()) => Vec::new(),
            // The dial never started; fail the leg locally instead of
            // throwing across the command path.
            Err(e) => Self::fail_connection(&mut state, format!("connect failed: {}", e)),
        };
        self.publish(&events);
        drop(state);

        self.notify_handler(events).await;
        Ok(connection_id)
    }

    /// Accept the pending incoming call
    ///
    /// Valid only while a Connecting, Incoming-direction connection exists;
    /// fails with `NoPendingConnection` otherwise. Acknowledged
    /// immediately; `connect`/`accept` outward events follow when the
    /// backend reports the leg connected.
    pub async fn accept_connection(&self) -> BridgeResult<()> {
        self.ensure_running().await?;

        let mut state = self.inner.state.lock().await;
        match &state.connection {
            Some(conn) if conn.is_pending_incoming() => {
                debug!(connection_id = %conn.id, "accepting incoming connection");
            }
            _ => return Err(BridgeError::NoPendingConnection),
        }

        let events = match self.inner.backend.accept().await {
            Ok(()) => Vec::new(),
            Err(e) => Self::fail_connection(&mut state, format!("accept failed: {}", e)),
        };
        self.publish(&events);
        drop(state);

        self.notify_handler(events).await;
        Ok(())
    }

    /// Disconnect the active connection
    ///
    /// Valid whenever a connection exists, regardless of its state.
    /// Reports the non-fatal `NoActiveConnection` if none does. The
    /// connection reaches a terminal state via the backend's disconnect
    /// notification, or locally if the backend refuses the request.
    pub async fn disconnect_connection(&self) -> BridgeResult<()> {
        self.ensure_running().await?;

        let mut state = self.inner.state.lock().await;
        let connection_id = match state.live_connection() {
            Some(conn) => conn.id,
            None => return Err(BridgeError::NoActiveConnection),
        };
        info!(%connection_id, "disconnect requested");

        let events = match self.inner.backend.disconnect().await {
            Ok(()) => Vec::new(),
            // Don't leave the leg dangling if the backend won't confirm.
            Err(e) => Self::fail_connection(&mut state, format!("disconnect failed: {}", e)),
        };
        self.publish(&events);
        drop(state);

        self.notify_handler(events).await;
        Ok(())
    }

    /// Disconnect everything and clear pending-call registration
    ///
    /// Always succeeds locally: the live connection (pending or connected)
    /// is driven to Disconnected immediately and backend refusals are
    /// logged, not surfaced. Reports the non-fatal `NoActiveConnection` if
    /// there was nothing to disconnect.
    pub async fn disconnect_all(&self) -> BridgeResult<()> {
        self.ensure_running().await?;

        let mut state = self.inner.state.lock().await;
        let had_connection = state.live_connection().is_some();

        if let Err(e) = self.inner.backend.disconnect_all().await {
            // "Nothing to disconnect" and friends are not our caller's
            // problem.
            warn!("backend disconnectAll reported: {}", e);
        }

        let events = Self::take_down_connection(&mut state, None);
        self.publish(&events);
        drop(state);

        self.notify_handler(events).await;

        if had_connection {
            Ok(())
        } else {
            Err(BridgeError::NoActiveConnection)
        }
    }

    /// Drive the current connection to Disconnected, producing the single
    /// `disconnect` event if it has not fired yet
    ///
    /// The terminal record stays in place until a new connection replaces
    /// it; repeat teardown notifications for the same leg are absorbed by
    /// the `disconnect_emitted` flag.
    pub(crate) fn take_down_connection(
        state: &mut SessionState,
        reason: Option<String>,
    ) -> Vec<OutwardEvent> {
        let Some(conn) = state.connection.as_mut() else {
            return Vec::new();
        };
        if !conn.state.is_terminal() {
            conn.state = ConnectionState::Disconnected;
        }
        if conn.disconnect_emitted {
            return Vec::new();
        }
        conn.disconnect_emitted = true;
        debug!(connection_id = %conn.id, "connection torn down");
        vec![OutwardEvent::Disconnect {
            connection_id: conn.id,
            reason,
        }]
    }

    /// Fail the current connection, producing `error` followed by the
    /// single `disconnect` event
    pub(crate) fn fail_connection(state: &mut SessionState, message: String) -> Vec<OutwardEvent> {
        let Some(conn) = state.connection.as_mut() else {
            return vec![OutwardEvent::Error { message }];
        };
        let connection_id = conn.id;
        warn!(%connection_id, "connection failed: {}", message);
        if !conn.state.is_terminal() {
            conn.state = ConnectionState::Failed;
        }
        let mut events = vec![OutwardEvent::Error {
            message: message.clone(),
        }];
        if !conn.disconnect_emitted {
            conn.disconnect_emitted = true;
            events.push(OutwardEvent::Disconnect {
                connection_id,
                reason: Some(message),
            });
        }
        events
    }
}
