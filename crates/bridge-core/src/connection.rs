//! Connection types
//!
//! A [`Connection`] is a single call leg, inbound or outbound. At most one
//! connection is live at a time; a new one may only be created after the
//! previous reached a terminal state. The connection never outlives the
//! device session that carries it.
//!
//! # State Transitions
//!
//! `Connecting` → `Connected` → `Disconnected` (terminal), with a `Failed`
//! terminal branch reachable from either non-terminal state on backend
//! error.
//!
//! # Examples
//!
//! ```rust
//! use callbridge_core::connection::{Connection, ConnectionDirection, ConnectionState};
//!
//! let conn = Connection::outgoing(vec![("To".to_string(), "+15551234567".to_string())]);
//! assert_eq!(conn.direction, ConnectionDirection::Outgoing);
//! assert_eq!(conn.state, ConnectionState::Connecting);
//! assert!(!conn.state.is_terminal());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection, assigned by the bridge
pub type ConnectionId = Uuid;

/// Which side initiated the call leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionDirection {
    /// Call initiated by the remote side and signaled by the backend
    Incoming,
    /// Call initiated locally via `connect`
    Outgoing,
}

impl std::fmt::Display for ConnectionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionDirection::Incoming => write!(f, "Incoming"),
            ConnectionDirection::Outgoing => write!(f, "Outgoing"),
        }
    }
}

/// Lifecycle state of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Setup in progress (outgoing dial or incoming awaiting accept)
    Connecting,
    /// Media path established
    Connected,
    /// Call ended normally (terminal)
    Disconnected,
    /// Call failed from Connecting or Connected (terminal)
    Failed,
}

impl ConnectionState {
    /// Whether this state ends the connection lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

/// A single active call leg owned by the connection tracker
#[derive(Debug, Clone)]
pub struct Connection {
    /// Bridge-assigned identifier, stable for the connection's lifetime
    pub id: ConnectionId,

    /// Which side initiated the call
    pub direction: ConnectionDirection,

    /// Current lifecycle state
    pub state: ConnectionState,

    /// Parameters passed at connect time (outgoing) or carried on the
    /// incoming notification, forwarded verbatim in order
    pub parameters: Vec<(String, String)>,

    /// Caller identity for incoming legs, if the backend provided one
    pub remote: Option<String>,

    /// When the connection was created
    pub created_at: DateTime<Utc>,

    /// Whether the single `disconnect` outward event for this connection
    /// has already been emitted
    pub(crate) disconnect_emitted: bool,
}

impl Connection {
    /// Create an outgoing connection in the Connecting state
    pub fn outgoing(parameters: Vec<(String, String)>) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction: ConnectionDirection::Outgoing,
            state: ConnectionState::Connecting,
            parameters,
            remote: None,
            created_at: Utc::now(),
            disconnect_emitted: false,
        }
    }

    /// Create an incoming connection in the Connecting state
    pub fn incoming(from: Option<String>, parameters: Vec<(String, String)>) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction: ConnectionDirection::Incoming,
            state: ConnectionState::Connecting,
            parameters,
            remote: from,
            created_at: Utc::now(),
            disconnect_emitted: false,
        }
    }

    /// Whether this is an incoming leg still awaiting an accept decision
    pub fn is_pending_incoming(&self) -> bool {
        self.direction == ConnectionDirection::Incoming
            && self.state == ConnectionState::Connecting
    }
}
