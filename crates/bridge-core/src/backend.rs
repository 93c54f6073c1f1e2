//! Native telephony backend interface
//!
//! The bridge never implements signaling, media, or presence itself; it only
//! drives an external client SDK through this trait and reacts to the
//! notifications the SDK pushes back. The two halves are deliberately
//! separate seams:
//!
//! - [`TelephonyBackend`] — the calls the bridge issues (initialize, device
//!   registration, connect/accept/disconnect).
//! - [`BackendEvent`] — the asynchronous notifications the backend delivers
//!   on its own channel, in its own callback context. The bridge makes no
//!   assumption that any two notifications are serialized by the backend;
//!   they are funneled through one mpsc channel and processed by a single
//!   task.
//!
//! Production integrations implement [`TelephonyBackend`] over the real SDK
//! and push its callbacks into the channel handed to
//! [`TelephonyBridge::start`](crate::bridge::TelephonyBridge::start). Tests
//! use scripted mock implementations.

use async_trait::async_trait;

use crate::error::BridgeResult;

/// Interface to the external telephony client SDK
///
/// All methods are issued from the bridge's command path and must not block
/// on backend round-trips: `initialize` only *begins* initialization, with
/// the outcome reported later as [`BackendEvent::InitCompleted`] or
/// [`BackendEvent::InitFailed`]. The remaining methods may validate and
/// hand off synchronously; call progress arrives as events.
#[async_trait]
pub trait TelephonyBackend: Send + Sync {
    /// Begin asynchronous backend initialization
    ///
    /// Completion (success or failure) is reported via the event channel,
    /// not the return value. An `Err` here means the request itself could
    /// not be handed to the SDK.
    async fn initialize(&self) -> BridgeResult<()>;

    /// Register the calling endpoint with the given capability token
    ///
    /// Only valid after initialization has completed. The token is opaque
    /// to the bridge and forwarded verbatim.
    async fn create_device(&self, token: &str) -> BridgeResult<()>;

    /// Start an outgoing call with the given parameters
    ///
    /// Parameters are forwarded verbatim as an ordered key/value mapping.
    /// Call progress (connected, disconnected, failed) arrives as events.
    async fn connect(&self, parameters: &[(String, String)]) -> BridgeResult<()>;

    /// Accept the currently pending incoming call
    async fn accept(&self) -> BridgeResult<()>;

    /// Disconnect the active call
    async fn disconnect(&self) -> BridgeResult<()>;

    /// Disconnect all calls and clear any pending incoming registration
    ///
    /// Backends may report "nothing to disconnect"; the bridge treats that
    /// as success.
    async fn disconnect_all(&self) -> BridgeResult<()>;
}

/// Asynchronous notifications pushed by the backend
///
/// These are the heterogeneous native callback shapes, reduced to the data
/// the normalizer needs. They arrive on the channel passed to the bridge at
/// start time and are processed strictly in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// Backend initialization finished successfully
    InitCompleted,

    /// Backend initialization failed; the session is parked in Failed
    InitFailed {
        /// Backend-provided failure description
        message: String,
    },

    /// An inbound call was detected by the backend
    IncomingCall {
        /// Caller identity, if the backend provides one
        from: Option<String>,
        /// Additional caller parameters, forwarded verbatim
        parameters: Vec<(String, String)>,
    },

    /// The active call (either direction) reached the connected state
    Connected,

    /// The active call ended
    ///
    /// Backends commonly raise more than one disconnect-shaped notification
    /// for a single call (e.g. a plain teardown callback plus an error
    /// variant carrying a code). The normalizer deduplicates; senders do
    /// not need to.
    Disconnected {
        /// Teardown reason, if the backend provides one
        reason: Option<String>,
    },

    /// The active call failed from Connecting or Connected
    ConnectionFailed {
        /// Backend-provided failure description
        message: String,
    },
}
