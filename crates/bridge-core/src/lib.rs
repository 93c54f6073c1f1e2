//! # callbridge-core — telephony bridge event-normalization core
//!
//! This crate is the core of a bridge between a proprietary native
//! telephony client SDK and a web-view-hosted hybrid application. It does
//! no signaling, media, or presence work of its own; it drives the SDK
//! through the [`backend::TelephonyBackend`] trait and maps the SDK's
//! heterogeneous asynchronous callbacks onto a stable, ordered,
//! exactly-once stream of outward events:
//!
//! - **Device Session Manager** — owns the single device handle and its
//!   Uninitialized → Initializing → Ready / Failed lifecycle.
//! - **Connection Tracker** — owns the single live call leg and its
//!   Connecting → Connected → Disconnected / Failed lifecycle.
//! - **Event Normalizer** — one task translating every backend
//!   notification into the fixed `ready` / `incoming` / `connect` /
//!   `accept` / `disconnect` / `error` vocabulary, in order, deduplicated.
//! - **Command Dispatcher** — `dispatch(command, args)` routing the five
//!   host-facing commands.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use callbridge_core::{BridgeConfig, TelephonyBridge};
//! use callbridge_core::backend::{BackendEvent, TelephonyBackend};
//! use tokio::sync::mpsc;
//!
//! # async fn example(backend: Arc<dyn TelephonyBackend>) -> callbridge_core::BridgeResult<()> {
//! let (backend_tx, backend_rx) = mpsc::unbounded_channel::<BackendEvent>();
//! // backend_tx goes to the SDK callback glue; the bridge consumes the rx.
//! let bridge = TelephonyBridge::new(backend, BridgeConfig::default());
//! bridge.start(backend_rx).await?;
//!
//! let mut events = bridge.subscribe_simple();
//! bridge.dispatch("deviceSetup", serde_json::json!("tok123")).await?;
//!
//! while let Some(event) = events.next().await {
//!     // { "event": "...", "data": { ... } } toward the host scripting context
//!     println!("{}", event.to_json());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency model
//!
//! Backend notifications and host commands arrive concurrently; all
//! mutation of device/connection state is serialized behind one lock, and
//! outward events are emitted on the stream under that same lock, so they
//! can never be observed out of order. Commands never block on backend
//! round-trips: they return a validation error or a pending acknowledgment
//! immediately, and terminal outcomes arrive on the event channel.

#![warn(missing_docs)]

pub mod backend;
pub mod bridge;
pub mod connection;
pub mod device;
pub mod error;
pub mod events;

// Re-export main types
pub use bridge::{BridgeConfig, DispatchOutcome, TelephonyBridge};
pub use connection::{Connection, ConnectionDirection, ConnectionId, ConnectionState};
pub use device::{Device, DeviceState};
pub use error::{BridgeError, BridgeResult};
pub use events::{BridgeEventHandler, EventIterator, EventStream, OutwardEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
