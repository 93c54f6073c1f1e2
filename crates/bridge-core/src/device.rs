//! Device session types
//!
//! A [`Device`] is the registered calling endpoint tied to a capability
//! token. Exactly one device exists per active session; it is created by
//! device setup and destroyed on session teardown. The top-level
//! [`DeviceState`] tracks backend initialization, while the presence of a
//! `Device` record marks the registered sub-state.
//!
//! # State Transitions
//!
//! Typical lifecycle:
//! `Uninitialized` → `Initializing` → `Ready` (setup allowed)
//! with `Initializing` → `Failed` on backend init failure. `Failed` is
//! terminal until a fresh device setup restarts initialization.
//!
//! # Examples
//!
//! ```rust
//! use callbridge_core::device::{Device, DeviceState};
//!
//! let device = Device::new("tok123".to_string());
//! assert_eq!(device.token, "tok123");
//!
//! let state = DeviceState::Ready;
//! assert!(state.is_ready());
//! println!("session state: {}", state);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level lifecycle state of the device session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    /// No initialization has been requested yet
    Uninitialized,

    /// Backend initialization is in flight; setup is deferred until the
    /// backend reports completion
    Initializing,

    /// Backend initialization completed; device setup may proceed
    Ready,

    /// Backend initialization failed
    ///
    /// Terminal until the caller issues a fresh `deviceSetup`, which
    /// restarts initialization. The bridge never auto-retries.
    Failed,
}

impl DeviceState {
    /// Whether the backend is ready for device setup
    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceState::Ready)
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceState::Uninitialized => write!(f, "Uninitialized"),
            DeviceState::Initializing => write!(f, "Initializing"),
            DeviceState::Ready => write!(f, "Ready"),
            DeviceState::Failed => write!(f, "Failed"),
        }
    }
}

/// The registered calling endpoint
///
/// Created when device setup succeeds against the backend. Holds the opaque
/// capability token it was registered with; the token is never interpreted
/// by the bridge.
#[derive(Debug, Clone)]
pub struct Device {
    /// Opaque credential the device was registered with
    pub token: String,

    /// When the device was registered
    pub registered_at: DateTime<Utc>,
}

impl Device {
    /// Create a device record for a successful registration
    pub fn new(token: String) -> Self {
        Self {
            token,
            registered_at: Utc::now(),
        }
    }
}
