//! Error types for the bridge core
//!
//! Validation errors (missing token, wrong state) are detected locally and
//! returned synchronously from the command path. Backend-originated failures
//! are never surfaced here; they arrive later as `error` outward events.

use thiserror::Error;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur in the bridge core
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Capability token was empty or missing
    #[error("Invalid capability token: {reason}")]
    InvalidToken {
        /// Why the token was rejected
        reason: String,
    },

    /// Device setup requested before backend initialization completed
    #[error("Backend not initialized: {message}")]
    NotInitialized {
        /// What was attempted too early
        message: String,
    },

    /// Initialize requested while initialization is in flight or complete
    #[error("Backend already initialized: {message}")]
    AlreadyInitialized {
        /// Current initialization status
        message: String,
    },

    /// Connection operation requested without a registered, ready device
    #[error("Device not ready: {message}")]
    DeviceNotReady {
        /// What the device session is missing
        message: String,
    },

    /// A connect was issued while another connection is still live
    #[error("Connection already active: {connection_id}")]
    ConnectionAlreadyActive {
        /// Identifier of the connection that is still live
        connection_id: String,
    },

    /// Accept requested but no incoming connection is pending
    #[error("No pending incoming connection")]
    NoPendingConnection,

    /// Disconnect requested with no active connection (non-fatal, idempotent)
    #[error("No active connection")]
    NoActiveConnection,

    /// Command name not recognized by the dispatcher (non-fatal)
    #[error("Unsupported command: {command}")]
    UnsupportedCommand {
        /// The unrecognized command name
        command: String,
    },

    /// Command arguments failed to unmarshal
    #[error("Invalid command arguments: {message}")]
    InvalidArguments {
        /// What was malformed
        message: String,
    },

    /// The backend rejected a call synchronously
    #[error("Backend error: {message}")]
    Backend {
        /// Backend-provided description
        message: String,
    },

    /// The bridge has been stopped or was never started
    #[error("Bridge not running: {message}")]
    NotRunning {
        /// Hint for the caller
        message: String,
    },
}

impl BridgeError {
    /// Create an invalid token error
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Create a not-initialized error
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::NotInitialized {
            message: message.into(),
        }
    }

    /// Create an already-initialized error
    pub fn already_initialized(message: impl Into<String>) -> Self {
        Self::AlreadyInitialized {
            message: message.into(),
        }
    }

    /// Create a device-not-ready error
    pub fn device_not_ready(message: impl Into<String>) -> Self {
        Self::DeviceNotReady {
            message: message.into(),
        }
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an invalid-arguments error
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a not-running error
    pub fn not_running(message: impl Into<String>) -> Self {
        Self::NotRunning {
            message: message.into(),
        }
    }

    /// Whether this error should be treated as fatal by the caller
    ///
    /// `NoActiveConnection` is the deliberately idempotent no-op of
    /// disconnecting when nothing is active, and `UnsupportedCommand` is a
    /// routing miss the caller decides how to surface. Everything else
    /// indicates a real contract violation.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BridgeError::NoActiveConnection | BridgeError::UnsupportedCommand { .. }
        )
    }
}
