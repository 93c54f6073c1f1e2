//! Device session manager operations
//!
//! Device setup is a single logical operation for the caller even though it
//! is two-phase internally: if the backend has not been initialized yet,
//! the capability token is stashed and initialization is started; the
//! normalizer replays the setup when the backend reports completion. The
//! caller sees one terminal outcome either way — a `ready` or an `error`
//! outward event.

use tracing::{debug, info, warn};

use crate::device::{Device, DeviceState};
use crate::error::{BridgeError, BridgeResult};
use crate::events::OutwardEvent;

use super::{SessionState, TelephonyBridge};

impl TelephonyBridge {
    /// Begin asynchronous backend initialization
    ///
    /// Fails fast if initialization is already in flight or complete. The
    /// outcome arrives later on the backend notification channel; a failed
    /// init parks the session in `Failed` until a fresh setup restarts it.
    pub async fn initialize(&self) -> BridgeResult<()> {
        self.ensure_running().await?;

        let mut state = self.inner.state.lock().await;
        match state.device_state {
            DeviceState::Initializing => {
                return Err(BridgeError::already_initialized("initialization in flight"));
            }
            DeviceState::Ready => {
                return Err(BridgeError::already_initialized("backend is ready"));
            }
            DeviceState::Uninitialized | DeviceState::Failed => {}
        }

        state.device_state = DeviceState::Initializing;
        if let Err(e) = self.inner.backend.initialize().await {
            warn!("backend initialize request failed: {}", e);
            state.device_state = DeviceState::Failed;
            let events = vec![OutwardEvent::Error {
                message: format!("initialization failed: {}", e),
            }];
            self.publish(&events);
            drop(state);
            self.notify_handler(events).await;
        }
        Ok(())
    }

    /// Register the device with a capability token (strict single phase)
    ///
    /// Requires backend initialization to have completed; fails with
    /// `NotInitialized` otherwise and with `InvalidToken` for an empty
    /// token, issuing no backend call in either case. Most callers want
    /// [`device_setup`](Self::device_setup), which chains initialization
    /// transparently.
    pub async fn setup_device(&self, token: &str) -> BridgeResult<()> {
        self.ensure_running().await?;

        let token = token.trim();
        if token.is_empty() {
            return Err(BridgeError::invalid_token("capability token is empty"));
        }

        let mut state = self.inner.state.lock().await;
        match state.device_state {
            DeviceState::Ready => {}
            DeviceState::Uninitialized | DeviceState::Initializing => {
                return Err(BridgeError::not_initialized(
                    "backend initialization has not completed",
                ));
            }
            DeviceState::Failed => {
                return Err(BridgeError::not_initialized(
                    "backend initialization failed; issue a fresh deviceSetup",
                ));
            }
        }

        let events = self.register_device(&mut state, token).await;
        self.publish(&events);
        drop(state);

        self.notify_handler(events).await;
        Ok(())
    }

    /// Set up the device with a capability token
    ///
    /// Validation failures (empty token) are returned synchronously and
    /// issue no backend call. Otherwise the command is acknowledged as
    /// pending and the outcome arrives as a `ready` or `error` outward
    /// event.
    ///
    /// Issued from `Uninitialized` or `Failed`, this begins backend
    /// initialization first. Issued while `Initializing`, it replaces the
    /// stashed token and stays pending. Issued from `Ready`, registration
    /// proceeds immediately.
    pub async fn device_setup(&self, token: &str) -> BridgeResult<()> {
        self.ensure_running().await?;

        // Local validation; no backend call on failure.
        let token = token.trim();
        if token.is_empty() {
            return Err(BridgeError::invalid_token("capability token is empty"));
        }

        let mut state = self.inner.state.lock().await;
        let events = match state.device_state {
            DeviceState::Uninitialized | DeviceState::Failed => {
                debug!("deviceSetup: backend uninitialized, starting init first");
                state.pending_setup = Some(token.to_string());
                state.device_state = DeviceState::Initializing;
                if let Err(e) = self.inner.backend.initialize().await {
                    // The request itself never reached the SDK; park the
                    // session and surface the failure on the event channel.
                    warn!("backend initialize request failed: {}", e);
                    state.pending_setup = None;
                    state.device_state = DeviceState::Failed;
                    vec![OutwardEvent::Error {
                        message: format!("initialization failed: {}", e),
                    }]
                } else {
                    Vec::new()
                }
            }
            DeviceState::Initializing => {
                debug!("deviceSetup: init already in flight, replacing pending token");
                state.pending_setup = Some(token.to_string());
                Vec::new()
            }
            DeviceState::Ready => self.register_device(&mut state, token).await,
        };
        self.publish(&events);
        drop(state);

        self.notify_handler(events).await;
        Ok(())
    }

    /// Register the device against the backend and produce the resulting
    /// outward events
    ///
    /// Runs with the state lock held: from the command path when the
    /// backend is already initialized, or from the normalizer on
    /// `InitCompleted`. Backend failures never propagate to the command
    /// path; they become `error` events.
    pub(crate) async fn register_device(
        &self,
        state: &mut SessionState,
        token: &str,
    ) -> Vec<OutwardEvent> {
        match self.inner.backend.create_device(token).await {
            Ok(()) => {
                info!("device registered");
                state.device = Some(Device::new(token.to_string()));
                vec![OutwardEvent::Ready]
            }
            Err(e) => {
                warn!("device setup failed: {}", e);
                vec![OutwardEvent::Error {
                    message: format!("device setup failed: {}", e),
                }]
            }
        }
    }
}
