//! Scripted end-to-end walkthrough of the bridge against an in-process
//! fake backend: device setup, an incoming call accepted and hung up,
//! then an outgoing call.
//!
//! Run with: cargo run --example scripted_call

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use callbridge_core::backend::{BackendEvent, TelephonyBackend};
use callbridge_core::error::BridgeResult;
use callbridge_core::{BridgeConfig, TelephonyBridge};

/// Fake SDK that immediately confirms everything it is asked to do
struct ScriptedBackend {
    tx: mpsc::UnboundedSender<BackendEvent>,
}

#[async_trait]
impl TelephonyBackend for ScriptedBackend {
    async fn initialize(&self) -> BridgeResult<()> {
        info!("backend: initializing");
        let _ = self.tx.send(BackendEvent::InitCompleted);
        Ok(())
    }

    async fn create_device(&self, _token: &str) -> BridgeResult<()> {
        info!("backend: device created");
        Ok(())
    }

    async fn connect(&self, parameters: &[(String, String)]) -> BridgeResult<()> {
        info!(?parameters, "backend: dialing");
        let _ = self.tx.send(BackendEvent::Connected);
        Ok(())
    }

    async fn accept(&self) -> BridgeResult<()> {
        info!("backend: accepting");
        let _ = self.tx.send(BackendEvent::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> BridgeResult<()> {
        info!("backend: hanging up");
        // Real SDKs tend to raise more than one teardown callback; the
        // bridge collapses them into a single outward disconnect.
        let _ = self.tx.send(BackendEvent::Disconnected { reason: None });
        let _ = self.tx.send(BackendEvent::Disconnected { reason: None });
        Ok(())
    }

    async fn disconnect_all(&self) -> BridgeResult<()> {
        let _ = self.tx.send(BackendEvent::Disconnected { reason: None });
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,callbridge_core=debug".into()),
        )
        .init();

    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(ScriptedBackend {
        tx: backend_tx.clone(),
    });

    let bridge = TelephonyBridge::new(backend, BridgeConfig::default());
    let mut events = bridge.subscribe_simple();
    bridge.start(backend_rx).await?;

    // Device setup: one command, one terminal `ready`.
    bridge
        .dispatch("deviceSetup", serde_json::json!("demo-capability-token"))
        .await?;
    print_next(&mut events).await; // ready

    // An inbound call arrives, gets accepted, then hung up.
    backend_tx.send(BackendEvent::IncomingCall {
        from: Some("+15550001111".to_string()),
        parameters: Vec::new(),
    })?;
    print_next(&mut events).await; // incoming
    bridge
        .dispatch("acceptConnection", serde_json::json!(null))
        .await?;
    print_next(&mut events).await; // connect
    print_next(&mut events).await; // accept
    bridge
        .dispatch("disconnectConnection", serde_json::json!(null))
        .await?;
    print_next(&mut events).await; // disconnect (exactly one)

    // Now an outgoing call.
    bridge
        .dispatch("connect", serde_json::json!({ "To": "+15551234567" }))
        .await?;
    print_next(&mut events).await; // connect
    bridge
        .dispatch("disconnectAll", serde_json::json!(null))
        .await?;
    print_next(&mut events).await; // disconnect

    bridge.stop().await;
    Ok(())
}

async fn print_next(events: &mut callbridge_core::EventIterator) {
    if let Some(event) = events.next().await {
        println!("outward -> {}", event.to_json());
    }
}
