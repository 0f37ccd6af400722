//! # kiosk-bridged — kiosk bridge daemon
//!
//! Composition root that wires the adapters together and runs the bridge.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Construct the kiosk host, the hub transport and the state pusher
//! - Resolve the hub token (configured, else the transport's ambient one)
//! - Start the bridge and stop it on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use kiosk_bridge_adapter_hub_http::HttpStatePusher;
use kiosk_bridge_adapter_virtual::{VirtualHubTransport, VirtualKiosk};
use kiosk_bridge_app::bridge;
use kiosk_bridge_app::event_bus::DeviceEventBus;
use kiosk_bridge_app::ports::resolve_auth_token;

use config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter).context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Device side
    let bus = DeviceEventBus::new(256);
    let kiosk = Arc::new(VirtualKiosk::new(&config.device, bus.clone()));

    // Hub side
    let transport = Arc::new(VirtualHubTransport::new(std::env::var("SUPERVISOR_TOKEN").ok()));
    let token = resolve_auth_token(config.hub.auth_token.clone(), &transport);
    if token.is_none() {
        tracing::warn!("no hub token configured, pushes are sent unauthenticated");
    }
    let pusher = HttpStatePusher::new(&config.hub, token)?;
    transport.connect();

    let handle = bridge::start(
        config.bridge_settings(),
        &bus,
        Arc::clone(&kiosk),
        pusher,
        Arc::clone(&kiosk),
        transport,
    )
    .await?;
    tracing::info!(server_url = %config.hub.server_url, "kiosk-bridged running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    handle.shutdown();

    Ok(())
}
