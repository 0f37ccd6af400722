//! Bridge lifecycle — wires the router, synchronizer and dispatcher together.
//!
//! Startup order matters: the snapshot and first readings are taken before any
//! handler runs, the router is subscribed to the event bus before the initial
//! pushes so no event is lost, and the dispatcher polls the hub in the
//! background while the rest of the bridge is already live.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use kiosk_bridge_domain::binding::EntityBindings;
use kiosk_bridge_domain::error::BridgeError;

use crate::device_router::DeviceEventRouter;
use crate::event_bus::DeviceEventBus;
use crate::hub_dispatcher::{HubCommandDispatcher, SubscriptionState};
use crate::ports::{DeviceApi, Geolocation, HubTransport, StatePusher};
use crate::services::StateSynchronizer;
use crate::timings::Timings;

/// Static settings the bridge runs with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeSettings {
    pub bindings: EntityBindings,
    /// Room reported for beacon sightings; `None` disables presence.
    pub location_name: Option<String>,
    pub timings: Timings,
}

impl BridgeSettings {
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] for a malformed binding or a zero
    /// timing.
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.bindings.validate()?;
        self.timings.validate()?;
        Ok(())
    }
}

/// A running bridge.
pub struct BridgeHandle<P, D> {
    sync: Arc<StateSynchronizer<P, D>>,
    subscription: watch::Receiver<SubscriptionState>,
    router: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

/// Validate the settings, capture the device snapshot and start the bridge.
///
/// # Errors
///
/// Returns [`BridgeError::Validation`] if the settings are invalid; nothing
/// is scheduled in that case.
pub async fn start<P, D, G, T>(
    settings: BridgeSettings,
    bus: &DeviceEventBus,
    device: D,
    pusher: P,
    geolocation: G,
    transport: T,
) -> Result<BridgeHandle<P, D>, BridgeError>
where
    P: StatePusher + 'static,
    D: DeviceApi + 'static,
    G: Geolocation + 'static,
    T: HubTransport + 'static,
{
    settings.validate()?;

    let snapshot = device.read_snapshot().with_location_name(settings.location_name);
    tracing::info!(
        device_id = snapshot.device_id.as_deref().unwrap_or("unknown"),
        model = snapshot.device_model.as_deref().unwrap_or("unknown"),
        app_version = snapshot.app_version.as_deref().unwrap_or("unknown"),
        geolocation = snapshot.supports_geolocation,
        presence = snapshot.has_presence_location(),
        "starting kiosk bridge"
    );

    let sync = Arc::new(StateSynchronizer::new(
        pusher,
        device,
        snapshot,
        settings.bindings,
        settings.timings,
    ));
    if sync.snapshot().supports_geolocation {
        sync.refresh_position(&geolocation).await;
    } else {
        tracing::info!("geolocation not supported by the device");
    }

    let router = DeviceEventRouter::new(Arc::clone(&sync), geolocation);
    let router = tokio::spawn(router.run(bus.subscribe()));

    let dispatcher = HubCommandDispatcher::new(transport, Arc::clone(&sync));
    let subscription = dispatcher.subscription();
    let dispatcher = tokio::spawn(dispatcher.run());

    sync.push_all().await;
    tracing::info!("kiosk bridge started");

    Ok(BridgeHandle {
        sync,
        subscription,
        router,
        dispatcher,
    })
}

impl<P, D> BridgeHandle<P, D>
where
    P: StatePusher + 'static,
    D: DeviceApi + 'static,
{
    pub fn synchronizer(&self) -> &Arc<StateSynchronizer<P, D>> {
        &self.sync
    }

    /// Current hub subscription state.
    pub fn subscription_state(&self) -> SubscriptionState {
        *self.subscription.borrow()
    }

    /// Wait until the dispatcher has subscribed to the hub.
    pub async fn subscribed(&mut self) {
        // only fails once the dispatcher is gone
        let _ = self
            .subscription
            .wait_for(|state| *state == SubscriptionState::Subscribed)
            .await;
    }

    /// Stop the router, the dispatcher and the motion timer.
    pub fn shutdown(self) {
        self.router.abort();
        self.dispatcher.abort();
        self.sync.cancel_motion_timer();
        tracing::info!("kiosk bridge stopped");
    }
}
