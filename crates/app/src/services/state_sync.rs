//! State synchronizer — owns the live device state and pushes it to the hub.
//!
//! Each bound capability gets an envelope built from the static snapshot and
//! the current [`DeviceState`]. A push is prepared from the state at one
//! instant and sent separately, so callers can hand the slow part to a task.
//! Pushes are best-effort: a failure is logged and not retried. The motion
//! sensor additionally runs a revert timer that doubles as a heartbeat, which
//! is what brings the hub back in line after a failed push. Only the latest
//! motion push may arm that timer.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;

use kiosk_bridge_domain::beacon::BeaconSighting;
use kiosk_bridge_domain::binding::{Capability, EntityBindings};
use kiosk_bridge_domain::entity::{HubPath, HubState};
use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::payload::{PresencePayload, StatePayload};
use kiosk_bridge_domain::snapshot::DeviceSnapshot;
use kiosk_bridge_domain::state::DeviceState;

use crate::ports::{DeviceApi, Geolocation, StatePusher};
use crate::timings::Timings;

/// Views pushed again whenever the motion timer settles.
pub const DEFAULT_SETTLE_VIEWS: [Capability; 3] = [
    Capability::Plugged,
    Capability::Screensaver,
    Capability::MediaPlayer,
];

#[derive(Default)]
struct MotionTimer {
    handle: Option<AbortHandle>,
    epoch: u64,
}

/// A push built from the device state at one instant, ready to be sent.
#[derive(Debug)]
pub struct PendingPush {
    path: HubPath,
    body: Result<serde_json::Value, BridgeError>,
    motion_generation: Option<u64>,
}

impl PendingPush {
    fn new(path: HubPath, body: Result<serde_json::Value, BridgeError>) -> Self {
        Self {
            path,
            body,
            motion_generation: None,
        }
    }
}

/// Application service keeping hub entities in line with the device.
pub struct StateSynchronizer<P, D> {
    pusher: P,
    device: D,
    snapshot: DeviceSnapshot,
    bindings: EntityBindings,
    timings: Timings,
    settle_views: Vec<Capability>,
    state: Mutex<DeviceState>,
    motion_timer: Mutex<MotionTimer>,
}

impl<P, D> StateSynchronizer<P, D>
where
    P: StatePusher + 'static,
    D: DeviceApi + 'static,
{
    /// Create a synchronizer seeded from the device's current readings.
    pub fn new(
        pusher: P,
        device: D,
        snapshot: DeviceSnapshot,
        bindings: EntityBindings,
        timings: Timings,
    ) -> Self {
        let state = DeviceState::from_readings(device.live_readings());
        Self {
            pusher,
            device,
            snapshot,
            bindings,
            timings,
            settle_views: DEFAULT_SETTLE_VIEWS.to_vec(),
            state: Mutex::new(state),
            motion_timer: Mutex::new(MotionTimer::default()),
        }
    }

    /// Replace the views refreshed after each motion revert.
    #[must_use]
    pub fn with_settle_views(mut self, views: Vec<Capability>) -> Self {
        self.settle_views = views;
        self
    }

    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    pub fn bindings(&self) -> &EntityBindings {
        &self.bindings
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutate the device state. The lock is released before returning, so
    /// a push started afterwards sees the whole mutation.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut DeviceState) -> R) -> R {
        mutate(&mut self.lock_state())
    }

    /// Copy of the current device state.
    pub fn state(&self) -> DeviceState {
        self.lock_state().clone()
    }

    /// Ask the host for a position fix and record it.
    ///
    /// A missing fix is not an error; the previous position is kept.
    pub async fn refresh_position<G: Geolocation>(&self, geolocation: &G) {
        match geolocation.current_position().await {
            Ok(position) => {
                tracing::debug!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "position updated"
                );
                self.update(|state| state.position = Some(position));
            }
            Err(err) => tracing::info!(error = %err, "unable to retrieve location"),
        }
    }

    /// Build the push for one capability from the state as it is now.
    ///
    /// Returns `None` when the capability is unbound. Preparing a motion push
    /// cancels the pending motion timer; the timer is re-armed once that push
    /// is sent, unless a newer motion push was prepared meanwhile.
    pub fn prepare(&self, capability: Capability) -> Option<PendingPush> {
        let push = match capability {
            Capability::Motion => {
                let entity_id = self.bindings.motion_sensor.clone()?;
                let generation = self.restart_motion_timer();
                PendingPush {
                    path: HubPath::States(entity_id),
                    body: self.envelope(DeviceState::motion_state),
                    motion_generation: Some(generation),
                }
            }
            Capability::Plugged => PendingPush::new(
                HubPath::States(self.bindings.plugged_sensor.clone()?),
                self.envelope(|state| HubState::from_flag(state.plugged_in)),
            ),
            Capability::Screensaver => PendingPush::new(
                HubPath::States(self.bindings.screensaver_light.clone()?),
                self.envelope(|state| HubState::from_flag(state.screensaver_on)),
            ),
            Capability::MediaPlayer => PendingPush::new(
                HubPath::MediaPlayer(self.bindings.media_player.clone()?),
                self.envelope(|state| HubState::from_playing(state.media.playing)),
            ),
            Capability::Presence => {
                tracing::trace!("presence is pushed per beacon sighting");
                return None;
            }
        };
        Some(push)
    }

    /// Build the room presence push for a beacon sighting.
    ///
    /// Returns `None` without a presence location.
    pub fn prepare_beacon(&self, sighting: &BeaconSighting) -> Option<PendingPush> {
        let room = self.snapshot.location_name.as_deref().filter(|name| !name.is_empty())?;
        let payload = PresencePayload::new(room, sighting, &self.lock_state());
        let body = serde_json::to_value(payload).map_err(|err| BridgeError::Delivery(Box::new(err)));
        Some(PendingPush::new(
            HubPath::RoomPresence(sighting.normalized_device_id()),
            body,
        ))
    }

    /// Deliver a prepared push. Failures are logged and not retried.
    pub async fn send(self: &Arc<Self>, push: PendingPush) {
        let PendingPush {
            path,
            body,
            motion_generation,
        } = push;
        self.deliver(path, body).await;
        if let Some(generation) = motion_generation {
            self.arm_motion_timer(generation);
        }
    }

    /// Prepare and deliver the view of one capability.
    pub async fn push(self: &Arc<Self>, capability: Capability) {
        if let Some(push) = self.prepare(capability) {
            self.send(push).await;
        }
    }

    /// Initial pushes made once the bridge is wired up.
    pub async fn push_all(self: &Arc<Self>) {
        for capability in [
            Capability::Motion,
            Capability::Plugged,
            Capability::Screensaver,
            Capability::MediaPlayer,
        ] {
            self.push(capability).await;
        }
    }

    /// Report a beacon sighting as room presence.
    pub async fn push_beacon(self: &Arc<Self>, sighting: &BeaconSighting) {
        if let Some(push) = self.prepare_beacon(sighting) {
            self.send(push).await;
        }
    }

    /// Stop the pending motion timer, if any. In-flight motion pushes will
    /// not re-arm it.
    pub fn cancel_motion_timer(&self) {
        self.restart_motion_timer();
    }

    pub fn motion_timer_pending(&self) -> bool {
        self.lock_timer().handle.is_some()
    }

    fn restart_motion_timer(&self) -> u64 {
        let mut timer = self.lock_timer();
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        timer.epoch = timer.epoch.wrapping_add(1);
        timer.epoch
    }

    /// Arm the revert timer for the motion push of `generation`: the active
    /// delay while motion is detected, the idle heartbeat otherwise.
    fn arm_motion_timer(self: &Arc<Self>, generation: u64) {
        let delay = if self.lock_state().motion_detected {
            self.timings.motion_active_revert
        } else {
            self.timings.motion_idle_revert
        };
        let mut timer = self.lock_timer();
        if timer.epoch != generation {
            tracing::trace!(generation, "newer motion push pending, timer left alone");
            return;
        }
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.settle_motion(generation).await;
        });
        timer.handle = Some(task.abort_handle());
    }

    // Boxed: settling pushes motion, which arms the timer that settles again.
    fn settle_motion(self: Arc<Self>, epoch: u64) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            {
                let mut timer = self.lock_timer();
                if timer.epoch != epoch {
                    return;
                }
                timer.handle = None;
            }
            tracing::debug!("motion timer settled");
            self.update(DeviceState::clear_motion);
            let pushes: Vec<_> = std::iter::once(Capability::Motion)
                .chain(self.settle_views.iter().copied())
                .filter_map(|capability| self.prepare(capability))
                .collect();
            for push in pushes {
                let this = Arc::clone(&self);
                tokio::spawn(async move { this.send(push).await });
            }
        })
    }

    fn envelope(&self, state_of: fn(&DeviceState) -> HubState) -> Result<serde_json::Value, BridgeError> {
        let readings = self.device.live_readings();
        let mut state = self.lock_state();
        state.refresh(readings);
        let payload = StatePayload::new(state_of(&state), &self.snapshot, &state);
        serde_json::to_value(payload).map_err(|err| BridgeError::Delivery(Box::new(err)))
    }

    async fn deliver(&self, path: HubPath, body: Result<serde_json::Value, BridgeError>) {
        let target = path.to_string();
        let result = match body {
            Ok(body) => self.pusher.push(path, body).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(_) => tracing::debug!(path = %target, "state pushed"),
            Err(err) => tracing::warn!(path = %target, error = %err, "state push failed"),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timer(&self) -> MutexGuard<'_, MotionTimer> {
        self.motion_timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
