//! Device event router — reacts to device events by updating state and
//! triggering pushes.
//!
//! Handlers are looked up in a table keyed by [`DeviceEventKind`], built once
//! from the snapshot: movement is only routed when the host supports
//! geolocation, beacon sightings only when a presence location is set.
//! Movement and beacon events pass through per-key throttles; their deferred
//! runs come back through a channel so every handler runs on the router task,
//! ahead of newer device events.
//!
//! Handlers only mutate state and prepare pushes; sending happens on tasks
//! tracked by the router, so a slow hub never holds up the next event.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use kiosk_bridge_domain::beacon::BeaconSighting;
use kiosk_bridge_domain::binding::Capability;
use kiosk_bridge_domain::event::{DeviceEvent, DeviceEventKind};
use kiosk_bridge_domain::snapshot::DeviceSnapshot;
use kiosk_bridge_domain::time::now;

use crate::ports::{DeviceApi, Geolocation, StatePusher};
use crate::rate_limiter::RateLimiter;
use crate::services::{PendingPush, StateSynchronizer};

/// Rate-limiter key shared by all movement events.
const MOVEMENT_KEY: &str = "movement";

/// What a device event does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Screen(bool),
    Network(bool),
    Internet(bool),
    Plugged(bool),
    Screensaver(bool),
    Battery,
    Motion,
    Movement,
    Beacon,
    Audio,
}

/// A throttled handler run, delivered back to the router task.
#[derive(Debug)]
enum Throttled {
    Movement,
    Beacon(BeaconSighting),
}

fn route_table(snapshot: &DeviceSnapshot) -> HashMap<DeviceEventKind, Route> {
    let mut routes: HashMap<_, _> = [
        (DeviceEventKind::ScreenOn, Route::Screen(true)),
        (DeviceEventKind::ScreenOff, Route::Screen(false)),
        (DeviceEventKind::NetworkReconnect, Route::Network(true)),
        (DeviceEventKind::NetworkDisconnect, Route::Network(false)),
        (DeviceEventKind::InternetReconnect, Route::Internet(true)),
        (DeviceEventKind::InternetDisconnect, Route::Internet(false)),
        (DeviceEventKind::PluggedAc, Route::Plugged(true)),
        (DeviceEventKind::PluggedUsb, Route::Plugged(true)),
        (DeviceEventKind::Unplugged, Route::Plugged(false)),
        (DeviceEventKind::ScreensaverStart, Route::Screensaver(true)),
        (DeviceEventKind::ScreensaverStop, Route::Screensaver(false)),
        (DeviceEventKind::BatteryLevelChanged, Route::Battery),
        (DeviceEventKind::Motion, Route::Motion),
        (DeviceEventKind::AudioPlaying, Route::Audio),
        (DeviceEventKind::AudioPaused, Route::Audio),
        (DeviceEventKind::AudioEnded, Route::Audio),
        (DeviceEventKind::AudioVolumeChanged, Route::Audio),
    ]
    .into_iter()
    .collect();

    if snapshot.supports_geolocation {
        routes.insert(DeviceEventKind::Movement, Route::Movement);
    }
    if snapshot.has_presence_location() {
        routes.insert(DeviceEventKind::IBeacon, Route::Beacon);
    }
    routes
}

/// Consumes device events and drives the [`StateSynchronizer`].
pub struct DeviceEventRouter<P, D, G> {
    handlers: Handlers<P, D, G>,
    throttled_rx: mpsc::UnboundedReceiver<Throttled>,
}

struct Handlers<P, D, G> {
    sync: Arc<StateSynchronizer<P, D>>,
    geolocation: Arc<G>,
    routes: HashMap<DeviceEventKind, Route>,
    limiters: HashMap<String, RateLimiter<Throttled>>,
    throttled_tx: mpsc::UnboundedSender<Throttled>,
    pushes: JoinSet<()>,
}

impl<P, D, G> DeviceEventRouter<P, D, G>
where
    P: StatePusher + 'static,
    D: DeviceApi + 'static,
    G: Geolocation + 'static,
{
    /// Build the handler table for the synchronizer's snapshot.
    pub fn new(sync: Arc<StateSynchronizer<P, D>>, geolocation: G) -> Self {
        let routes = route_table(sync.snapshot());
        let (throttled_tx, throttled_rx) = mpsc::unbounded_channel();
        Self {
            handlers: Handlers {
                sync,
                geolocation: Arc::new(geolocation),
                routes,
                limiters: HashMap::new(),
                throttled_tx,
                pushes: JoinSet::new(),
            },
            throttled_rx,
        }
    }

    /// Whether events of `kind` have a handler.
    #[must_use]
    pub fn handles(&self, kind: DeviceEventKind) -> bool {
        self.handlers.routes.contains_key(&kind)
    }

    /// Process events until the bus closes, then wait for in-flight pushes.
    pub async fn run(self, mut events: broadcast::Receiver<DeviceEvent>) {
        let Self {
            mut handlers,
            mut throttled_rx,
        } = self;
        loop {
            tokio::select! {
                biased;
                Some(throttled) = throttled_rx.recv() => handlers.run_throttled(throttled),
                received = events.recv() => match received {
                    Ok(event) => handlers.route(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "device event router lagged behind");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("device event bus closed, router stopping");
                        break;
                    }
                },
                Some(joined) = handlers.pushes.join_next(), if !handlers.pushes.is_empty() => {
                    log_joined(joined);
                }
            }
        }
        for limiter in handlers.limiters.values() {
            limiter.cancel();
        }
        while let Some(joined) = handlers.pushes.join_next().await {
            log_joined(joined);
        }
    }
}

fn log_joined(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        tracing::warn!(error = %err, "push task failed");
    }
}

impl<P, D, G> Handlers<P, D, G>
where
    P: StatePusher + 'static,
    D: DeviceApi + 'static,
    G: Geolocation + 'static,
{
    fn route(&mut self, event: DeviceEvent) {
        let kind = event.kind();
        let Some(route) = self.routes.get(&kind).copied() else {
            tracing::debug!(event = kind.host_name(), "no handler registered, ignoring");
            return;
        };
        tracing::trace!(event = kind.host_name(), "device event");

        match route {
            Route::Screen(on) => {
                self.sync.update(|state| state.screen_on = on);
                tracing::info!(on, "screen state changed");
            }
            Route::Network(up) => {
                self.sync.update(|state| state.network_connected = up);
                tracing::info!(connected = up, "network connectivity changed");
            }
            Route::Internet(up) => {
                self.sync.update(|state| state.internet_connected = up);
                tracing::info!(connected = up, "internet connectivity changed");
            }
            Route::Plugged(plugged) => {
                self.sync.update(|state| state.plugged_in = plugged);
                tracing::info!(plugged, "power source changed");
                self.spawn_push(self.sync.prepare(Capability::Plugged));
            }
            Route::Screensaver(on) => {
                self.sync.update(|state| state.screensaver_on = on);
                tracing::info!(on, "screensaver changed");
                self.spawn_push(self.sync.prepare(Capability::Screensaver));
            }
            Route::Battery => tracing::debug!("battery level changed"),
            Route::Motion => {
                if let DeviceEvent::Motion { at } = event {
                    self.sync.update(|state| state.record_motion(at));
                    self.spawn_push(self.sync.prepare(Capability::Motion));
                }
            }
            Route::Movement => self.throttle(MOVEMENT_KEY.to_string(), Throttled::Movement),
            Route::Beacon => {
                if let DeviceEvent::IBeacon(reading) = event {
                    let sighting = BeaconSighting::new(
                        reading.uuid,
                        reading.major,
                        reading.minor,
                        reading.distance,
                        now(),
                    );
                    self.throttle(sighting.key(), Throttled::Beacon(sighting));
                }
            }
            Route::Audio => {
                self.sync.update(|state| match event {
                    DeviceEvent::AudioPlaying { media_content_id } => state.media.start(media_content_id),
                    DeviceEvent::AudioVolumeChanged { level } => state.media.set_volume(level),
                    _ => state.media.stop(),
                });
                self.spawn_push(self.sync.prepare(Capability::MediaPlayer));
            }
        }
    }

    /// Send a push prepared on the router task in the background.
    fn spawn_push(&mut self, push: Option<PendingPush>) {
        if let Some(push) = push {
            let sync = Arc::clone(&self.sync);
            self.pushes.spawn(async move { sync.send(push).await });
        }
    }

    fn throttle(&mut self, key: String, throttled: Throttled) {
        let limiter = match self.limiters.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::debug!(key = %entry.key(), "new throttle window");
                let tx = self.throttled_tx.clone();
                let window = self.sync.timings().throttle_window;
                entry.insert(RateLimiter::throttle(window, move |throttled| {
                    // the receiver only goes away when the router stops
                    let _ = tx.send(throttled);
                }))
            }
        };
        limiter.call(throttled);
    }

    fn run_throttled(&mut self, throttled: Throttled) {
        match throttled {
            Throttled::Movement => {
                tracing::debug!("movement detected");
                let sync = Arc::clone(&self.sync);
                let geolocation = Arc::clone(&self.geolocation);
                self.pushes.spawn(async move {
                    sync.refresh_position(&geolocation).await;
                    sync.push(Capability::Motion).await;
                });
            }
            Throttled::Beacon(sighting) => {
                tracing::debug!(
                    beacon = %sighting.key(),
                    distance = sighting.distance,
                    "beacon sighted"
                );
                let ttl = self.sync.timings().beacon_ttl;
                self.sync.update(|state| state.record_beacon(sighting.clone(), ttl));
                self.spawn_push(self.sync.prepare_beacon(&sighting));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::DeviceEventBus;
    use crate::ports::DeviceEventSink;
    use crate::test_support::{SpyDevice, SpyGeolocation, SpyPusher};
    use crate::timings::Timings;
    use kiosk_bridge_domain::binding::EntityBindings;
    use kiosk_bridge_domain::event::BeaconReading;
    use kiosk_bridge_domain::state::LiveReadings;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio::time::sleep;

    struct Harness {
        bus: DeviceEventBus,
        pusher: Arc<SpyPusher>,
        device: Arc<SpyDevice>,
        geolocation: Arc<SpyGeolocation>,
        sync: Arc<StateSynchronizer<Arc<SpyPusher>, Arc<SpyDevice>>>,
        router: JoinHandle<()>,
    }

    fn bindings() -> EntityBindings {
        EntityBindings {
            motion_sensor: Some("binary_sensor.kiosk_motion".into()),
            plugged_sensor: Some("binary_sensor.kiosk_plugged".into()),
            screensaver_light: Some("light.kiosk_screensaver".into()),
            media_player: Some("media_player.kiosk".into()),
        }
    }

    fn presence_snapshot() -> DeviceSnapshot {
        DeviceSnapshot {
            supports_geolocation: true,
            ..DeviceSnapshot::default()
        }
        .with_location_name(Some("Hallway".into()))
    }

    fn start(snapshot: DeviceSnapshot, bindings: EntityBindings) -> Harness {
        start_with(snapshot, bindings, SpyPusher::default())
    }

    fn start_with(snapshot: DeviceSnapshot, bindings: EntityBindings, pusher: SpyPusher) -> Harness {
        let bus = DeviceEventBus::new(64);
        let pusher = Arc::new(pusher);
        let device = Arc::new(SpyDevice::default());
        let geolocation = Arc::new(SpyGeolocation::at(48.85, 2.35));
        let sync = Arc::new(StateSynchronizer::new(
            Arc::clone(&pusher),
            Arc::clone(&device),
            snapshot,
            bindings,
            Timings::default(),
        ));
        let router = DeviceEventRouter::new(Arc::clone(&sync), Arc::clone(&geolocation));
        let router = tokio::spawn(router.run(bus.subscribe()));
        Harness {
            bus,
            pusher,
            device,
            geolocation,
            sync,
            router,
        }
    }

    fn unplug(device: &SpyDevice) {
        device.set_readings(LiveReadings {
            plugged_in: false,
            ..device.live_readings()
        });
    }

    fn beacon(uuid: &str, major: &str) -> DeviceEvent {
        DeviceEvent::IBeacon(BeaconReading {
            uuid: uuid.into(),
            major: Some(major.into()),
            minor: None,
            distance: 1.5,
        })
    }

    async fn settle() {
        sleep(Duration::from_millis(10)).await;
    }

    // ── Handler table ───────────────────────────────────────────────

    #[test]
    fn should_skip_movement_and_beacons_without_support() {
        let routes = route_table(&DeviceSnapshot::default());
        assert!(!routes.contains_key(&DeviceEventKind::Movement));
        assert!(!routes.contains_key(&DeviceEventKind::IBeacon));
        assert!(routes.contains_key(&DeviceEventKind::Motion));
        assert!(routes.contains_key(&DeviceEventKind::PluggedUsb));
    }

    #[test]
    fn should_route_every_event_when_fully_supported() {
        let routes = route_table(&presence_snapshot());
        for kind in DeviceEventKind::ALL {
            assert!(routes.contains_key(&kind), "{} has no route", kind.host_name());
        }
    }

    #[test]
    fn should_treat_usb_like_ac_power() {
        let routes = route_table(&DeviceSnapshot::default());
        assert_eq!(
            routes.get(&DeviceEventKind::PluggedUsb),
            routes.get(&DeviceEventKind::PluggedAc)
        );
    }

    // ── State events ────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_push_plugged_off_on_unplug() {
        let h = start(DeviceSnapshot::default(), bindings());

        unplug(&h.device);
        h.bus.emit(DeviceEvent::Unplugged);
        settle().await;

        let (path, body) = h.pusher.last().unwrap();
        assert_eq!(path.to_string(), "/api/states/binary_sensor.kiosk_plugged");
        assert_eq!(body["state"], "off");
    }

    #[tokio::test(start_paused = true)]
    async fn should_push_screensaver_transitions_in_order() {
        let h = start(DeviceSnapshot::default(), bindings());

        h.bus.emit(DeviceEvent::ScreensaverStart);
        h.bus.emit(DeviceEvent::ScreensaverStop);
        settle().await;

        let states: Vec<_> = h
            .pusher
            .pushes()
            .into_iter()
            .map(|(_, body)| body["state"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(states, vec!["on", "off"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_update_flags_without_pushing() {
        let h = start(DeviceSnapshot::default(), bindings());

        h.bus.emit(DeviceEvent::ScreenOff);
        h.bus.emit(DeviceEvent::NetworkDisconnect);
        h.bus.emit(DeviceEvent::InternetDisconnect);
        h.bus.emit(DeviceEvent::BatteryLevelChanged);
        settle().await;

        assert!(h.pusher.pushes().is_empty());
        let state = h.sync.state();
        assert!(!state.screen_on);
        assert!(!state.network_connected);
        assert!(!state.internet_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_push_motion_on_with_timestamp() {
        let h = start(DeviceSnapshot::default(), bindings());
        let at = now();

        h.bus.emit(DeviceEvent::Motion { at });
        settle().await;

        let (path, body) = h.pusher.last().unwrap();
        assert_eq!(path.to_string(), "/api/states/binary_sensor.kiosk_motion");
        assert_eq!(body["state"], "on");
        assert_eq!(h.sync.state().last_motion, Some(at));
    }

    #[tokio::test(start_paused = true)]
    async fn should_track_audio_playback() {
        let h = start(DeviceSnapshot::default(), bindings());

        h.bus.emit(DeviceEvent::AudioPlaying {
            media_content_id: Some("http://radio/stream".into()),
        });
        h.bus.emit(DeviceEvent::AudioVolumeChanged { level: 0.4 });
        h.bus.emit(DeviceEvent::AudioEnded);
        settle().await;

        let states: Vec<_> = h
            .pusher
            .pushes()
            .into_iter()
            .map(|(_, body)| body["state"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(states, vec!["playing", "playing", "idle"]);
        let media = h.sync.state().media;
        assert_eq!(media.volume_level, Some(0.4));
        assert_eq!(media.media_content_id.as_deref(), Some("http://radio/stream"));
    }

    // ── Throttled events ────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_ignore_movement_without_geolocation() {
        let h = start(DeviceSnapshot::default(), bindings());

        h.bus.emit(DeviceEvent::Movement);
        settle().await;

        assert_eq!(h.geolocation.requests(), 0);
        assert!(h.pusher.pushes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_throttle_movement_bursts() {
        let h = start(presence_snapshot(), bindings());

        for _ in 0..5 {
            h.bus.emit(DeviceEvent::Movement);
            sleep(Duration::from_secs(1)).await;
        }
        assert_eq!(h.geolocation.requests(), 1);

        sleep(Duration::from_secs(6)).await;
        assert_eq!(h.geolocation.requests(), 2);
        assert!(h.sync.state().position.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn should_throttle_each_beacon_independently() {
        let h = start(presence_snapshot(), EntityBindings::default());

        h.bus.emit(beacon("aaaa-1111", "1"));
        h.bus.emit(beacon("bbbb-2222", "1"));
        h.bus.emit(beacon("aaaa-1111", "1"));
        settle().await;

        assert_eq!(
            h.pusher.paths(),
            vec!["/api/room_presence/AAAA1111", "/api/room_presence/BBBB2222"]
        );

        sleep(Duration::from_secs(11)).await;
        assert_eq!(
            h.pusher.paths(),
            vec![
                "/api/room_presence/AAAA1111",
                "/api/room_presence/BBBB2222",
                "/api/room_presence/AAAA1111",
            ]
        );
        assert_eq!(h.sync.state().beacons.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_key_beacons_by_major_and_minor() {
        let h = start(presence_snapshot(), EntityBindings::default());

        h.bus.emit(beacon("aaaa", "1"));
        h.bus.emit(beacon("aaaa", "2"));
        settle().await;

        assert_eq!(h.pusher.pushes().len(), 2);
        let beacons = h.sync.state().beacons;
        assert!(beacons.get("aaaa_1").is_some());
        assert!(beacons.get("aaaa_2").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_beacons_without_location() {
        let snapshot = DeviceSnapshot {
            supports_geolocation: true,
            ..DeviceSnapshot::default()
        };
        let h = start(snapshot, EntityBindings::default());

        h.bus.emit(beacon("aaaa", "1"));
        settle().await;

        assert!(h.pusher.pushes().is_empty());
        assert!(h.sync.state().beacons.is_empty());
    }

    // ── Slow hub ────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_not_hold_beacon_behind_slow_push() {
        let h = start_with(
            presence_snapshot(),
            EntityBindings::default(),
            SpyPusher::slow(Duration::from_secs(8)),
        );

        h.bus.emit(beacon("aaaa", "1"));
        h.bus.emit(beacon("bbbb", "1"));
        settle().await;

        let started = h.pusher.started();
        assert_eq!(started.len(), 2);
        assert!(started[1] - started[0] < Duration::from_secs(1));
        assert!(h.pusher.delivered().is_empty());

        sleep(Duration::from_secs(8)).await;
        assert_eq!(h.pusher.delivered().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_handle_motion_while_push_in_flight() {
        let h = start_with(
            DeviceSnapshot::default(),
            bindings(),
            SpyPusher::with_latencies([Duration::from_secs(8)]),
        );

        unplug(&h.device);
        h.bus.emit(DeviceEvent::Unplugged);
        settle().await;
        h.bus.emit(DeviceEvent::Motion { at: now() });
        settle().await;

        assert!(h.sync.state().motion_detected);
        let delivered = h.pusher.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0.to_string(), "/api/states/binary_sensor.kiosk_motion");
        assert_eq!(delivered[0].1["state"], "on");

        sleep(Duration::from_secs(8)).await;
        let (path, body) = h.pusher.delivered().pop().unwrap();
        assert_eq!(path.to_string(), "/api/states/binary_sensor.kiosk_plugged");
        assert_eq!(body["state"], "off");
    }

    #[tokio::test(start_paused = true)]
    async fn should_finish_in_flight_pushes_when_bus_closes() {
        let h = start_with(
            DeviceSnapshot::default(),
            bindings(),
            SpyPusher::slow(Duration::from_secs(2)),
        );

        h.bus.emit(DeviceEvent::ScreensaverStart);
        settle().await;
        drop(h.bus);
        h.router.await.unwrap();

        assert_eq!(h.pusher.delivered().len(), 1);
    }

    #[test]
    fn should_report_registered_handlers() {
        let sync = Arc::new(StateSynchronizer::new(
            Arc::new(SpyPusher::default()),
            Arc::new(SpyDevice::default()),
            DeviceSnapshot::default(),
            EntityBindings::default(),
            Timings::default(),
        ));
        let router = DeviceEventRouter::new(sync, SpyGeolocation::default());

        assert!(router.handles(DeviceEventKind::ScreenOn));
        assert!(!router.handles(DeviceEventKind::Movement));
    }
}
