//! Spy port implementations shared by the unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::time::Instant;

use kiosk_bridge_domain::entity::HubPath;
use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::hub::HubMessage;
use kiosk_bridge_domain::service::DeviceCommand;
use kiosk_bridge_domain::snapshot::DeviceSnapshot;
use kiosk_bridge_domain::state::{LiveReadings, Position};

use crate::ports::{DeviceApi, Geolocation, HubTransport, StatePusher};

// ── Pusher ──────────────────────────────────────────────────────────

/// Records every push when it starts. Latency comes from the queued
/// per-call delays first, then from the fixed delay.
#[derive(Default)]
pub struct SpyPusher {
    pushes: Mutex<Vec<(HubPath, Value)>>,
    started: Mutex<Vec<Instant>>,
    delivered: Arc<Mutex<Vec<(HubPath, Value)>>>,
    latencies: Mutex<VecDeque<Duration>>,
    latency: Duration,
    failing: AtomicBool,
}

impl SpyPusher {
    pub fn failing() -> Self {
        let pusher = Self::default();
        pusher.failing.store(true, Ordering::SeqCst);
        pusher
    }

    /// Pusher taking `latency` for every call.
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Pusher whose first calls take the given delays, the rest none.
    pub fn with_latencies(latencies: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            latencies: Mutex::new(latencies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn pushes(&self) -> Vec<(HubPath, Value)> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.pushes().iter().map(|(path, _)| path.to_string()).collect()
    }

    pub fn last(&self) -> Option<(HubPath, Value)> {
        self.pushes().last().cloned()
    }

    /// Start instant of each push, in call order.
    pub fn started(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }

    /// Pushes whose latency has elapsed, in completion order.
    pub fn delivered(&self) -> Vec<(HubPath, Value)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl StatePusher for SpyPusher {
    fn push(&self, path: HubPath, body: Value) -> impl Future<Output = Result<Value, BridgeError>> + Send {
        self.pushes.lock().unwrap().push((path.clone(), body.clone()));
        self.started.lock().unwrap().push(Instant::now());
        let latency = self.latencies.lock().unwrap().pop_front().unwrap_or(self.latency);
        let delivered = Arc::clone(&self.delivered);
        let failing = self.failing.load(Ordering::SeqCst);
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if failing {
                return Err(BridgeError::Delivery("hub unreachable".into()));
            }
            delivered.lock().unwrap().push((path, body));
            Ok(json!([]))
        }
    }
}

// ── Device ──────────────────────────────────────────────────────────

pub struct SpyDevice {
    snapshot: DeviceSnapshot,
    readings: Mutex<LiveReadings>,
    commands: Mutex<Vec<DeviceCommand>>,
    rejecting: AtomicBool,
}

impl SpyDevice {
    pub fn new(snapshot: DeviceSnapshot) -> Self {
        Self {
            snapshot,
            readings: Mutex::new(LiveReadings {
                battery_level: Some(80),
                screen_brightness: Some(128),
                screen_on: true,
                plugged_in: true,
            }),
            commands: Mutex::new(Vec::new()),
            rejecting: AtomicBool::new(false),
        }
    }

    pub fn set_readings(&self, readings: LiveReadings) {
        *self.readings.lock().unwrap() = readings;
    }

    pub fn reject_commands(&self) {
        self.rejecting.store(true, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: DeviceCommand) -> Result<(), BridgeError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(BridgeError::Device("host refused".into()));
        }
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

impl Default for SpyDevice {
    fn default() -> Self {
        Self::new(DeviceSnapshot::default())
    }
}

impl DeviceApi for SpyDevice {
    fn read_snapshot(&self) -> DeviceSnapshot {
        self.snapshot.clone()
    }

    fn live_readings(&self) -> LiveReadings {
        *self.readings.lock().unwrap()
    }

    fn set_screen_brightness(&self, level: u8) -> Result<(), BridgeError> {
        self.record(DeviceCommand::SetScreenBrightness(level))
    }

    fn start_screensaver(&self) -> Result<(), BridgeError> {
        self.record(DeviceCommand::StartScreensaver)
    }

    fn stop_screensaver(&self) -> Result<(), BridgeError> {
        self.record(DeviceCommand::StopScreensaver)
    }

    fn text_to_speech(&self, text: &str) -> Result<(), BridgeError> {
        self.record(DeviceCommand::Speak(text.to_string()))
    }

    fn play_media(&self, url: Option<&str>) -> Result<(), BridgeError> {
        self.record(DeviceCommand::PlayMedia(url.map(str::to_string)))
    }

    fn pause_media(&self) -> Result<(), BridgeError> {
        self.record(DeviceCommand::PauseMedia)
    }

    fn set_volume(&self, level: f64) -> Result<(), BridgeError> {
        self.record(DeviceCommand::SetVolume(level))
    }
}

// ── Geolocation ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct SpyGeolocation {
    position: Mutex<Option<Position>>,
    requests: AtomicUsize,
}

impl SpyGeolocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Mutex::new(Some(Position { latitude, longitude })),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Geolocation for SpyGeolocation {
    fn current_position(&self) -> impl Future<Output = Result<Position, BridgeError>> + Send {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let position = *self.position.lock().unwrap();
        async move { position.ok_or_else(|| BridgeError::Geolocation("no fix".into())) }
    }
}

// ── Hub transport ───────────────────────────────────────────────────

pub struct SpyTransport {
    not_ready_checks: AtomicUsize,
    readiness_checks: AtomicUsize,
    subscriptions: Mutex<Vec<String>>,
    sender: broadcast::Sender<HubMessage>,
}

impl SpyTransport {
    /// Transport that reports not-ready for the first `checks` polls.
    pub fn ready_after(checks: usize) -> Self {
        let (sender, _) = broadcast::channel(32);
        Self {
            not_ready_checks: AtomicUsize::new(checks),
            readiness_checks: AtomicUsize::new(0),
            subscriptions: Mutex::new(Vec::new()),
            sender,
        }
    }

    pub fn readiness_checks(&self) -> usize {
        self.readiness_checks.load(Ordering::SeqCst)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn deliver(&self, message: HubMessage) {
        let _ = self.sender.send(message);
    }
}

impl HubTransport for SpyTransport {
    fn is_ready(&self) -> bool {
        self.readiness_checks.fetch_add(1, Ordering::SeqCst);
        self.not_ready_checks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_err()
    }

    fn subscribe_events(&self, event_type: &str) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.subscriptions.lock().unwrap().push(event_type.to_string());
        async { Ok(()) }
    }

    fn messages(&self) -> broadcast::Receiver<HubMessage> {
        self.sender.subscribe()
    }
}
