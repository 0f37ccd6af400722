//! Live device state — everything that changes while the bridge runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::beacon::{BeaconSighting, BeaconTable};
use crate::time::Timestamp;

/// A geolocation fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Values the device API reports on demand.
///
/// All four seed the initial state and are re-read before every payload
/// build, so the host's view wins over the last event seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveReadings {
    pub battery_level: Option<u8>,
    pub screen_brightness: Option<u8>,
    pub screen_on: bool,
    pub plugged_in: bool,
}

/// Audio playback as last reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaState {
    pub playing: bool,
    pub volume_level: Option<f64>,
    pub media_content_id: Option<String>,
}

impl MediaState {
    /// Playback started; keeps the previous content id when none is reported.
    pub fn start(&mut self, media_content_id: Option<String>) {
        self.playing = true;
        if media_content_id.is_some() {
            self.media_content_id = media_content_id;
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn set_volume(&mut self, level: f64) {
        self.volume_level = Some(level);
    }
}

/// Mutable, process-lifetime record of the device.
///
/// Owned by the state synchronizer; every mutation goes through one of the
/// methods below so that handlers finish mutating before a push reads it.
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    pub battery_level: Option<u8>,
    pub screen_brightness: Option<u8>,
    pub screen_on: bool,
    pub plugged_in: bool,
    pub network_connected: bool,
    pub internet_connected: bool,
    pub motion_detected: bool,
    pub last_motion: Option<Timestamp>,
    pub screensaver_on: bool,
    pub position: Option<Position>,
    pub media: MediaState,
    pub beacons: BeaconTable,
}

impl DeviceState {
    /// Initial state seeded from the first live readings.
    #[must_use]
    pub fn from_readings(readings: LiveReadings) -> Self {
        let mut state = Self {
            network_connected: true,
            internet_connected: true,
            ..Self::default()
        };
        state.refresh(readings);
        state
    }

    /// Take every polled value from fresh readings; the host wins over the
    /// last screen or power event seen.
    pub fn refresh(&mut self, readings: LiveReadings) {
        self.battery_level = readings.battery_level;
        self.screen_brightness = readings.screen_brightness;
        self.screen_on = readings.screen_on;
        self.plugged_in = readings.plugged_in;
    }

    /// Mark motion as active and stamp the time.
    pub fn record_motion(&mut self, at: Timestamp) {
        self.motion_detected = true;
        self.last_motion = Some(at);
    }

    /// Motion timed out without renewal.
    pub fn clear_motion(&mut self) {
        self.motion_detected = false;
    }

    pub fn record_beacon(&mut self, sighting: BeaconSighting, ttl: Duration) {
        self.beacons.record(sighting, ttl);
    }

    /// Hub-side `on` / `off` for the motion sensor.
    #[must_use]
    pub fn motion_state(&self) -> crate::entity::HubState {
        crate::entity::HubState::from_flag(self.motion_detected)
    }
}
