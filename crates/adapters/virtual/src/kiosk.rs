//! Virtual kiosk host — answers device reads from memory and echoes
//! actuations back as device events, the way a real host reports them.

use std::future::Future;
use std::sync::Mutex;

use kiosk_bridge_app::ports::{DeviceApi, DeviceEventSink, Geolocation};
use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::event::{DeviceEvent, DeviceEventKind};
use kiosk_bridge_domain::service::DeviceCommand;
use kiosk_bridge_domain::snapshot::DeviceSnapshot;
use kiosk_bridge_domain::state::{LiveReadings, Position};
use kiosk_bridge_domain::time::now;

use crate::config::VirtualDeviceConfig;
use crate::lock;

/// A simulated kiosk host.
pub struct VirtualKiosk<S> {
    snapshot: DeviceSnapshot,
    position: Option<Position>,
    readings: Mutex<LiveReadings>,
    actuations: Mutex<Vec<DeviceCommand>>,
    sink: S,
}

impl<S: DeviceEventSink> VirtualKiosk<S> {
    /// Build a kiosk reporting `config` and emitting its events into `sink`.
    pub fn new(config: &VirtualDeviceConfig, sink: S) -> Self {
        Self {
            snapshot: config.snapshot(),
            position: config.position(),
            readings: Mutex::new(config.readings()),
            actuations: Mutex::new(Vec::new()),
            sink,
        }
    }

    /// Simulate something happening on the device.
    ///
    /// Plug and screen events update the readings first so later reads agree
    /// with the event.
    pub fn trigger(&self, event: DeviceEvent) {
        {
            let mut readings = lock(&self.readings);
            match event {
                DeviceEvent::ScreenOn => readings.screen_on = true,
                DeviceEvent::ScreenOff => readings.screen_on = false,
                DeviceEvent::PluggedAc | DeviceEvent::PluggedUsb => readings.plugged_in = true,
                DeviceEvent::Unplugged => readings.plugged_in = false,
                _ => {}
            }
        }
        tracing::debug!(event = event.kind().host_name(), "virtual kiosk event");
        self.sink.emit(event);
    }

    /// Simulate a host callback by its host API name, e.g. `pluggedAC`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] for an unknown name or for an event
    /// that needs a payload (`onIBeacon`, `audioVolumeChange`).
    pub fn trigger_named(&self, name: &str) -> Result<(), BridgeError> {
        let kind: DeviceEventKind = name
            .parse()
            .map_err(|err| BridgeError::Device(Box::new(err)))?;
        let event = DeviceEvent::without_payload(kind, now())
            .ok_or_else(|| BridgeError::Device(format!("{name} needs a payload").into()))?;
        self.trigger(event);
        Ok(())
    }

    /// Change the battery level and report it.
    pub fn set_battery_level(&self, level: u8) {
        lock(&self.readings).battery_level = Some(level);
        self.sink.emit(DeviceEvent::BatteryLevelChanged);
    }

    /// Every actuation accepted so far, oldest first.
    #[must_use]
    pub fn actuations(&self) -> Vec<DeviceCommand> {
        lock(&self.actuations).clone()
    }

    fn actuate(&self, command: DeviceCommand, echo: Option<DeviceEvent>) {
        tracing::info!(?command, "virtual kiosk actuation");
        lock(&self.actuations).push(command);
        if let Some(event) = echo {
            self.sink.emit(event);
        }
    }
}

impl<S: DeviceEventSink> DeviceApi for VirtualKiosk<S> {
    fn read_snapshot(&self) -> DeviceSnapshot {
        self.snapshot.clone()
    }

    fn live_readings(&self) -> LiveReadings {
        *lock(&self.readings)
    }

    fn set_screen_brightness(&self, level: u8) -> Result<(), BridgeError> {
        lock(&self.readings).screen_brightness = Some(level);
        self.actuate(DeviceCommand::SetScreenBrightness(level), None);
        Ok(())
    }

    fn start_screensaver(&self) -> Result<(), BridgeError> {
        self.actuate(DeviceCommand::StartScreensaver, Some(DeviceEvent::ScreensaverStart));
        Ok(())
    }

    fn stop_screensaver(&self) -> Result<(), BridgeError> {
        self.actuate(DeviceCommand::StopScreensaver, Some(DeviceEvent::ScreensaverStop));
        Ok(())
    }

    fn text_to_speech(&self, text: &str) -> Result<(), BridgeError> {
        self.actuate(DeviceCommand::Speak(text.to_string()), None);
        Ok(())
    }

    fn play_media(&self, url: Option<&str>) -> Result<(), BridgeError> {
        let url = url.map(str::to_string);
        self.actuate(
            DeviceCommand::PlayMedia(url.clone()),
            Some(DeviceEvent::AudioPlaying {
                media_content_id: url,
            }),
        );
        Ok(())
    }

    fn pause_media(&self) -> Result<(), BridgeError> {
        self.actuate(DeviceCommand::PauseMedia, Some(DeviceEvent::AudioPaused));
        Ok(())
    }

    fn set_volume(&self, level: f64) -> Result<(), BridgeError> {
        self.actuate(
            DeviceCommand::SetVolume(level),
            Some(DeviceEvent::AudioVolumeChanged { level }),
        );
        Ok(())
    }
}

impl<S: DeviceEventSink> Geolocation for VirtualKiosk<S> {
    fn current_position(&self) -> impl Future<Output = Result<Position, BridgeError>> + Send {
        let position = self.position;
        async move { position.ok_or_else(|| BridgeError::Geolocation("no position configured".into())) }
    }
}
