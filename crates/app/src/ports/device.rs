//! Device port — the kiosk host's API, reads and actuations.

use std::sync::Arc;

use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::service::DeviceCommand;
use kiosk_bridge_domain::snapshot::DeviceSnapshot;
use kiosk_bridge_domain::state::LiveReadings;

/// Synchronous calls into the kiosk host.
///
/// Actuations return as soon as the host has accepted them; the resulting
/// state change comes back later as a device event.
pub trait DeviceApi: Send + Sync {
    /// Identity, network and software facts. Read once at startup.
    fn read_snapshot(&self) -> DeviceSnapshot;

    /// Values the host reports on demand.
    fn live_readings(&self) -> LiveReadings;

    /// Set the screen backlight, `0..=255`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the host rejects the call.
    fn set_screen_brightness(&self, level: u8) -> Result<(), BridgeError>;

    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the host rejects the call.
    fn start_screensaver(&self) -> Result<(), BridgeError>;

    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the host rejects the call.
    fn stop_screensaver(&self) -> Result<(), BridgeError>;

    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the host rejects the call.
    fn text_to_speech(&self, text: &str) -> Result<(), BridgeError>;

    /// Play `url`, or resume the current media when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the host rejects the call.
    fn play_media(&self, url: Option<&str>) -> Result<(), BridgeError>;

    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the host rejects the call.
    fn pause_media(&self) -> Result<(), BridgeError>;

    /// Set the media volume, `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the host rejects the call.
    fn set_volume(&self, level: f64) -> Result<(), BridgeError>;

    /// Run one planned command against the host.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying actuation.
    fn execute(&self, command: &DeviceCommand) -> Result<(), BridgeError> {
        match command {
            DeviceCommand::StartScreensaver => self.start_screensaver(),
            DeviceCommand::StopScreensaver => self.stop_screensaver(),
            DeviceCommand::SetScreenBrightness(level) => self.set_screen_brightness(*level),
            DeviceCommand::PlayMedia(url) => self.play_media(url.as_deref()),
            DeviceCommand::PauseMedia => self.pause_media(),
            DeviceCommand::SetVolume(level) => self.set_volume(*level),
            DeviceCommand::Speak(text) => self.text_to_speech(text),
        }
    }
}

impl<T: DeviceApi> DeviceApi for Arc<T> {
    fn read_snapshot(&self) -> DeviceSnapshot {
        (**self).read_snapshot()
    }

    fn live_readings(&self) -> LiveReadings {
        (**self).live_readings()
    }

    fn set_screen_brightness(&self, level: u8) -> Result<(), BridgeError> {
        (**self).set_screen_brightness(level)
    }

    fn start_screensaver(&self) -> Result<(), BridgeError> {
        (**self).start_screensaver()
    }

    fn stop_screensaver(&self) -> Result<(), BridgeError> {
        (**self).stop_screensaver()
    }

    fn text_to_speech(&self, text: &str) -> Result<(), BridgeError> {
        (**self).text_to_speech(text)
    }

    fn play_media(&self, url: Option<&str>) -> Result<(), BridgeError> {
        (**self).play_media(url)
    }

    fn pause_media(&self) -> Result<(), BridgeError> {
        (**self).pause_media()
    }

    fn set_volume(&self, level: f64) -> Result<(), BridgeError> {
        (**self).set_volume(level)
    }
}
