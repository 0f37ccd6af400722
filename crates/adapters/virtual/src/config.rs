//! Settings of the simulated kiosk (`[device]` section).

use serde::Deserialize;

use kiosk_bridge_domain::snapshot::DeviceSnapshot;
use kiosk_bridge_domain::state::{LiveReadings, Position};

/// What the virtual kiosk reports about itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VirtualDeviceConfig {
    pub device_id: String,
    pub device_model: String,
    pub hostname: String,
    pub app_version: String,
    pub start_url: Option<String>,
    pub battery_level: u8,
    pub screen_brightness: u8,
    pub plugged_in: bool,
    /// Fixed position; geolocation is reported unsupported unless both
    /// coordinates are set.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for VirtualDeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "virtual-kiosk".to_string(),
            device_model: "Virtual Kiosk".to_string(),
            hostname: "virtual-kiosk.local".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            start_url: None,
            battery_level: 100,
            screen_brightness: 128,
            plugged_in: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl VirtualDeviceConfig {
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        Some(Position {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            start_url: self.start_url.clone(),
            device_id: Some(self.device_id.clone()),
            hostname: Some(self.hostname.clone()),
            app_version: Some(self.app_version.clone()),
            device_model: Some(self.device_model.clone()),
            supports_geolocation: self.position().is_some(),
            ..DeviceSnapshot::default()
        }
    }

    #[must_use]
    pub fn readings(&self) -> LiveReadings {
        LiveReadings {
            battery_level: Some(self.battery_level),
            screen_brightness: Some(self.screen_brightness),
            screen_on: true,
            plugged_in: self.plugged_in,
        }
    }
}
