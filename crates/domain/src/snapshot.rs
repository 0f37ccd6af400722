//! Device snapshot — static facts captured once at startup.

use serde::{Deserialize, Serialize};

/// Identity, network and software facts read from the device API at startup.
///
/// The snapshot is created exactly once per process and never mutated
/// afterwards. Live values (battery, brightness, …) belong to
/// [`DeviceState`](crate::state::DeviceState).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub start_url: Option<String>,
    pub locale: Option<String>,
    pub ip_v4: Option<String>,
    pub ip_v6: Option<String>,
    pub mac_address: Option<String>,
    pub wifi_ssid: Option<String>,
    pub wifi_signal_level: Option<i32>,
    pub serial_number: Option<String>,
    pub device_id: Option<String>,
    pub hostname: Option<String>,
    pub app_version: Option<String>,
    pub webview_version: Option<String>,
    pub os_version: Option<String>,
    pub os_sdk: Option<String>,
    pub device_model: Option<String>,
    /// Whether the host can acquire a geolocation fix.
    pub supports_geolocation: bool,
    /// Room name used for presence reports, when presence detection is on.
    pub location_name: Option<String>,
}

impl DeviceSnapshot {
    /// Whether beacon sightings should be reported as room presence.
    #[must_use]
    pub fn has_presence_location(&self) -> bool {
        self.location_name.as_deref().is_some_and(|name| !name.is_empty())
    }

    /// Attach the configured presence location to facts read from the device.
    #[must_use]
    pub fn with_location_name(mut self, location_name: Option<String>) -> Self {
        self.location_name = location_name;
        self
    }
}
