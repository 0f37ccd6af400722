//! Payload envelopes pushed to the hub.
//!
//! The attribute names are what the hub's entity cards read, so they are kept
//! verbatim, including their mixed casing.

use serde::Serialize;

use crate::beacon::BeaconSighting;
use crate::entity::HubState;
use crate::snapshot::DeviceSnapshot;
use crate::state::DeviceState;
use crate::time::Timestamp;

/// Body of a state push: `{state, brightness, attributes}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatePayload {
    pub state: HubState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    pub attributes: Attributes,
}

/// Static snapshot facts merged with live state facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_content_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_brightness: Option<u8>,
    #[serde(rename = "currentlocale", skip_serializing_if = "Option::is_none")]
    pub current_locale: Option<String>,
    #[serde(rename = "startUrl", skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    #[serde(rename = "wifiSSID", skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<String>,
    #[serde(rename = "wifiSignalLevel", skip_serializing_if = "Option::is_none")]
    pub wifi_signal_level: Option<i32>,
    #[serde(rename = "serialNumber", skip_serializing_if = "Option::is_none")]
    pub serial_number_legacy: Option<String>,
    #[serde(rename = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id_legacy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(rename = "fullyVersion", skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(rename = "webViewVersion", skip_serializing_if = "Option::is_none")]
    pub webview_version: Option<String>,
    #[serde(rename = "androidVersion", skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(rename = "androidSDK", skip_serializing_if = "Option::is_none")]
    pub os_sdk: Option<String>,
    #[serde(rename = "deviceModel", skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(rename = "_isScreenOn")]
    pub is_screen_on: bool,
    #[serde(rename = "_isPluggedIn")]
    pub is_plugged_in: bool,
    #[serde(rename = "_isMotionDetected")]
    pub is_motion_detected: bool,
    #[serde(rename = "_lastMotionDetected", skip_serializing_if = "Option::is_none")]
    pub last_motion_detected: Option<Timestamp>,
    #[serde(rename = "_isScreensaverOn")]
    pub is_screensaver_on: bool,
    #[serde(rename = "_latitude", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(rename = "_longitude", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// JSON-encoded list of every known beacon sighting.
    #[serde(rename = "_beacons")]
    pub beacons: String,
}

impl StatePayload {
    /// Build the envelope for one entity from the snapshot and current state.
    #[must_use]
    pub fn new(state: HubState, snapshot: &DeviceSnapshot, device: &DeviceState) -> Self {
        Self {
            state,
            brightness: device.screen_brightness,
            attributes: Attributes::new(snapshot, device),
        }
    }
}

impl Attributes {
    #[must_use]
    pub fn new(snapshot: &DeviceSnapshot, device: &DeviceState) -> Self {
        Self {
            volume_level: device.media.volume_level,
            media_content_id: device.media.media_content_id.clone(),
            address: snapshot.ip_v4.clone(),
            mac_address: snapshot.mac_address.clone(),
            serial_number: snapshot.serial_number.clone(),
            device_id: snapshot.device_id.clone(),
            battery_level: device.battery_level,
            screen_brightness: device.screen_brightness,
            current_locale: snapshot.locale.clone(),
            start_url: snapshot.start_url.clone(),
            wifi_ssid: snapshot.wifi_ssid.clone(),
            wifi_signal_level: snapshot.wifi_signal_level,
            serial_number_legacy: snapshot.serial_number.clone(),
            device_id_legacy: snapshot.device_id.clone(),
            hostname: snapshot.hostname.clone(),
            app_version: snapshot.app_version.clone(),
            webview_version: snapshot.webview_version.clone(),
            os_version: snapshot.os_version.clone(),
            os_sdk: snapshot.os_sdk.clone(),
            device_model: snapshot.device_model.clone(),
            is_screen_on: device.screen_on,
            is_plugged_in: device.plugged_in,
            is_motion_detected: device.motion_detected,
            last_motion_detected: device.last_motion,
            is_screensaver_on: device.screensaver_on,
            latitude: device.position.map(|p| p.latitude),
            longitude: device.position.map(|p| p.longitude),
            beacons: device.beacons.to_json_list(),
        }
    }
}

/// Body of a room-presence push for one beacon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresencePayload {
    pub room: String,
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl PresencePayload {
    #[must_use]
    pub fn new(room: &str, sighting: &BeaconSighting, device: &DeviceState) -> Self {
        Self {
            room: room.to_string(),
            uuid: sighting.uuid.clone(),
            major: sighting.major.clone(),
            minor: sighting.minor.clone(),
            distance: sighting.distance,
            latitude: device.position.map(|p| p.latitude),
            longitude: device.position.map(|p| p.longitude),
        }
    }
}
