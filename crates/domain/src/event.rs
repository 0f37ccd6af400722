//! Device events — what the kiosk host reports, as a typed enum.
//!
//! Host adapters translate the host's named callbacks into [`DeviceEvent`]s;
//! [`DeviceEventKind`] parses those names so no string-keyed dispatch leaks
//! past the adapter.

use std::str::FromStr;

use crate::time::Timestamp;

/// Raw iBeacon proximity reading.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconReading {
    pub uuid: String,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub distance: f64,
}

/// Something that happened on the device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    ScreenOn,
    ScreenOff,
    NetworkDisconnect,
    NetworkReconnect,
    InternetDisconnect,
    InternetReconnect,
    Unplugged,
    PluggedAc,
    PluggedUsb,
    ScreensaverStart,
    ScreensaverStop,
    BatteryLevelChanged,
    /// Camera motion; the host emits at most one per second.
    Motion { at: Timestamp },
    /// Accelerometer movement; only meaningful when geolocation is available.
    Movement,
    IBeacon(BeaconReading),
    AudioPlaying {
        media_content_id: Option<String>,
    },
    AudioPaused,
    AudioEnded,
    AudioVolumeChanged { level: f64 },
}

impl DeviceEvent {
    #[must_use]
    pub fn kind(&self) -> DeviceEventKind {
        match self {
            Self::ScreenOn => DeviceEventKind::ScreenOn,
            Self::ScreenOff => DeviceEventKind::ScreenOff,
            Self::NetworkDisconnect => DeviceEventKind::NetworkDisconnect,
            Self::NetworkReconnect => DeviceEventKind::NetworkReconnect,
            Self::InternetDisconnect => DeviceEventKind::InternetDisconnect,
            Self::InternetReconnect => DeviceEventKind::InternetReconnect,
            Self::Unplugged => DeviceEventKind::Unplugged,
            Self::PluggedAc => DeviceEventKind::PluggedAc,
            Self::PluggedUsb => DeviceEventKind::PluggedUsb,
            Self::ScreensaverStart => DeviceEventKind::ScreensaverStart,
            Self::ScreensaverStop => DeviceEventKind::ScreensaverStop,
            Self::BatteryLevelChanged => DeviceEventKind::BatteryLevelChanged,
            Self::Motion { .. } => DeviceEventKind::Motion,
            Self::Movement => DeviceEventKind::Movement,
            Self::IBeacon(_) => DeviceEventKind::IBeacon,
            Self::AudioPlaying { .. } => DeviceEventKind::AudioPlaying,
            Self::AudioPaused => DeviceEventKind::AudioPaused,
            Self::AudioEnded => DeviceEventKind::AudioEnded,
            Self::AudioVolumeChanged { .. } => DeviceEventKind::AudioVolumeChanged,
        }
    }
}

impl DeviceEvent {
    /// Build the event for a kind the host reports without payload.
    ///
    /// Motion is stamped with `at`, and audio playback resumes the current
    /// media. Returns `None` for beacon sightings and volume changes, which
    /// cannot be told apart without their readings.
    #[must_use]
    pub fn without_payload(kind: DeviceEventKind, at: Timestamp) -> Option<Self> {
        let event = match kind {
            DeviceEventKind::ScreenOn => Self::ScreenOn,
            DeviceEventKind::ScreenOff => Self::ScreenOff,
            DeviceEventKind::NetworkDisconnect => Self::NetworkDisconnect,
            DeviceEventKind::NetworkReconnect => Self::NetworkReconnect,
            DeviceEventKind::InternetDisconnect => Self::InternetDisconnect,
            DeviceEventKind::InternetReconnect => Self::InternetReconnect,
            DeviceEventKind::Unplugged => Self::Unplugged,
            DeviceEventKind::PluggedAc => Self::PluggedAc,
            DeviceEventKind::PluggedUsb => Self::PluggedUsb,
            DeviceEventKind::ScreensaverStart => Self::ScreensaverStart,
            DeviceEventKind::ScreensaverStop => Self::ScreensaverStop,
            DeviceEventKind::BatteryLevelChanged => Self::BatteryLevelChanged,
            DeviceEventKind::Motion => Self::Motion { at },
            DeviceEventKind::Movement => Self::Movement,
            DeviceEventKind::AudioPlaying => Self::AudioPlaying {
                media_content_id: None,
            },
            DeviceEventKind::AudioPaused => Self::AudioPaused,
            DeviceEventKind::AudioEnded => Self::AudioEnded,
            DeviceEventKind::IBeacon | DeviceEventKind::AudioVolumeChanged => return None,
        };
        Some(event)
    }
}

/// Payload-free discriminant of [`DeviceEvent`], used as a handler table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceEventKind {
    ScreenOn,
    ScreenOff,
    NetworkDisconnect,
    NetworkReconnect,
    InternetDisconnect,
    InternetReconnect,
    Unplugged,
    PluggedAc,
    PluggedUsb,
    ScreensaverStart,
    ScreensaverStop,
    BatteryLevelChanged,
    Motion,
    Movement,
    IBeacon,
    AudioPlaying,
    AudioPaused,
    AudioEnded,
    AudioVolumeChanged,
}

impl DeviceEventKind {
    pub const ALL: [Self; 19] = [
        Self::ScreenOn,
        Self::ScreenOff,
        Self::NetworkDisconnect,
        Self::NetworkReconnect,
        Self::InternetDisconnect,
        Self::InternetReconnect,
        Self::Unplugged,
        Self::PluggedAc,
        Self::PluggedUsb,
        Self::ScreensaverStart,
        Self::ScreensaverStop,
        Self::BatteryLevelChanged,
        Self::Motion,
        Self::Movement,
        Self::IBeacon,
        Self::AudioPlaying,
        Self::AudioPaused,
        Self::AudioEnded,
        Self::AudioVolumeChanged,
    ];

    /// Name the host API binds this event under.
    #[must_use]
    pub fn host_name(self) -> &'static str {
        match self {
            Self::ScreenOn => "screenOn",
            Self::ScreenOff => "screenOff",
            Self::NetworkDisconnect => "networkDisconnect",
            Self::NetworkReconnect => "networkReconnect",
            Self::InternetDisconnect => "internetDisconnect",
            Self::InternetReconnect => "internetReconnect",
            Self::Unplugged => "unplugged",
            Self::PluggedAc => "pluggedAC",
            Self::PluggedUsb => "pluggedUSB",
            Self::ScreensaverStart => "onScreensaverStart",
            Self::ScreensaverStop => "onScreensaverStop",
            Self::BatteryLevelChanged => "onBatteryLevelChanged",
            Self::Motion => "onMotion",
            Self::Movement => "onMovement",
            Self::IBeacon => "onIBeacon",
            Self::AudioPlaying => "audioPlaying",
            Self::AudioPaused => "audioPause",
            Self::AudioEnded => "audioEnded",
            Self::AudioVolumeChanged => "audioVolumeChange",
        }
    }
}

/// The host reported an event name this bridge does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device event {0:?}")]
pub struct UnknownDeviceEvent(pub String);

impl FromStr for DeviceEventKind {
    type Err = UnknownDeviceEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.host_name() == s)
            .ok_or_else(|| UnknownDeviceEvent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_host_event_names() {
        assert_eq!("pluggedAC".parse(), Ok(DeviceEventKind::PluggedAc));
        assert_eq!("onIBeacon".parse(), Ok(DeviceEventKind::IBeacon));
        assert_eq!("onScreensaverStop".parse(), Ok(DeviceEventKind::ScreensaverStop));
    }

    #[test]
    fn should_reject_unknown_event_name() {
        let err = "onTeleport".parse::<DeviceEventKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown device event \"onTeleport\"");
    }

    #[test]
    fn should_give_every_kind_a_distinct_host_name() {
        let mut names: Vec<_> = DeviceEventKind::ALL.iter().map(|k| k.host_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DeviceEventKind::ALL.len());
    }

    #[test]
    fn should_rebuild_payload_free_events_from_kind() {
        let at = crate::time::now();
        for kind in DeviceEventKind::ALL {
            match DeviceEvent::without_payload(kind, at) {
                Some(event) => assert_eq!(event.kind(), kind),
                None => assert!(matches!(
                    kind,
                    DeviceEventKind::IBeacon | DeviceEventKind::AudioVolumeChanged
                )),
            }
        }
        assert_eq!(
            DeviceEvent::without_payload(DeviceEventKind::Motion, at),
            Some(DeviceEvent::Motion { at })
        );
    }

    #[test]
    fn should_report_kind_of_payload_events() {
        let beacon = DeviceEvent::IBeacon(BeaconReading {
            uuid: "abc".into(),
            major: None,
            minor: None,
            distance: 2.0,
        });
        assert_eq!(beacon.kind(), DeviceEventKind::IBeacon);
        assert_eq!(
            DeviceEvent::Motion { at: crate::time::now() }.kind(),
            DeviceEventKind::Motion
        );
    }
}
