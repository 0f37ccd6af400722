//! Hub entities — the state strings the hub displays and where they are posted.

use serde::{Deserialize, Serialize};

/// State value reported for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubState {
    On,
    Off,
    Playing,
    Idle,
}

impl HubState {
    /// Binary sensors and lights: `true` → `on`.
    #[must_use]
    pub fn from_flag(flag: bool) -> Self {
        if flag { Self::On } else { Self::Off }
    }

    /// Media players: `true` → `playing`.
    #[must_use]
    pub fn from_playing(playing: bool) -> Self {
        if playing { Self::Playing } else { Self::Idle }
    }
}

impl std::fmt::Display for HubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Playing => f.write_str("playing"),
            Self::Idle => f.write_str("idle"),
        }
    }
}

/// Hub endpoint a push is delivered to, relative to the server URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubPath {
    /// `/api/states/{entity_id}`
    States(String),
    /// `/api/fully_kiosk/media_player/{entity_id}`
    MediaPlayer(String),
    /// `/api/room_presence/{device_id}`
    RoomPresence(String),
}

impl HubPath {
    /// The entity or device the push targets.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::States(id) | Self::MediaPlayer(id) | Self::RoomPresence(id) => id,
        }
    }
}

impl std::fmt::Display for HubPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::States(id) => write!(f, "/api/states/{id}"),
            Self::MediaPlayer(id) => write!(f, "/api/fully_kiosk/media_player/{id}"),
            Self::RoomPresence(id) => write!(f, "/api/room_presence/{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_flag_to_on_off() {
        assert_eq!(HubState::from_flag(true), HubState::On);
        assert_eq!(HubState::from_flag(false), HubState::Off);
    }

    #[test]
    fn should_map_playing_to_playing_idle() {
        assert_eq!(HubState::from_playing(true).to_string(), "playing");
        assert_eq!(HubState::from_playing(false).to_string(), "idle");
    }

    #[test]
    fn should_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&HubState::Idle).unwrap(), "\"idle\"");
    }

    #[test]
    fn should_format_state_path() {
        let path = HubPath::States("binary_sensor.kiosk_motion".into());
        assert_eq!(path.to_string(), "/api/states/binary_sensor.kiosk_motion");
    }

    #[test]
    fn should_format_media_player_path() {
        let path = HubPath::MediaPlayer("media_player.kiosk".into());
        assert_eq!(path.to_string(), "/api/fully_kiosk/media_player/media_player.kiosk");
        assert_eq!(path.target(), "media_player.kiosk");
    }

    #[test]
    fn should_format_room_presence_path() {
        let path = HubPath::RoomPresence("FDA50693".into());
        assert_eq!(path.to_string(), "/api/room_presence/FDA50693");
    }
}
