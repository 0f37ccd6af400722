//! Entity bindings — which hub entity each kiosk capability reports to.
//!
//! An absent binding disables that capability's push and dispatch paths.
//! This is not an error.

use serde::Deserialize;

use crate::error::ValidationError;

/// A logical capability of the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Motion,
    Plugged,
    Screensaver,
    MediaPlayer,
    Presence,
}

impl Capability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motion => "motion_sensor",
            Self::Plugged => "plugged_sensor",
            Self::Screensaver => "screensaver_light",
            Self::MediaPlayer => "media_player",
            Self::Presence => "presence",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static mapping from capabilities to hub entity ids.
///
/// Presence is bound by the room name in
/// [`DeviceSnapshot::location_name`](crate::snapshot::DeviceSnapshot::location_name)
/// rather than an entity id, since the presence endpoint is keyed by beacon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntityBindings {
    pub motion_sensor: Option<String>,
    pub plugged_sensor: Option<String>,
    pub screensaver_light: Option<String>,
    pub media_player: Option<String>,
}

impl EntityBindings {
    /// Entity bound to `capability`, if any.
    #[must_use]
    pub fn entity_for(&self, capability: Capability) -> Option<&str> {
        match capability {
            Capability::Motion => self.motion_sensor.as_deref(),
            Capability::Plugged => self.plugged_sensor.as_deref(),
            Capability::Screensaver => self.screensaver_light.as_deref(),
            Capability::MediaPlayer => self.media_player.as_deref(),
            Capability::Presence => None,
        }
    }

    /// Check every configured id is non-empty and shaped `domain.object_id`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let bound = [
            (Capability::Motion, &self.motion_sensor),
            (Capability::Plugged, &self.plugged_sensor),
            (Capability::Screensaver, &self.screensaver_light),
            (Capability::MediaPlayer, &self.media_player),
        ];
        for (capability, entity_id) in bound {
            let Some(entity_id) = entity_id else {
                continue;
            };
            if entity_id.trim().is_empty() {
                return Err(ValidationError::EmptyEntityId {
                    capability: capability.as_str(),
                });
            }
            match entity_id.split_once('.') {
                Some((domain, object)) if !domain.is_empty() && !object.is_empty() => {}
                _ => {
                    return Err(ValidationError::MalformedEntityId {
                        entity_id: entity_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> EntityBindings {
        EntityBindings {
            motion_sensor: Some("binary_sensor.kiosk_motion".into()),
            plugged_sensor: Some("binary_sensor.kiosk_plugged".into()),
            screensaver_light: Some("light.kiosk_screensaver".into()),
            media_player: Some("media_player.kiosk".into()),
        }
    }

    #[test]
    fn should_resolve_bound_entities() {
        let bindings = full();
        assert_eq!(
            bindings.entity_for(Capability::Screensaver),
            Some("light.kiosk_screensaver")
        );
        assert_eq!(bindings.entity_for(Capability::Presence), None);
    }

    #[test]
    fn should_treat_missing_binding_as_disabled() {
        let bindings = EntityBindings::default();
        assert_eq!(bindings.entity_for(Capability::Motion), None);
        assert!(bindings.validate().is_ok());
    }

    #[test]
    fn should_accept_well_formed_ids() {
        assert!(full().validate().is_ok());
    }

    #[test]
    fn should_reject_empty_id() {
        let bindings = EntityBindings {
            plugged_sensor: Some("  ".into()),
            ..EntityBindings::default()
        };
        assert_eq!(
            bindings.validate(),
            Err(ValidationError::EmptyEntityId {
                capability: "plugged_sensor"
            })
        );
    }

    #[test]
    fn should_reject_id_without_domain() {
        let bindings = EntityBindings {
            media_player: Some("kiosk".into()),
            ..EntityBindings::default()
        };
        assert!(matches!(
            bindings.validate(),
            Err(ValidationError::MalformedEntityId { .. })
        ));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            motion_sensor = "binary_sensor.hall_motion"
            media_player = "media_player.hall"
        "#;
        let bindings: EntityBindings = toml::from_str(toml).unwrap();
        assert_eq!(bindings.motion_sensor.as_deref(), Some("binary_sensor.hall_motion"));
        assert_eq!(bindings.media_player.as_deref(), Some("media_player.hall"));
        assert_eq!(bindings.plugged_sensor, None);
    }
}
