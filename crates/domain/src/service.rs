//! Service calls — hub commands and their translation into device commands.
//!
//! A `call_service` event names a `domain` and `service` and carries a free-form
//! `service_data` object. [`ServiceCall::plan`] matches the call against the
//! configured [`EntityBindings`] and yields the [`DeviceCommand`]s to run.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::binding::EntityBindings;
use crate::error::MalformedServiceCall;

/// TTS services the kiosk speaks for.
pub const TTS_SERVICES: [&str; 3] = ["google_say", "cloud_say", "speak"];

/// A decoded `call_service` event payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    #[serde(default)]
    pub service_data: Option<Map<String, Value>>,
}

/// `service_data.entity_id`: a single id or a list of ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EntityTarget {
    One(String),
    Many(Vec<String>),
}

impl EntityTarget {
    /// Whether `entity_id` is (one of) the targets.
    #[must_use]
    pub fn matches(&self, entity_id: &str) -> bool {
        match self {
            Self::One(id) => id == entity_id,
            Self::Many(ids) => ids.iter().any(|id| id == entity_id),
        }
    }
}

/// An actuation on the kiosk.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    StartScreensaver,
    StopScreensaver,
    SetScreenBrightness(u8),
    /// `None` resumes the current media.
    PlayMedia(Option<String>),
    PauseMedia,
    SetVolume(f64),
    Speak(String),
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartScreensaver => f.write_str("start screensaver"),
            Self::StopScreensaver => f.write_str("stop screensaver"),
            Self::SetScreenBrightness(level) => write!(f, "set screen brightness to {level}"),
            Self::PlayMedia(Some(url)) => write!(f, "play media {url}"),
            Self::PlayMedia(None) => f.write_str("resume media"),
            Self::PauseMedia => f.write_str("pause media"),
            Self::SetVolume(level) => write!(f, "set volume to {level}"),
            Self::Speak(text) => write!(f, "speak {text:?}"),
        }
    }
}

/// Outcome of matching a service call against the bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicePlan {
    pub commands: Vec<DeviceCommand>,
    /// Set when the call targets a bound entity with a service the kiosk
    /// cannot perform.
    pub unsupported: Option<String>,
}

impl ServicePlan {
    fn run(commands: Vec<DeviceCommand>) -> Self {
        Self {
            commands,
            unsupported: None,
        }
    }

    fn unsupported(service: &str) -> Self {
        Self {
            commands: Vec::new(),
            unsupported: Some(service.to_string()),
        }
    }

    /// Nothing to run and nothing to report.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.commands.is_empty() && self.unsupported.is_none()
    }
}

impl ServiceCall {
    /// Decode the `data` of a `call_service` event.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedServiceCall::Decode`] when `domain` or `service`
    /// is missing or not a string.
    pub fn from_event_data(data: &Value) -> Result<Self, MalformedServiceCall> {
        Self::deserialize(data).map_err(MalformedServiceCall::Decode)
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.service_data
            .as_ref()
            .and_then(|data| data.get(name))
            .filter(|value| !value.is_null())
    }

    /// The targeted entity or entities.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedServiceCall`] if `service_data.entity_id` is
    /// missing or neither a string nor a list of strings.
    pub fn target(&self) -> Result<EntityTarget, MalformedServiceCall> {
        let value = self
            .field("entity_id")
            .ok_or(MalformedServiceCall::MissingField("service_data.entity_id"))?;
        EntityTarget::deserialize(value).map_err(|_| MalformedServiceCall::InvalidField {
            field: "service_data.entity_id",
            reason: "must be a string or a list of strings",
        })
    }

    /// Translate the call into device commands for the bound entities.
    ///
    /// Calls for unbound capabilities or other entities yield an empty plan.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedServiceCall`] when a field the matched service
    /// needs is missing or out of range.
    pub fn plan(&self, bindings: &EntityBindings) -> Result<ServicePlan, MalformedServiceCall> {
        match self.domain.as_str() {
            "light" => match bindings.screensaver_light.as_deref() {
                Some(entity_id) => self.plan_screensaver(entity_id),
                None => Ok(ServicePlan::default()),
            },
            "media_player" => match bindings.media_player.as_deref() {
                Some(entity_id) => self.plan_media_player(entity_id),
                None => Ok(ServicePlan::default()),
            },
            "tts" if TTS_SERVICES.contains(&self.service.as_str()) => {
                match bindings.media_player.as_deref() {
                    Some(entity_id) => self.plan_speech(entity_id),
                    None => Ok(ServicePlan::default()),
                }
            }
            _ => Ok(ServicePlan::default()),
        }
    }

    fn plan_screensaver(&self, entity_id: &str) -> Result<ServicePlan, MalformedServiceCall> {
        if !self.target()?.matches(entity_id) {
            return Ok(ServicePlan::default());
        }
        let mut commands = Vec::new();
        match self.service.as_str() {
            "turn_on" => commands.push(DeviceCommand::StartScreensaver),
            "turn_off" => commands.push(DeviceCommand::StopScreensaver),
            _ => {}
        }
        if let Some(level) = self.brightness()? {
            commands.push(DeviceCommand::SetScreenBrightness(level));
        }
        Ok(ServicePlan::run(commands))
    }

    fn plan_media_player(&self, entity_id: &str) -> Result<ServicePlan, MalformedServiceCall> {
        if !self.target()?.matches(entity_id) {
            return Ok(ServicePlan::default());
        }
        let command = match self.service.as_str() {
            "play_media" => DeviceCommand::PlayMedia(Some(
                self.string_field("media_content_id", "service_data.media_content_id")?,
            )),
            "media_play" => DeviceCommand::PlayMedia(None),
            "media_pause" | "media_stop" => DeviceCommand::PauseMedia,
            "volume_set" => DeviceCommand::SetVolume(self.volume_level()?),
            other => return Ok(ServicePlan::unsupported(other)),
        };
        Ok(ServicePlan::run(vec![command]))
    }

    fn plan_speech(&self, entity_id: &str) -> Result<ServicePlan, MalformedServiceCall> {
        if !self.target()?.matches(entity_id) {
            return Ok(ServicePlan::default());
        }
        let message = self.string_field("message", "service_data.message")?;
        Ok(ServicePlan::run(vec![DeviceCommand::Speak(message)]))
    }

    fn string_field(
        &self,
        name: &str,
        path: &'static str,
    ) -> Result<String, MalformedServiceCall> {
        match self.field(name) {
            None => Err(MalformedServiceCall::MissingField(path)),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(_) => Err(MalformedServiceCall::InvalidField {
                field: path,
                reason: "must be a string",
            }),
        }
    }

    fn brightness(&self) -> Result<Option<u8>, MalformedServiceCall> {
        const INVALID: MalformedServiceCall = MalformedServiceCall::InvalidField {
            field: "service_data.brightness",
            reason: "must be a number between 0 and 255",
        };
        let Some(value) = self.field("brightness") else {
            return Ok(None);
        };
        let level = value.as_f64().ok_or(INVALID)?;
        if !(0.0..=255.0).contains(&level) {
            return Err(INVALID);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Some(level.round() as u8))
    }

    fn volume_level(&self) -> Result<f64, MalformedServiceCall> {
        let value = self
            .field("volume_level")
            .ok_or(MalformedServiceCall::MissingField("service_data.volume_level"))?;
        value
            .as_f64()
            .filter(|level| (0.0..=1.0).contains(level))
            .ok_or(MalformedServiceCall::InvalidField {
                field: "service_data.volume_level",
                reason: "must be a number between 0 and 1",
            })
    }
}
