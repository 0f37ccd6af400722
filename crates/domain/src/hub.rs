//! Hub messages — the `{type, event}` envelopes delivered by the hub transport.

use serde::{Deserialize, Serialize};

/// Event types the bridge subscribes to on the hub.
pub const CALL_SERVICE: &str = "call_service";
pub const STATE_CHANGED: &str = "state_changed";

/// One message from the hub event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<HubEvent>,
}

impl HubMessage {
    /// Build an `event` message, mostly useful for transports and tests.
    #[must_use]
    pub fn event(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: "event".to_string(),
            event: Some(HubEvent {
                event_type: event_type.into(),
                data,
            }),
        }
    }

    #[must_use]
    pub fn is_event(&self) -> bool {
        self.kind == "event"
    }
}

/// A hub event; `data` is interpreted according to `event_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The hub event kinds the dispatcher acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubEventKind {
    StateChanged,
    CallService,
}

impl HubEvent {
    /// `None` for event types the bridge ignores.
    #[must_use]
    pub fn kind(&self) -> Option<HubEventKind> {
        match self.event_type.as_str() {
            STATE_CHANGED => Some(HubEventKind::StateChanged),
            CALL_SERVICE => Some(HubEventKind::CallService),
            _ => None,
        }
    }
}
