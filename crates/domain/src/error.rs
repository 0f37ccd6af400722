//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! when crossing a port boundary.

use std::error::Error as StdError;

/// Boxed error coming from an adapter or collaborator.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Configuration rejected before anything was scheduled.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A hub service call did not have the expected shape.
    #[error("malformed service call")]
    MalformedServiceCall(#[from] MalformedServiceCall),

    /// The hub transport is not ready to accept subscriptions yet.
    #[error("hub transport not ready")]
    TransportNotReady,

    /// The hub transport failed.
    #[error("hub transport error")]
    Transport(#[source] BoxError),

    /// The current position could not be acquired.
    #[error("geolocation unavailable")]
    Geolocation(#[source] BoxError),

    /// A state push did not reach the hub or was refused.
    #[error("state delivery failed")]
    Delivery(#[source] BoxError),

    /// The device refused or failed an actuation.
    #[error("device error")]
    Device(#[source] BoxError),
}

/// Configuration invariants violated at load or construction time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An entity binding was configured with an empty identifier.
    #[error("entity id for {capability} must not be empty")]
    EmptyEntityId {
        /// Capability the binding belongs to.
        capability: &'static str,
    },

    /// An entity identifier lacks the `domain.object_id` shape.
    #[error("entity id {entity_id:?} must look like `domain.object_id`")]
    MalformedEntityId {
        /// The offending identifier.
        entity_id: String,
    },

    /// The hub server URL is not an absolute http(s) URL.
    #[error("server url {0:?} must be an absolute http(s) url")]
    InvalidServerUrl(String),

    /// A duration setting was zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// A rate limiter was configured with neither edge enabled.
    #[error("rate limiter must fire on the leading edge, the trailing edge, or both")]
    NoEdgeEnabled,
}

/// Reasons a `call_service` event could not be translated into commands.
#[derive(Debug, thiserror::Error)]
pub enum MalformedServiceCall {
    /// The event data could not be decoded at all.
    #[error("failed to decode service call")]
    Decode(#[source] serde_json::Error),

    /// A field the service requires is missing.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field is present but has the wrong type or range.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Dotted path of the field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}
