//! Hub HTTP adapter error types.

use kiosk_bridge_domain::error::{BridgeError, ValidationError};

/// Errors specific to the hub HTTP adapter.
#[derive(Debug, thiserror::Error)]
pub enum HubHttpError {
    /// The configuration was rejected.
    #[error("invalid hub configuration")]
    Config(#[from] ValidationError),

    /// The HTTP client could not be built.
    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),

    /// The request did not complete.
    #[error("request to hub failed")]
    Request(#[source] reqwest::Error),

    /// The hub answered with something other than `200 OK`.
    #[error("hub answered with status {0}")]
    Status(u16),

    /// The hub's answer was not JSON.
    #[error("hub response is not json")]
    Decode(#[source] reqwest::Error),
}

impl HubHttpError {
    /// Convert into a [`BridgeError`] for propagation across port boundaries.
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Config(err) => BridgeError::Validation(err),
            other => BridgeError::Delivery(Box::new(other)),
        }
    }
}

impl From<HubHttpError> for BridgeError {
    fn from(err: HubHttpError) -> Self {
        err.into_domain()
    }
}
