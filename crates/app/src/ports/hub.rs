//! Hub transport port — the hub's event stream.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::hub::HubMessage;

/// Connection to the hub's event stream (websocket or equivalent).
pub trait HubTransport: Send + Sync {
    /// Whether the connection is up and authenticated.
    fn is_ready(&self) -> bool;

    /// Ask the hub to deliver events of `event_type`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TransportNotReady`] before the transport is
    /// ready, or [`BridgeError::Transport`] when the hub refuses.
    fn subscribe_events(
        &self,
        event_type: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Every message received from the hub from now on, in order.
    fn messages(&self) -> broadcast::Receiver<HubMessage>;

    /// Token the transport authenticated with, if it exposes one.
    fn access_token(&self) -> Option<String> {
        None
    }
}

impl<T: HubTransport> HubTransport for Arc<T> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn subscribe_events(
        &self,
        event_type: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).subscribe_events(event_type)
    }

    fn messages(&self) -> broadcast::Receiver<HubMessage> {
        (**self).messages()
    }

    fn access_token(&self) -> Option<String> {
        (**self).access_token()
    }
}

/// Pick the bearer token for state pushes: the configured one, else the
/// transport's ambient one.
#[must_use]
pub fn resolve_auth_token(configured: Option<String>, transport: &impl HubTransport) -> Option<String> {
    configured
        .filter(|token| !token.is_empty())
        .or_else(|| transport.access_token())
}
