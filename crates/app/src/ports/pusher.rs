//! State pusher port — authenticated JSON POSTs to the hub.

use std::future::Future;
use std::sync::Arc;

use kiosk_bridge_domain::entity::HubPath;
use kiosk_bridge_domain::error::BridgeError;

/// Delivers state and presence payloads to the hub's REST API.
pub trait StatePusher: Send + Sync {
    /// POST `body` to `path`, returning the hub's JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Delivery`] on transport failure, a non-200
    /// status, or a response that is not JSON.
    fn push(
        &self,
        path: HubPath,
        body: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, BridgeError>> + Send;
}

impl<T: StatePusher> StatePusher for Arc<T> {
    fn push(
        &self,
        path: HubPath,
        body: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, BridgeError>> + Send {
        (**self).push(path, body)
    }
}
