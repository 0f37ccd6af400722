//! Geolocation port.

use std::future::Future;
use std::sync::Arc;

use kiosk_bridge_domain::error::BridgeError;
use kiosk_bridge_domain::state::Position;

/// Acquires a position fix from the host.
pub trait Geolocation: Send + Sync {
    /// # Errors
    ///
    /// Returns [`BridgeError::Geolocation`] when no fix can be acquired.
    fn current_position(&self) -> impl Future<Output = Result<Position, BridgeError>> + Send;
}

impl<T: Geolocation> Geolocation for Arc<T> {
    fn current_position(&self) -> impl Future<Output = Result<Position, BridgeError>> + Send {
        (**self).current_position()
    }
}
