//! Event sink port — where host adapters report device events.

use std::sync::Arc;

use kiosk_bridge_domain::event::DeviceEvent;

/// Accepts device events from the host.
pub trait DeviceEventSink: Send + Sync {
    /// Forward `event` to whoever is listening. Never blocks.
    fn emit(&self, event: DeviceEvent);
}

impl<T: DeviceEventSink> DeviceEventSink for Arc<T> {
    fn emit(&self, event: DeviceEvent) {
        (**self).emit(event);
    }
}
