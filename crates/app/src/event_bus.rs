//! In-process device event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use kiosk_bridge_domain::event::DeviceEvent;

use crate::ports::DeviceEventSink;

/// Delivers device events from host adapters to the router.
///
/// Emitting succeeds even when nobody is subscribed (the event is simply
/// dropped). Subscribers see events in emission order.
#[derive(Clone)]
pub struct DeviceEventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl DeviceEventBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receiver for every event emitted *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }
}

impl DeviceEventSink for DeviceEventBus {
    fn emit(&self, event: DeviceEvent) {
        // fails only when there are zero receivers
        let _ = self.sender.send(event);
    }
}
