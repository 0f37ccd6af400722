//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the bridge core and the outside world:
//! the kiosk host on one side, the hub on the other.

pub mod device;
pub mod event_sink;
pub mod geolocation;
pub mod hub;
pub mod pusher;

pub use device::DeviceApi;
pub use event_sink::DeviceEventSink;
pub use geolocation::Geolocation;
pub use hub::{HubTransport, resolve_auth_token};
pub use pusher::StatePusher;
