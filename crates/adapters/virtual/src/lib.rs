//! # kiosk-bridge-adapter-virtual
//!
//! Simulated collaborators for testing and demonstration.
//!
//! ## Provided adapters
//!
//! | Adapter | Ports | Behaviour |
//! |---------|-------|-----------|
//! | [`VirtualKiosk`] | `DeviceApi`, `Geolocation` | Holds configurable readings, records actuations and echoes them back as device events |
//! | [`VirtualHubTransport`] | `HubTransport` | In-process event stream; messages are injected by the caller |
//!
//! ## Dependency rule
//!
//! Depends on `kiosk-bridge-app` (port traits) and `kiosk-bridge-domain` only.

mod config;
mod hub;
mod kiosk;

pub use config::VirtualDeviceConfig;
pub use hub::VirtualHubTransport;
pub use kiosk::VirtualKiosk;

use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
