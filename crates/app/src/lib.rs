//! # kiosk-bridge-app
//!
//! Application layer — the bridge's use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `DeviceApi` — kiosk host reads and actuations
//!   - `Geolocation` — position fixes
//!   - `StatePusher` — authenticated JSON POSTs to the hub
//!   - `HubTransport` — the hub's event stream
//!   - `DeviceEventSink` — where host adapters report device events
//! - Provide the use-cases:
//!   - `StateSynchronizer` — owns device state, pushes it, runs the motion timer
//!   - `DeviceEventRouter` — device events → state updates and pushes
//!   - `HubCommandDispatcher` — hub service calls → device actuations
//!   - `bridge::start` — startup sequence and shutdown handle
//! - Provide **in-process infrastructure** (event bus, rate limiter) that
//!   doesn't need IO
//!
//! ## Dependency rule
//! Depends on `kiosk-bridge-domain` only (plus `tokio` for channels, tasks and
//! timers). Never imports adapter crates.

pub mod bridge;
pub mod device_router;
pub mod event_bus;
pub mod hub_dispatcher;
pub mod ports;
pub mod rate_limiter;
pub mod services;
pub mod timings;

#[cfg(test)]
mod test_support;
