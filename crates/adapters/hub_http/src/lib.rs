//! # kiosk-bridge-adapter-hub-http
//!
//! Hub HTTP adapter — implements the `StatePusher` port on top of `reqwest`.
//!
//! ## Responsibilities
//! - POST state and presence payloads to `{server_url}{path}`
//! - Authenticate with a bearer token
//! - Treat anything but `200` with a JSON body as a failed delivery
//!
//! ## Dependency rule
//! Depends on `kiosk-bridge-app` (for the port trait) and `kiosk-bridge-domain`.

pub mod config;
pub mod error;
mod pusher;

pub use config::HubHttpConfig;
pub use error::HubHttpError;
pub use pusher::HttpStatePusher;
