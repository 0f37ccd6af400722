//! # kiosk-bridge-domain
//!
//! Pure domain model for the kiosk ⇄ hub bridge.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - The **snapshot** (static device facts captured once) and the live
//!   **device state** (battery, screen, plug, motion, screensaver, media,
//!   position, beacon sightings)
//! - **Bindings** from logical capabilities to hub entity identifiers
//! - **Device events** as a typed enum, replacing string-named host callbacks
//! - **Hub messages** and **service calls**, including translation of a call
//!   into device commands
//! - The JSON **payload envelopes** pushed to the hub
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod beacon;
pub mod binding;
pub mod entity;
pub mod event;
pub mod hub;
pub mod payload;
pub mod service;
pub mod snapshot;
pub mod state;
