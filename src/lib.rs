//! Hub supervisor library.
//!
//! Exposes the supervisory event loop and its building blocks for
//! integration testing and for embedding in the firmware binary. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod status;
pub mod timer;
