//! Light node firmware library.
//!
//! Exposes the application task and its building blocks for integration
//! testing. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod indicator;
pub mod reboot_guard;

pub mod pins;

// Board-facing modules; the real implementations are cfg-gated inside.
pub mod adapters;
pub mod drivers;
