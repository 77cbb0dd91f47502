//! LNA focuser firmware library.
//!
//! Exposes the motion engine, the command dispatcher and both transport
//! bindings for integration testing and fuzzing.  All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod bindings;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod motion;
pub mod pins;

pub mod adapters;
pub mod drivers;

