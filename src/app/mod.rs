//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the focuser's command model and the service that
//! owns the motion engine.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
