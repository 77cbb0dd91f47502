//! Actuator drivers.

pub mod stepper;
