//! Hardware adapter: bridges the stepper driver to the domain port trait.
//!
//! Owns the concrete [`StepperDriver`] and exposes it through
//! [`StepperPort`].  The motion engine cannot act on a failed GPIO write
//! mid-step, so driver errors are counted and logged here instead of
//! being propagated into the control loop.

use log::warn;

use crate::app::ports::StepperPort;
use crate::drivers::stepper::StepperDriver;
use crate::motion::Direction;

/// Log every n-th driver fault after the first.
const FAULT_LOG_EVERY: u32 = 1000;

/// Concrete adapter that puts a stepper driver behind [`StepperPort`].
pub struct HardwareAdapter<M: StepperDriver> {
    motor: M,
    faults: u32,
}

impl<M: StepperDriver> HardwareAdapter<M> {
    pub fn new(motor: M) -> Self {
        Self { motor, faults: 0 }
    }

    /// Driver errors since boot.
    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn driver(&self) -> &M {
        &self.motor
    }

    fn record_fault(&mut self, op: &str, err: &M::Error) {
        self.faults = self.faults.saturating_add(1);
        if self.faults == 1 || self.faults % FAULT_LOG_EVERY == 0 {
            warn!("Stepper: {} failed ({:?}), {} faults so far", op, err, self.faults);
        }
    }
}

// ── StepperPort implementation ────────────────────────────────

impl<M: StepperDriver> StepperPort for HardwareAdapter<M> {
    fn step(&mut self, direction: Direction, position: i32) {
        if let Err(e) = self.motor.step(direction, position) {
            self.record_fault("step", &e);
        }
    }

    fn release(&mut self) {
        if let Err(e) = self.motor.release() {
            self.record_fault("release", &e);
        }
    }
}
