//! Stepper motor drivers.
//!
//! Two wirings are supported, both over `embedded-hal` output pins so the
//! same code runs on ESP-IDF GPIO and on host mocks:
//!
//! - [`FourWireDriver`]: four coil outputs through a ULN2003 darlington
//!   array (28BYJ-48 class motors), full-step two-phase-on sequence.
//! - [`StepDirDriver`]: STEP/DIR inputs of an A4988 / DRV8825 board.
//!
//! ## Coil sequence (four-wire)
//!
//! ```text
//!   position & 3 │ pin0 pin1 pin2 pin3
//!   ─────────────┼─────────────────────
//!        0       │  1    0    1    0
//!        1       │  0    1    1    0
//!        2       │  0    1    0    1
//!        3       │  1    0    0    1
//! ```
//!
//! The phase is a function of absolute position only, so reversing or
//! retargeting mid-move never skips a phase.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::motion::Direction;

/// Minimum STEP high time in microseconds (A4988 needs 1 µs).
pub const STEP_PULSE_US: u32 = 2;

/// A driver that turns engine steps into pin activity.
pub trait StepperDriver {
    type Error: core::fmt::Debug;

    /// Drive the outputs for one step.  `position` is the axis position
    /// after the step.
    fn step(&mut self, direction: Direction, position: i32) -> Result<(), Self::Error>;

    /// De-energise the outputs.
    fn release(&mut self) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Four-wire driver
// ───────────────────────────────────────────────────────────────

const PHASES: [u8; 4] = [0b0101, 0b0110, 0b1010, 0b1001];

/// Four coil outputs, full-step.
pub struct FourWireDriver<P: OutputPin> {
    pins: [P; 4],
}

impl<P: OutputPin> FourWireDriver<P> {
    /// `pins` are in sequence order.  For a ULN2003 board wired IN1..IN4
    /// that is `[IN1, IN3, IN2, IN4]`.
    pub fn new(pins: [P; 4]) -> Self {
        Self { pins }
    }

    /// Coil bitmask for an absolute position.
    pub fn phase(position: i32) -> u8 {
        PHASES[(position & 3) as usize]
    }

    fn write_mask(&mut self, mask: u8) -> Result<(), P::Error> {
        for (i, pin) in self.pins.iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }
        Ok(())
    }
}

impl<P: OutputPin> StepperDriver for FourWireDriver<P> {
    type Error = P::Error;

    fn step(&mut self, _direction: Direction, position: i32) -> Result<(), Self::Error> {
        self.write_mask(Self::phase(position))
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.write_mask(0)
    }
}

// ───────────────────────────────────────────────────────────────
// Step / direction driver
// ───────────────────────────────────────────────────────────────

/// STEP and DIR outputs of a dedicated driver board.
pub struct StepDirDriver<S, D, T> {
    step: S,
    dir: D,
    delay: T,
    /// Level currently on DIR; `None` until the first step.
    direction: Option<Direction>,
}

impl<S, D, T> StepDirDriver<S, D, T>
where
    S: OutputPin,
    D: OutputPin<Error = S::Error>,
    T: DelayNs,
{
    pub fn new(step: S, dir: D, delay: T) -> Self {
        Self {
            step,
            dir,
            delay,
            direction: None,
        }
    }
}

impl<S, D, T> StepperDriver for StepDirDriver<S, D, T>
where
    S: OutputPin,
    D: OutputPin<Error = S::Error>,
    T: DelayNs,
{
    type Error = S::Error;

    fn step(&mut self, direction: Direction, _position: i32) -> Result<(), Self::Error> {
        if self.direction != Some(direction) {
            match direction {
                Direction::Forward => self.dir.set_high()?,
                Direction::Reverse => self.dir.set_low()?,
            }
            self.direction = Some(direction);
        }
        self.step.set_high()?;
        self.delay.delay_us(STEP_PULSE_US);
        self.step.set_low()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.step.set_low()
    }
}
