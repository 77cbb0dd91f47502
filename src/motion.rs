//! Single-axis motion engine.
//!
//! Owns the focuser's kinematic state and advances it by at most one step
//! per [`MotionEngine::tick`].  Speed follows a trapezoidal profile using
//! the per-step interval recurrence from D. Austin, "Generate stepper-motor
//! speed profiles in real time" (the same scheme as the Arduino
//! AccelStepper library the first firmware generation was built on):
//!
//! ```text
//!   c0  = 0.676 · sqrt(2 / a) · 10⁶ µs          first step interval
//!   cₙ  = cₙ₋₁ − 2·cₙ₋₁ / (4n + 1)              n > 0 accelerating, n < 0 decelerating
//!   cₙ ≥ c_min = 10⁶ / v_max                     cruise
//! ```
//!
//! Every call is O(1), allocation-free and non-blocking; the only blocking
//! entry point is [`MotionEngine::run_to_completion`], used by the HTTP
//! "move and wait" request.

use core::fmt;

use crate::app::ports::{StepperPort, TimePort};

/// Highest step rate the engine accepts (steps/s).  One step per 10 µs is
/// already far beyond what the GPIO-driven coil drivers can follow.
pub const MAX_STEP_RATE: f32 = 100_000.0;

/// Direction of travel in step space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Increasing position (clockwise on the focuser drawtube gear).
    Forward,
    /// Decreasing position.
    Reverse,
}

/// Errors raised when the engine is constructed with unusable limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionError {
    /// Max speed is not finite, not positive, or above [`MAX_STEP_RATE`].
    InvalidMaxSpeed,
    /// Acceleration is not finite or not positive.
    InvalidAcceleration,
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMaxSpeed => write!(f, "max speed must be in (0, {}] steps/s", MAX_STEP_RATE),
            Self::InvalidAcceleration => write!(f, "acceleration must be a positive number of steps/s²"),
        }
    }
}

/// Point-in-time copy of the engine's kinematic state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorState {
    pub current_position: i32,
    pub target_position: i32,
    pub max_speed: f32,
    pub acceleration: f32,
    /// Signed instantaneous speed (steps/s, negative = reverse).
    pub speed: f32,
}

impl MotorState {
    /// Derived, never stored: the axis is running while it is off target.
    pub fn running(&self) -> bool {
        self.current_position != self.target_position
    }
}

/// Trapezoidal-profile stepper engine for one axis.
#[derive(Debug, Clone)]
pub struct MotionEngine {
    current_position: i32,
    target_position: i32,
    max_speed: f32,
    acceleration: f32,
    /// Signed speed of the most recent step (steps/s).
    speed: f32,
    /// Microseconds between steps; 0 while at rest.
    step_interval_us: u64,
    last_step_us: u64,
    direction: Direction,
    /// Profile step counter: > 0 accelerating, < 0 decelerating.
    n: i64,
    c0: f32,
    cn: f32,
    c_min: f32,
}

impl MotionEngine {
    /// Create the engine with fixed kinematic limits.
    ///
    /// Limits cannot be changed afterwards; the engine starts at rest at
    /// position 0.
    pub fn new(max_speed: f32, acceleration: f32) -> Result<Self, MotionError> {
        if !max_speed.is_finite() || max_speed <= 0.0 || max_speed > MAX_STEP_RATE {
            return Err(MotionError::InvalidMaxSpeed);
        }
        if !acceleration.is_finite() || acceleration <= 0.0 {
            return Err(MotionError::InvalidAcceleration);
        }

        let c_min = 1_000_000.0 / max_speed;
        let c0 = 0.676 * (2.0 / acceleration).sqrt() * 1_000_000.0;

        Ok(Self {
            current_position: 0,
            target_position: 0,
            max_speed,
            acceleration,
            speed: 0.0,
            step_interval_us: 0,
            last_step_us: 0,
            direction: Direction::Forward,
            n: 0,
            c0,
            cn: c0,
            c_min,
        })
    }

    // ── Commands ──────────────────────────────────────────────

    /// Set a new absolute target.  Any value is accepted.
    ///
    /// Retargeting mid-move recomputes the profile from the speed in
    /// effect, so the axis never has to reach the previous target first.
    pub fn set_target(&mut self, position: i32) {
        if self.target_position != position {
            self.target_position = position;
            self.compute_new_speed();
        }
    }

    /// Decelerate to rest as quickly as the acceleration limit allows.
    ///
    /// At rest this simply pins the target to the current position.
    /// In motion the target is moved to the nearest point the axis can
    /// stop at, unless the axis is already ramping down into a target
    /// closer than that.
    pub fn stop(&mut self) {
        if self.speed == 0.0 {
            self.target_position = self.current_position;
            self.halt();
            return;
        }

        let stop_distance = self.steps_to_stop() + 1;
        let remaining = self.distance_to_go();
        let heading_to_target =
            (self.speed > 0.0 && remaining > 0) || (self.speed < 0.0 && remaining < 0);
        if heading_to_target && stop_distance >= remaining.abs() {
            return;
        }

        let current = i64::from(self.current_position);
        let stop_at = if self.speed > 0.0 {
            current + stop_distance
        } else {
            current - stop_distance
        };
        self.set_target(clamp_to_i32(stop_at));
    }

    // ── Stepping ──────────────────────────────────────────────

    /// Advance the axis by at most one step if one is due at `now_us`.
    ///
    /// Returns `true` while the axis is still in motion or off target.
    pub fn tick(&mut self, now_us: u64, motor: &mut impl StepperPort) -> bool {
        if self.run_speed(now_us, motor) {
            if self.distance_to_go() == 0 {
                // Landing on the target always ends the move.
                self.halt();
            } else {
                self.compute_new_speed();
            }
        }
        self.in_motion()
    }

    /// Tick until the axis is at rest on its target.  Blocks the caller.
    pub fn run_to_completion(&mut self, clock: &impl TimePort, motor: &mut impl StepperPort) {
        while self.tick(clock.uptime_us(), motor) {
            core::hint::spin_loop();
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn position(&self) -> i32 {
        self.current_position
    }

    pub fn target(&self) -> i32 {
        self.target_position
    }

    /// `true` while the axis is off target.
    pub fn is_running(&self) -> bool {
        self.current_position != self.target_position
    }

    /// Signed distance from the current position to the target.
    pub fn distance_to_go(&self) -> i64 {
        i64::from(self.target_position) - i64::from(self.current_position)
    }

    /// Signed speed of the most recent step (steps/s).
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Interval until the next step is due, measured from the last step.
    /// Zero while at rest.
    pub fn step_interval_us(&self) -> u64 {
        self.step_interval_us
    }

    pub fn state(&self) -> MotorState {
        MotorState {
            current_position: self.current_position,
            target_position: self.target_position,
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            speed: self.speed,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn in_motion(&self) -> bool {
        self.speed != 0.0 || self.distance_to_go() != 0
    }

    fn steps_to_stop(&self) -> i64 {
        ((self.speed * self.speed) / (2.0 * self.acceleration)) as i64
    }

    fn halt(&mut self) {
        self.step_interval_us = 0;
        self.speed = 0.0;
        self.n = 0;
    }

    /// Emit one step if the current interval has elapsed.
    fn run_speed(&mut self, now_us: u64, motor: &mut impl StepperPort) -> bool {
        if self.step_interval_us == 0 {
            return false;
        }
        if now_us.saturating_sub(self.last_step_us) < self.step_interval_us {
            return false;
        }

        self.current_position = match self.direction {
            Direction::Forward => self.current_position.saturating_add(1),
            Direction::Reverse => self.current_position.saturating_sub(1),
        };
        motor.step(self.direction, self.current_position);
        self.last_step_us = now_us;
        true
    }

    /// Recompute the interval for the next step from the distance left
    /// and the speed in effect.
    fn compute_new_speed(&mut self) {
        let distance = self.distance_to_go();
        let steps_to_stop = self.steps_to_stop();

        if distance == 0 && steps_to_stop <= 1 {
            self.halt();
            return;
        }

        if distance > 0 {
            if self.n > 0 {
                if steps_to_stop >= distance || self.direction == Direction::Reverse {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < distance && self.direction == Direction::Forward {
                self.n = -self.n;
            }
        } else if distance < 0 {
            if self.n > 0 {
                if steps_to_stop >= -distance || self.direction == Direction::Forward {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < -distance && self.direction == Direction::Reverse {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            // First step from rest: never faster than the speed ceiling.
            self.cn = self.c0.max(self.c_min);
            self.direction = if distance > 0 {
                Direction::Forward
            } else {
                Direction::Reverse
            };
        } else {
            self.cn -= (2.0 * self.cn) / (4.0 * self.n as f32 + 1.0);
            self.cn = self.cn.max(self.c_min);
        }
        self.n += 1;

        self.step_interval_us = (self.cn as u64).max(1);
        self.speed = 1_000_000.0 / self.cn;
        if self.direction == Direction::Reverse {
            self.speed = -self.speed;
        }
    }
}

fn clamp_to_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
