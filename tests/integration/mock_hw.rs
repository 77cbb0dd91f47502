//! Mock adapters for integration tests.
//!
//! Records every motor call and every application event so tests can
//! assert on the full history without touching real GPIO.

use std::cell::Cell;

use focuser::app::events::AppEvent;
use focuser::app::ports::{EventSink, StepperPort, TimePort};
use focuser::motion::Direction;

// ── Motor call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCall {
    Step { direction: Direction, position: i32 },
    Release,
}

// ── MockMotor ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockMotor {
    pub calls: Vec<MotorCall>,
}

#[allow(dead_code)]
impl MockMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MotorCall::Step { .. }))
            .count()
    }

    /// Positions reported with each step, in order.
    pub fn positions(&self) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MotorCall::Step { position, .. } => Some(*position),
                MotorCall::Release => None,
            })
            .collect()
    }

    pub fn released(&self) -> bool {
        matches!(self.calls.last(), Some(MotorCall::Release))
    }
}

impl StepperPort for MockMotor {
    fn step(&mut self, direction: Direction, position: i32) {
        self.calls.push(MotorCall::Step { direction, position });
    }

    fn release(&mut self) {
        self.calls.push(MotorCall::Release);
    }
}

// ── SimClock ──────────────────────────────────────────────────

/// Clock that advances a fixed amount on every read, so busy loops
/// make progress without real time passing.
pub struct SimClock {
    now_us: Cell<u64>,
    per_read_us: u64,
}

impl SimClock {
    pub fn new(per_read_us: u64) -> Self {
        Self {
            now_us: Cell::new(0),
            per_read_us,
        }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(50)
    }
}

impl TimePort for SimClock {
    fn uptime_us(&self) -> u64 {
        let now = self.now_us.get() + self.per_read_us;
        self.now_us.set(now);
        now
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arrivals(&self) -> Vec<i32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Arrived { position } => Some(*position),
                _ => None,
            })
            .collect()
    }

    pub fn rejections(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::CommandRejected(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
