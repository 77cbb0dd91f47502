//! Application service: the hexagonal core.
//!
//! [`FocuserService`] owns the [`MotionEngine`] and is the only thing that
//! touches it.  Transport bindings hand it parsed [`Command`]s and render
//! the [`Reply`] it returns; the control loop calls [`FocuserService::tick`]
//! on every iteration.  All I/O flows through port traits injected at call
//! sites, so the whole service is testable with mock adapters.
//!
//! ```text
//!   SerialBinding ─┐                            ┌──▶ StepperPort
//!                  ├─▶ ┌─────────────────────┐ ─┤
//!   HttpBinding ───┘   │   FocuserService     │  └──▶ EventSink
//!                      │   MotionEngine       │
//!         TimePort ──▶ └─────────────────────┘
//! ```

use log::{debug, info};

use crate::config::FocuserConfig;
use crate::error::Result;
use crate::motion::{MotionEngine, MotorState};

use super::commands::{Command, ParseError};
use super::events::AppEvent;
use super::ports::{EventSink, StepperPort, TimePort};

/// Whether a Move returns as soon as the target is set or only once the
/// axis has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCompletion {
    /// Serial behaviour: acknowledge and keep stepping from the loop.
    Immediate,
    /// HTTP behaviour: block in the engine until the target is reached.
    WaitForArrival,
}

/// Transport-neutral answer to a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Move accepted.  Carries the requested target.
    Moved(i32),
    Position(i32),
    Running(bool),
    Stopped,
    /// Microseconds the last serial line took to arrive.
    Duration(u64),
}

// ───────────────────────────────────────────────────────────────
// FocuserService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct FocuserService {
    engine: MotionEngine,
    /// Whether the axis was in motion at the end of the previous tick.
    was_moving: bool,
    release_when_idle: bool,
    last_read_us: u64,
    commands_handled: u32,
}

impl FocuserService {
    /// Construct the service from configuration.
    ///
    /// Does **not** emit anything; call [`start`](Self::start) next.
    pub fn new(config: &FocuserConfig) -> Result<Self> {
        let engine = MotionEngine::new(config.max_speed, config.acceleration)?;
        Ok(Self {
            engine,
            was_moving: false,
            release_when_idle: true,
            last_read_us: 0,
            commands_handled: 0,
        })
    }

    /// Keep the coils energised at rest (holding torque at the cost of heat).
    pub fn hold_when_idle(mut self) -> Self {
        self.release_when_idle = false;
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            max_speed: self.engine.max_speed(),
            acceleration: self.engine.acceleration(),
        });
        info!(
            "FocuserService started (v_max={} steps/s, a={} steps/s²)",
            self.engine.max_speed(),
            self.engine.acceleration()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Advance the engine by at most one step.  Call on every loop
    /// iteration, whether or not a command arrived.
    pub fn tick(
        &mut self,
        hw: &mut impl StepperPort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> bool {
        let moving = self.engine.tick(clock.uptime_us(), hw);
        self.settle(moving, hw, sink);
        moving
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute one command against the engine.
    pub fn handle(
        &mut self,
        cmd: Command,
        completion: MoveCompletion,
        hw: &mut impl StepperPort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> Reply {
        self.commands_handled = self.commands_handled.wrapping_add(1);
        match cmd {
            Command::Move(target) => {
                let from = self.engine.position();
                if self.engine.is_running() {
                    sink.emit(&AppEvent::Retargeted { position: from, to: target });
                } else if target != from {
                    sink.emit(&AppEvent::MoveStarted { from, to: target });
                }
                self.engine.set_target(target);
                self.was_moving |= self.engine.is_running();

                if completion == MoveCompletion::WaitForArrival {
                    self.engine.run_to_completion(clock, hw);
                    self.settle(false, hw, sink);
                }
                Reply::Moved(target)
            }
            Command::Position => Reply::Position(self.engine.position()),
            Command::IsRunning => Reply::Running(self.engine.is_running()),
            Command::Stop => {
                let position = self.engine.position();
                self.engine.stop();
                sink.emit(&AppEvent::StopRequested {
                    position,
                    settle_at: self.engine.target(),
                });
                Reply::Stopped
            }
            Command::Duration => Reply::Duration(self.last_read_us),
        }
    }

    /// Report a line or request a transport could not parse.
    pub fn reject(&mut self, err: ParseError, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::CommandRejected(err));
    }

    /// Record how long the most recent command line took to arrive.
    pub fn record_read_duration(&mut self, micros: u64) {
        self.last_read_us = micros;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> MotorState {
        self.engine.state()
    }

    pub fn position(&self) -> i32 {
        self.engine.position()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Commands executed since startup (wraps).
    pub fn commands_handled(&self) -> u32 {
        self.commands_handled
    }

    // ── Internal ──────────────────────────────────────────────

    /// Emit `Arrived` on the moving → idle edge and release the coils.
    fn settle(&mut self, moving: bool, hw: &mut impl StepperPort, sink: &mut impl EventSink) {
        if self.was_moving && !moving {
            let position = self.engine.position();
            sink.emit(&AppEvent::Arrived { position });
            if self.release_when_idle {
                hw.release();
                debug!("coils released at {}", position);
            }
        }
        self.was_moving = moving;
    }
}
