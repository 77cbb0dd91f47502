//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FocuserService (domain)
//! ```
//!
//! Driven adapters (stepper coils, clock, event sinks) implement these
//! traits.  The [`FocuserService`](super::service::FocuserService) and the
//! [`MotionEngine`](crate::motion::MotionEngine) consume them via generics,
//! so the domain core never touches GPIO or timers directly.

use crate::motion::Direction;

// ───────────────────────────────────────────────────────────────
// Stepper port (driven adapter: domain → coils / driver board)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the motion engine calls this once per physical step.
pub trait StepperPort {
    /// Emit one step.  `position` is the axis position *after* the step,
    /// which four-wire drivers use to select the coil phase.
    fn step(&mut self, direction: Direction, position: i32);

    /// De-energise the outputs (coils or driver enable).
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: hardware timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond clock used for step timing.
pub trait TimePort {
    /// Microseconds since boot.  Must never go backwards.
    fn uptime_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
