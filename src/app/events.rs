//! Outbound application events.
//!
//! The [`FocuserService`](super::service::FocuserService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  The firmware
//! routes them to the serial log; tests collect them in a `Vec`.

use super::commands::ParseError;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service is up; carries the kinematic limits in force.
    Started { max_speed: f32, acceleration: f32 },

    /// A move was accepted from rest.
    MoveStarted { from: i32, to: i32 },

    /// A move was accepted while the axis was already running.
    Retargeted { position: i32, to: i32 },

    /// Stop was requested; the axis will settle at `settle_at`.
    StopRequested { position: i32, settle_at: i32 },

    /// The axis came to rest on its target.
    Arrived { position: i32 },

    /// A transport rejected an input line or request.
    CommandRejected(ParseError),
}
