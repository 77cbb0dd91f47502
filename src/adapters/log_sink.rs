//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { max_speed, acceleration } => {
                info!("START | v_max={:.0} steps/s | a={:.0} steps/s\u{00b2}", max_speed, acceleration);
            }
            AppEvent::MoveStarted { from, to } => {
                info!("MOVE | {} -> {}", from, to);
            }
            AppEvent::Retargeted { position, to } => {
                info!("MOVE | retarget at {} -> {}", position, to);
            }
            AppEvent::StopRequested { position, settle_at } => {
                info!("STOP | at {} | settling at {}", position, settle_at);
            }
            AppEvent::Arrived { position } => {
                info!("ARRIVE | position={}", position);
            }
            AppEvent::CommandRejected(err) => {
                warn!("REJECT | {}", err);
            }
        }
    }
}
