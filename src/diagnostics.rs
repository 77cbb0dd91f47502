//! Runtime diagnostics for the control loop.
//!
//! Step timing is only as good as the loop that calls `tick()`: a step can
//! never be issued earlier than the next loop iteration after it falls due.
//! [`LoopStats`] tracks the worst gap between iterations so a slow HTTP
//! handler or a blocking Wi-Fi reconnect shows up in the log as lost step
//! resolution rather than as a mysteriously slow focuser.

use log::{info, warn};

/// A gap this long between ticks caps the step rate below 1 kHz.
pub const SLOW_TICK_US: u64 = 1_000;

/// One reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopReport {
    pub uptime_secs: u64,
    pub iterations: u64,
    /// Worst gap between consecutive ticks in this window (µs).
    pub max_gap_us: u64,
    /// Commands handled in this window, across all bindings.
    pub commands: u32,
    /// Stepper driver errors since boot.
    pub motor_faults: u32,
    /// Serial replies that failed to send since boot.
    pub write_errors: u32,
    pub heap_free: u32,
}

impl LoopReport {
    fn faults(&self) -> u32 {
        self.motor_faults.saturating_add(self.write_errors)
    }
}

/// Accumulates loop timing between reports.
#[derive(Debug, Default)]
pub struct LoopStats {
    last_tick_us: Option<u64>,
    last_report_us: u64,
    iterations: u64,
    max_gap_us: u64,
    commands: u32,
    motor_faults: u32,
    write_errors: u32,
    /// Fault total carried by the previous report.
    reported_faults: u32,
}

impl LoopStats {
    pub fn new(now_us: u64) -> Self {
        Self {
            last_report_us: now_us,
            ..Self::default()
        }
    }

    /// Record one loop iteration.
    pub fn record_tick(&mut self, now_us: u64) {
        if let Some(last) = self.last_tick_us {
            let gap = now_us.saturating_sub(last);
            self.max_gap_us = self.max_gap_us.max(gap);
        }
        self.last_tick_us = Some(now_us);
        self.iterations += 1;
    }

    pub fn record_commands(&mut self, n: usize) {
        self.commands = self.commands.saturating_add(n as u32);
    }

    /// Latest since-boot fault counters from the adapters.
    pub fn record_faults(&mut self, motor_faults: u32, write_errors: u32) {
        self.motor_faults = motor_faults;
        self.write_errors = write_errors;
    }

    /// Emit and return a report once `interval_secs` has elapsed, then
    /// start a new window.
    pub fn maybe_report(&mut self, now_us: u64, interval_secs: u32) -> Option<LoopReport> {
        if interval_secs == 0
            || now_us.saturating_sub(self.last_report_us) < u64::from(interval_secs) * 1_000_000
        {
            return None;
        }

        let report = LoopReport {
            uptime_secs: now_us / 1_000_000,
            iterations: self.iterations,
            max_gap_us: self.max_gap_us,
            commands: self.commands,
            motor_faults: self.motor_faults,
            write_errors: self.write_errors,
            heap_free: heap_free(),
        };

        if report.max_gap_us > SLOW_TICK_US || report.faults() > self.reported_faults {
            warn!(
                "LOOP | {} iterations | worst gap {} µs | {} commands | faults motor {} serial {} | heap {}",
                report.iterations,
                report.max_gap_us,
                report.commands,
                report.motor_faults,
                report.write_errors,
                report.heap_free
            );
        } else {
            info!(
                "LOOP | {} iterations | worst gap {} µs | {} commands | faults motor {} serial {} | heap {}",
                report.iterations,
                report.max_gap_us,
                report.commands,
                report.motor_faults,
                report.write_errors,
                report.heap_free
            );
        }
        self.reported_faults = report.faults();

        self.last_report_us = now_us;
        self.iterations = 0;
        self.max_gap_us = 0;
        self.commands = 0;
        Some(report)
    }
}

#[cfg(target_os = "espidf")]
fn heap_free() -> u32 {
    unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
}

#[cfg(not(target_os = "espidf"))]
fn heap_free() -> u32 {
    307_200
}
