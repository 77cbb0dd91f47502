//! Serial line protocol, end to end.
//!
//! Bytes go in through the host UART port, through `SerialBinding` and the
//! `FocuserService`, and replies come back out of the same port while the
//! mock motor records every step.

use focuser::adapters::uart::UartTransport;
use focuser::app::commands::{ParseError, ParseMode};
use focuser::app::events::AppEvent;
use focuser::app::service::FocuserService;
use focuser::bindings::serial::SerialBinding;
use focuser::bindings::transport::{NullTransport, Transport};
use focuser::config::FocuserConfig;

use super::mock_hw::{MockMotor, RecordingSink, SimClock};

struct Rig {
    service: FocuserService,
    binding: SerialBinding,
    port: UartTransport,
    hw: MockMotor,
    clock: SimClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: &FocuserConfig) -> Self {
        let mut sink = RecordingSink::new();
        let mut service = FocuserService::new(config).unwrap();
        service.start(&mut sink);
        Self {
            service,
            binding: SerialBinding::new(config.parse_mode, config.duration_command),
            port: UartTransport::new(),
            hw: MockMotor::new(),
            clock: SimClock::default(),
            sink,
        }
    }

    fn strict() -> Self {
        Self::new(&FocuserConfig {
            parse_mode: ParseMode::Strict,
            ..FocuserConfig::default()
        })
    }

    /// Deliver raw bytes and collect whatever was written back.
    fn send(&mut self, bytes: &str) -> String {
        self.port.inject(bytes.as_bytes());
        while self.port.available() {
            self.binding.poll(
                &mut self.port,
                &mut self.service,
                &mut self.hw,
                &self.clock,
                &mut self.sink,
            );
        }
        self.port.take_output()
    }

    fn tick(&mut self) -> bool {
        self.service.tick(&mut self.hw, &self.clock, &mut self.sink)
    }

    fn tick_until(&mut self, mut done: impl FnMut(&FocuserService) -> bool) {
        for _ in 0..5_000_000 {
            if done(&self.service) {
                return;
            }
            self.tick();
        }
        panic!("condition never reached");
    }

    fn settle(&mut self) {
        self.tick_until(|s| !s.is_running());
        while self.tick() {}
    }
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn move_then_query_position_and_running() {
    let mut rig = Rig::new(&FocuserConfig::default());

    assert_eq!(rig.send("M200\n"), "1\r\n");
    assert_eq!(rig.send("R\n"), "1\r\n");

    rig.settle();

    assert_eq!(rig.send("P\n"), "200\r\n");
    assert_eq!(rig.send("R\n"), "0\r\n");
    assert_eq!(rig.hw.steps(), 200);
    assert_eq!(rig.sink.arrivals(), vec![200]);
    assert!(rig.hw.released(), "coils should drop once the move ends");
}

#[test]
fn every_step_is_reported_in_order() {
    let mut rig = Rig::new(&FocuserConfig::default());
    rig.send("M-25\n");
    rig.settle();
    assert_eq!(rig.hw.positions(), (-25..=-1).rev().collect::<Vec<_>>());
}

#[test]
fn several_commands_in_one_burst() {
    let mut rig = Rig::new(&FocuserConfig::default());
    assert_eq!(rig.send("P\nM10\nR\n"), "0\r\n1\r\n1\r\n");
    assert_eq!(rig.service.commands_handled(), 3);
}

#[test]
fn crlf_terminated_lines_are_accepted() {
    let mut rig = Rig::new(&FocuserConfig::default());
    assert_eq!(rig.send("M5\r\nP\r\n"), "1\r\n0\r\n");
}

#[test]
fn move_to_current_position_is_a_no_op() {
    let mut rig = Rig::new(&FocuserConfig::default());
    assert_eq!(rig.send("M0\n"), "1\r\n");
    assert!(!rig.tick());
    assert_eq!(rig.hw.steps(), 0);
    assert!(rig.sink.arrivals().is_empty());
}

// ── Stop and retarget ─────────────────────────────────────────

#[test]
fn stop_decelerates_short_of_the_target() {
    let mut rig = Rig::new(&FocuserConfig::default());
    rig.send("M1000\n");
    rig.tick_until(|s| s.position() >= 100);

    assert_eq!(rig.send("S\n"), "1\r\n");
    let stop_seen = rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::StopRequested { .. }));
    assert!(stop_seen);

    rig.settle();
    let p = rig.service.position();
    assert!(p > 100 && p < 1000, "stopped at {p}");
    assert_eq!(rig.send("R\n"), "0\r\n");
}

#[test]
fn stop_at_rest_replies_and_stays_put() {
    let mut rig = Rig::new(&FocuserConfig::default());
    assert_eq!(rig.send("S\n"), "1\r\n");
    assert!(!rig.tick());
    assert_eq!(rig.service.position(), 0);
}

#[test]
fn retarget_mid_move_reverses_without_reaching_old_target() {
    let mut rig = Rig::new(&FocuserConfig::default());
    rig.send("M1000\n");
    rig.tick_until(|s| s.position() >= 300);

    assert_eq!(rig.send("M-50\n"), "1\r\n");
    rig.settle();

    assert_eq!(rig.service.position(), -50);
    assert!(rig.hw.positions().iter().all(|&p| p < 1000));
    assert_eq!(rig.sink.arrivals(), vec![-50]);
}

// ── Malformed input ───────────────────────────────────────────

#[test]
fn lenient_mode_drops_unknown_lines_silently() {
    let mut rig = Rig::new(&FocuserConfig::default());
    assert_eq!(rig.send("X\n"), "");
    assert_eq!(rig.send("\n"), "");
    assert_eq!(rig.send("PP\n"), "");
    assert_eq!(rig.sink.rejections(), 2);
    assert_eq!(rig.service.commands_handled(), 0);
}

#[test]
fn lenient_mode_moves_to_zero_on_garbage_number() {
    let mut rig = Rig::new(&FocuserConfig::default());
    rig.send("M40\n");
    rig.settle();
    assert_eq!(rig.send("Mabc\n"), "1\r\n");
    rig.settle();
    assert_eq!(rig.service.position(), 0);
}

#[test]
fn strict_mode_answers_errors() {
    let mut rig = Rig::strict();
    assert_eq!(rig.send("Mabc\n"), "ERR invalid number\r\n");
    assert_eq!(rig.send("X\n"), "ERR unknown command\r\n");
    assert_eq!(rig.send("\n"), "");
    assert!(!rig.service.is_running());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::CommandRejected(ParseError::InvalidNumber))
    );
}

#[test]
fn over_long_line_is_discarded_up_to_newline() {
    let mut rig = Rig::strict();
    let long = format!("M{}\n", "1".repeat(100));
    assert_eq!(rig.send(&long), "ERR line longer than 64 bytes\r\n");
    assert_eq!(rig.send("P\n"), "0\r\n");
}

// ── Duration diagnostic ───────────────────────────────────────

#[test]
fn duration_is_unknown_unless_enabled() {
    let mut rig = Rig::strict();
    assert_eq!(rig.send("D\n"), "ERR unknown command\r\n");
}

#[test]
fn duration_reports_time_taken_by_its_own_line() {
    let config = FocuserConfig::duration_diagnostic();
    let mut rig = Rig::new(&config);

    rig.send("D");
    for _ in 0..100 {
        rig.tick();
    }
    let reply = rig.send("\n");
    let micros: u64 = reply.trim_end().parse().unwrap();
    assert!(micros >= 100 * 50, "reported {micros} µs");
}

// ── Transport edge cases ──────────────────────────────────────

#[test]
fn silent_transport_is_never_read() {
    let mut rig = Rig::new(&FocuserConfig::default());
    let mut null = NullTransport;
    assert!(!null.available());
    let handled = rig
        .binding
        .poll(&mut null, &mut rig.service, &mut rig.hw, &rig.clock, &mut rig.sink);
    assert_eq!(handled, 0);
}
