//! Serial line binding.
//!
//! ```text
//!   UART ──▶ LineDecoder ──▶ parse_command ──▶ FocuserService
//!     ▲                                             │
//!     └──────────────── "<reply>\r\n" ◀─────────────┘
//! ```
//!
//! [`SerialBinding::poll`] never blocks: it reads only what the transport
//! already holds, at most [`READ_CHUNK`] bytes per call, so the control
//! loop gets back to ticking the motor between every chunk.

use core::fmt::Write as _;

use heapless::String;
use log::warn;

use crate::app::commands::{Command, ParseError, ParseMode, parse_command};
use crate::app::ports::{EventSink, StepperPort, TimePort};
use crate::app::service::{FocuserService, MoveCompletion, Reply};

use super::line::{LineDecoder, LineError};
use super::transport::{Transport, write_all};

/// Most bytes consumed per poll.
pub const READ_CHUNK: usize = 16;

/// Longest reply text, terminator excluded.
pub const REPLY_CAP: usize = 32;

/// Reply text plus `\r\n`.
type Frame = String<{ REPLY_CAP + 2 }>;

enum Dispatched {
    Executed(String<REPLY_CAP>),
    /// Optional error text, strict mode only.
    Rejected(Option<String<REPLY_CAP>>),
}

/// Serial protocol front-end for the focuser service.
pub struct SerialBinding {
    decoder: LineDecoder,
    mode: ParseMode,
    duration_command: bool,
    /// Uptime at which the first byte of the current line arrived.
    line_started_us: u64,
    write_errors: u32,
}

impl SerialBinding {
    pub fn new(mode: ParseMode, duration_command: bool) -> Self {
        Self {
            decoder: LineDecoder::new(),
            mode,
            duration_command,
            line_started_us: 0,
            write_errors: 0,
        }
    }

    /// Service whatever input is pending.  Returns the number of commands
    /// executed.
    pub fn poll<T: Transport>(
        &mut self,
        transport: &mut T,
        service: &mut FocuserService,
        hw: &mut impl StepperPort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> usize {
        if !transport.available() {
            return 0;
        }

        let mut chunk = [0u8; READ_CHUNK];
        let n = match transport.read(&mut chunk) {
            Ok(n) => n,
            Err(e) => {
                warn!("Serial: read failed: {:?}", e);
                return 0;
            }
        };

        let mut handled = 0;
        for &byte in &chunk[..n] {
            if !self.decoder.in_progress() && byte != b'\n' {
                self.line_started_us = clock.uptime_us();
            }
            let Some(line) = self.decoder.feed(byte) else {
                continue;
            };

            let elapsed = clock.uptime_us().saturating_sub(self.line_started_us);
            let reply = match line {
                Ok(line) => match self.dispatch(&line, elapsed, service, hw, clock, sink) {
                    Dispatched::Executed(text) => {
                        handled += 1;
                        Some(text)
                    }
                    Dispatched::Rejected(text) => text,
                },
                Err(e) => self.reject_line(e),
            };
            if let Some(text) = reply {
                self.send(transport, &text);
            }
        }
        handled
    }

    /// Replies that failed to send since boot.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    // ── Internal ──────────────────────────────────────────────

    fn dispatch(
        &mut self,
        line: &str,
        elapsed_us: u64,
        service: &mut FocuserService,
        hw: &mut impl StepperPort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> Dispatched {
        let cmd = match parse_command(line, self.mode) {
            Ok(Command::Duration) if !self.duration_command => Err(ParseError::UnknownCommand),
            other => other,
        };

        match cmd {
            Ok(cmd) => {
                service.record_read_duration(elapsed_us);
                let reply = service.handle(cmd, MoveCompletion::Immediate, hw, clock, sink);
                Dispatched::Executed(render(reply))
            }
            Err(ParseError::Empty) => Dispatched::Rejected(None),
            Err(e) => {
                service.reject(e, sink);
                match self.mode {
                    ParseMode::Lenient => {
                        warn!("Serial: ignoring {:?} ({})", line, e);
                        Dispatched::Rejected(None)
                    }
                    ParseMode::Strict => Dispatched::Rejected(Some(error_reply(e))),
                }
            }
        }
    }

    fn reject_line(&self, err: LineError) -> Option<String<REPLY_CAP>> {
        warn!("Serial: dropped line: {}", err);
        match self.mode {
            ParseMode::Lenient => None,
            ParseMode::Strict => {
                let mut out = String::new();
                let _ = write!(out, "ERR {}", err);
                Some(out)
            }
        }
    }

    /// One write and one flush per reply, both non-blocking on the UART.
    fn send<T: Transport>(&mut self, transport: &mut T, text: &str) {
        let mut frame = Frame::new();
        let _ = write!(frame, "{}\r\n", text);
        if let Err(e) = write_all(transport, frame.as_bytes()) {
            self.write_errors = self.write_errors.saturating_add(1);
            warn!("Serial: write failed: {:?}", e);
        }
    }
}

/// Serial text for a service reply.
pub fn render(reply: Reply) -> String<REPLY_CAP> {
    let mut out = String::new();
    let _ = match reply {
        Reply::Moved(_) | Reply::Stopped => write!(out, "1"),
        Reply::Position(p) => write!(out, "{}", p),
        Reply::Running(r) => write!(out, "{}", u8::from(r)),
        Reply::Duration(us) => write!(out, "{}", us),
    };
    out
}

fn error_reply(err: ParseError) -> String<REPLY_CAP> {
    let mut out = String::new();
    let _ = write!(out, "ERR {}", err);
    out
}

#[cfg(test)]
mod tests {
    use core::fmt::Write as _;
    use std::collections::VecDeque;

    use super::*;
    use crate::app::events::AppEvent;
    use crate::config::FocuserConfig;
    use crate::motion::Direction;

    /// Records every write and flush separately.
    #[derive(Default)]
    struct Port {
        rx: VecDeque<u8>,
        writes: Vec<Vec<u8>>,
        flushes: u32,
        fail_writes: bool,
    }

    impl Transport for Port {
        type Error = &'static str;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.rx.len());
            for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
            if self.fail_writes {
                return Err("tx");
            }
            self.writes.push(data.to_vec());
            Ok(data.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }

        fn available(&self) -> bool {
            !self.rx.is_empty()
        }
    }

    struct Idle;

    impl StepperPort for Idle {
        fn step(&mut self, _: Direction, _: i32) {}
        fn release(&mut self) {}
    }

    impl TimePort for Idle {
        fn uptime_us(&self) -> u64 {
            0
        }
    }

    impl EventSink for Idle {
        fn emit(&mut self, _: &AppEvent) {}
    }

    fn poll_line(binding: &mut SerialBinding, port: &mut Port, line: &[u8]) -> usize {
        let mut service = FocuserService::new(&FocuserConfig::default()).unwrap();
        port.rx.extend(line);
        let mut handled = 0;
        while port.available() {
            handled += binding.poll(port, &mut service, &mut Idle, &Idle, &mut Idle);
        }
        handled
    }

    #[test]
    fn reply_is_one_write_and_one_flush() {
        let mut binding = SerialBinding::new(ParseMode::Lenient, false);
        let mut port = Port::default();
        assert_eq!(poll_line(&mut binding, &mut port, b"P\n"), 1);

        assert_eq!(port.writes, vec![b"0\r\n".to_vec()]);
        assert_eq!(port.flushes, 1);
    }

    #[test]
    fn longest_reply_fits_one_frame() {
        let mut binding = SerialBinding::new(ParseMode::Strict, false);
        let mut port = Port::default();
        poll_line(&mut binding, &mut port, b"Q\n");
        assert_eq!(port.writes, vec![b"ERR unknown command\r\n".to_vec()]);

        let mut frame = Frame::new();
        let text = render(Reply::Position(i32::MIN));
        assert!(write!(frame, "{}\r\n", text).is_ok());
    }

    #[test]
    fn failed_writes_are_counted() {
        let mut binding = SerialBinding::new(ParseMode::Lenient, false);
        let mut port = Port {
            fail_writes: true,
            ..Port::default()
        };
        assert_eq!(poll_line(&mut binding, &mut port, b"P\nR\n"), 2);
        assert_eq!(binding.write_errors(), 2);
    }

    #[test]
    fn renders_replies() {
        assert_eq!(render(Reply::Moved(10)).as_str(), "1");
        assert_eq!(render(Reply::Stopped).as_str(), "1");
        assert_eq!(render(Reply::Position(-2_147_483_648)).as_str(), "-2147483648");
        assert_eq!(render(Reply::Running(true)).as_str(), "1");
        assert_eq!(render(Reply::Running(false)).as_str(), "0");
        assert_eq!(render(Reply::Duration(1520)).as_str(), "1520");
    }

    #[test]
    fn error_reply_names_reason() {
        assert_eq!(error_reply(ParseError::InvalidNumber).as_str(), "ERR invalid number");
        assert_eq!(error_reply(ParseError::UnknownCommand).as_str(), "ERR unknown command");
    }
}
