//! Newline-terminated line decoder.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────┬────────────┐
//! │ ASCII command (≤ 64 B)   │ [\r] \n    │
//! └──────────────────────────┴────────────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines.
//! This handles partial reads gracefully: a single `Transport::read`
//! may return part of a line or several lines at once, so bytes are fed
//! one at a time.  Over-long lines are discarded up to the next newline
//! rather than being split into two commands.

use core::fmt;

use heapless::{String, Vec};

/// Longest accepted line, terminator excluded.
pub const MAX_LINE: usize = 64;

/// Room for the `\r` of a CRLF terminator on a full-length line.
const BUF_LEN: usize = MAX_LINE + 1;

/// Why a completed line was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// More than [`MAX_LINE`] bytes arrived before the newline.
    TooLong,
    /// The line is not valid UTF-8.
    NotUtf8,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => write!(f, "line longer than {} bytes", MAX_LINE),
            Self::NotUtf8 => write!(f, "line is not UTF-8"),
        }
    }
}

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Collecting bytes of the current line.
    Collecting,
    /// Buffer overflowed; dropping bytes until the next newline.
    Discarding,
}

/// Streaming line decoder.
pub struct LineDecoder {
    state: DecoderState,
    buf: Vec<u8, BUF_LEN>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting,
            buf: Vec::new(),
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some` when a newline completes a line.  A trailing `\r`
    /// is stripped.
    pub fn feed(&mut self, byte: u8) -> Option<Result<String<MAX_LINE>, LineError>> {
        match (self.state, byte) {
            (DecoderState::Discarding, b'\n') => {
                self.reset();
                Some(Err(LineError::TooLong))
            }
            (DecoderState::Discarding, _) => None,
            (DecoderState::Collecting, b'\n') => {
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                let Ok(line) = Vec::<u8, MAX_LINE>::from_slice(&self.buf) else {
                    self.buf.clear();
                    return Some(Err(LineError::TooLong));
                };
                self.buf.clear();
                Some(String::from_utf8(line).map_err(|_| LineError::NotUtf8))
            }
            (DecoderState::Collecting, _) => {
                if self.buf.push(byte).is_err() {
                    self.state = DecoderState::Discarding;
                    self.buf.clear();
                }
                None
            }
        }
    }

    /// `true` once at least one byte of an unfinished line has arrived.
    pub fn in_progress(&self) -> bool {
        !self.buf.is_empty() || self.state == DecoderState::Discarding
    }

    /// Reset decoder state (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.state = DecoderState::Collecting;
        self.buf.clear();
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(dec: &mut LineDecoder, data: &[u8]) -> std::vec::Vec<Result<std::string::String, LineError>> {
        data.iter()
            .filter_map(|&b| dec.feed(b))
            .map(|r| r.map(|s| s.as_str().to_owned()))
            .collect()
    }

    #[test]
    fn yields_line_on_newline() {
        let mut d = LineDecoder::new();
        assert_eq!(feed_all(&mut d, b"M100\n"), vec![Ok("M100".to_owned())]);
        assert!(!d.in_progress());
    }

    #[test]
    fn strips_carriage_return() {
        let mut d = LineDecoder::new();
        assert_eq!(feed_all(&mut d, b"P\r\n"), vec![Ok("P".to_owned())]);
    }

    #[test]
    fn partial_reads_accumulate() {
        let mut d = LineDecoder::new();
        assert!(feed_all(&mut d, b"M12").is_empty());
        assert!(d.in_progress());
        assert_eq!(feed_all(&mut d, b"34\n"), vec![Ok("M1234".to_owned())]);
    }

    #[test]
    fn several_lines_in_one_chunk() {
        let mut d = LineDecoder::new();
        assert_eq!(
            feed_all(&mut d, b"P\nR\nS\n"),
            vec![Ok("P".to_owned()), Ok("R".to_owned()), Ok("S".to_owned())]
        );
    }

    #[test]
    fn overflow_discards_until_newline() {
        let mut d = LineDecoder::new();
        let mut long = vec![b'9'; MAX_LINE + 10];
        long.push(b'\n');
        long.extend_from_slice(b"P\n");
        assert_eq!(
            feed_all(&mut d, &long),
            vec![Err(LineError::TooLong), Ok("P".to_owned())]
        );
    }

    #[test]
    fn exactly_max_line_is_accepted() {
        let mut d = LineDecoder::new();
        let mut line = vec![b'1'; MAX_LINE];
        line.push(b'\n');
        let out = feed_all(&mut d, &line);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().map(|s| s.len()), Ok(MAX_LINE));

        let mut line = vec![b'1'; MAX_LINE];
        line.extend_from_slice(b"\r\n");
        let out = feed_all(&mut d, &line);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().map(|s| s.len()), Ok(MAX_LINE));
    }

    #[test]
    fn one_past_max_line_is_rejected() {
        let mut d = LineDecoder::new();
        let mut line = vec![b'1'; MAX_LINE + 1];
        line.push(b'\n');
        assert_eq!(feed_all(&mut d, &line), vec![Err(LineError::TooLong)]);

        let mut line = vec![b'1'; MAX_LINE + 1];
        line.extend_from_slice(b"\r\n");
        line.extend_from_slice(b"P\r\n");
        assert_eq!(
            feed_all(&mut d, &line),
            vec![Err(LineError::TooLong), Ok("P".to_owned())]
        );
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut d = LineDecoder::new();
        assert_eq!(feed_all(&mut d, &[0xff, 0xfe, b'\n']), vec![Err(LineError::NotUtf8)]);
    }

    #[test]
    fn empty_line_is_yielded() {
        let mut d = LineDecoder::new();
        assert_eq!(feed_all(&mut d, b"\n"), vec![Ok(std::string::String::new())]);
    }
}
