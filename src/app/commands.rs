//! Inbound commands to the application service.
//!
//! Both transport bindings reduce their input to a [`Command`] through
//! [`parse_command`] / [`parse_step_value`], then hand it to the
//! [`FocuserService`](super::service::FocuserService).
//!
//! ```text
//!   "M1500"  ──▶ Move(1500)        "P" ──▶ Position
//!   "R"      ──▶ IsRunning         "S" ──▶ Stop
//!   "D"      ──▶ Duration
//! ```

use core::fmt;

/// Logical focuser commands shared by every transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set a new absolute target (steps).
    Move(i32),
    /// Report the current position.
    Position,
    /// Report whether the axis is off target.
    IsRunning,
    /// Decelerate to rest.
    Stop,
    /// Report how long the last command line took to arrive (µs).
    Duration,
}

/// How malformed numeric arguments are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ParseMode {
    /// Leading-digit parse; anything unparseable becomes 0 and unknown
    /// serial lines are dropped without a reply.
    #[default]
    Lenient,
    /// Malformed numbers are rejected and every bad line gets an error reply.
    Strict,
}

/// Why a command string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Blank line.
    Empty,
    /// First character is not a known command letter.
    UnknownCommand,
    /// HTTP `steps` value does not start with `M`.
    MissingPrefix,
    /// Numeric argument is not a valid `i32` (strict mode only).
    InvalidNumber,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::MissingPrefix => write!(f, "missing M prefix"),
            Self::InvalidNumber => write!(f, "invalid number"),
        }
    }
}

/// Parse one serial command line (terminator already removed).
///
/// Trailing `\r` and surrounding whitespace are ignored.  Single-letter
/// commands must match exactly; `M` takes the remainder as its argument.
pub fn parse_command(line: &str, mode: ParseMode) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(arg) = line.strip_prefix('M') {
        return parse_number(arg, mode).map(Command::Move);
    }

    match line {
        "P" => Ok(Command::Position),
        "R" => Ok(Command::IsRunning),
        "S" => Ok(Command::Stop),
        "D" => Ok(Command::Duration),
        _ => Err(ParseError::UnknownCommand),
    }
}

/// Parse the HTTP `steps` query value, which must itself be `M<int>`.
pub fn parse_step_value(value: &str, mode: ParseMode) -> Result<i32, ParseError> {
    let arg = value.trim().strip_prefix('M').ok_or(ParseError::MissingPrefix)?;
    parse_number(arg, mode)
}

fn parse_number(arg: &str, mode: ParseMode) -> Result<i32, ParseError> {
    match mode {
        ParseMode::Lenient => Ok(leading_int(arg)),
        ParseMode::Strict => arg.trim().parse::<i32>().map_err(|_| ParseError::InvalidNumber),
    }
}

/// Leading-integer parse: optional whitespace, optional sign, then as many
/// digits as are present.  No digits yields 0; overflow saturates.
fn leading_int(s: &str) -> i32 {
    let bytes = s.trim_start().as_bytes();
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let mut value: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        value = value * 10 + i64::from(b - b'0');
        if value > i64::from(i32::MAX) + 1 {
            break;
        }
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
