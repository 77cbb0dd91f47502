//! Fuzz target: `parse_command` / `parse_step_value`
//!
//! Arbitrary UTF-8 through both parse modes.  Strict must never accept
//! something lenient rejects, and any move strict accepts must agree
//! with lenient on the value.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use focuser::app::commands::{Command, ParseMode, parse_command, parse_step_value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    let lenient = parse_command(line, ParseMode::Lenient);
    let strict = parse_command(line, ParseMode::Strict);
    if let Ok(cmd) = strict {
        assert_eq!(lenient, Ok(cmd));
    }
    if let (Ok(Command::Move(a)), Ok(Command::Move(b))) = (lenient, strict) {
        assert_eq!(a, b);
    }

    if let Ok(steps) = parse_step_value(line, ParseMode::Strict) {
        assert_eq!(parse_step_value(line, ParseMode::Lenient), Ok(steps));
    }
});
