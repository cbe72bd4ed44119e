// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line parser for the operator console.
//!
//! Bytes are pushed one at a time as they arrive on the serial port. A request is parsed when a
//! line terminator (CR or LF) arrives; empty lines, including the LF of a CRLF pair, are ignored.

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::protocol::messages::*;

/// Longest accepted line, terminator excluded.
pub const LINE_CAPACITY: usize = 32;

pub struct Parser {
    buf: [u8; LINE_CAPACITY],
    len: usize,
    overflow: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
            overflow: false,
        }
    }

    /// Process a single incoming byte. Returns `Some` once a complete line has been received.
    pub fn push(&mut self, byte: u8) -> Option<Result<ConsoleRequest, ParseError>> {
        match byte {
            b'\r' | b'\n' => {
                if self.overflow {
                    self.reset();
                    return Some(Err(ParseError::LineTooLong));
                }
                if self.len == 0 {
                    return None;
                }
                let result = parse_line(&self.buf[..self.len]);
                self.reset();
                Some(result)
            }
            _ => {
                if self.len < LINE_CAPACITY {
                    self.buf[self.len] = byte;
                    self.len += 1;
                } else {
                    self.overflow = true;
                }
                None
            }
        }
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.len = 0;
        self.overflow = false;
    }
}

/// Parse one console line (without terminator).
pub fn parse_line(line: &[u8]) -> Result<ConsoleRequest, ParseError> {
    let line = core::str::from_utf8(line).map_err(|_| ParseError::Encoding)?;
    let mut words = line.split_ascii_whitespace();

    let request = match words.next() {
        Some(REQ_SPEED_UP) => ConsoleRequest::SpeedUp,
        Some(REQ_SPEED_DOWN) => ConsoleRequest::SpeedDown,
        Some(REQ_STOP) => ConsoleRequest::Stop,
        Some(REQ_RAMP) => ConsoleRequest::RampTo {
            speed: int_arg(words.next())?,
            slope_us: seconds_arg(words.next())?,
        },
        Some(REQ_RAMP_SIDES) => ConsoleRequest::RampSides {
            left: int_arg(words.next())?,
            right: int_arg(words.next())?,
            slope_us: seconds_arg(words.next())?,
        },
        Some(REQ_MOVE) => ConsoleRequest::MoveSteps(int_arg(words.next())?),
        Some(REQ_LEFT) => ConsoleRequest::SetLeft(int_arg(words.next())?),
        Some(REQ_RIGHT) => ConsoleRequest::SetRight(int_arg(words.next())?),
        Some(_) => return Err(ParseError::UnknownRequest),
        None => return Err(ParseError::MissingArgument),
    };

    if words.next().is_some() {
        return Err(ParseError::UnexpectedArgument);
    }
    Ok(request)
}

fn int_arg(word: Option<&str>) -> Result<i32, ParseError> {
    word.ok_or(ParseError::MissingArgument)?
        .parse()
        .map_err(|_| ParseError::InvalidNumber)
}

/// Decimal seconds to whole microseconds. Negative, non-finite and out-of-range values are
/// rejected.
fn seconds_arg(word: Option<&str>) -> Result<u32, ParseError> {
    let secs: f32 = word
        .ok_or(ParseError::MissingArgument)?
        .parse()
        .map_err(|_| ParseError::InvalidNumber)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ParseError::InvalidNumber);
    }

    let us = (secs * 1_000_000.0).round();
    if us > u32::MAX as f32 {
        return Err(ParseError::InvalidNumber);
    }
    Ok(us as u32)
}
