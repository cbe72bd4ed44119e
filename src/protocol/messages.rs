// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Operator console messages.
//!
//! One request per line, first word selects the request:
//!
//! | Line | Request |
//! | ---- | ------- |
//! | `p` | speed up by one jog increment |
//! | `q` | speed down by one jog increment |
//! | `v <speed> <slope_s>` | ramp to `speed` over `slope_s` seconds |
//! | `m <steps>` | move both motors by `steps` full steps |
//! | `w <left> <right> <slope_s>` | ramp each motor to its own speed over `slope_s` seconds |
//! | `l <speed>` / `r <speed>` | set the left / right motor speed immediately |
//! | `s` | stop and release the motors |

use core::fmt;

// Request words
pub const REQ_SPEED_UP: &str = "p";
pub const REQ_SPEED_DOWN: &str = "q";
pub const REQ_RAMP: &str = "v";
pub const REQ_RAMP_SIDES: &str = "w";
pub const REQ_MOVE: &str = "m";
pub const REQ_LEFT: &str = "l";
pub const REQ_RIGHT: &str = "r";
pub const REQ_STOP: &str = "s";

/// Help text printed at startup and after a parse error.
pub const HELP: &[&str] = &[
    "Speed Up   --> p",
    "Speed Down --> q",
    "Ramp       --> v <speed> <slope seconds> (max +-40000)",
    "Ramp sides --> w <left> <right> <slope seconds>",
    "Move       --> m <steps>",
    "Left/Right --> l <speed> / r <speed>",
    "Stop       --> s",
];

/// A parsed console request.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleRequest {
    SpeedUp,
    SpeedDown,
    /// Ramp both motors to `speed` over `slope_us` microseconds.
    RampTo { speed: i32, slope_us: u32 },
    /// Ramp the left and right motors to their own speeds over `slope_us` microseconds.
    RampSides { left: i32, right: i32, slope_us: u32 },
    /// Move both motors by whole steps.
    MoveSteps(i32),
    /// Left (primary) motor speed, applied immediately.
    SetLeft(i32),
    /// Right (mirrored) motor speed, applied immediately.
    SetRight(i32),
    Stop,
}

/// Why a console line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line is not valid UTF-8.
    Encoding,
    /// First word is not a known request.
    UnknownRequest,
    /// A required argument is absent.
    MissingArgument,
    /// More arguments than the request takes.
    UnexpectedArgument,
    /// An argument is not a valid number for its position.
    InvalidNumber,
    /// Line exceeded the input buffer and was discarded.
    LineTooLong,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseError::Encoding => "line is not valid text",
            ParseError::UnknownRequest => "unknown request",
            ParseError::MissingArgument => "missing argument",
            ParseError::UnexpectedArgument => "too many arguments",
            ParseError::InvalidNumber => "invalid number",
            ParseError::LineTooLong => "line too long",
        };
        f.write_str(msg)
    }
}

/// Console feedback after a request has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// One ramp increment was applied.
    RampStep(i32),
    /// Ramp was interrupted at this speed.
    RampAborted(i32),
    /// Speed set without ramping.
    Speed(i32),
    /// Per-side speeds, left then right.
    Sides(i32, i32),
    /// Step move issued, in microsteps.
    Microsteps(i32),
    /// Motors stopped and released.
    Stopped,
}

impl fmt::Display for Echo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Echo::RampStep(v) => write!(f, "{}", v),
            Echo::RampAborted(v) => write!(f, "*** Ramp aborted at {} ***", v),
            Echo::Speed(v) => write!(f, "*** Speed {} ***", v),
            Echo::Sides(l, r) => write!(f, "*** Left {} Right {} ***", l, r),
            Echo::Microsteps(n) => write!(f, "*** {} microsteps ***", n),
            Echo::Stopped => f.write_str("***** SoftStop, HiZ. *****"),
        }
    }
}
