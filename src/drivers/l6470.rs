// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ST L6470 ("dSPIN") SPI command codec.
//!
//! This module handles framing for the subset of the L6470 command set used by the drive: `Run`,
//! `Move`, `SoftStop`, `HardHiZ` and `SetParam`. Every frame is one command byte followed by a
//! payload whose length is fixed by the command byte. Multi-byte values go out MSB first.
//!
//! Encoding is pure; nothing here touches the bus. See [`crate::drivers::transport`] for that.

use core::fmt;

/// Command opcodes.
pub mod cmd {
    /// `SetParam`, OR-ed with the 5-bit register address.
    pub const SET_PARAM: u8 = 0x00;
    /// `Move` in the reverse direction. Forward is `MOVE | DIR_FWD`.
    pub const MOVE: u8 = 0x40;
    /// `Run` in the reverse direction. Forward is `RUN | DIR_FWD`.
    pub const RUN: u8 = 0x50;
    pub const HARD_HIZ: u8 = 0xA8;
    pub const SOFT_STOP: u8 = 0xB0;

    /// Direction bit of `Run` / `Move`.
    pub const DIR_FWD: u8 = 0x01;
}

// Register addresses
pub mod reg {
    pub const MAX_SPEED: u8 = 0x07;
    pub const KVAL_HOLD: u8 = 0x09;
    pub const KVAL_RUN: u8 = 0x0A;
    pub const KVAL_ACC: u8 = 0x0B;
    pub const KVAL_DEC: u8 = 0x0C;
    pub const ST_SLP: u8 = 0x0E;
    pub const FN_SLP_DEC: u8 = 0x10;
    pub const OCD_TH: u8 = 0x13;
    pub const STALL_TH: u8 = 0x14;
}

/// Width of the `Run` speed and `Move` step payloads.
pub const MOTION_BITS: u8 = 20;

/// Largest magnitude a `Run` or `Move` payload can carry.
pub const MOTION_MAX: u32 = (1 << MOTION_BITS) - 1;

/// Payload bytes following a `Run` or `Move` command byte.
const MOTION_PAYLOAD_LEN: usize = 3;

/// Longest frame on the wire: command byte + 3 payload bytes.
pub const MAX_FRAME_LEN: usize = 1 + MOTION_PAYLOAD_LEN;

/// A motion request for a single channel.
///
/// The sign of `RunAtSpeed` / `MoveSteps` carries the direction; negative is reverse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionCommand {
    /// Run continuously at the given speed (chip `SPEED` units, 20-bit magnitude).
    RunAtSpeed(i32),
    /// Move a relative number of microsteps (20-bit magnitude).
    MoveSteps(i32),
    /// Decelerate to zero using the `DEC` profile, then hold.
    SoftStop,
    /// Put the bridges into high impedance immediately.
    HighImpedanceStop,
}

impl MotionCommand {
    /// The same command in the opposite direction. Stops are unchanged.
    ///
    /// Uses wrapping negation; `i32::MIN` is out of range for the chip anyway and is rejected by
    /// [`encode`].
    pub fn mirrored(self) -> Self {
        match self {
            MotionCommand::RunAtSpeed(v) => MotionCommand::RunAtSpeed(v.wrapping_neg()),
            MotionCommand::MoveSteps(n) => MotionCommand::MoveSteps(n.wrapping_neg()),
            stop => stop,
        }
    }
}

/// A value did not fit in its field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange {
    /// Offending magnitude (after sign removal).
    pub value: u32,
    /// Width of the field it was meant for.
    pub bits: u8,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value {} does not fit in {} bits", self.value, self.bits)
    }
}

/// Reasons a byte sequence is not a valid motion frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// No command byte.
    Empty,
    /// Command byte is not one this codec produces.
    UnknownCommand(u8),
    /// Payload length does not match the command class.
    PayloadLength { expected: usize, actual: usize },
}

/// One command byte plus its payload, stored inline.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct RegisterFrame {
    bytes: [u8; MAX_FRAME_LEN],
    len: u8,
}

impl RegisterFrame {
    fn new(command: u8, payload: &[u8]) -> Self {
        debug_assert!(payload.len() < MAX_FRAME_LEN);
        let mut bytes = [0u8; MAX_FRAME_LEN];
        bytes[0] = command;
        bytes[1..1 + payload.len()].copy_from_slice(payload);
        Self {
            bytes,
            len: (payload.len() + 1) as u8,
        }
    }

    /// The command / register-address byte.
    #[inline]
    pub fn command(&self) -> u8 {
        self.bytes[0]
    }

    /// Bytes following the command byte.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..self.len as usize]
    }

    /// The full frame, in transmission order.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Frames always carry at least a command byte.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for RegisterFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_bytes()).finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RegisterFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:#x}", self.as_bytes())
    }
}

/// Check `value` against a `bits`-wide field.
#[inline]
fn check_width(value: u32, bits: u8) -> Result<u32, OutOfRange> {
    if bits < 32 && value >> bits != 0 {
        Err(OutOfRange { value, bits })
    } else {
        Ok(value)
    }
}

/// Split a 20-bit magnitude into the three payload bytes: bits 16..=19 in the low nibble of the
/// first byte, then bits 8..=15, then bits 0..=7.
#[inline]
fn split_motion(magnitude: u32) -> [u8; MOTION_PAYLOAD_LEN] {
    [
        ((magnitude >> 16) & 0x0F) as u8,
        ((magnitude >> 8) & 0xFF) as u8,
        (magnitude & 0xFF) as u8,
    ]
}

#[inline]
fn join_motion(payload: &[u8]) -> u32 {
    ((payload[0] as u32 & 0x0F) << 16) | ((payload[1] as u32) << 8) | payload[2] as u32
}

/// Direction-encoded motion frame for `Run` / `Move`.
fn motion_frame(base: u8, value: i32) -> Result<RegisterFrame, OutOfRange> {
    let magnitude = check_width(value.unsigned_abs(), MOTION_BITS)?;
    let opcode = if value < 0 { base } else { base | cmd::DIR_FWD };
    Ok(RegisterFrame::new(opcode, &split_motion(magnitude)))
}

/// Encode a motion command into its wire frame.
///
/// Fails with [`OutOfRange`] if the speed or step magnitude needs more than 20 bits.
pub fn encode(command: MotionCommand) -> Result<RegisterFrame, OutOfRange> {
    match command {
        MotionCommand::RunAtSpeed(v) => motion_frame(cmd::RUN, v),
        MotionCommand::MoveSteps(n) => motion_frame(cmd::MOVE, n),
        MotionCommand::SoftStop => Ok(RegisterFrame::new(cmd::SOFT_STOP, &[])),
        MotionCommand::HighImpedanceStop => Ok(RegisterFrame::new(cmd::HARD_HIZ, &[])),
    }
}

/// Decode a motion frame produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<MotionCommand, DecodeError> {
    let (&opcode, payload) = bytes.split_first().ok_or(DecodeError::Empty)?;

    let expected = match opcode & !cmd::DIR_FWD {
        cmd::RUN | cmd::MOVE => MOTION_PAYLOAD_LEN,
        _ if opcode == cmd::SOFT_STOP || opcode == cmd::HARD_HIZ => 0,
        _ => return Err(DecodeError::UnknownCommand(opcode)),
    };
    if payload.len() != expected {
        return Err(DecodeError::PayloadLength {
            expected,
            actual: payload.len(),
        });
    }

    let signed = || {
        let magnitude = join_motion(payload) as i32;
        if opcode & cmd::DIR_FWD != 0 {
            magnitude
        } else {
            -magnitude
        }
    };

    Ok(match opcode & !cmd::DIR_FWD {
        cmd::RUN => MotionCommand::RunAtSpeed(signed()),
        cmd::MOVE => MotionCommand::MoveSteps(signed()),
        _ if opcode == cmd::SOFT_STOP => MotionCommand::SoftStop,
        _ => MotionCommand::HighImpedanceStop,
    })
}

/// Field width of a configuration register, in bits.
///
/// Only the registers written by the init profile are listed.
pub fn register_width(register: u8) -> Option<u8> {
    match register {
        reg::MAX_SPEED => Some(10),
        reg::KVAL_HOLD | reg::KVAL_RUN | reg::KVAL_ACC | reg::KVAL_DEC => Some(8),
        reg::ST_SLP | reg::FN_SLP_DEC => Some(8),
        reg::OCD_TH => Some(4),
        reg::STALL_TH => Some(7),
        _ => None,
    }
}

/// Encode a `SetParam` write of `value` to `register`.
///
/// The payload is `ceil(width / 8)` bytes, MSB first. Unknown registers are treated as 8 bits
/// wide.
pub fn encode_register(register: u8, value: u32) -> Result<RegisterFrame, OutOfRange> {
    let bits = register_width(register).unwrap_or(8);
    let value = check_width(value, bits)?;
    let opcode = cmd::SET_PARAM | (register & 0x1F);

    if bits > 8 {
        Ok(RegisterFrame::new(opcode, &[(value >> 8) as u8, value as u8]))
    } else {
        Ok(RegisterFrame::new(opcode, &[value as u8]))
    }
}
