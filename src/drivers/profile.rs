// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Chip initialization profile.
//!
//! Register values written to each L6470 once at startup, before any motion command. Issuing
//! motion commands to an uninitialized chip runs it on power-on defaults; this is not guarded.

use crate::drivers::l6470::{encode_register, reg, OutOfRange, RegisterFrame};
use crate::drivers::transport::{ChannelTransport, Duplex, MotorChannel};
use crate::error::Error;

/// Number of register writes in a profile.
pub const PROFILE_LEN: usize = 9;

/// Configuration register values applied by [`InitProfile::initialize`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitProfile {
    /// `MAX_SPEED` (10 bits). Power-on default is 0x041.
    pub max_speed: u16,
    /// Bridge voltage while stopped.
    pub kval_hold: u8,
    /// Bridge voltage at constant speed.
    pub kval_run: u8,
    /// Bridge voltage while accelerating.
    pub kval_acc: u8,
    /// Bridge voltage while decelerating. Power-on default is 0x8A.
    pub kval_dec: u8,
    /// Overcurrent threshold (4 bits).
    pub ocd_th: u8,
    /// Stall threshold (7 bits).
    pub stall_th: u8,
    /// BEMF compensation start slope.
    pub st_slp: u8,
    /// BEMF compensation final slope while decelerating.
    pub fn_slp_dec: u8,
}

impl Default for InitProfile {
    fn default() -> Self {
        Self {
            max_speed: 0x025,
            kval_hold: 0xFF,
            kval_run: 0xFF,
            kval_acc: 0xFF,
            kval_dec: 0x40,
            ocd_th: 0x0F,
            stall_th: 0x7F,
            st_slp: 0x00,
            fn_slp_dec: 0x29,
        }
    }
}

impl InitProfile {
    /// Override `MAX_SPEED`.
    pub fn with_max_speed(mut self, max_speed: u16) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Override all four bridge voltages.
    pub fn with_kvals(mut self, hold: u8, run: u8, acc: u8, dec: u8) -> Self {
        self.kval_hold = hold;
        self.kval_run = run;
        self.kval_acc = acc;
        self.kval_dec = dec;
        self
    }

    /// Override the overcurrent and stall thresholds.
    pub fn with_thresholds(mut self, ocd_th: u8, stall_th: u8) -> Self {
        self.ocd_th = ocd_th;
        self.stall_th = stall_th;
        self
    }

    /// `(register, value)` pairs in write order.
    pub fn writes(&self) -> [(u8, u32); PROFILE_LEN] {
        [
            (reg::MAX_SPEED, self.max_speed as u32),
            (reg::KVAL_HOLD, self.kval_hold as u32),
            (reg::KVAL_RUN, self.kval_run as u32),
            (reg::KVAL_ACC, self.kval_acc as u32),
            (reg::KVAL_DEC, self.kval_dec as u32),
            (reg::OCD_TH, self.ocd_th as u32),
            (reg::STALL_TH, self.stall_th as u32),
            (reg::ST_SLP, self.st_slp as u32),
            (reg::FN_SLP_DEC, self.fn_slp_dec as u32),
        ]
    }

    /// Encode every register write. Fails if any value is wider than its register.
    pub fn frames(&self) -> Result<[RegisterFrame; PROFILE_LEN], OutOfRange> {
        let writes = self.writes();
        let mut frames = [encode_register(writes[0].0, writes[0].1)?; PROFILE_LEN];
        for (frame, &(register, value)) in frames.iter_mut().zip(writes.iter()).skip(1) {
            *frame = encode_register(register, value)?;
        }
        Ok(frames)
    }

    /// Write the profile to the chip on `channel`.
    ///
    /// All frames are encoded before the first byte goes out.
    pub fn initialize<B: Duplex>(
        &self,
        transport: &mut ChannelTransport<B>,
        channel: MotorChannel,
    ) -> Result<(), Error<B::Error>> {
        let frames = self.frames()?;
        for frame in frames.iter() {
            transport
                .send(channel, frame)
                .map_err(|cause| Error::Transport { channel, cause })?;
        }
        info!("l6470 on channel {} initialized", channel.index());
        Ok(())
    }
}
