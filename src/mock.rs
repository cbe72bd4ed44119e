// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-side test doubles for the duplex bus and the delay.

use crate::drivers::l6470::{decode, MotionCommand};
use embedded_hal::delay::DelayNs;

use crate::drivers::{Duplex, MotorChannel};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusError;

/// Records every byte exchanged, per channel, and can inject failures at a given byte index.
#[derive(Default)]
pub struct RecordingBus {
    sent: Vec<(MotorChannel, u8)>,
    calls: usize,
    selected: bool,
    fail_at: Option<usize>,
    short_at: Option<usize>,
    reply: u8,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the exchange of the `n`th byte (0-based) with [`BusError`].
    pub fn fail_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Report zero bytes exchanged for the `n`th byte (0-based).
    pub fn short_at(mut self, n: usize) -> Self {
        self.short_at = Some(n);
        self
    }

    pub fn with_reply(mut self, reply: u8) -> Self {
        self.reply = reply;
        self
    }

    pub fn sent(&self) -> &[(MotorChannel, u8)] {
        &self.sent
    }

    pub fn transfer_calls(&self) -> usize {
        self.calls
    }

    /// Whether a chip-select line is still asserted.
    pub fn selected(&self) -> bool {
        self.selected
    }

    /// Bytes sent to one channel, in order.
    pub fn bytes_on(&self, channel: MotorChannel) -> Vec<u8> {
        self.sent
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, b)| *b)
            .collect()
    }

    /// Split everything sent to `channel` into motion frames and decode them.
    pub fn commands_on(&self, channel: MotorChannel) -> Vec<MotionCommand> {
        let bytes = self.bytes_on(channel);
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let len = match bytes[i] & 0xF0 {
                0x40 | 0x50 => 4,
                _ => 1,
            };
            out.push(decode(&bytes[i..i + len]).unwrap());
            i += len;
        }
        out
    }
}

impl Duplex for RecordingBus {
    type Error = BusError;

    fn transfer(&mut self, channel: MotorChannel, buf: &mut [u8]) -> Result<usize, BusError> {
        let index = self.calls;
        self.calls += 1;

        self.selected = true;
        let result = if self.fail_at == Some(index) {
            Err(BusError)
        } else if self.short_at == Some(index) {
            Ok(0)
        } else {
            for b in buf.iter_mut() {
                self.sent.push((channel, *b));
                *b = self.reply;
            }
            Ok(buf.len())
        };
        self.selected = false;

        result
    }
}

/// Records every requested delay, in microseconds.
#[derive(Default)]
pub struct RecordingDelay {
    pub delays: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays.push(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.delays.push(us);
    }
}
