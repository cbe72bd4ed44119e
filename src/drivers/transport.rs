// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Chip-select channel transport.
//!
//! The two L6470s share one SPI bus and are told apart only by their chip-select line. The
//! [`Duplex`] primitive exchanges bytes on one line; [`ChannelTransport`] sits on top and ships a
//! [`RegisterFrame`] to a channel one byte at a time. The L6470 latches every byte on the rising
//! edge of CS, so the primitive must deassert CS between bytes.

use core::convert::TryFrom;

use crate::drivers::l6470::RegisterFrame;

/// One of the two chip-select channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorChannel {
    Cs0,
    Cs1,
}

impl MotorChannel {
    /// Channel index (0 or 1).
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            MotorChannel::Cs0 => 0,
            MotorChannel::Cs1 => 1,
        }
    }
}

impl TryFrom<u8> for MotorChannel {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, u8> {
        match id {
            0 => Ok(MotorChannel::Cs0),
            1 => Ok(MotorChannel::Cs1),
            other => Err(other),
        }
    }
}

/// Full-duplex byte exchange on a selected chip-select line.
///
/// Implementations assert the channel's CS, clock `buf` out while overwriting it with the bytes
/// clocked in, and deassert CS before returning, also on failure.
pub trait Duplex {
    type Error;

    /// Exchange `buf` in place on `channel`. Returns the number of bytes exchanged.
    fn transfer(&mut self, channel: MotorChannel, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Failure of a single frame transmission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
    /// The duplex primitive reported an error.
    Bus(E),
    /// The primitive exchanged fewer bytes than requested.
    ShortTransfer { expected: usize, actual: usize },
}

/// Ships frames to either chip-select channel over one [`Duplex`] bus.
///
/// The transport owns the bus, so every chip-select change goes through `&mut self`.
pub struct ChannelTransport<B> {
    bus: B,
}

impl<B: Duplex> ChannelTransport<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Release the bus.
    pub fn free(self) -> B {
        self.bus
    }

    /// Access the underlying bus.
    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Send one byte on `channel` and return the byte clocked back.
    pub fn exchange_byte(
        &mut self,
        channel: MotorChannel,
        byte: u8,
    ) -> Result<u8, TransportError<B::Error>> {
        let mut tmp = [byte];
        let n = self
            .bus
            .transfer(channel, &mut tmp)
            .map_err(TransportError::Bus)?;
        if n != tmp.len() {
            return Err(TransportError::ShortTransfer {
                expected: tmp.len(),
                actual: n,
            });
        }
        Ok(tmp[0])
    }

    /// Transmit every byte of `frame` on `channel`, in order, as single-byte exchanges.
    ///
    /// Returned bytes are discarded. Stops at the first failed byte; the frame is not retried, as
    /// resending a partial frame would desynchronize the chip's command decoder.
    pub fn send(
        &mut self,
        channel: MotorChannel,
        frame: &RegisterFrame,
    ) -> Result<(), TransportError<B::Error>> {
        for &byte in frame.as_bytes() {
            let _ = self.exchange_byte(channel, byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::l6470::{encode, MotionCommand};
    use crate::mock::{BusError, RecordingBus};

    #[test]
    fn channel_ids() {
        assert_eq!(MotorChannel::try_from(0), Ok(MotorChannel::Cs0));
        assert_eq!(MotorChannel::try_from(1), Ok(MotorChannel::Cs1));
        assert_eq!(MotorChannel::try_from(2), Err(2));
        assert_eq!(MotorChannel::Cs1.index(), 1);
    }

    #[test]
    fn send_ships_each_byte_separately_in_order() {
        let mut transport = ChannelTransport::new(RecordingBus::new());
        let frame = encode(MotionCommand::RunAtSpeed(0x1_0203)).unwrap();

        transport.send(MotorChannel::Cs1, &frame).unwrap();

        let bus = transport.free();
        assert_eq!(
            bus.sent(),
            &[
                (MotorChannel::Cs1, 0x51),
                (MotorChannel::Cs1, 0x01),
                (MotorChannel::Cs1, 0x02),
                (MotorChannel::Cs1, 0x03),
            ]
        );
        assert_eq!(bus.transfer_calls(), 4);
        assert!(!bus.selected());
    }

    #[test]
    fn back_to_back_sends_do_not_interleave() {
        let mut transport = ChannelTransport::new(RecordingBus::new());
        let a = encode(MotionCommand::MoveSteps(5)).unwrap();
        let b = encode(MotionCommand::SoftStop).unwrap();

        transport.send(MotorChannel::Cs0, &a).unwrap();
        transport.send(MotorChannel::Cs1, &b).unwrap();

        let channels: Vec<_> = transport.bus().sent().iter().map(|(c, _)| *c).collect();
        assert_eq!(
            channels,
            [
                MotorChannel::Cs0,
                MotorChannel::Cs0,
                MotorChannel::Cs0,
                MotorChannel::Cs0,
                MotorChannel::Cs1,
            ]
        );
    }

    #[test]
    fn bus_error_stops_the_frame() {
        let mut transport = ChannelTransport::new(RecordingBus::new().fail_at(2));
        let frame = encode(MotionCommand::RunAtSpeed(100)).unwrap();

        assert_eq!(
            transport.send(MotorChannel::Cs0, &frame),
            Err(TransportError::Bus(BusError))
        );

        let bus = transport.free();
        assert_eq!(bus.sent().len(), 2);
        assert!(!bus.selected());
    }

    #[test]
    fn short_transfer_is_an_error() {
        let mut transport = ChannelTransport::new(RecordingBus::new().short_at(0));
        let frame = encode(MotionCommand::SoftStop).unwrap();

        assert_eq!(
            transport.send(MotorChannel::Cs0, &frame),
            Err(TransportError::ShortTransfer {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn exchange_returns_clocked_in_byte() {
        let mut transport = ChannelTransport::new(RecordingBus::new().with_reply(0x7E));
        assert_eq!(transport.exchange_byte(MotorChannel::Cs0, 0x00), Ok(0x7E));
    }
}
