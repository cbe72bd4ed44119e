// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Mirrored axis pair.
//!
//! The two drive motors face each other across the chassis, so "forward" for the robot is forward
//! on the primary channel and reverse on the mirrored one. [`AxisPair::apply`] turns one logical
//! motion request into the two channel-local frames and sends them, primary first.

use crate::drivers::l6470::{encode, MotionCommand};
use crate::drivers::{ChannelTransport, Duplex, MotorChannel};
use crate::error::Error;

/// One side of an [`AxisPair`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    /// Left motor, commands sent unchanged.
    Primary,
    /// Right motor, commands sent sign-inverted.
    Mirrored,
}

/// Two distinct channels with a fixed sign relationship: the mirrored channel always receives the
/// negated speed or step count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisPair {
    primary: MotorChannel,
    mirrored: MotorChannel,
}

impl Default for AxisPair {
    /// Primary on CS0, mirrored on CS1.
    fn default() -> Self {
        Self {
            primary: MotorChannel::Cs0,
            mirrored: MotorChannel::Cs1,
        }
    }
}

impl AxisPair {
    /// Pair two channels. Returns `None` if both are the same channel.
    pub fn new(primary: MotorChannel, mirrored: MotorChannel) -> Option<Self> {
        if primary == mirrored {
            None
        } else {
            Some(Self { primary, mirrored })
        }
    }

    #[inline]
    pub fn primary(&self) -> MotorChannel {
        self.primary
    }

    #[inline]
    pub fn mirrored(&self) -> MotorChannel {
        self.mirrored
    }

    /// Channel driving `side`.
    #[inline]
    pub fn channel(&self, side: Side) -> MotorChannel {
        match side {
            Side::Primary => self.primary,
            Side::Mirrored => self.mirrored,
        }
    }

    /// Channel-local commands for one logical request, in send order.
    pub fn split(&self, command: MotionCommand) -> [(MotorChannel, MotionCommand); 2] {
        [
            (self.primary, command),
            (self.mirrored, command.mirrored()),
        ]
    }

    /// Send `command` to both channels: unchanged to the primary, sign-inverted to the mirrored
    /// channel. Stops are broadcast unchanged.
    ///
    /// Both frames are encoded before anything is sent. If the primary send fails the mirrored
    /// channel is not attempted and `Error::Transport` is returned; if only the mirrored send
    /// fails the result is `Error::ChannelSync`.
    pub fn apply<B: Duplex>(
        &self,
        transport: &mut ChannelTransport<B>,
        command: MotionCommand,
    ) -> Result<(), Error<B::Error>> {
        self.apply_split(transport, command, command)
    }

    /// Send independent commands to each side, both expressed in the robot's frame of reference.
    ///
    /// `mirrored` is sign-inverted before it goes out, exactly as in [`apply`](Self::apply).
    pub fn apply_split<B: Duplex>(
        &self,
        transport: &mut ChannelTransport<B>,
        primary: MotionCommand,
        mirrored: MotionCommand,
    ) -> Result<(), Error<B::Error>> {
        let first = encode(primary)?;
        let second = encode(mirrored.mirrored())?;

        transport
            .send(self.primary, &first)
            .map_err(|cause| Error::Transport {
                channel: self.primary,
                cause,
            })?;

        transport.send(self.mirrored, &second).map_err(|cause| {
            warn!(
                "channel {} failed after channel {} was updated",
                self.mirrored.index(),
                self.primary.index()
            );
            Error::ChannelSync {
                failed: self.mirrored,
                cause,
            }
        })
    }

    /// Send `command` to one side only, sign-inverted if that side is the mirrored one.
    pub fn apply_side<B: Duplex>(
        &self,
        transport: &mut ChannelTransport<B>,
        side: Side,
        command: MotionCommand,
    ) -> Result<(), Error<B::Error>> {
        let channel = self.channel(side);
        let frame = match side {
            Side::Primary => encode(command)?,
            Side::Mirrored => encode(command.mirrored())?,
        };
        transport
            .send(channel, &frame)
            .map_err(|cause| Error::Transport { channel, cause })
    }
}
