// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error type for motion requests.
//!
//! Nothing is rolled back or retried. After a `Transport` or `ChannelSync` error the two axes may
//! be out of step; callers should broadcast a stop (see
//! [`DifferentialDrive::emergency_stop`](crate::control::DifferentialDrive::emergency_stop)).

use crate::drivers::{MotorChannel, OutOfRange, TransportError};

/// Error for operations that encode and send frames. `E` is the bus error type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A value did not fit its field. Detected before anything was sent.
    OutOfRange(OutOfRange),
    /// Sending to `channel` failed. For a dual-channel request this is the first channel, and the
    /// second one was not attempted.
    Transport {
        channel: MotorChannel,
        cause: TransportError<E>,
    },
    /// The first channel accepted its frame and `failed` did not: the pair is desynchronized.
    ChannelSync {
        failed: MotorChannel,
        cause: TransportError<E>,
    },
}

impl<E> From<OutOfRange> for Error<E> {
    fn from(e: OutOfRange) -> Self {
        Error::OutOfRange(e)
    }
}

impl<E> Error<E> {
    /// Whether the hardware may have been left in a partially applied state.
    pub fn is_partial(&self) -> bool {
        matches!(self, Error::ChannelSync { .. })
    }
}
