// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains the L6470 driver pieces that sit below the motion logic. None of them
//! depend on a particular MCU; the bus is reached through the [`Duplex`] trait.
//!
//! ## Existing drivers
//!
//! - [`l6470`] – ST L6470 command and register codec
//! - [`transport`] – per-channel frame transport over a shared SPI bus
//! - [`profile`] – register values written at startup

pub mod l6470;
pub mod profile;
pub mod transport;

pub use l6470::{MotionCommand, OutOfRange, RegisterFrame};
pub use profile::InitProfile;
pub use transport::{ChannelTransport, Duplex, MotorChannel, TransportError};
