// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # twinstep
//!
//! Driver and control logic for a differential-drive robot built from two stepper motors, each
//! behind its own ST L6470 ("dSPIN") driver on a shared SPI bus with one chip-select line per
//! motor. The two motors are mounted mirrored, so every motion command sent to the second channel
//! is sign-inverted.
//!
//! The library is `no_std` and hardware-agnostic: it only needs a byte-level duplex exchange
//! ([`drivers::Duplex`]) and a blocking `embedded_hal` delay (`DelayNs`). The STM32F7 bindings
//! and the firmware binary live behind the `stm32` feature.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`drivers`] | L6470 register codec, chip-select transport, init profile |
//! | [`motors`] | Mirrored axis pair (dual-channel synchronizer) |
//! | [`control`] | Speed ramps and the differential drive control loop |
//! | [`protocol`] | Operator console line protocol |
//! | [`config`] | Drive configuration defaults |
//! | `hw` | MCU-level wrappers around SPI, USART and delay (feature `stm32`) |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features stm32 --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod motors;
pub mod protocol;

#[cfg(feature = "stm32")]
pub mod hw;

#[cfg(test)]
pub(crate) mod mock;

pub use config::DriveConfig;
pub use error::Error;
