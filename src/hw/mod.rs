// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCU-level wrappers for the STM32F777 (feature `stm32`).

pub mod board;
pub mod delay;
pub mod spi;
pub mod usart;

pub use delay::SysDelay;
pub use spi::{ChipSelect, DualChannelSpi, SpiBus};
pub use usart::{Usart, UsartRx};
