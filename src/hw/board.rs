// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board constants and pin assignments for the STM32F777 drive board.
//!
//! | Signal | Pin |
//! | ------ | --- |
//! | SPI4 SCK / MISO / MOSI | PE12 / PE13 / PE14 (AF5) |
//! | L6470 #0 CS (primary, left) | PE4 |
//! | L6470 #1 CS (mirrored, right) | PE11 |
//! | USART1 TX / RX (console) | PA9 / PA10 (AF7) |

use stm32f7xx_hal::spi::{Mode, Phase, Polarity};

/// SPI clock for both L6470s.
pub const SPI_FREQ_HZ: u32 = 1_000_000;

/// The L6470 samples on the rising edge with the clock idling high (SPI mode 3).
pub const SPI_MODE: Mode = Mode {
    polarity: Polarity::IdleHigh,
    phase: Phase::CaptureOnSecondTransition,
};

/// Console baud rate.
pub const USART_BAUD: u32 = 115_200;

/// Core cycles to hold CS high between bytes; covers the L6470's 800 ns `t_disCS` at 216 MHz.
pub const CS_DESELECT_CYCLES: u32 = 200;
