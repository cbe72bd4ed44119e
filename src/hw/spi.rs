// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial Peripheral Interface (SPI) abstraction layer.
//!
//! - `SpiBus` wraps a configured HAL SPI instance with 8-bit words.
//! - `ChipSelect` is an active-low GPIO output wrapper for manual CS control.
//! - `DualChannelSpi` puts two L6470s on one bus and implements [`Duplex`] for them.

use stm32f7xx_hal::{
    gpio::{self, Output, PinState, PushPull},
    prelude::*,
    spi::{self, Enabled, Spi},
};

use crate::drivers::{Duplex, MotorChannel};
use crate::hw::board::CS_DESELECT_CYCLES;

/// Wrapper around an enabled HAL SPI instance (8-bit words).
pub struct SpiBus<I, P> {
    spi: Spi<I, P, Enabled<u8>>,
}

impl<I, P> SpiBus<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(spi: Spi<I, P, Enabled<u8>>) -> Self {
        Self { spi }
    }

    /// Perform a blocking, full-duplex transfer of one byte.
    pub fn transfer_byte(&mut self, byte: u8) -> Result<u8, spi::Error> {
        let mut tmp = [byte];
        self.spi.transfer(&mut tmp)?;
        Ok(tmp[0])
    }

    pub fn free(self) -> Spi<I, P, Enabled<u8>> {
        self.spi
    }
}

/// Manual chip-select line, active-low, generic over any GPIO pin.
pub struct ChipSelect<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> ChipSelect<P, N> {
    /// Create an active-low chip select and set to the inactive state (i.e., high).
    pub fn active_low<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        let mut pin = pin.into_push_pull_output();
        pin.set_state(PinState::High);
        Self { pin }
    }

    /// Assert the chip select.
    #[inline]
    pub fn select(&mut self) {
        self.pin.set_low();
    }

    /// Deassert the chip select.
    #[inline]
    pub fn deselect(&mut self) {
        self.pin.set_high();
    }

    pub fn free(self) -> gpio::Pin<P, N, Output<PushPull>> {
        self.pin
    }
}

/// One SPI bus shared by two L6470s, told apart by their chip-select lines.
///
/// CS is pulsed around every byte: the L6470 executes a byte on the CS rising edge and needs CS
/// high for at least 800 ns before the next one.
pub struct DualChannelSpi<I, PINS, const P0: char, const N0: u8, const P1: char, const N1: u8> {
    bus: SpiBus<I, PINS>,
    cs0: ChipSelect<P0, N0>,
    cs1: ChipSelect<P1, N1>,
}

impl<I, PINS, const P0: char, const N0: u8, const P1: char, const N1: u8>
    DualChannelSpi<I, PINS, P0, N0, P1, N1>
where
    I: spi::Instance,
    PINS: spi::Pins<I>,
{
    /// Both chip selects are deasserted on construction.
    pub fn new(bus: SpiBus<I, PINS>, cs0: ChipSelect<P0, N0>, cs1: ChipSelect<P1, N1>) -> Self {
        let mut dual = Self { bus, cs0, cs1 };
        dual.deselect_all();
        dual
    }

    pub fn free(self) -> (SpiBus<I, PINS>, ChipSelect<P0, N0>, ChipSelect<P1, N1>) {
        (self.bus, self.cs0, self.cs1)
    }

    #[inline]
    fn select(&mut self, channel: MotorChannel) {
        match channel {
            MotorChannel::Cs0 => self.cs0.select(),
            MotorChannel::Cs1 => self.cs1.select(),
        }
    }

    #[inline]
    fn deselect_all(&mut self) {
        self.cs0.deselect();
        self.cs1.deselect();
    }
}

impl<I, PINS, const P0: char, const N0: u8, const P1: char, const N1: u8> Duplex
    for DualChannelSpi<I, PINS, P0, N0, P1, N1>
where
    I: spi::Instance,
    PINS: spi::Pins<I>,
{
    type Error = spi::Error;

    fn transfer(&mut self, channel: MotorChannel, buf: &mut [u8]) -> Result<usize, spi::Error> {
        let mut done = 0;
        for b in buf.iter_mut() {
            self.select(channel);
            let rx = self.bus.transfer_byte(*b);
            self.deselect_all();
            cortex_m::asm::delay(CS_DESELECT_CYCLES);

            *b = rx?;
            done += 1;
        }
        Ok(done)
    }
}
