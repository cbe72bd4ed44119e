// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! SysTick-based blocking delay.
//!
//! `cortex-m` 0.7 only implements the `embedded-hal` 0.2 delay traits, so [`SysDelay`] wraps its
//! `Delay` to provide `DelayNs`.

use cortex_m::delay::Delay;
use embedded_hal::delay::DelayNs;

pub struct SysDelay {
    inner: Delay,
}

impl SysDelay {
    pub fn new(inner: Delay) -> Self {
        Self { inner }
    }

    pub fn free(self) -> Delay {
        self.inner
    }
}

impl DelayNs for SysDelay {
    /// Rounded up to whole microseconds, the SysTick resolution used here.
    fn delay_ns(&mut self, ns: u32) {
        self.inner.delay_us(ns.div_ceil(1000));
    }

    #[inline]
    fn delay_us(&mut self, us: u32) {
        self.inner.delay_us(us);
    }

    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        self.inner.delay_ms(ms);
    }
}
