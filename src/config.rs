// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Drive configuration.

/// Tunables for [`DifferentialDrive`](crate::control::DifferentialDrive) and the operator console.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveConfig {
    /// Commanded-speed increment per ramp step.
    pub ramp_step: u32,
    /// Speed change applied by a single jog (speed up / speed down) request.
    pub jog_increment: i32,
    /// Requested speeds are clamped to `±max_speed`.
    pub max_speed: i32,
    /// Microsteps per full step, used to convert console step counts.
    pub microsteps: i32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            ramp_step: 100,
            jog_increment: 10_000,
            max_speed: 40_000,
            microsteps: 128,
        }
    }
}

impl DriveConfig {
    /// Set the ramp step. Zero is treated as one.
    pub fn with_ramp_step(mut self, step: u32) -> Self {
        self.ramp_step = step.max(1);
        self
    }

    pub fn with_jog_increment(mut self, increment: i32) -> Self {
        self.jog_increment = increment;
        self
    }

    /// Set the speed limit. Negative values are taken by magnitude.
    pub fn with_max_speed(mut self, max_speed: i32) -> Self {
        self.max_speed = max_speed.saturating_abs();
        self
    }

    pub fn with_microsteps(mut self, microsteps: i32) -> Self {
        self.microsteps = microsteps;
        self
    }

    /// Clamp a requested speed to the configured limit.
    #[inline]
    pub fn clamp_speed(&self, speed: i32) -> i32 {
        let limit = self.max_speed.saturating_abs();
        speed.clamp(-limit, limit)
    }
}
