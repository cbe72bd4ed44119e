// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Speed unit conversions.
//!
//! The L6470 `SPEED` value is expressed in steps per tick scaled by 2^-28, with a 250 ns tick.
//! [`Wheel`] carries the drive geometry needed to go from there to wheel speeds.

#[allow(unused_imports)]
use micromath::F32Ext;

/// Steps per second represented by one unit of chip speed: `2^-28 / 250 ns`.
pub const STEPS_PER_SEC_PER_UNIT: f32 = 1.0 / (268_435_456.0 * 250.0e-9);

/// Chip speed units to steps per second.
#[inline]
pub fn speed_to_steps_per_sec(speed: i32) -> f32 {
    speed as f32 * STEPS_PER_SEC_PER_UNIT
}

/// Steps per second to the nearest chip speed value. Saturates at the `i32` range.
#[inline]
pub fn steps_per_sec_to_speed(steps_per_sec: f32) -> i32 {
    (steps_per_sec / STEPS_PER_SEC_PER_UNIT).round() as i32
}

/// Wheel geometry for converting between chip speed and travel speed.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Wheel {
    /// Wheel diameter in centimeters.
    pub diameter_cm: f32,
    /// Full steps per wheel revolution.
    pub steps_per_rev: u32,
    /// Distance between the two wheel contact points, in centimeters.
    pub track_cm: f32,
}

impl Default for Wheel {
    fn default() -> Self {
        Self {
            diameter_cm: 9.8,
            steps_per_rev: 200,
            track_cm: 21.3,
        }
    }
}

impl Wheel {
    #[inline]
    fn circumference_cm(&self) -> f32 {
        self.diameter_cm * core::f32::consts::PI
    }

    pub fn speed_to_rev_per_sec(&self, speed: i32) -> f32 {
        speed_to_steps_per_sec(speed) / self.steps_per_rev as f32
    }

    pub fn rev_per_sec_to_speed(&self, rev_per_sec: f32) -> i32 {
        steps_per_sec_to_speed(rev_per_sec * self.steps_per_rev as f32)
    }

    pub fn speed_to_cm_per_sec(&self, speed: i32) -> f32 {
        self.speed_to_rev_per_sec(speed) * self.circumference_cm()
    }

    pub fn cm_per_sec_to_speed(&self, cm_per_sec: f32) -> i32 {
        self.rev_per_sec_to_speed(cm_per_sec / self.circumference_cm())
    }

    /// Forward speed of the chassis center from the two wheel speeds (cm/s).
    #[inline]
    pub fn center_velocity(&self, left_cm_s: f32, right_cm_s: f32) -> f32 {
        (left_cm_s + right_cm_s) / 2.0
    }

    /// Turn rate of the chassis in rad/s from the two wheel speeds (cm/s), positive to the left.
    #[inline]
    pub fn yaw_rate(&self, left_cm_s: f32, right_cm_s: f32) -> f32 {
        (right_cm_s - left_cm_s) / self.track_cm
    }
}
