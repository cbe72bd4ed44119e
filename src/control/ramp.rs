// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Linear speed ramp.
//!
//! [`SpeedRamp`] is a lazy iterator of `RunAtSpeed` commands that walks the commanded speed from
//! its current value to a target in fixed increments, landing exactly on the target. The caller
//! applies each command and waits [`SpeedRamp::step_delay_us`] before pulling the next one, so the
//! whole ramp takes roughly the requested slope duration. Dropping the iterator abandons the ramp
//! between two steps.
//!
//! Works in `no_std` and does not allocate memory.

use core::iter::FusedIterator;

use crate::drivers::MotionCommand;

/// Progress of one ramp.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampState {
    /// Last commanded speed (the start speed before the first step).
    pub current: i32,
    /// Speed the ramp ends on.
    pub target: i32,
    /// Requested ramp duration in microseconds.
    pub slope_us: u32,
    /// Steps emitted so far.
    pub elapsed_steps: u32,
}

impl RampState {
    #[inline]
    pub fn is_done(&self) -> bool {
        self.current == self.target
    }
}

/// Iterator over the intermediate `RunAtSpeed` commands of a ramp.
#[derive(Clone, Debug)]
pub struct SpeedRamp {
    state: RampState,
    step: u32,
    delay_us: u32,
    jump: bool,
}

/// Delay between ramp steps: `slope × min(span, step) / span`, where `span` is the distance to
/// cover. A single step shorter than `step` gets the whole slope.
pub fn step_delay_us(span: u64, slope_us: u32, step: u32) -> u32 {
    if span == 0 || slope_us == 0 {
        return 0;
    }
    let per_step = slope_us as u64 * span.min(step.max(1) as u64) / span;
    per_step.min(u32::MAX as u64) as u32
}

/// Distance between two speeds.
#[inline]
pub fn span(from: i32, to: i32) -> u64 {
    (to as i64 - from as i64).unsigned_abs()
}

impl SpeedRamp {
    /// Ramp from `current` to `target` over `slope_us` microseconds in increments of `step`.
    ///
    /// A zero `slope_us` jumps straight to the target in a single command. A zero `step` is
    /// treated as one.
    pub fn new(current: i32, target: i32, slope_us: u32, step: u32) -> Self {
        let step = step.max(1);
        Self {
            state: RampState {
                current,
                target,
                slope_us,
                elapsed_steps: 0,
            },
            step,
            delay_us: step_delay_us(span(current, target), slope_us, step),
            jump: slope_us == 0,
        }
    }

    /// Ramp from `current` to `target` in increments of `step`, waiting a fixed `delay_us` before
    /// each one. The total duration follows from the number of steps.
    pub fn stepped(current: i32, target: i32, step: u32, delay_us: u32) -> Self {
        let mut ramp = Self {
            state: RampState {
                current,
                target,
                slope_us: 0,
                elapsed_steps: 0,
            },
            step: step.max(1),
            delay_us,
            jump: false,
        };
        let total = ramp.remaining() as u64 * delay_us as u64;
        ramp.state.slope_us = total.min(u32::MAX as u64) as u32;
        ramp
    }

    /// Time to wait before applying each command.
    #[inline]
    pub fn step_delay_us(&self) -> u32 {
        self.delay_us
    }

    #[inline]
    pub fn state(&self) -> &RampState {
        &self.state
    }

    /// Commands left in the ramp.
    pub fn remaining(&self) -> usize {
        let distance = span(self.state.current, self.state.target);
        if distance == 0 {
            0
        } else if self.jump {
            1
        } else {
            distance.div_ceil(self.step as u64) as usize
        }
    }
}

impl Iterator for SpeedRamp {
    type Item = MotionCommand;

    fn next(&mut self) -> Option<MotionCommand> {
        let RampState {
            current, target, ..
        } = self.state;
        if current == target {
            return None;
        }

        let next = if self.jump {
            target
        } else if target > current {
            (current as i64 + self.step as i64).min(target as i64) as i32
        } else {
            (current as i64 - self.step as i64).max(target as i64) as i32
        };

        self.state.current = next;
        self.state.elapsed_steps += 1;
        Some(MotionCommand::RunAtSpeed(next))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for SpeedRamp {}

impl FusedIterator for SpeedRamp {}

#[cfg(test)]
mod tests {
    use super::*;

    fn speeds(ramp: SpeedRamp) -> Vec<i32> {
        ramp.map(|c| match c {
            MotionCommand::RunAtSpeed(v) => v,
            other => panic!("unexpected {:?}", other),
        })
        .collect()
    }

    #[test]
    fn equal_endpoints_are_empty() {
        for c in [0, 100, -4200, 40_000] {
            let ramp = SpeedRamp::new(c, c, 1_000_000, 100);
            assert_eq!(ramp.len(), 0);
            assert!(speeds(ramp).is_empty());
        }
    }

    #[test]
    fn zero_to_thousand_in_ten_steps() {
        let ramp = SpeedRamp::new(0, 1000, 2_000_000, 100);
        assert_eq!(ramp.len(), 10);
        assert_eq!(ramp.step_delay_us(), 200_000);

        let v = speeds(ramp);
        assert_eq!(v, [100, 200, 300, 400, 500, 600, 700, 800, 900, 1000]);
        assert!(v.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn crosses_zero_when_reversing() {
        let v = speeds(SpeedRamp::new(500, -300, 1_000_000, 100));
        assert_eq!(v, [400, 300, 200, 100, 0, -100, -200, -300]);
        assert!(v.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn last_step_is_clamped_to_target() {
        let v = speeds(SpeedRamp::new(0, 250, 1_000_000, 100));
        assert_eq!(v, [100, 200, 250]);

        let v = speeds(SpeedRamp::new(-30, -275, 1_000_000, 100));
        assert_eq!(v, [-130, -230, -275]);
    }

    #[test]
    fn ramp_to_zero_ends_on_zero() {
        let v = speeds(SpeedRamp::new(-350, 0, 1_000_000, 100));
        assert_eq!(v, [-250, -150, -50, 0]);
    }

    #[test]
    fn zero_slope_jumps_to_target() {
        let ramp = SpeedRamp::new(0, 1000, 0, 100);
        assert_eq!(ramp.step_delay_us(), 0);
        assert_eq!(ramp.len(), 1);
        assert_eq!(speeds(ramp), [1000]);
    }

    #[test]
    fn short_ramp_gets_whole_slope() {
        let ramp = SpeedRamp::new(0, 40, 500_000, 100);
        assert_eq!(ramp.step_delay_us(), 500_000);
        assert_eq!(speeds(ramp), [40]);
    }

    #[test]
    fn state_tracks_progress() {
        let mut ramp = SpeedRamp::new(0, 300, 300_000, 100);
        assert!(!ramp.state().is_done());

        ramp.next();
        assert_eq!(ramp.state().current, 100);
        assert_eq!(ramp.state().elapsed_steps, 1);
        assert_eq!(ramp.len(), 2);

        ramp.by_ref().for_each(drop);
        assert!(ramp.state().is_done());
        assert_eq!(ramp.state().elapsed_steps, 3);
        assert_eq!(ramp.next(), None);
    }

    #[test]
    fn stepped_ramp_uses_fixed_delay() {
        let ramp = SpeedRamp::stepped(1000, 650, 100, 30_000);
        assert_eq!(ramp.step_delay_us(), 30_000);
        assert_eq!(ramp.len(), 4);
        assert_eq!(ramp.state().slope_us, 120_000);
        assert_eq!(speeds(ramp), [900, 800, 700, 650]);
    }

    #[test]
    fn stepped_ramp_with_zero_delay_still_steps() {
        assert_eq!(speeds(SpeedRamp::stepped(0, 250, 100, 0)), [100, 200, 250]);
    }

    #[test]
    fn delay_scales_with_span() {
        assert_eq!(step_delay_us(1000, 2_000_000, 100), 200_000);
        assert_eq!(step_delay_us(2200, 1_100_000, 100), 50_000);
        assert_eq!(step_delay_us(40, 500_000, 100), 500_000);
        assert_eq!(step_delay_us(0, 500_000, 100), 0);
        assert_eq!(step_delay_us(1000, 0, 100), 0);
    }

    #[test]
    fn extreme_span_does_not_overflow() {
        let ramp = SpeedRamp::new(i32::MIN, i32::MAX, u32::MAX, u32::MAX);
        assert_eq!(ramp.len(), 1);
        assert_eq!(ramp.step_delay_us(), u32::MAX);
        assert_eq!(speeds(ramp), [i32::MAX]);
    }
}
