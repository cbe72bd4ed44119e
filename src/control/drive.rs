// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Differential drive control loop.
//!
//! [`DifferentialDrive`] owns the channel transport, the delay and the mirrored [`AxisPair`], and
//! tracks the speed last commanded on each side. It is the single owner of ramp state: a ramp runs
//! to completion (or until aborted) inside one call, blocking on the delay between steps.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! drive.initialize(&InitProfile::default())?;
//! drive.ramp_to(20_000, 2_000_000, |left, right| defmt::info!("{} {}", left, right))?;
//! drive.shutdown()?;
//! ```

use embedded_hal::delay::DelayNs;

use crate::config::DriveConfig;
use crate::control::ramp::{self, SpeedRamp};
use crate::drivers::{ChannelTransport, Duplex, InitProfile, MotionCommand};
use crate::error::Error;
use crate::motors::{AxisPair, Side};

/// Pause after each stop command of the shutdown sequence, letting the chips settle.
pub const SHUTDOWN_SETTLE_US: u32 = 1_000_000;

/// How a ramp ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampOutcome {
    /// The target speed was reached.
    Completed,
    /// The abort predicate fired; `at` is the last speed applied.
    Aborted { at: i32 },
}

/// Two L6470-driven motors run as one mirrored differential pair.
pub struct DifferentialDrive<B, D> {
    transport: ChannelTransport<B>,
    delay: D,
    pair: AxisPair,
    config: DriveConfig,

    /// Last successfully commanded speed per side, primary first, in the robot's frame.
    speeds: [i32; 2],
}

impl<B: Duplex, D: DelayNs> DifferentialDrive<B, D> {
    pub fn new(
        transport: ChannelTransport<B>,
        delay: D,
        pair: AxisPair,
        config: DriveConfig,
    ) -> Self {
        Self {
            transport,
            delay,
            pair,
            config,
            speeds: [0, 0],
        }
    }

    /// Tear down the drive and return the transport and delay.
    pub fn free(self) -> (ChannelTransport<B>, D) {
        (self.transport, self.delay)
    }

    /// Write the init profile to both chips, primary first.
    pub fn initialize(&mut self, profile: &InitProfile) -> Result<(), Error<B::Error>> {
        profile.initialize(&mut self.transport, self.pair.primary())?;
        profile.initialize(&mut self.transport, self.pair.mirrored())
    }

    /// Speed last commanded on the primary side.
    #[inline]
    pub fn speed(&self) -> i32 {
        self.speeds[0]
    }

    /// Speeds last commanded on `(primary, mirrored)`, both in the robot's frame.
    #[inline]
    pub fn side_speeds(&self) -> (i32, i32) {
        (self.speeds[0], self.speeds[1])
    }

    #[inline]
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    #[inline]
    pub fn pair(&self) -> AxisPair {
        self.pair
    }

    #[inline]
    pub fn transport(&self) -> &ChannelTransport<B> {
        &self.transport
    }

    #[inline]
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Apply one command to both sides.
    pub fn apply(&mut self, command: MotionCommand) -> Result<(), Error<B::Error>> {
        self.pair.apply(&mut self.transport, command)
    }

    /// Ramp both sides to `target` over `slope_us`, each side starting from its own last
    /// commanded speed.
    ///
    /// `on_step` is called with `(primary, mirrored)` after every applied step.
    pub fn ramp_to<F>(
        &mut self,
        target: i32,
        slope_us: u32,
        on_step: F,
    ) -> Result<RampOutcome, Error<B::Error>>
    where
        F: FnMut(i32, i32),
    {
        self.ramp_to_with(target, slope_us, || false, on_step)
    }

    /// Like [`ramp_to`](Self::ramp_to), but `abort` is polled before every step; when it returns
    /// true the ramp stops at the last applied speeds.
    pub fn ramp_to_with<A, F>(
        &mut self,
        target: i32,
        slope_us: u32,
        abort: A,
        on_step: F,
    ) -> Result<RampOutcome, Error<B::Error>>
    where
        A: FnMut() -> bool,
        F: FnMut(i32, i32),
    {
        self.ramp_sides_to_with(target, target, slope_us, abort, on_step)
    }

    /// Ramp each side to its own target over `slope_us`, in steps of the configured ramp step.
    ///
    /// Targets are clamped to the configured speed limit. The step delay is set by the side with
    /// the longer way to go, which arrives after roughly `slope_us`; the other side stops
    /// stepping once it reaches its target.
    pub fn ramp_sides_to_with<A, F>(
        &mut self,
        primary: i32,
        mirrored: i32,
        slope_us: u32,
        abort: A,
        on_step: F,
    ) -> Result<RampOutcome, Error<B::Error>>
    where
        A: FnMut() -> bool,
        F: FnMut(i32, i32),
    {
        let targets = [
            self.config.clamp_speed(primary),
            self.config.clamp_speed(mirrored),
        ];
        let step = self.config.ramp_step;
        let longest = ramp::span(self.speeds[0], targets[0])
            .max(ramp::span(self.speeds[1], targets[1]));
        let step_delay = ramp::step_delay_us(longest, slope_us, step);

        let ramps = [
            SpeedRamp::new(self.speeds[0], targets[0], slope_us, step),
            SpeedRamp::new(self.speeds[1], targets[1], slope_us, step),
        ];
        self.run_ramps(ramps, step_delay, abort, on_step)
    }

    /// Step each side toward its own target by its own increment, waiting `wait_us` before every
    /// step. A side that has arrived is left alone while the other one finishes.
    pub fn step_sides_to_with<A, F>(
        &mut self,
        targets: (i32, i32),
        steps: (u32, u32),
        wait_us: u32,
        abort: A,
        on_step: F,
    ) -> Result<RampOutcome, Error<B::Error>>
    where
        A: FnMut() -> bool,
        F: FnMut(i32, i32),
    {
        let primary = self.config.clamp_speed(targets.0);
        let mirrored = self.config.clamp_speed(targets.1);
        let ramps = [
            SpeedRamp::stepped(self.speeds[0], primary, steps.0, wait_us),
            SpeedRamp::stepped(self.speeds[1], mirrored, steps.1, wait_us),
        ];
        self.run_ramps(ramps, wait_us, abort, on_step)
    }

    /// Step one side toward `target`, leaving the other side untouched.
    pub fn step_side_to<F>(
        &mut self,
        side: Side,
        target: i32,
        step: u32,
        wait_us: u32,
        on_step: F,
    ) -> Result<RampOutcome, Error<B::Error>>
    where
        F: FnMut(i32, i32),
    {
        let (primary, mirrored) = self.side_speeds();
        let targets = match side {
            Side::Primary => (target, mirrored),
            Side::Mirrored => (primary, target),
        };
        self.step_sides_to_with(targets, (step, step), wait_us, || false, on_step)
    }

    fn run_ramps<A, F>(
        &mut self,
        mut ramps: [SpeedRamp; 2],
        step_delay: u32,
        mut abort: A,
        mut on_step: F,
    ) -> Result<RampOutcome, Error<B::Error>>
    where
        A: FnMut() -> bool,
        F: FnMut(i32, i32),
    {
        debug!(
            "ramp {} -> {} / {} -> {}: {} us apart",
            self.speeds[0],
            ramps[0].state().target,
            self.speeds[1],
            ramps[1].state().target,
            step_delay
        );

        while !ramps.iter().all(|r| r.state().is_done()) {
            if abort() {
                info!("ramp aborted at {} / {}", self.speeds[0], self.speeds[1]);
                return Ok(RampOutcome::Aborted { at: self.speed() });
            }
            self.delay.delay_us(step_delay);

            let [primary, mirrored] = &mut ramps;
            match (primary.next(), mirrored.next()) {
                (Some(p), Some(m)) => self.pair.apply_split(&mut self.transport, p, m)?,
                (Some(p), None) => self.pair.apply_side(&mut self.transport, Side::Primary, p)?,
                (None, Some(m)) => self.pair.apply_side(&mut self.transport, Side::Mirrored, m)?,
                (None, None) => break,
            }

            self.speeds = [ramps[0].state().current, ramps[1].state().current];
            on_step(self.speeds[0], self.speeds[1]);
        }
        Ok(RampOutcome::Completed)
    }

    /// Set both sides to `speed` without ramping. Returns the speed applied after clamping.
    pub fn set_speed(&mut self, speed: i32) -> Result<i32, Error<B::Error>> {
        let speed = self.config.clamp_speed(speed);
        self.apply(MotionCommand::RunAtSpeed(speed))?;
        self.speeds = [speed, speed];
        Ok(speed)
    }

    /// Raise the speed by one jog increment, without ramping.
    pub fn speed_up(&mut self) -> Result<i32, Error<B::Error>> {
        self.set_speed(self.speed().saturating_add(self.config.jog_increment))
    }

    /// Lower the speed by one jog increment, without ramping.
    pub fn speed_down(&mut self) -> Result<i32, Error<B::Error>> {
        self.set_speed(self.speed().saturating_sub(self.config.jog_increment))
    }

    /// Set each side independently, without ramping. Returns the clamped `(primary, mirrored)`.
    pub fn set_side_speeds(
        &mut self,
        primary: i32,
        mirrored: i32,
    ) -> Result<(i32, i32), Error<B::Error>> {
        let primary = self.config.clamp_speed(primary);
        let mirrored = self.config.clamp_speed(mirrored);
        self.pair.apply_split(
            &mut self.transport,
            MotionCommand::RunAtSpeed(primary),
            MotionCommand::RunAtSpeed(mirrored),
        )?;
        self.speeds = [primary, mirrored];
        Ok((primary, mirrored))
    }

    /// Move both sides by `microsteps`.
    pub fn move_steps(&mut self, microsteps: i32) -> Result<(), Error<B::Error>> {
        self.apply(MotionCommand::MoveSteps(microsteps))
    }

    /// Move both sides by whole motor steps. Returns the microstep count sent.
    pub fn move_full_steps(&mut self, steps: i32) -> Result<i32, Error<B::Error>> {
        let microsteps = steps.saturating_mul(self.config.microsteps);
        self.move_steps(microsteps)?;
        Ok(microsteps)
    }

    /// Orderly shutdown: command zero speed, soft-stop, then put the bridges into high impedance,
    /// pausing after each stop.
    pub fn shutdown(&mut self) -> Result<(), Error<B::Error>> {
        info!("shutting down drive");
        self.set_speed(0)?;
        self.apply(MotionCommand::SoftStop)?;
        self.delay.delay_us(SHUTDOWN_SETTLE_US);
        self.apply(MotionCommand::HighImpedanceStop)?;
        self.delay.delay_us(SHUTDOWN_SETTLE_US);
        Ok(())
    }

    /// Best-effort stop after a failure: broadcast `SoftStop` and `HighImpedanceStop` without
    /// waiting. The second broadcast is sent even if the first fails; the first error is returned.
    pub fn emergency_stop(&mut self) -> Result<(), Error<B::Error>> {
        warn!("emergency stop");
        let soft = self.apply(MotionCommand::SoftStop);
        let hiz = self.apply(MotionCommand::HighImpedanceStop);
        self.speeds = [0, 0];
        soft.and(hiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{MotorChannel, TransportError};
    use crate::mock::{BusError, RecordingBus, RecordingDelay};

    fn drive_with(bus: RecordingBus) -> DifferentialDrive<RecordingBus, RecordingDelay> {
        DifferentialDrive::new(
            ChannelTransport::new(bus),
            RecordingDelay::default(),
            AxisPair::default(),
            DriveConfig::default(),
        )
    }

    fn drive() -> DifferentialDrive<RecordingBus, RecordingDelay> {
        drive_with(RecordingBus::new())
    }

    fn runs(speeds: &[i32]) -> Vec<MotionCommand> {
        speeds.iter().map(|&v| MotionCommand::RunAtSpeed(v)).collect()
    }

    #[test]
    fn initialize_writes_both_chips_primary_first() {
        let mut d = drive();
        d.initialize(&InitProfile::default()).unwrap();

        let sent = d.transport().bus().sent();
        assert_eq!(sent.len(), 38);
        assert!(sent[..19].iter().all(|(c, _)| *c == MotorChannel::Cs0));
        assert!(sent[19..].iter().all(|(c, _)| *c == MotorChannel::Cs1));
    }

    #[test]
    fn ramp_applies_every_step_to_both_sides() {
        let mut d = drive();
        let mut echoed = Vec::new();
        let outcome = d.ramp_to(500, 1_000_000, |v, _| echoed.push(v)).unwrap();

        assert_eq!(outcome, RampOutcome::Completed);
        assert_eq!(echoed, [100, 200, 300, 400, 500]);
        assert_eq!(d.speed(), 500);
        assert_eq!(d.delay().delays, [200_000; 5]);

        let bus = d.transport().bus();
        assert_eq!(bus.commands_on(MotorChannel::Cs0), runs(&[100, 200, 300, 400, 500]));
        assert_eq!(
            bus.commands_on(MotorChannel::Cs1),
            runs(&[-100, -200, -300, -400, -500])
        );
    }

    #[test]
    fn ramp_continues_from_last_speed() {
        let mut d = drive();
        d.ramp_to(300, 0, |_, _| {}).unwrap();
        let mut echoed = Vec::new();
        d.ramp_to(-100, 400_000, |v, _| echoed.push(v)).unwrap();

        assert_eq!(echoed, [200, 100, 0, -100]);
        assert_eq!(d.speed(), -100);
    }

    #[test]
    fn ramp_to_current_speed_sends_nothing() {
        let mut d = drive();
        assert_eq!(d.ramp_to(0, 1_000_000, |_, _| {}), Ok(RampOutcome::Completed));
        assert!(d.transport().bus().sent().is_empty());
        assert!(d.delay().delays.is_empty());
    }

    #[test]
    fn ramp_target_is_clamped() {
        let mut d = drive();
        d.ramp_to(90_000, 0, |_, _| {}).unwrap();
        assert_eq!(d.speed(), 40_000);
    }

    #[test]
    fn ramp_can_be_aborted_between_steps() {
        let mut d = drive();
        let mut polls = 0;
        let outcome = d
            .ramp_to_with(
                1000,
                1_000_000,
                || {
                    polls += 1;
                    polls > 3
                },
                |_, _| {},
            )
            .unwrap();

        assert_eq!(outcome, RampOutcome::Aborted { at: 300 });
        assert_eq!(d.speed(), 300);
        assert_eq!(d.transport().bus().commands_on(MotorChannel::Cs0).len(), 3);
    }

    #[test]
    fn failed_step_keeps_last_good_speed() {
        // Two full steps (16 bytes) go through, the third fails on the primary channel.
        let mut d = drive_with(RecordingBus::new().fail_at(16));
        let err = d.ramp_to(1000, 1_000_000, |_, _| {}).unwrap_err();

        assert_eq!(
            err,
            Error::Transport {
                channel: MotorChannel::Cs0,
                cause: TransportError::Bus(BusError),
            }
        );
        assert_eq!(d.speed(), 200);
    }

    #[test]
    fn jog_steps_by_increment() {
        let mut d = drive();
        assert_eq!(d.speed_up(), Ok(10_000));
        assert_eq!(d.speed_up(), Ok(20_000));
        assert_eq!(d.speed_down(), Ok(10_000));
        assert_eq!(d.speed_down(), Ok(0));
        assert_eq!(d.speed_down(), Ok(-10_000));

        let bus = d.transport().bus();
        assert_eq!(
            bus.commands_on(MotorChannel::Cs1),
            runs(&[-10_000, -20_000, -10_000, 0, 10_000])
        );
        assert!(d.delay().delays.is_empty());
    }

    #[test]
    fn jog_saturates_at_limit() {
        let mut d = drive();
        for _ in 0..6 {
            d.speed_up().unwrap();
        }
        assert_eq!(d.speed(), 40_000);
    }

    #[test]
    fn side_speeds_are_independent() {
        let mut d = drive();
        assert_eq!(d.set_side_speeds(1200, -800), Ok((1200, -800)));
        assert_eq!(d.side_speeds(), (1200, -800));

        let bus = d.transport().bus();
        assert_eq!(bus.commands_on(MotorChannel::Cs0), runs(&[1200]));
        assert_eq!(bus.commands_on(MotorChannel::Cs1), runs(&[800]));
    }

    #[test]
    fn full_steps_are_scaled_to_microsteps() {
        let mut d = drive();
        assert_eq!(d.move_full_steps(2), Ok(256));

        let bus = d.transport().bus();
        assert_eq!(
            bus.commands_on(MotorChannel::Cs0),
            [MotionCommand::MoveSteps(256)]
        );
        assert_eq!(
            bus.commands_on(MotorChannel::Cs1),
            [MotionCommand::MoveSteps(-256)]
        );
    }

    #[test]
    fn oversized_move_is_rejected_before_sending() {
        let mut d = drive();
        assert!(matches!(
            d.move_full_steps(10_000),
            Err(Error::OutOfRange(_))
        ));
        assert!(d.transport().bus().sent().is_empty());
    }

    #[test]
    fn shutdown_sequence() {
        let mut d = drive();
        d.set_speed(5000).unwrap();
        d.shutdown().unwrap();

        assert_eq!(d.speed(), 0);
        assert_eq!(
            d.transport().bus().commands_on(MotorChannel::Cs0),
            [
                MotionCommand::RunAtSpeed(5000),
                MotionCommand::RunAtSpeed(0),
                MotionCommand::SoftStop,
                MotionCommand::HighImpedanceStop,
            ]
        );
        assert_eq!(d.delay().delays, [SHUTDOWN_SETTLE_US, SHUTDOWN_SETTLE_US]);
    }

    #[test]
    fn emergency_stop_sends_hiz_even_if_soft_stop_fails() {
        let mut d = drive_with(RecordingBus::new().fail_at(0));
        let err = d.emergency_stop().unwrap_err();

        assert!(matches!(err, Error::Transport { channel: MotorChannel::Cs0, .. }));
        assert_eq!(
            d.transport().bus().sent(),
            &[(MotorChannel::Cs0, 0xA8), (MotorChannel::Cs1, 0xA8)]
        );
        assert_eq!(d.speed(), 0);
    }

    #[test]
    fn ramp_starts_each_side_from_its_own_speed() {
        let mut d = drive();
        d.set_side_speeds(1000, -1000).unwrap();
        let mut ticks = Vec::new();
        d.ramp_to(1200, 1_100_000, |l, r| ticks.push((l, r)))
            .unwrap();

        assert_eq!(d.side_speeds(), (1200, 1200));
        assert_eq!(ticks.len(), 22);
        assert_eq!(d.delay().delays, [50_000; 22]);

        let mut prev = (1000, -1000);
        for &(l, r) in &ticks {
            assert!((l - prev.0).abs() <= 100, "{:?} -> {:?}", prev, (l, r));
            assert!((r - prev.1).abs() <= 100, "{:?} -> {:?}", prev, (l, r));
            prev = (l, r);
        }

        let bus = d.transport().bus();
        assert_eq!(bus.commands_on(MotorChannel::Cs0), runs(&[1000, 1100, 1200]));
        let mirrored: Vec<i32> = (0..=22).map(|i| 1000 - 100 * i).collect();
        assert_eq!(bus.commands_on(MotorChannel::Cs1), runs(&mirrored));
    }

    #[test]
    fn sides_ramp_to_different_targets() {
        let mut d = drive();
        d.ramp_sides_to_with(400, -200, 800_000, || false, |_, _| {})
            .unwrap();

        assert_eq!(d.side_speeds(), (400, -200));
        assert_eq!(d.delay().delays, [200_000; 4]);

        let bus = d.transport().bus();
        assert_eq!(bus.commands_on(MotorChannel::Cs0), runs(&[100, 200, 300, 400]));
        assert_eq!(bus.commands_on(MotorChannel::Cs1), runs(&[100, 200]));
    }

    #[test]
    fn sides_step_with_their_own_increment() {
        let mut d = drive();
        let outcome = d
            .step_sides_to_with((300, -500), (100, 250), 20_000, || false, |_, _| {})
            .unwrap();

        assert_eq!(outcome, RampOutcome::Completed);
        assert_eq!(d.side_speeds(), (300, -500));
        assert_eq!(d.delay().delays, [20_000; 3]);

        let bus = d.transport().bus();
        assert_eq!(bus.commands_on(MotorChannel::Cs0), runs(&[100, 200, 300]));
        assert_eq!(bus.commands_on(MotorChannel::Cs1), runs(&[250, 500]));
    }

    #[test]
    fn single_side_step_leaves_other_side_alone() {
        let mut d = drive();
        d.set_speed(500).unwrap();
        d.step_side_to(Side::Mirrored, 200, 150, 10_000, |_, _| {})
            .unwrap();

        assert_eq!(d.side_speeds(), (500, 200));
        let bus = d.transport().bus();
        assert_eq!(bus.commands_on(MotorChannel::Cs0), runs(&[500]));
        assert_eq!(bus.commands_on(MotorChannel::Cs1), runs(&[-500, -350, -200]));
    }
}
