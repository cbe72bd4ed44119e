// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! Open-loop motion control for the mirrored drive pair.
//!
//! ## Modules
//!
//! - [`ramp`] - Linear speed ramp generator.
//! - [`drive`] - Differential drive control loop (ramps, jogs, step moves, shutdown).

pub mod drive;
pub mod ramp;

pub use drive::{DifferentialDrive, RampOutcome};
pub use ramp::{RampState, SpeedRamp};
