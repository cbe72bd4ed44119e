// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Actuator Abstractions
//!
//! Motor-level wrappers that sit above the device-level drivers in `drivers`.
//!
//! ## Modules
//!
//! - [`axis_pair`] - Two L6470 channels driven as a mirrored differential pair.
//! - [`units`] - Chip speed to steps, wheel and chassis speed conversions.

pub mod axis_pair;
pub mod units;

pub use axis_pair::{AxisPair, Side};
pub use units::Wheel;
