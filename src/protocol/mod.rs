// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Operator console protocol: line-based requests in, echo lines out.

pub mod messages;
pub mod parser;

pub use messages::{ConsoleRequest, Echo, ParseError};
pub use parser::Parser;
