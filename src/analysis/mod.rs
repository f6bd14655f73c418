// SPDX-License-Identifier: GPL-2.0

//! Program analysis.
//!
//! [`cfg`] holds the control-flow graph the verifier works on, including
//! construction from an instruction sequence, conversion of conditional
//! jumps into assume-edges, and chain simplification. [`analyzer`] runs
//! the worklist fixpoint over it and the final assertion-discharge sweep.

pub mod analyzer;
pub mod cfg;

pub use analyzer::*;
pub use cfg::*;
