// SPDX-License-Identifier: GPL-2.0

//! Core types and definitions for the verifier.
//!
//! This module contains the instruction AST, register and type-set
//! definitions, the program description, error types, and logging.

pub mod error;
pub mod insn;
pub mod log;
pub mod types;

pub use error::*;
pub use insn::*;
pub use log::*;
pub use types::*;
