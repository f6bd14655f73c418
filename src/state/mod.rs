// SPDX-License-Identifier: GPL-2.0

//! Per-point analysis state.
//!
//! [`regs`] models the register file (a slot is either an abstract value
//! or uninitialized); [`machine`] bundles registers, the stack store, and
//! the packet bound into the product state the fixpoint propagates, and
//! carries the transfer function for every instruction.

pub mod machine;
pub mod regs;

pub use machine::*;
pub use regs::*;
