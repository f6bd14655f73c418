// SPDX-License-Identifier: GPL-2.0

//! The assertion language and the extraction pass.
//!
//! [`assertions`] defines the constraint forms an instruction may
//! require; [`extract`] computes, per instruction, the assertions it
//! needs and inserts them into the CFG; [`helpers`] provides argument
//! prototypes for well-known helper calls.

pub mod assertions;
pub mod extract;
pub mod helpers;

pub use assertions::*;
pub use extract::*;
pub use helpers::*;
