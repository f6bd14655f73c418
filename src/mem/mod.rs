// SPDX-License-Identifier: GPL-2.0

//! Abstract memory.
//!
//! The stack is the only memory the program can both read and write with
//! tracked contents; it is modelled byte-addressed in [`stack`]. Packet
//! validity is tracked as a single proven lower bound on the packet
//! length in [`packet`]. Context and map memory are opaque.

pub mod packet;
pub mod stack;

pub use packet::*;
pub use stack::*;
