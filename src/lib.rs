//! # RCP Verifier
//!
//! A static verifier for eBPF programs based on abstract interpretation
//! over the register/context/packet (RCP) domain.
//!
//! The verifier proves, before a program is loaded, that every memory
//! access stays inside its region, that every helper call receives
//! arguments of the right kind and size, and that pointer and scalar
//! arithmetic is tracked precisely enough to discharge those obligations.
//! Programs that cannot be proven safe are rejected.
//!
//! ## How it works
//!
//! 1. The instruction sequence is turned into a control-flow graph of
//!    basic blocks ([`analysis::cfg`]).
//! 2. An extraction pass inserts an explicit `Assert` before each
//!    instruction stating the typed preconditions it needs
//!    ([`check::extract::explicate_assertions`]).
//! 3. Conditional jumps are replaced by `Assume` edges and the graph is
//!    simplified.
//! 4. A worklist fixpoint propagates an abstract machine state
//!    (registers, stack cells, packet min-size) over the graph
//!    ([`analysis::analyzer::analyze_rcp`]).
//! 5. A final sweep re-walks each block and marks every assertion proven
//!    or not; the program is accepted iff all assertions hold
//!    ([`verifier::abs_validate`]).
//!
//! ## Quick start
//!
//! ```rust
//! use rcp_verifier::prelude::*;
//!
//! // mov r0, 0; exit
//! let prog = vec![
//!     Instruction::Bin { op: BinOp::Mov, dst: Reg(0), v: Value::Imm(0) },
//!     Instruction::Exit,
//! ];
//!
//! let info = ProgramInfo::with_type(ProgramType::SocketFilter);
//! let opts = VerifierOptions::default();
//! let mut log = VerifierLog::default();
//! let accepted = verify_program(prog, &info, &opts, &mut log).unwrap();
//! assert!(accepted);
//! ```
//!
//! ## Module structure
//!
//! - [`core`]: instruction AST, types, errors, logging
//! - [`domains`]: the value lattices (finite sets, the RCP product)
//! - [`mem`]: the abstract stack store and the packet min-size bound
//! - [`state`]: the register file and the per-point machine state
//! - [`analysis`]: CFG representation, worklist fixpoint, discharge
//! - [`check`]: assertion language, extraction, helper prototypes
//! - [`verifier`]: options and the top-level drivers
//!
//! ## no_std support
//!
//! Disable default features to build without `std`; the crate then relies
//! on `alloc` only.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collection/string types so the rest of the crate is agnostic
// to the std/alloc split.
#[cfg(not(feature = "std"))]
#[allow(unused_imports)]
pub(crate) mod stdlib {
    pub use alloc::boxed::Box;
    pub use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
    pub use alloc::format;
    pub use alloc::string::{String, ToString};
    pub use alloc::vec;
    pub use alloc::vec::Vec;
}

#[cfg(feature = "std")]
#[allow(unused_imports)]
pub(crate) mod stdlib {
    pub use std::boxed::Box;
    pub use std::collections::{BTreeMap, BTreeSet, VecDeque};
    pub use std::format;
    pub use std::string::{String, ToString};
    pub use std::vec;
    pub use std::vec::Vec;
}

/// Instruction AST, core types, error definitions, and logging
pub mod core;

/// Value lattices: finite sets and the RCP product domain
pub mod domains;

/// Abstract memory: the stack store and the packet min-size bound
pub mod mem;

/// Per-point analysis state: register file and machine
pub mod state;

/// CFG representation and the worklist fixpoint
pub mod analysis;

/// Assertion language and the extraction pass
pub mod check;

/// Top-level drivers
pub mod verifier;

/// Commonly used types and entry points
pub mod prelude {
    pub use crate::analysis::analyzer::{analyze_rcp, worklist, Analyzer};
    pub use crate::analysis::cfg::{BasicBlock, Cfg, Label};
    pub use crate::check::extract::{explicate_assertions, AssertionExtractor};
    pub use crate::core::error::{Result, VerifierError};
    pub use crate::core::insn::{
        ArgPair, ArgPairKind, ArgSingle, ArgSingleKind, BinOp, Call, CmpOp, Condition, Deref,
        Instruction, Reg, UnOp, Value,
    };
    pub use crate::core::log::VerifierLog;
    pub use crate::core::types::{
        CtxDescriptor, MapDef, ProgramInfo, ProgramType, TypeSet, VerifierOptions, STACK_SIZE,
    };
    pub use crate::domains::lattice::Lattice;
    pub use crate::domains::numset::{NumSet, OffsetSet};
    pub use crate::domains::rcp::RcpDomain;
    pub use crate::state::machine::Machine;
    pub use crate::verifier::{abs_validate, verify_program};
}

pub use crate::core::error::{Result, VerifierError};
