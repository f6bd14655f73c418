// SPDX-License-Identifier: GPL-2.0

//! Error types for the verifier

use crate::stdlib::String;
use core::fmt;

/// Result type alias for verifier operations
pub type Result<T> = core::result::Result<T, VerifierError>;

/// Errors that can occur while analyzing a program.
///
/// These are *analysis failures*: the program is malformed or the
/// analysis cannot proceed. An unsafe-but-well-formed program does not
/// produce an error; it produces unproven assertions and a reject
/// verdict.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    EmptyProgram,
    FallThroughExit(usize),
    InvalidJumpTarget(usize),
    BackEdgeDetected,
    InvalidRegister(u8),
    UninitializedRegister(u8),
    UndefinedInstruction(i32),
    InvalidMemoryAccess(String),
    TooManyMaps(usize),
    Internal(String),
}

impl fmt::Display for VerifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifierError::EmptyProgram => write!(f, "empty program"),
            VerifierError::FallThroughExit(i) => {
                write!(f, "instruction {} falls through past the last instruction", i)
            }
            VerifierError::InvalidJumpTarget(t) => write!(f, "invalid jump target {}", t),
            VerifierError::BackEdgeDetected => {
                write!(f, "back-edge detected, loops are not supported")
            }
            VerifierError::InvalidRegister(r) => write!(f, "invalid register r{}", r),
            VerifierError::UninitializedRegister(r) => {
                write!(f, "read of uninitialized register r{}", r)
            }
            VerifierError::UndefinedInstruction(op) => {
                write!(f, "undefined instruction (opcode {:#x})", op)
            }
            VerifierError::InvalidMemoryAccess(s) => write!(f, "invalid memory access: {}", s),
            VerifierError::TooManyMaps(n) => {
                write!(f, "program references {} maps, limit is {}", n, crate::core::types::MAX_MAPS)
            }
            VerifierError::Internal(s) => write!(f, "internal error: {}", s),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for VerifierError {}
