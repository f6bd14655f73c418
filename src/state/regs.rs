// SPDX-License-Identifier: GPL-2.0

//! The abstract register file.

use crate::core::error::{Result, VerifierError};
use crate::core::types::{Reg, NUM_REG_SLOTS};
use crate::domains::lattice::Lattice;
use crate::domains::rcp::RcpDomain;
use core::fmt;

/// One optional abstract value per register slot.
///
/// `None` means uninitialized. This is distinct from holding a bottom
/// value: an uninitialized read is a verification error in the program,
/// a bottom value marks an infeasible path. A slot absent on either side
/// of a join is absent in the result, so "initialized" means initialized
/// on all paths.
#[derive(Debug, Clone, PartialEq)]
pub struct RegsDom {
    regs: [Option<RcpDomain>; NUM_REG_SLOTS],
}

impl Default for RegsDom {
    fn default() -> Self {
        RegsDom::new()
    }
}

impl RegsDom {
    /// The bottom register file: every slot holds the bottom value.
    pub fn new() -> Self {
        RegsDom { regs: core::array::from_fn(|_| Some(RcpDomain::bot())) }
    }

    /// The entry state: r1 is the context, r10 the frame pointer, the
    /// packet bookkeeping slots are unknown numbers, everything else is
    /// uninitialized.
    ///
    /// The bookkeeping slots start as numbers so the bound checks that
    /// assume a numeric zero base stay consistent.
    pub fn init(&mut self, ctx: RcpDomain, stack_end: RcpDomain, num_top: RcpDomain) {
        for r in &mut self.regs {
            *r = None;
        }
        self.regs[Reg::R1.slot()] = Some(ctx);
        self.regs[Reg::FP.slot()] = Some(stack_end);
        self.regs[Reg::DATA_END.slot()] = Some(num_top.clone());
        self.regs[Reg::META.slot()] = Some(num_top);
    }

    /// Whether some general-purpose register holds an infeasible value.
    pub fn is_bot(&self) -> bool {
        (0..10).any(|i| self.regs[i].as_ref().is_some_and(|v| v.is_bot()))
    }

    /// The slot index of `r`, or an error for a register number the
    /// file has no slot for. Nothing upstream restricts the register
    /// numbers an instruction may carry.
    fn slot_of(r: Reg) -> Result<usize> {
        let slot = r.slot();
        if slot >= NUM_REG_SLOTS {
            return Err(VerifierError::InvalidRegister(r.0));
        }
        Ok(slot)
    }

    /// Overwrite a register.
    pub fn assign(&mut self, r: Reg, v: RcpDomain) -> Result<()> {
        self.regs[Self::slot_of(r)?] = Some(v);
        Ok(())
    }

    /// Read a register; uninitialized reads are a verification error.
    pub fn at(&self, r: Reg) -> Result<&RcpDomain> {
        self.regs[Self::slot_of(r)?]
            .as_ref()
            .ok_or(VerifierError::UninitializedRegister(r.0))
    }

    /// Mutable access to a register for in-place refinement.
    pub fn at_mut(&mut self, r: Reg) -> Result<&mut RcpDomain> {
        self.regs[Self::slot_of(r)?]
            .as_mut()
            .ok_or(VerifierError::UninitializedRegister(r.0))
    }

    /// Mark a register uninitialized.
    pub fn to_uninit(&mut self, r: Reg) -> Result<()> {
        self.regs[Self::slot_of(r)?] = None;
        Ok(())
    }

    /// Clobber the caller-saved argument registers after a call.
    pub fn scratch_regs(&mut self) {
        for i in 1..6 {
            self.regs[i] = None;
        }
    }
}

impl Lattice for RegsDom {
    fn join(&mut self, other: &Self) {
        for (a, b) in self.regs.iter_mut().zip(other.regs.iter()) {
            match (a.as_mut(), b) {
                (Some(l), Some(r)) => l.join(r),
                _ => *a = None,
            }
        }
    }

    fn meet(&mut self, other: &Self) {
        for (a, b) in self.regs.iter_mut().zip(other.regs.iter()) {
            match (a.as_mut(), b) {
                (Some(l), Some(r)) => l.meet(r),
                _ => *a = None,
            }
        }
    }

    fn is_bot(&self) -> bool {
        RegsDom::is_bot(self)
    }
}

impl fmt::Display for RegsDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<<")?;
        for i in 0..=10 {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "r{}: ", i)?;
            match &self.regs[i] {
                Some(v) => write!(f, "{}", v)?,
                None => write!(f, "*")?,
            }
        }
        write!(f, ">>")
    }
}
