// SPDX-License-Identifier: GPL-2.0

//! The product state and the per-instruction transfer functions.
//!
//! A `Machine` is the abstract state at one program point: the register
//! file, the stack store, and the proven packet bound. `visit` applies
//! one instruction; every transfer function is monotone in the lattice
//! order.

use crate::check::assertions::{Assertion, Constraint};
use crate::core::error::{Result, VerifierError};
use crate::core::insn::{ArgPairKind, BinOp, Call, CmpOp, Instruction, Value};
use crate::core::types::{ProgramInfo, Reg, TypeSet, STACK_SIZE};
use crate::domains::lattice::Lattice;
use crate::domains::numset::{NumSet, OffsetSet};
use crate::domains::rcp::RcpDomain;
use crate::mem::packet::MinSizeDom;
use crate::mem::stack::MemDom;
use crate::stdlib::ToString;
use core::fmt;

/// The abstract state at one program point.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    /// Register file.
    pub regs: crate::state::regs::RegsDom,
    /// Stack store.
    pub stack: MemDom,
    /// Proven packet length bound.
    pub min_size: MinSizeDom,
    info: ProgramInfo,
}

impl Machine {
    /// The bottom state for a program description.
    pub fn new(info: ProgramInfo) -> Self {
        Machine {
            regs: crate::state::regs::RegsDom::new(),
            stack: MemDom::bot(),
            min_size: MinSizeDom::bot(),
            info,
        }
    }

    /// Turn this into the entry state: r1 = ctx, r10 = end of stack,
    /// nothing on the stack, no packet bytes validated.
    pub fn init(&mut self) {
        self.regs.init(
            RcpDomain::with_ctx(0),
            RcpDomain::with_stack(STACK_SIZE),
            RcpDomain::with_num_top(),
        );
        self.stack = MemDom::empty();
        self.min_size.havoc();
    }

    /// The program description this machine analyzes under.
    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    fn nmaps(&self) -> usize {
        self.info.map_defs.len()
    }

    /// Whether the state is infeasible.
    pub fn is_bot(&self) -> bool {
        self.regs.is_bot() || self.stack.is_bot()
    }

    /// Evaluate an operand to an abstract value.
    pub fn eval(&self, v: &Value) -> Result<RcpDomain> {
        match v {
            Value::Imm(i) => Ok(RcpDomain::with_num(*i)),
            Value::Reg(r) => Ok(self.regs.at(*r)?.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    /// Store through an abstract address. Only the stack component of
    /// the address receives tracked contents; context and packet memory
    /// are read-only for the program, and map memory is opaque.
    fn store(&mut self, addr: &RcpDomain, widths: &NumSet, value: &RcpDomain) {
        let as_stack = addr.get_stack().clone();
        if as_stack.is_bot() {
            return;
        }
        // An address that may also be something other than a stack
        // pointer makes the write target unknown within the frame.
        let offsets = if addr.must_be(TypeSet::STACK) { as_stack } else { OffsetSet::top() };
        match widths.as_single() {
            Some(w) if w > 0 && w <= STACK_SIZE => {
                self.stack.store(&offsets, w as u32, value);
            }
            _ => self.stack.store_dynamic(&offsets, widths, value),
        }
    }

    fn load_stack(&self, offsets: &OffsetSet, width: u32) -> RcpDomain {
        if offsets.is_bot() {
            return RcpDomain::bot();
        }
        self.stack.load(offsets, width)
    }

    fn load_ctx(&self, offsets: &OffsetSet) -> RcpDomain {
        if offsets.is_bot() {
            return RcpDomain::bot();
        }
        match offsets.as_single() {
            Some(o) => {
                let d = self.info.descriptor;
                if d.data >= 0 && o == d.data as i64 {
                    // Packet start carries a small sentinel offset so it
                    // stays distinct from the metadata base.
                    RcpDomain::with_packet(3)
                } else if d.end >= 0 && o == d.end as i64 {
                    RcpDomain::with_packet_end()
                } else if d.meta >= 0 && o == d.meta as i64 {
                    RcpDomain::with_packet(0)
                } else {
                    RcpDomain::with_num_top()
                }
            }
            None => RcpDomain::top(self.nmaps()),
        }
    }

    fn load_other(&self, addr: &RcpDomain) -> RcpDomain {
        if addr.maybe_packet() || addr.maybe_map() {
            RcpDomain::with_num_top()
        } else {
            RcpDomain::bot()
        }
    }

    /// Load through an abstract address: the join over every region the
    /// address may point into.
    fn load(&self, addr: &RcpDomain, width: u32) -> RcpDomain {
        let mut r = self.load_stack(addr.get_stack(), width);
        r.join(&self.load_ctx(addr.get_ctx()));
        r.join(&self.load_other(addr));
        r
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn do_call(&mut self, call: &Call) -> Result<()> {
        for pair in &call.pairs {
            let mem = self.regs.at(pair.mem)?.clone();
            let mut val = RcpDomain::with_num_top();
            match pair.kind {
                ArgPairKind::PtrToMemOrNull => {
                    if mem.must_be_num() {
                        continue;
                    }
                    if !mem.get_num().is_bot() {
                        // Maybe-null: the helper may or may not write.
                        val = RcpDomain::top(self.nmaps());
                    }
                }
                ArgPairKind::PtrToMem | ArgPairKind::PtrToUninitMem => {}
            }
            let widths = self.regs.at(pair.size)?.get_num().clone();
            self.store(&mem, &widths, &val);
        }
        let r0 = if call.returns_map {
            self.regs.at(Reg::R1)?.map_lookup_elem(&self.info.map_defs)
        } else {
            RcpDomain::with_num_top()
        };
        self.regs.assign(Reg::R0, r0)?;
        self.regs.scratch_regs();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------

    fn linear_rhs(&self, reg: Reg, offset: i64, width: &Value, v: &Value) -> Result<RcpDomain> {
        let base = self.regs.at(reg)?.zero();
        let v = self.eval(v)?;
        let w = self.eval(width)?;
        let off = RcpDomain::with_num(offset);
        Ok(&base + &(&(&v - &w) - &off))
    }

    /// Sharpen the state as if the constraint held.
    pub fn assume_constraint(&mut self, cst: &Constraint) -> Result<()> {
        match cst {
            Constraint::Linear(lc) => {
                debug_assert!(
                    !(lc.when_types.intersects(TypeSet::NUM)
                        && lc.when_types.intersects(TypeSet::PTR))
                );
                let right = self.linear_rhs(lc.reg, lc.offset, &lc.width, &lc.v)?;
                RcpDomain::assume_cmp(self.regs.at_mut(lc.reg)?, lc.op, &right, lc.when_types);
            }
            Constraint::Type(tc) => match &tc.given {
                Some(g) => {
                    let given = self.regs.at(g.reg)?.clone();
                    RcpDomain::assume_type_given(
                        self.regs.at_mut(tc.then.reg)?,
                        tc.then.types,
                        &given,
                        g.types,
                    );
                }
                None => RcpDomain::assume_type(self.regs.at_mut(tc.then.reg)?, tc.then.types),
            },
            Constraint::InPacket(ip) => {
                let off = RcpDomain::with_num(ip.offset);
                let w = self.eval(&ip.width)?;
                let ub = (&(self.regs.at(ip.reg)? + &off) + &w).get_packet().clone();
                self.min_size.assume_larger_than(&ub);
            }
        }
        Ok(())
    }

    /// Whether the current state proves the constraint.
    pub fn satisfied(&self, cst: &Constraint) -> Result<bool> {
        match cst {
            Constraint::Linear(lc) => {
                let right = self.linear_rhs(lc.reg, lc.offset, &lc.width, &lc.v)?;
                Ok(RcpDomain::satisfied_cmp(self.regs.at(lc.reg)?, lc.op, &right, lc.when_types))
            }
            Constraint::Type(tc) => {
                let left = self.regs.at(tc.then.reg)?;
                match &tc.given {
                    Some(g) => Ok(RcpDomain::satisfied_type_given(
                        left,
                        tc.then.types,
                        self.regs.at(g.reg)?,
                        g.types,
                    )),
                    None => Ok(RcpDomain::satisfied_type(left, tc.then.types)),
                }
            }
            Constraint::InPacket(ip) => {
                let off = RcpDomain::with_num(ip.offset);
                let w = self.eval(&ip.width)?;
                let ub = (&(self.regs.at(ip.reg)? + &off) + &w).get_packet().clone();
                Ok(self.min_size.in_bounds(&ub))
            }
        }
    }

    /// Whether the current state proves the assertion.
    pub fn satisfied_assert(&self, a: &Assertion) -> Result<bool> {
        self.satisfied(&a.cst)
    }

    // ------------------------------------------------------------------
    // Transfer
    // ------------------------------------------------------------------

    /// Apply one instruction to the state.
    pub fn visit(&mut self, ins: &Instruction) -> Result<()> {
        match ins {
            Instruction::Undefined(op) => return Err(VerifierError::UndefinedInstruction(*op)),
            Instruction::LoadMapFd { dst, mapfd } => {
                self.regs.assign(*dst, RcpDomain::with_fd(*mapfd as i64))?;
            }
            // Byte-order conversions keep the value a number of the same
            // width; the set contents are not tracked through them.
            Instruction::Un { .. } => {}
            Instruction::Bin { op, dst, v } => {
                let val = self.eval(v)?;
                match op {
                    BinOp::Mov => self.regs.assign(*dst, val)?,
                    BinOp::Add => *self.regs.at_mut(*dst)? += &val,
                    BinOp::Sub => *self.regs.at_mut(*dst)? -= &val,
                    _ => self.regs.at_mut(*dst)?.exec(*op, &val),
                }
            }
            Instruction::Assume(c) => {
                let right = self.eval(&c.right)?;
                if right.is_packet_end() {
                    if c.op == CmpOp::Le {
                        let pk = self.regs.at(c.left)?.get_packet().clone();
                        self.min_size.assume_larger_than(&pk);
                    }
                } else {
                    RcpDomain::assume_cmp(self.regs.at_mut(c.left)?, c.op, &right, TypeSet::ALL);
                }
            }
            Instruction::Assert(a) => self.assume_constraint(&a.cst)?,
            Instruction::Exit => {}
            Instruction::Jmp { .. } => {}
            Instruction::Call(call) => self.do_call(call)?,
            Instruction::Packet { .. } => {
                self.regs.assign(Reg::R0, RcpDomain::with_num_top())?;
                self.regs.scratch_regs();
            }
            Instruction::Mem { access, value, is_load } => {
                let off = RcpDomain::with_num(access.offset);
                let addr = self.regs.at(access.basereg)? + &off;
                if *is_load {
                    let dst = match value {
                        Value::Reg(r) => *r,
                        Value::Imm(_) => {
                            return Err(VerifierError::InvalidMemoryAccess(
                                "load into an immediate".to_string(),
                            ))
                        }
                    };
                    let v = self.load(&addr, access.width);
                    self.regs.assign(dst, v)?;
                } else {
                    let v = self.eval(value)?;
                    self.store(&addr, &NumSet::single(access.width as i64), &v);
                }
            }
            // Map memory is opaque; the atomic add leaves no tracked
            // state behind.
            Instruction::LockAdd { .. } => {}
        }
        Ok(())
    }
}

impl Lattice for Machine {
    fn join(&mut self, other: &Self) {
        self.regs.join(&other.regs);
        self.stack.join(&other.stack);
        self.min_size.join(&other.min_size);
    }

    fn meet(&mut self, other: &Self) {
        self.regs.meet(&other.regs);
        self.stack.meet(&other.stack);
        self.min_size.meet(&other.min_size);
    }

    fn is_bot(&self) -> bool {
        Machine::is_bot(self)
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.regs, self.stack, self.min_size)
    }
}
