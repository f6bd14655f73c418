// SPDX-License-Identifier: GPL-2.0

//! Assertion extraction.
//!
//! A pure per-instruction function computing the typed preconditions the
//! instruction needs, and a pass inserting them as explicit `Assert`
//! instructions immediately before it. Insertion is local: nothing else
//! in the graph is touched.

use crate::analysis::cfg::Cfg;
use crate::check::assertions::{
    Assertion, Constraint, InPacket, LinearConstraint, TypeConstraint, TypeOf,
};
use crate::core::error::{Result, VerifierError};
use crate::core::insn::{
    ArgPairKind, ArgSingleKind, BinOp, CmpOp, Condition, Instruction, Value,
};
use crate::core::types::{ProgramInfo, Reg, TypeSet, MAX_MAPS, STACK_SIZE};
use crate::stdlib::Vec;

/// Computes the assertions an instruction requires.
pub struct AssertionExtractor {
    info: ProgramInfo,
    regions: Vec<TypeSet>,
    privileged: bool,
}

impl AssertionExtractor {
    /// An extractor for the given program description (unprivileged).
    ///
    /// Fails if the program references more maps than the type universe
    /// has region bits for.
    pub fn new(info: ProgramInfo) -> Result<Self> {
        if info.map_defs.len() > MAX_MAPS {
            return Err(VerifierError::TooManyMaps(info.map_defs.len()));
        }
        let mut regions = Vec::new();
        for i in 0..info.map_defs.len() {
            regions.push(TypeSet::map(i));
        }
        regions.push(TypeSet::CTX);
        regions.push(TypeSet::STACK);
        regions.push(TypeSet::PACKET);
        regions.push(TypeSet::NUM);
        regions.push(TypeSet::FD);
        Ok(AssertionExtractor { info, regions, privileged: false })
    }

    /// Set privileged mode: pointer-leak and comparison-typing
    /// constraints are skipped.
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    fn type_of(reg: Reg, types: TypeSet) -> Assertion {
        Assertion::type_of(reg, types)
    }

    /// Lower bound, then one upper bound per region the access may be
    /// in: the map value size, the stack size, the context size, or
    /// membership in the validated packet prefix.
    fn check_access(
        &self,
        out: &mut Vec<Assertion>,
        t: TypeSet,
        reg: Reg,
        offset: i64,
        width: Value,
    ) {
        out.push(Assertion::new(Constraint::Linear(LinearConstraint {
            op: CmpOp::Ge,
            reg,
            offset,
            width: Value::Imm(0),
            v: Value::Imm(0),
            when_types: t,
        })));
        for (i, &s) in self.regions.iter().enumerate() {
            if !t.intersects(s) {
                continue;
            }
            if s == TypeSet::NUM || s == TypeSet::FD {
                continue;
            }
            if s == TypeSet::PACKET {
                out.push(Assertion::new(Constraint::InPacket(InPacket { reg, offset, width })));
                continue;
            }
            let end: i64 = if i < self.info.map_defs.len() {
                self.info.map_defs[i].value_size as i64
            } else if s == TypeSet::STACK {
                STACK_SIZE
            } else {
                self.info.descriptor.size as i64
            };
            out.push(Assertion::new(Constraint::Linear(LinearConstraint {
                op: CmpOp::Le,
                reg,
                offset,
                width,
                v: Value::Imm(end),
                when_types: s,
            })));
        }
    }

    /// One conditional constraint per region: `r1` inhabits it whenever
    /// `r2` does.
    fn same_type(&self, out: &mut Vec<Assertion>, ts: TypeSet, r1: Reg, r2: Reg) {
        for &s in &self.regions {
            if ts.intersects(s) {
                out.push(Assertion::new(Constraint::Type(TypeConstraint {
                    then: TypeOf { reg: r1, types: s },
                    given: Some(TypeOf { reg: r2, types: s }),
                })));
            }
        }
    }

    fn explicate(&self, cond: &Condition) -> Vec<Assertion> {
        if self.privileged {
            return Vec::new();
        }
        let mut res = Vec::new();
        match cond.right {
            Value::Imm(v) => {
                if v != 0 {
                    res.push(Self::type_of(cond.left, TypeSet::NUM));
                }
                // Comparing against zero is fine for any kind; an fd is
                // just another pointer here.
            }
            Value::Reg(right) => {
                if cond.op != CmpOp::Eq && cond.op != CmpOp::Ne {
                    res.push(Self::type_of(cond.left, TypeSet::NONFD));
                }
                self.same_type(&mut res, TypeSet::ALL, cond.left, right);
            }
        }
        res
    }

    /// The assertions `ins` requires, in order.
    pub fn extract(&self, ins: &Instruction) -> Vec<Assertion> {
        match ins {
            Instruction::Exit => crate::stdlib::vec![Self::type_of(Reg::R0, TypeSet::NUM)],
            Instruction::Call(call) => {
                let mut res = Vec::new();
                for arg in &call.singles {
                    match arg.kind {
                        ArgSingleKind::Anything => {
                            if !self.privileged {
                                res.push(Self::type_of(arg.reg, TypeSet::NUM));
                            }
                        }
                        ArgSingleKind::MapFd => res.push(Self::type_of(arg.reg, TypeSet::FD)),
                        ArgSingleKind::PtrToMapKey | ArgSingleKind::PtrToMapValue => {
                            res.push(Self::type_of(arg.reg, TypeSet::STACK | TypeSet::PACKET));
                        }
                        ArgSingleKind::PtrToCtx => res.push(Self::type_of(arg.reg, TypeSet::CTX)),
                    }
                }
                // TODO: helpers with a second memory argument (e.g.
                // csum_diff) only get their first pair checked here.
                if let Some(arg) = call.pairs.first() {
                    match arg.kind {
                        ArgPairKind::PtrToMemOrNull => {
                            res.push(Self::type_of(arg.mem, TypeSet::MEM | TypeSet::NUM));
                            res.push(Assertion::new(Constraint::Linear(LinearConstraint {
                                op: CmpOp::Eq,
                                reg: arg.mem,
                                offset: 0,
                                width: Value::Imm(0),
                                v: Value::Imm(0),
                                when_types: TypeSet::NUM,
                            })));
                        }
                        ArgPairKind::PtrToMem | ArgPairKind::PtrToUninitMem => {
                            res.push(Self::type_of(arg.mem, TypeSet::MEM));
                        }
                    }
                    let op = if arg.can_be_zero { CmpOp::Ge } else { CmpOp::Gt };
                    res.push(Self::type_of(arg.size, TypeSet::NUM));
                    res.push(Assertion::new(Constraint::Linear(LinearConstraint {
                        op,
                        reg: arg.size,
                        offset: 0,
                        width: Value::Imm(0),
                        v: Value::Imm(0),
                        when_types: TypeSet::NUM,
                    })));
                    self.check_access(&mut res, TypeSet::MEM, arg.mem, 0, Value::Reg(arg.size));
                }
                res
            }
            Instruction::Assume(cond) => self.explicate(cond),
            Instruction::Jmp { cond: Some(cond), .. } => self.explicate(cond),
            Instruction::Mem { access, value, is_load } => {
                let mut res = Vec::new();
                let reg = access.basereg;
                let width = Value::Imm(access.width as i64);
                if reg == Reg::FP {
                    self.check_access(&mut res, TypeSet::STACK, reg, access.offset, width);
                } else {
                    res.push(Self::type_of(reg, TypeSet::PTR));
                    self.check_access(&mut res, TypeSet::PTR, reg, access.offset, width);
                    if !self.privileged && !*is_load {
                        if let Value::Reg(stored) = value {
                            // Storing a pointer into memory the outside
                            // world can read leaks kernel addresses.
                            for t in [TypeSet::MAPS, TypeSet::CTX, TypeSet::PACKET] {
                                res.push(Assertion::new(Constraint::Type(TypeConstraint {
                                    then: TypeOf { reg: *stored, types: TypeSet::NUM },
                                    given: Some(TypeOf { reg, types: t }),
                                })));
                            }
                        }
                    }
                }
                res
            }
            Instruction::LockAdd { access, .. } => {
                let mut res =
                    crate::stdlib::vec![Self::type_of(access.basereg, TypeSet::MAPS)];
                self.check_access(
                    &mut res,
                    TypeSet::MAPS,
                    access.basereg,
                    access.offset,
                    Value::Imm(access.width as i64),
                );
                res
            }
            Instruction::Bin { op, dst, v } => match op {
                BinOp::Mov => Vec::new(),
                BinOp::Add => match v {
                    Value::Reg(r) => crate::stdlib::vec![
                        Assertion::new(Constraint::Type(TypeConstraint {
                            then: TypeOf { reg: *r, types: TypeSet::NUM },
                            given: Some(TypeOf { reg: *dst, types: TypeSet::PTR }),
                        })),
                        Assertion::new(Constraint::Type(TypeConstraint {
                            then: TypeOf { reg: *dst, types: TypeSet::NUM },
                            given: Some(TypeOf { reg: *r, types: TypeSet::PTR }),
                        })),
                    ],
                    Value::Imm(_) => Vec::new(),
                },
                BinOp::Sub => match v {
                    Value::Reg(r) => {
                        let mut res =
                            crate::stdlib::vec![Self::type_of(*dst, TypeSet::NONFD)];
                        self.same_type(
                            &mut res,
                            TypeSet::MAPS | TypeSet::CTX | TypeSet::PACKET,
                            *r,
                            *dst,
                        );
                        res.push(Self::type_of(*r, TypeSet::NONFD));
                        res
                    }
                    Value::Imm(_) => Vec::new(),
                },
                _ => crate::stdlib::vec![Self::type_of(*dst, TypeSet::NUM)],
            },
            _ => Vec::new(),
        }
    }
}

/// Insert each instruction's assertions immediately before it,
/// throughout the graph (unprivileged extraction).
pub fn explicate_assertions(cfg: &mut Cfg, info: &ProgramInfo) -> Result<()> {
    explicate_assertions_with(cfg, &AssertionExtractor::new(info.clone())?);
    Ok(())
}

/// Insert assertions using an explicitly configured extractor.
pub fn explicate_assertions_with(cfg: &mut Cfg, extractor: &AssertionExtractor) {
    for l in cfg.keys() {
        let bb = cfg.block_mut(l);
        let old = core::mem::take(&mut bb.insts);
        let mut insts = Vec::with_capacity(old.len() * 2);
        for ins in old {
            for a in extractor.extract(&ins) {
                insts.push(Instruction::Assert(a));
            }
            insts.push(ins);
        }
        bb.insts = insts;
    }
}
