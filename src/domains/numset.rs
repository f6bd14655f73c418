// SPDX-License-Identifier: GPL-2.0

//! Small finite sets of 64-bit values.
//!
//! A set is either bottom (no value), a sorted list of at most
//! [`MAX_ELEMS`] concrete values, or top (any value). Joins that would
//! exceed the size bound widen to top, so precision is bounded by
//! construction.

use crate::core::insn::{BinOp, CmpOp};
use crate::domains::lattice::Lattice;
use crate::stdlib::Vec;
use core::fmt;

/// Maximum number of concrete values a set tracks before widening.
pub const MAX_ELEMS: usize = 4;

/// A finite set of 64-bit values with explicit top and bottom.
///
/// Comparisons through [`CmpOp::Lt`]..[`CmpOp::Ge`] are signed, matching
/// the signed offset arithmetic the bound constraints rely on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NumSet {
    top: bool,
    elems: Vec<i64>,
}

/// Byte offsets into some region; structurally the same small-set
/// lattice.
pub type OffsetSet = NumSet;

impl NumSet {
    /// The empty set.
    pub fn bot() -> Self {
        NumSet::default()
    }

    /// The set of all values.
    pub fn top() -> Self {
        NumSet { top: true, elems: Vec::new() }
    }

    /// A singleton set.
    pub fn single(v: i64) -> Self {
        NumSet { top: false, elems: crate::stdlib::vec![v] }
    }

    /// A set from explicit values (deduplicated; widens if oversized).
    pub fn from_slice(vs: &[i64]) -> Self {
        let mut s = NumSet { top: false, elems: vs.to_vec() };
        s.normalize();
        s
    }

    /// Whether the set is empty.
    pub fn is_bot(&self) -> bool {
        !self.top && self.elems.is_empty()
    }

    /// Whether the set is all values.
    pub fn is_top(&self) -> bool {
        self.top
    }

    /// Whether the set holds exactly one value.
    pub fn is_single(&self) -> bool {
        !self.top && self.elems.len() == 1
    }

    /// The value, if single.
    pub fn as_single(&self) -> Option<i64> {
        if self.is_single() {
            Some(self.elems[0])
        } else {
            None
        }
    }

    /// The concrete values of a finite set (empty when top).
    pub fn elems(&self) -> &[i64] {
        &self.elems
    }

    /// Whether `v` may be in the set.
    pub fn contains(&self, v: i64) -> bool {
        self.top || self.elems.binary_search(&v).is_ok()
    }

    /// Smallest element of a finite non-empty set.
    pub fn min_elem(&self) -> Option<i64> {
        if self.top {
            None
        } else {
            self.elems.first().copied()
        }
    }

    /// Largest element of a finite non-empty set.
    pub fn max_elem(&self) -> Option<i64> {
        if self.top {
            None
        } else {
            self.elems.last().copied()
        }
    }

    fn normalize(&mut self) {
        if self.top {
            self.elems.clear();
            return;
        }
        self.elems.sort_unstable();
        self.elems.dedup();
        if self.elems.len() > MAX_ELEMS {
            self.top = true;
            self.elems.clear();
        }
    }

    /// Pointwise binary operation with the top/bottom rules of §arith:
    /// bottom absorbs, then top absorbs, else apply to every pair.
    fn map2(&self, other: &NumSet, f: impl Fn(i64, i64) -> i64) -> NumSet {
        if self.is_bot() || other.is_bot() {
            return NumSet::bot();
        }
        if self.top || other.top {
            return NumSet::top();
        }
        let mut out = Vec::with_capacity(self.elems.len() * other.elems.len());
        for &l in &self.elems {
            for &r in &other.elems {
                out.push(f(l, r));
            }
        }
        let mut s = NumSet { top: false, elems: out };
        s.normalize();
        s
    }

    /// Pointwise addition.
    pub fn plus(&self, other: &NumSet) -> NumSet {
        self.map2(other, |l, r| l.wrapping_add(r))
    }

    /// Pointwise subtraction.
    pub fn minus(&self, other: &NumSet) -> NumSet {
        self.map2(other, |l, r| l.wrapping_sub(r))
    }

    /// Apply an ALU operation. Division or modulo by a set that may
    /// contain zero yields top; the abstract semantics never trap.
    pub fn exec(&self, op: BinOp, rhs: &NumSet) -> NumSet {
        match op {
            BinOp::Mov => rhs.clone(),
            BinOp::Add => self.plus(rhs),
            BinOp::Sub => self.minus(rhs),
            BinOp::Mul => self.map2(rhs, |l, r| l.wrapping_mul(r)),
            BinOp::Div | BinOp::Mod => {
                if rhs.is_bot() || self.is_bot() {
                    return NumSet::bot();
                }
                if rhs.contains(0) {
                    return NumSet::top();
                }
                match op {
                    BinOp::Div => self.map2(rhs, |l, r| l.wrapping_div(r)),
                    _ => self.map2(rhs, |l, r| l.wrapping_rem(r)),
                }
            }
            BinOp::Or => self.map2(rhs, |l, r| l | r),
            BinOp::And => self.map2(rhs, |l, r| l & r),
            BinOp::Xor => self.map2(rhs, |l, r| l ^ r),
            BinOp::Lsh => self.map2(rhs, |l, r| l.wrapping_shl(r as u32 & 63)),
            BinOp::Rsh => self.map2(rhs, |l, r| ((l as u64) >> (r as u32 & 63)) as i64),
            BinOp::Arsh => self.map2(rhs, |l, r| l >> (r as u32 & 63)),
        }
    }

    fn holds(l: i64, op: CmpOp, r: i64) -> bool {
        match op {
            CmpOp::Eq => l == r,
            CmpOp::Ne => l != r,
            CmpOp::Set => (l & r) != 0,
            CmpOp::Nset => (l & r) == 0,
            CmpOp::Lt | CmpOp::Slt => l < r,
            CmpOp::Le | CmpOp::Sle => l <= r,
            CmpOp::Gt | CmpOp::Sgt => l > r,
            CmpOp::Ge | CmpOp::Sge => l >= r,
        }
    }

    /// Keep the subset consistent with `self op rhs`.
    ///
    /// Exact for concrete sets; if either side is top the left side is
    /// returned unchanged (sound but imprecise). An empty right side
    /// makes the relation unsatisfiable and the result is bottom.
    pub fn assume(&mut self, op: CmpOp, rhs: &NumSet) {
        if self.is_bot() || self.top || rhs.top {
            return;
        }
        if rhs.is_bot() {
            *self = NumSet::bot();
            return;
        }
        self.elems.retain(|&l| rhs.elems.iter().any(|&r| NumSet::holds(l, op, r)));
    }

    /// Whether every value on the left satisfies the relation with every
    /// value on the right. Top on either side cannot be proven.
    pub fn satisfied(&self, op: CmpOp, rhs: &NumSet) -> bool {
        if self.is_bot() || rhs.is_bot() {
            return true;
        }
        if self.top || rhs.top {
            return false;
        }
        self.elems.iter().all(|&l| rhs.elems.iter().all(|&r| NumSet::holds(l, op, r)))
    }
}

impl Lattice for NumSet {
    fn join(&mut self, other: &Self) {
        if other.is_bot() {
            return;
        }
        if self.is_bot() {
            *self = other.clone();
            return;
        }
        if self.top || other.top {
            *self = NumSet::top();
            return;
        }
        self.elems.extend_from_slice(&other.elems);
        self.normalize();
    }

    fn meet(&mut self, other: &Self) {
        if self.is_bot() || other.top {
            return;
        }
        if other.is_bot() || self.top {
            *self = other.clone();
            return;
        }
        self.elems.retain(|v| other.elems.binary_search(v).is_ok());
    }

    fn is_bot(&self) -> bool {
        NumSet::is_bot(self)
    }
}

impl fmt::Display for NumSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.top {
            return write!(f, "*");
        }
        if self.elems.is_empty() {
            return write!(f, "bot");
        }
        write!(f, "{{")?;
        for (i, v) in self.elems.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}
