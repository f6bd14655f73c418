// SPDX-License-Identifier: GPL-2.0

//! The per-value product domain.
//!
//! An abstract value is decomposed into independent components, one per
//! region: plain numbers, offsets into the context, the stack, the
//! packet, map fds, one offset set per map value region, and a flag for
//! the packet-end sentinel. The concretization is the union of the
//! non-empty components, so a value that "may be a number or a map
//! pointer" keeps both components live until a branch refines it away.

use crate::core::insn::{BinOp, CmpOp};
use crate::core::types::{MapDef, TypeSet, MAX_MAPS};
use crate::domains::lattice::Lattice;
use crate::domains::numset::{NumSet, OffsetSet};
use crate::stdlib::Vec;
use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

/// An abstract value: one independent component per region.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RcpDomain {
    num: NumSet,
    ctx: OffsetSet,
    stack: OffsetSet,
    packet: OffsetSet,
    fd: NumSet,
    maps: Vec<OffsetSet>,
    packet_end: bool,
}

impl RcpDomain {
    /// The bottom value (no region inhabited).
    pub fn bot() -> Self {
        RcpDomain::default()
    }

    /// The most general value over `nmaps` maps.
    pub fn top(nmaps: usize) -> Self {
        RcpDomain {
            num: NumSet::top(),
            ctx: OffsetSet::top(),
            stack: OffsetSet::top(),
            packet: OffsetSet::top(),
            fd: NumSet::top(),
            maps: crate::stdlib::vec![OffsetSet::top(); nmaps],
            packet_end: true,
        }
    }

    /// A single concrete number.
    pub fn with_num(v: i64) -> Self {
        RcpDomain { num: NumSet::single(v), ..RcpDomain::bot() }
    }

    /// A number from an explicit set.
    pub fn with_num_set(s: NumSet) -> Self {
        RcpDomain { num: s, ..RcpDomain::bot() }
    }

    /// An unknown number.
    pub fn with_num_top() -> Self {
        RcpDomain { num: NumSet::top(), ..RcpDomain::bot() }
    }

    /// A context pointer at a concrete offset.
    pub fn with_ctx(o: i64) -> Self {
        RcpDomain { ctx: OffsetSet::single(o), ..RcpDomain::bot() }
    }

    /// A stack pointer at a concrete offset.
    pub fn with_stack(o: i64) -> Self {
        RcpDomain { stack: OffsetSet::single(o), ..RcpDomain::bot() }
    }

    /// A packet pointer at a concrete offset.
    pub fn with_packet(o: i64) -> Self {
        RcpDomain { packet: OffsetSet::single(o), ..RcpDomain::bot() }
    }

    /// A map file descriptor.
    pub fn with_fd(fd: i64) -> Self {
        RcpDomain { fd: NumSet::single(fd), ..RcpDomain::bot() }
    }

    /// A pointer into map `i`'s value region at a concrete offset.
    ///
    /// # Panics
    ///
    /// Panics if `i >= MAX_MAPS`; regions past the limit have no type
    /// bit.
    pub fn with_map(i: usize, o: i64) -> Self {
        assert!(i < MAX_MAPS, "map index {} out of range", i);
        let mut maps = crate::stdlib::vec![OffsetSet::bot(); i + 1];
        maps[i] = OffsetSet::single(o);
        RcpDomain { maps, ..RcpDomain::bot() }
    }

    /// The packet-end sentinel.
    pub fn with_packet_end() -> Self {
        RcpDomain { packet_end: true, ..RcpDomain::bot() }
    }

    /// The number component.
    pub fn get_num(&self) -> &NumSet {
        &self.num
    }

    /// The context offset component.
    pub fn get_ctx(&self) -> &OffsetSet {
        &self.ctx
    }

    /// The stack offset component.
    pub fn get_stack(&self) -> &OffsetSet {
        &self.stack
    }

    /// The packet offset component.
    pub fn get_packet(&self) -> &OffsetSet {
        &self.packet
    }

    /// The fd component.
    pub fn get_fd(&self) -> &NumSet {
        &self.fd
    }

    /// Map `i`'s offset component (bottom when absent).
    pub fn get_map(&self, i: usize) -> OffsetSet {
        self.maps.get(i).cloned().unwrap_or_default()
    }

    fn map_ref(&self, i: usize) -> Option<&OffsetSet> {
        self.maps.get(i).filter(|m| !m.is_bot())
    }

    fn set_map(&mut self, i: usize, s: OffsetSet) {
        if s.is_bot() && i >= self.maps.len() {
            return;
        }
        if i >= self.maps.len() {
            self.maps.resize(i + 1, OffsetSet::bot());
        }
        self.maps[i] = s;
    }

    fn normalize(&mut self) {
        while self.maps.last().is_some_and(|m| m.is_bot()) {
            self.maps.pop();
        }
    }

    /// The set of regions this value may inhabit (the flag is not part of
    /// the type universe and is reported separately).
    pub fn regions(&self) -> TypeSet {
        let mut t = TypeSet::empty();
        if !self.num.is_bot() {
            t |= TypeSet::NUM;
        }
        if !self.ctx.is_bot() {
            t |= TypeSet::CTX;
        }
        if !self.stack.is_bot() {
            t |= TypeSet::STACK;
        }
        if !self.packet.is_bot() {
            t |= TypeSet::PACKET;
        }
        if !self.fd.is_bot() {
            t |= TypeSet::FD;
        }
        for (i, m) in self.maps.iter().enumerate() {
            if !m.is_bot() && i < MAX_MAPS {
                t |= TypeSet::map(i);
            }
        }
        t
    }

    /// Whether no region is inhabited.
    pub fn is_bot(&self) -> bool {
        self.regions().is_empty() && !self.packet_end
    }

    /// Whether the value is certainly a plain number.
    pub fn must_be_num(&self) -> bool {
        (self.regions() | TypeSet::NUM) == TypeSet::NUM && !self.packet_end
    }

    /// Whether every inhabited region lies within `t`. The packet-end
    /// flag counts as a region outside every type set, and bottom is not
    /// "must": an impossible value proves nothing.
    pub fn must_be(&self, t: TypeSet) -> bool {
        !self.is_bot() && !self.packet_end && t.contains(self.regions())
    }

    /// Whether some inhabited region lies within `t`.
    pub fn may_be(&self, t: TypeSet) -> bool {
        self.regions().intersects(t)
    }

    /// Whether the value may be a packet pointer.
    pub fn maybe_packet(&self) -> bool {
        !self.packet.is_bot()
    }

    /// Whether the value may point into some map.
    pub fn maybe_map(&self) -> bool {
        self.maps.iter().any(|m| !m.is_bot())
    }

    /// Whether the value is exactly the packet-end sentinel.
    pub fn is_packet_end(&self) -> bool {
        self.packet_end && self.regions().is_empty()
    }

    fn has_ptr(&self) -> bool {
        self.may_be(TypeSet::PTR)
    }

    fn has_oddball(&self) -> bool {
        !self.fd.is_bot() || self.packet_end
    }

    fn has_nonnum(&self) -> bool {
        self.has_ptr() || self.has_oddball()
    }

    /// A same-shape value with every inhabited component collapsed to
    /// `{0}`; the base of a relocated bound computation.
    pub fn zero(&self) -> RcpDomain {
        let z = |s: &NumSet| if s.is_bot() { NumSet::bot() } else { NumSet::single(0) };
        let mut r = RcpDomain {
            num: z(&self.num),
            ctx: z(&self.ctx),
            stack: z(&self.stack),
            packet: z(&self.packet),
            fd: z(&self.fd),
            maps: self.maps.iter().map(z).collect(),
            packet_end: self.packet_end,
        };
        r.normalize();
        r
    }

    /// Apply a non-additive ALU operation. These project through the
    /// number component only; if either operand may be a pointer the
    /// result collapses to an unknown number.
    pub fn exec(&mut self, op: BinOp, rhs: &RcpDomain) {
        debug_assert!(!matches!(op, BinOp::Mov | BinOp::Add | BinOp::Sub));
        if self.has_nonnum() || rhs.has_nonnum() {
            *self = RcpDomain::with_num_top();
            return;
        }
        self.num = self.num.exec(op, &rhs.num);
    }

    /// The result of a map lookup through this value's fd component: a
    /// nullable pointer to offset 0 of each possible map's value region.
    pub fn map_lookup_elem(&self, map_defs: &[MapDef]) -> RcpDomain {
        let mut r = RcpDomain::with_num(0);
        if self.fd.is_top() {
            for i in 0..map_defs.len() {
                r.set_map(i, OffsetSet::single(0));
            }
        } else {
            for &fd in self.fd.elems() {
                if fd >= 0 && (fd as usize) < map_defs.len() {
                    r.set_map(fd as usize, OffsetSet::single(0));
                }
            }
        }
        r
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

fn joined(a: NumSet, b: NumSet) -> NumSet {
    let mut r = a;
    r.join(&b);
    r
}

impl Add<&RcpDomain> for &RcpDomain {
    type Output = RcpDomain;

    /// Pointer + number shifts the offset component; number + number adds.
    /// Every other pairing (pointer + pointer, fd or packet-end on either
    /// side) contributes an unknown number.
    fn add(self, rhs: &RcpDomain) -> RcpDomain {
        let nmaps = self.maps.len().max(rhs.maps.len());
        let mut r = RcpDomain::bot();
        r.num = self.num.plus(&rhs.num);
        r.ctx = joined(self.ctx.plus(&rhs.num), rhs.ctx.plus(&self.num));
        r.stack = joined(self.stack.plus(&rhs.num), rhs.stack.plus(&self.num));
        r.packet = joined(self.packet.plus(&rhs.num), rhs.packet.plus(&self.num));
        for i in 0..nmaps {
            r.set_map(i, joined(self.get_map(i).plus(&rhs.num), rhs.get_map(i).plus(&self.num)));
        }
        let imprecise = (self.has_ptr() && rhs.has_ptr())
            || (self.has_oddball() && !rhs.is_bot())
            || (rhs.has_oddball() && !self.is_bot());
        if imprecise {
            r.num = NumSet::top();
        }
        r.normalize();
        r
    }
}

impl Sub<&RcpDomain> for &RcpDomain {
    type Output = RcpDomain;

    /// Pointer − number shifts the offset; pointer − same-region pointer
    /// yields the offset difference as a number. Every other pairing
    /// contributes an unknown number.
    fn sub(self, rhs: &RcpDomain) -> RcpDomain {
        let nmaps = self.maps.len().max(rhs.maps.len());
        let mut r = RcpDomain::bot();
        r.num = self.num.minus(&rhs.num);
        r.ctx = self.ctx.minus(&rhs.num);
        r.stack = self.stack.minus(&rhs.num);
        r.packet = self.packet.minus(&rhs.num);
        for i in 0..nmaps {
            r.set_map(i, self.get_map(i).minus(&rhs.num));
        }
        r.num.join(&self.ctx.minus(&rhs.ctx));
        r.num.join(&self.stack.minus(&rhs.stack));
        r.num.join(&self.packet.minus(&rhs.packet));
        for i in 0..nmaps {
            r.num.join(&self.get_map(i).minus(&rhs.get_map(i)));
        }
        let a_pr = self.regions() & TypeSet::PTR;
        let b_pr = rhs.regions() & TypeSet::PTR;
        let cross_regions = !a_pr.is_empty()
            && !b_pr.is_empty()
            && !(a_pr == b_pr && a_pr.bits().count_ones() == 1);
        let imprecise = cross_regions
            || (!b_pr.is_empty() && !self.num.is_bot())
            || (self.has_oddball() && !rhs.is_bot())
            || (rhs.has_oddball() && !self.is_bot());
        if imprecise {
            r.num = NumSet::top();
        }
        r.normalize();
        r
    }
}

impl AddAssign<&RcpDomain> for RcpDomain {
    fn add_assign(&mut self, rhs: &RcpDomain) {
        *self = &*self + rhs;
    }
}

impl SubAssign<&RcpDomain> for RcpDomain {
    fn sub_assign(&mut self, rhs: &RcpDomain) {
        *self = &*self - rhs;
    }
}

// ============================================================================
// Assumption and satisfaction
// ============================================================================

fn region_assume(left: &mut NumSet, op: CmpOp, right: &NumSet) {
    if left.is_bot() {
        return;
    }
    if !right.is_bot() {
        left.assume(op, right);
    } else if op == CmpOp::Eq {
        // A region inhabited on one side only cannot satisfy equality.
        *left = NumSet::bot();
    }
}

impl RcpDomain {
    /// Sharpen `left` under `left op right`, refining only the components
    /// named in `when`.
    pub fn assume_cmp(left: &mut RcpDomain, op: CmpOp, right: &RcpDomain, when: TypeSet) {
        if when.contains(TypeSet::NUM) {
            region_assume(&mut left.num, op, &right.num);
        }
        if when.contains(TypeSet::CTX) {
            region_assume(&mut left.ctx, op, &right.ctx);
        }
        if when.contains(TypeSet::STACK) {
            region_assume(&mut left.stack, op, &right.stack);
        }
        if when.contains(TypeSet::PACKET) {
            region_assume(&mut left.packet, op, &right.packet);
        }
        if when.contains(TypeSet::FD) {
            region_assume(&mut left.fd, op, &right.fd);
        }
        for i in 0..left.maps.len().min(MAX_MAPS) {
            if when.contains(TypeSet::map(i)) {
                let r = rhs_map(right, i);
                region_assume(&mut left.maps[i], op, &r);
            }
        }
        if when == TypeSet::ALL && op == CmpOp::Eq && !right.packet_end {
            left.packet_end = false;
        }
        left.normalize();
    }

    /// Restrict `left` to the regions in `t`.
    pub fn assume_type(left: &mut RcpDomain, t: TypeSet) {
        if !t.contains(TypeSet::NUM) {
            left.num = NumSet::bot();
        }
        if !t.contains(TypeSet::CTX) {
            left.ctx = OffsetSet::bot();
        }
        if !t.contains(TypeSet::STACK) {
            left.stack = OffsetSet::bot();
        }
        if !t.contains(TypeSet::PACKET) {
            left.packet = OffsetSet::bot();
        }
        if !t.contains(TypeSet::FD) {
            left.fd = NumSet::bot();
        }
        for i in 0..left.maps.len().min(MAX_MAPS) {
            if !t.contains(TypeSet::map(i)) {
                left.maps[i] = OffsetSet::bot();
            }
        }
        left.packet_end = false;
        left.normalize();
    }

    /// Restrict `left` to `t` when `given` certainly inhabits `given_t`.
    pub fn assume_type_given(
        left: &mut RcpDomain,
        t: TypeSet,
        given: &RcpDomain,
        given_t: TypeSet,
    ) {
        if given.must_be(given_t) {
            RcpDomain::assume_type(left, t);
        }
    }

    /// Whether `left op right` holds for every concrete value of the
    /// components named in `when`. Components outside `when` are outside
    /// the typing hypothesis and vacuous.
    pub fn satisfied_cmp(left: &RcpDomain, op: CmpOp, right: &RcpDomain, when: TypeSet) -> bool {
        if when.contains(TypeSet::NUM) && !left.num.satisfied(op, &right.num) {
            return false;
        }
        if when.contains(TypeSet::CTX) && !left.ctx.satisfied(op, &right.ctx) {
            return false;
        }
        if when.contains(TypeSet::STACK) && !left.stack.satisfied(op, &right.stack) {
            return false;
        }
        if when.contains(TypeSet::PACKET) && !left.packet.satisfied(op, &right.packet) {
            return false;
        }
        if when.contains(TypeSet::FD) && !left.fd.satisfied(op, &right.fd) {
            return false;
        }
        for (i, m) in left.maps.iter().enumerate().take(MAX_MAPS) {
            if when.contains(TypeSet::map(i)) && !m.satisfied(op, &rhs_map(right, i)) {
                return false;
            }
        }
        true
    }

    /// Whether the value certainly inhabits `t` (vacuously true for an
    /// infeasible value).
    pub fn satisfied_type(left: &RcpDomain, t: TypeSet) -> bool {
        left.is_bot() || left.must_be(t)
    }

    /// Whether "if `given: given_t` then `left: t`" holds.
    pub fn satisfied_type_given(
        left: &RcpDomain,
        t: TypeSet,
        given: &RcpDomain,
        given_t: TypeSet,
    ) -> bool {
        !given.may_be(given_t) || RcpDomain::satisfied_type(left, t)
    }
}

fn rhs_map(r: &RcpDomain, i: usize) -> OffsetSet {
    r.map_ref(i).cloned().unwrap_or_default()
}

// ============================================================================
// Lattice
// ============================================================================

impl Lattice for RcpDomain {
    fn join(&mut self, other: &Self) {
        self.num.join(&other.num);
        self.ctx.join(&other.ctx);
        self.stack.join(&other.stack);
        self.packet.join(&other.packet);
        self.fd.join(&other.fd);
        for i in 0..other.maps.len() {
            let mut m = self.get_map(i);
            m.join(&other.maps[i]);
            self.set_map(i, m);
        }
        self.packet_end |= other.packet_end;
        self.normalize();
    }

    fn meet(&mut self, other: &Self) {
        self.num.meet(&other.num);
        self.ctx.meet(&other.ctx);
        self.stack.meet(&other.stack);
        self.packet.meet(&other.packet);
        self.fd.meet(&other.fd);
        for i in 0..self.maps.len() {
            let o = rhs_map(other, i);
            self.maps[i].meet(&o);
        }
        self.packet_end &= other.packet_end;
        self.normalize();
    }

    fn is_bot(&self) -> bool {
        RcpDomain::is_bot(self)
    }
}

impl fmt::Display for RcpDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bot() {
            return write!(f, "bot");
        }
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !first {
                write!(f, "|")?;
            }
            first = false;
            Ok(())
        };
        if !self.num.is_bot() {
            sep(f)?;
            write!(f, "num{}", self.num)?;
        }
        if !self.ctx.is_bot() {
            sep(f)?;
            write!(f, "ctx{}", self.ctx)?;
        }
        if !self.stack.is_bot() {
            sep(f)?;
            write!(f, "stack{}", self.stack)?;
        }
        if !self.packet.is_bot() {
            sep(f)?;
            write!(f, "pkt{}", self.packet)?;
        }
        if self.packet_end {
            sep(f)?;
            write!(f, "pkt_end")?;
        }
        if !self.fd.is_bot() {
            sep(f)?;
            write!(f, "fd{}", self.fd)?;
        }
        for (i, m) in self.maps.iter().enumerate() {
            if !m.is_bot() {
                sep(f)?;
                write!(f, "map{}{}", i, m)?;
            }
        }
        Ok(())
    }
}
