// SPDX-License-Identifier: GPL-2.0

//! Proven lower bound on the packet length.
//!
//! Packet pointers carry offsets; an access through one is safe only if
//! the packet is known to extend past the accessed bytes. That knowledge
//! comes exclusively from comparisons against the packet-end sentinel,
//! and is summarized here as a single integer: "the packet is at least
//! `size` bytes".

use crate::domains::lattice::Lattice;
use crate::domains::numset::OffsetSet;
use core::fmt;

/// Bottom sentinel: an unreachable state knows an absurdly large packet.
const BOT_SIZE: i64 = 0xFFF_FFFF;

/// Lower bound on the validated packet prefix, in bytes.
///
/// Join takes the minimum (weaker knowledge survives a merge), meet the
/// maximum. Havoc resets to 0: nothing validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinSizeDom {
    size: i64,
}

impl Default for MinSizeDom {
    fn default() -> Self {
        MinSizeDom::bot()
    }
}

impl MinSizeDom {
    /// The bottom element.
    pub fn bot() -> Self {
        MinSizeDom { size: BOT_SIZE }
    }

    /// Forget everything: no validated prefix.
    pub fn havoc(&mut self) {
        self.size = 0;
    }

    /// The current bound.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Learn that the packet extends at least to the smallest offset in
    /// `ub` (the comparison that taught us this holds for every possible
    /// offset, so the smallest is the one guaranteed).
    pub fn assume_larger_than(&mut self, ub: &OffsetSet) {
        if ub.is_bot() {
            return;
        }
        if ub.is_top() {
            self.size = BOT_SIZE;
            return;
        }
        if let Some(m) = ub.min_elem() {
            self.size = self.size.max(m);
        }
    }

    /// Whether every possible end offset in `ub` is within the validated
    /// prefix.
    pub fn in_bounds(&self, ub: &OffsetSet) -> bool {
        if ub.is_bot() {
            return true;
        }
        if ub.is_top() {
            return false;
        }
        ub.max_elem().is_some_and(|m| self.size >= m)
    }
}

impl Lattice for MinSizeDom {
    fn join(&mut self, other: &Self) {
        self.size = self.size.min(other.size);
    }

    fn meet(&mut self, other: &Self) {
        self.size = self.size.max(other.size);
    }

    fn is_bot(&self) -> bool {
        self.size == BOT_SIZE
    }
}

impl fmt::Display for MinSizeDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min_size: {}", self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_havoc_then_learn() {
        let mut d = MinSizeDom::bot();
        d.havoc();
        assert_eq!(d.size(), 0);
        d.assume_larger_than(&OffsetSet::from_slice(&[14, 20]));
        assert_eq!(d.size(), 14);
    }

    #[test]
    fn test_in_bounds() {
        let mut d = MinSizeDom::bot();
        d.havoc();
        d.assume_larger_than(&OffsetSet::single(14));
        assert!(d.in_bounds(&OffsetSet::single(14)));
        assert!(d.in_bounds(&OffsetSet::from_slice(&[4, 14])));
        assert!(!d.in_bounds(&OffsetSet::from_slice(&[4, 15])));
        assert!(!d.in_bounds(&OffsetSet::top()));
        assert!(d.in_bounds(&OffsetSet::bot()));
    }

    #[test]
    fn test_join_takes_min() {
        let mut a = MinSizeDom::bot();
        a.havoc();
        a.assume_larger_than(&OffsetSet::single(20));
        let mut b = MinSizeDom::bot();
        b.havoc();
        b.assume_larger_than(&OffsetSet::single(10));
        a.join(&b);
        assert_eq!(a.size(), 10);
    }

    #[test]
    fn test_bot_is_join_identity() {
        let mut a = MinSizeDom::bot();
        let mut b = MinSizeDom::bot();
        b.havoc();
        b.assume_larger_than(&OffsetSet::single(42));
        a.join(&b);
        assert_eq!(a.size(), 42);
    }
}
