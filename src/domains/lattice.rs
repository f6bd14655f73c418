// SPDX-License-Identifier: GPL-2.0

//! The capability every abstract domain implements.

/// A join-semilattice with a meet and a distinguished bottom.
///
/// `join` and `meet` mutate in place; transfer functions copy first. The
/// partial order is induced: `a ≤ b` iff `a ⊔ b = b`.
pub trait Lattice: Clone + PartialEq {
    /// Least upper bound, in place.
    fn join(&mut self, other: &Self);

    /// Greatest lower bound, in place.
    fn meet(&mut self, other: &Self);

    /// Whether this is the bottom element (no concrete values).
    fn is_bot(&self) -> bool;

    /// Induced partial order.
    fn leq(&self, other: &Self) -> bool {
        let mut j = self.clone();
        j.join(other);
        j == *other
    }
}
