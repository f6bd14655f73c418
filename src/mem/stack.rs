// SPDX-License-Identifier: GPL-2.0

//! The abstract stack store.
//!
//! A sparse map from (offset, width) cells to abstract values. A cell
//! exists iff the analysis can prove the bytes were written on every path
//! to the current point; reading bytes with no covering cell is reading
//! uninitialized stack and contributes nothing (bottom).
//!
//! Writes at a single concrete offset strongly replace the cells they
//! fully cover. All other writes are weak: they join into every cell the
//! write may touch and never create cells, so an uncertain write can only
//! lose information, never invent it.

use crate::domains::lattice::Lattice;
use crate::domains::numset::{NumSet, OffsetSet};
use crate::domains::rcp::RcpDomain;
use crate::stdlib::{BTreeMap, Vec};
use core::fmt;

/// Byte-addressed abstract store over the stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemDom {
    bot: bool,
    cells: BTreeMap<(i64, u32), RcpDomain>,
}

impl Default for MemDom {
    fn default() -> Self {
        MemDom::bot()
    }
}

impl MemDom {
    /// The bottom store (unreachable state).
    pub fn bot() -> Self {
        MemDom { bot: true, cells: BTreeMap::new() }
    }

    /// An empty store: reachable, nothing written yet.
    pub fn empty() -> Self {
        MemDom { bot: false, cells: BTreeMap::new() }
    }

    /// Whether this is the unreachable store.
    pub fn is_bot(&self) -> bool {
        self.bot
    }

    /// Number of tracked cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is tracked.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The tracked cells in offset order.
    pub fn cells(&self) -> impl Iterator<Item = (&(i64, u32), &RcpDomain)> {
        self.cells.iter()
    }

    fn overlapping_keys(&self, lo: i64, hi: i64) -> Vec<(i64, u32)> {
        self.cells
            .keys()
            .filter(|&&(o, w)| o < hi && o + w as i64 > lo)
            .copied()
            .collect()
    }

    /// Store `value` at the given offsets with a concrete width.
    ///
    /// A single concrete offset is a strong update: fully covered cells
    /// are replaced, partially covered ones are joined with the value.
    /// Multiple (or unknown) offsets weakly join into every cell the
    /// write may touch.
    pub fn store(&mut self, offsets: &OffsetSet, width: u32, value: &RcpDomain) {
        if self.bot {
            return;
        }
        if let Some(o) = offsets.as_single() {
            let hi = o + width as i64;
            for key in self.overlapping_keys(o, hi) {
                let fully = key.0 >= o && key.0 + key.1 as i64 <= hi;
                if fully {
                    self.cells.remove(&key);
                } else if let Some(cell) = self.cells.get_mut(&key) {
                    cell.join(value);
                }
            }
            self.cells.insert((o, width), value.clone());
            return;
        }
        if offsets.is_top() {
            for cell in self.cells.values_mut() {
                cell.join(value);
            }
            return;
        }
        for &o in offsets.elems() {
            for key in self.overlapping_keys(o, o + width as i64) {
                if let Some(cell) = self.cells.get_mut(&key) {
                    cell.join(value);
                }
            }
        }
    }

    /// Store with both offsets and width uncertain: weakly join into the
    /// cartesian product of possibilities.
    pub fn store_dynamic(&mut self, offsets: &OffsetSet, widths: &NumSet, value: &RcpDomain) {
        if self.bot || widths.is_bot() || offsets.is_bot() {
            return;
        }
        if offsets.is_top() || widths.is_top() {
            for cell in self.cells.values_mut() {
                cell.join(value);
            }
            return;
        }
        for &o in offsets.elems() {
            for &w in widths.elems() {
                if w <= 0 {
                    continue;
                }
                for key in self.overlapping_keys(o, o.saturating_add(w)) {
                    if let Some(cell) = self.cells.get_mut(&key) {
                        cell.join(value);
                    }
                }
            }
        }
    }

    /// Load a value of the given width.
    ///
    /// An exact cell hit yields its value; a partial overlap is an
    /// ambiguous byte mixture and yields an unknown number; no overlap
    /// contributes nothing. Multiple candidate offsets join.
    pub fn load(&self, offsets: &OffsetSet, width: u32) -> RcpDomain {
        if self.bot {
            return RcpDomain::bot();
        }
        let mut r = RcpDomain::bot();
        if offsets.is_top() {
            for cell in self.cells.values() {
                r.join(cell);
            }
            r.join(&RcpDomain::with_num_top());
            return r;
        }
        for &o in offsets.elems() {
            if let Some(cell) = self.cells.get(&(o, width)) {
                r.join(cell);
            } else if !self.overlapping_keys(o, o + width as i64).is_empty() {
                r.join(&RcpDomain::with_num_top());
            }
        }
        r
    }
}

impl Lattice for MemDom {
    fn join(&mut self, other: &Self) {
        if other.bot {
            return;
        }
        if self.bot {
            *self = other.clone();
            return;
        }
        // A cell survives a join only if both sides have it: the stack is
        // initialized-on-all-paths, like the register file.
        let mut joined = BTreeMap::new();
        for (key, cell) in &self.cells {
            if let Some(o) = other.cells.get(key) {
                let mut v = cell.clone();
                v.join(o);
                joined.insert(*key, v);
            }
        }
        self.cells = joined;
    }

    fn meet(&mut self, other: &Self) {
        if self.bot {
            return;
        }
        if other.bot {
            *self = MemDom::bot();
            return;
        }
        for (key, cell) in &other.cells {
            self.cells
                .entry(*key)
                .and_modify(|v| v.meet(cell))
                .or_insert_with(|| cell.clone());
        }
    }

    fn is_bot(&self) -> bool {
        self.bot
    }
}

impl fmt::Display for MemDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bot {
            return write!(f, "stack: bot");
        }
        write!(f, "stack: [")?;
        for (i, ((o, w), v)) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}..{}: {}", o, o + *w as i64, v)?;
        }
        write!(f, "]")
    }
}
