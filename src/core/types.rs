// SPDX-License-Identifier: GPL-2.0

//! Registers, region type sets, and the program description.

use crate::stdlib::{String, Vec};
use bitflags::bitflags;
use core::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Size of the per-program stack frame in bytes.
///
/// The frame pointer r10 points one past the stack, i.e. it holds a stack
/// pointer with offset `STACK_SIZE`; stores use negative displacements.
pub const STACK_SIZE: i64 = 512;

/// Number of register slots tracked by the analysis (r0..r10 plus
/// bookkeeping slots).
pub const NUM_REG_SLOTS: usize = 16;

/// Maximum number of maps a program may reference; each map is a distinct
/// region in the type universe.
pub const MAX_MAPS: usize = 16;

/// A register name.
///
/// `r0`..`r9` are general purpose, `r10` is the frame pointer. Slots 13
/// and 14 are pseudo-registers carrying packet bookkeeping; they never
/// appear in program text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(pub u8);

impl Reg {
    /// The return-value register.
    pub const R0: Reg = Reg(0);
    /// The context argument register.
    pub const R1: Reg = Reg(1);
    /// The frame pointer.
    pub const FP: Reg = Reg(10);
    /// Pseudo-slot tracking the packet end.
    pub const DATA_END: Reg = Reg(13);
    /// Pseudo-slot tracking the packet metadata base.
    pub const META: Reg = Reg(14);

    /// Slot index into the register file.
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// ============================================================================
// Type sets
// ============================================================================

bitflags! {
    /// A finite set of value kinds.
    ///
    /// The universe is `{num, ctx, stack, packet, fd}` plus one kind per
    /// declared map. Map kinds occupy bits `0..MAX_MAPS`; use
    /// [`TypeSet::map`] to name one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeSet: u64 {
        /// Plain number.
        const NUM = 1 << MAX_MAPS;
        /// Pointer into the program context.
        const CTX = 1 << (MAX_MAPS + 1);
        /// Pointer into the stack frame.
        const STACK = 1 << (MAX_MAPS + 2);
        /// Pointer into the packet.
        const PACKET = 1 << (MAX_MAPS + 3);
        /// Map file descriptor.
        const FD = 1 << (MAX_MAPS + 4);
        /// Every map-value region.
        const MAPS = (1 << MAX_MAPS) - 1;
        /// Regions a helper may treat as memory.
        const MEM = Self::STACK.bits() | Self::PACKET.bits() | Self::MAPS.bits();
        /// Every pointer region (everything but num and fd).
        const PTR = Self::CTX.bits() | Self::MEM.bits();
        /// Everything but fd.
        const NONFD = Self::PTR.bits() | Self::NUM.bits();
        /// The whole universe.
        const ALL = Self::NONFD.bits() | Self::FD.bits();
    }
}

impl TypeSet {
    /// The singleton kind of map `i`'s value region.
    ///
    /// Map bits share the word with the named kinds, so an index past
    /// [`MAX_MAPS`] would alias them. Program descriptions are validated
    /// against the limit before analysis; this check backstops direct
    /// callers.
    ///
    /// # Panics
    ///
    /// Panics if `i >= MAX_MAPS`.
    pub fn map(i: usize) -> TypeSet {
        assert!(i < MAX_MAPS, "map index {} out of range", i);
        TypeSet::from_bits_retain(1 << i)
    }

    /// Iterate the map indices present in this set.
    pub fn map_indices(self) -> impl Iterator<Item = usize> {
        (0..MAX_MAPS).filter(move |i| self.contains(TypeSet::map(*i)))
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == TypeSet::ALL {
            return write!(f, "all");
        }
        if *self == TypeSet::PTR {
            return write!(f, "ptr");
        }
        if *self == TypeSet::MEM {
            return write!(f, "mem");
        }
        if *self == TypeSet::NONFD {
            return write!(f, "nonfd");
        }
        let mut parts: Vec<String> = Vec::new();
        if self.contains(TypeSet::NUM) {
            parts.push(String::from("num"));
        }
        if self.contains(TypeSet::CTX) {
            parts.push(String::from("ctx"));
        }
        if self.contains(TypeSet::STACK) {
            parts.push(String::from("stack"));
        }
        if self.contains(TypeSet::PACKET) {
            parts.push(String::from("packet"));
        }
        if self.contains(TypeSet::FD) {
            parts.push(String::from("fd"));
        }
        if self.contains(TypeSet::MAPS) {
            parts.push(String::from("maps"));
        } else {
            for i in self.map_indices() {
                parts.push(crate::stdlib::format!("map{}", i));
            }
        }
        if parts.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", parts.join("|"))
    }
}

// ============================================================================
// Program description
// ============================================================================

/// Metadata for one map referenced by the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapDef {
    /// Size of a map key in bytes.
    pub key_size: u32,
    /// Size of a map value in bytes; bounds accesses through value
    /// pointers.
    pub value_size: u32,
}

/// Byte offsets of the packet bookkeeping fields inside the context.
///
/// A negative offset means the field is not present for this program
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtxDescriptor {
    /// Total context size in bytes.
    pub size: i32,
    /// Offset of the packet data pointer field.
    pub data: i32,
    /// Offset of the packet data end field.
    pub end: i32,
    /// Offset of the packet metadata field.
    pub meta: i32,
}

impl CtxDescriptor {
    /// A context with no packet fields.
    pub const fn opaque(size: i32) -> Self {
        CtxDescriptor { size, data: -1, end: -1, meta: -1 }
    }
}

/// The kind of program being verified; determines the context layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgramType {
    /// Unknown program type; opaque context.
    #[default]
    Unspec,
    /// Socket filter; skb context without metadata.
    SocketFilter,
    /// Traffic-control classifier; full skb context.
    SchedCls,
    /// XDP; packet pointers at the head of the context.
    Xdp,
    /// Kprobe; pt_regs context, no packet.
    Kprobe,
}

impl ProgramType {
    /// The context descriptor for this program type.
    pub fn descriptor(self) -> CtxDescriptor {
        match self {
            ProgramType::Unspec => CtxDescriptor::opaque(64),
            ProgramType::SocketFilter => CtxDescriptor { size: 192, data: 76, end: 80, meta: -1 },
            ProgramType::SchedCls => CtxDescriptor { size: 192, data: 76, end: 80, meta: 152 },
            ProgramType::Xdp => CtxDescriptor { size: 24, data: 0, end: 4, meta: 8 },
            ProgramType::Kprobe => CtxDescriptor::opaque(168),
        }
    }
}

/// Everything the analysis needs to know about the program being checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    /// The program type.
    pub program_type: ProgramType,
    /// One entry per map the program references; the index is the map's
    /// region id and its load-time fd.
    pub map_defs: Vec<MapDef>,
    /// Context layout.
    pub descriptor: CtxDescriptor,
}

impl ProgramInfo {
    /// Program description for a given type with no maps.
    pub fn with_type(program_type: ProgramType) -> Self {
        ProgramInfo { program_type, map_defs: Vec::new(), descriptor: program_type.descriptor() }
    }

    /// Program description with maps.
    ///
    /// At most [`MAX_MAPS`] maps can be analyzed; the drivers reject a
    /// longer table before any analysis runs.
    pub fn with_maps(program_type: ProgramType, map_defs: Vec<MapDef>) -> Self {
        ProgramInfo { program_type, map_defs, descriptor: program_type.descriptor() }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Process-wide verification options.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifierOptions {
    /// Dump the abstract machine before and after every instruction.
    pub print_invariants: bool,
    /// Report every assertion that could not be proven.
    pub print_failures: bool,
    /// Merge straight-line block chains before the fixpoint.
    pub simplify: bool,
    /// Privileged mode: skip the pointer-leak and comparison-typing
    /// assertions.
    pub privileged: bool,
}
