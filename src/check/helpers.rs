// SPDX-License-Identifier: GPL-2.0

//! Argument prototypes for well-known helper calls.
//!
//! Each prototype describes how the verifier must treat the argument
//! registers: which carry plain values, which carry fds, and which form
//! (pointer, size) pairs into memory.

use crate::core::insn::{ArgPair, ArgPairKind, ArgSingle, ArgSingleKind, Call};
use crate::core::types::Reg;
use crate::stdlib::{String, Vec};

fn call(func: i32, name: &str, singles: Vec<ArgSingle>, pairs: Vec<ArgPair>, returns_map: bool) -> Call {
    Call { func, name: String::from(name), singles, pairs, returns_map }
}

fn single(kind: ArgSingleKind, reg: u8) -> ArgSingle {
    ArgSingle { kind, reg: Reg(reg) }
}

fn pair(kind: ArgPairKind, mem: u8, size: u8, can_be_zero: bool) -> ArgPair {
    ArgPair { kind, mem: Reg(mem), size: Reg(size), can_be_zero }
}

/// `bpf_map_lookup_elem(map, key)`: returns a nullable value pointer.
pub fn map_lookup_elem() -> Call {
    call(
        1,
        "map_lookup_elem",
        crate::stdlib::vec![
            single(ArgSingleKind::MapFd, 1),
            single(ArgSingleKind::PtrToMapKey, 2),
        ],
        Vec::new(),
        true,
    )
}

/// `bpf_map_update_elem(map, key, value, flags)`.
pub fn map_update_elem() -> Call {
    call(
        2,
        "map_update_elem",
        crate::stdlib::vec![
            single(ArgSingleKind::MapFd, 1),
            single(ArgSingleKind::PtrToMapKey, 2),
            single(ArgSingleKind::PtrToMapValue, 3),
            single(ArgSingleKind::Anything, 4),
        ],
        Vec::new(),
        false,
    )
}

/// `bpf_map_delete_elem(map, key)`.
pub fn map_delete_elem() -> Call {
    call(
        3,
        "map_delete_elem",
        crate::stdlib::vec![
            single(ArgSingleKind::MapFd, 1),
            single(ArgSingleKind::PtrToMapKey, 2),
        ],
        Vec::new(),
        false,
    )
}

/// `bpf_probe_read(dst, size, src)`: fills caller memory.
pub fn probe_read() -> Call {
    call(
        4,
        "probe_read",
        crate::stdlib::vec![single(ArgSingleKind::Anything, 3)],
        crate::stdlib::vec![pair(ArgPairKind::PtrToUninitMem, 1, 2, true)],
        false,
    )
}

/// `bpf_ktime_get_ns()`.
pub fn ktime_get_ns() -> Call {
    call(5, "ktime_get_ns", Vec::new(), Vec::new(), false)
}

/// `bpf_get_prandom_u32()`.
pub fn get_prandom_u32() -> Call {
    call(7, "get_prandom_u32", Vec::new(), Vec::new(), false)
}

/// `bpf_csum_diff(from, from_size, to, to_size, seed)`: two nullable
/// memory arguments.
pub fn csum_diff() -> Call {
    call(
        28,
        "csum_diff",
        crate::stdlib::vec![single(ArgSingleKind::Anything, 5)],
        crate::stdlib::vec![
            pair(ArgPairKind::PtrToMemOrNull, 1, 2, true),
            pair(ArgPairKind::PtrToMemOrNull, 3, 4, true),
        ],
        false,
    )
}
