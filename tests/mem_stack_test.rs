// SPDX-License-Identifier: GPL-2.0
//! Tests for rcp_verifier::mem::stack

use rcp_verifier::mem::stack::MemDom;
use rcp_verifier::prelude::*;

fn num(v: i64) -> RcpDomain {
    RcpDomain::with_num(v)
}

fn store_at(m: &mut MemDom, o: i64, w: u32, v: RcpDomain) {
    m.store(&OffsetSet::single(o), w, &v);
}

#[test]
fn test_join_commutative() {
    let mut a = MemDom::empty();
    store_at(&mut a, 504, 8, num(1));
    store_at(&mut a, 496, 8, num(2));
    let mut b = MemDom::empty();
    store_at(&mut b, 504, 8, num(3));

    let mut ab = a.clone();
    ab.join(&b);
    let mut ba = b.clone();
    ba.join(&a);
    assert_eq!(ab, ba);
}

#[test]
fn test_join_cell_values_join() {
    let mut a = MemDom::empty();
    store_at(&mut a, 504, 8, num(1));
    let mut b = MemDom::empty();
    store_at(&mut b, 504, 8, num(2));
    a.join(&b);
    let v = a.load(&OffsetSet::single(504), 8);
    assert_eq!(*v.get_num(), NumSet::from_slice(&[1, 2]));
}

#[test]
fn test_pointer_values_survive_the_stack() {
    // spilling the context pointer and filling it back
    let mut m = MemDom::empty();
    store_at(&mut m, 496, 8, RcpDomain::with_ctx(0));
    let v = m.load(&OffsetSet::single(496), 8);
    assert!(v.must_be(TypeSet::CTX));
}

#[test]
fn test_load_multi_offset_joins_candidates() {
    let mut m = MemDom::empty();
    store_at(&mut m, 496, 8, num(1));
    store_at(&mut m, 504, 8, num(2));
    let v = m.load(&OffsetSet::from_slice(&[496, 504]), 8);
    assert_eq!(*v.get_num(), NumSet::from_slice(&[1, 2]));
}

#[test]
fn test_load_mixing_hit_and_miss() {
    let mut m = MemDom::empty();
    store_at(&mut m, 504, 8, num(1));
    // 496 never written: only the written candidate contributes
    let v = m.load(&OffsetSet::from_slice(&[496, 504]), 8);
    assert_eq!(*v.get_num(), NumSet::single(1));
}

#[test]
fn test_weak_store_never_creates_cells() {
    let mut m = MemDom::empty();
    m.store(&OffsetSet::from_slice(&[496, 504]), 8, &num(1));
    assert!(m.is_empty());
    m.store(&OffsetSet::top(), 8, &num(1));
    assert!(m.is_empty());
}

#[test]
fn test_store_dynamic_cartesian() {
    let mut m = MemDom::empty();
    store_at(&mut m, 500, 4, num(7));
    // may write 4 or 8 bytes at 496: the 8-byte case touches the cell
    m.store_dynamic(
        &OffsetSet::single(496),
        &NumSet::from_slice(&[4, 8]),
        &RcpDomain::with_num_top(),
    );
    assert!(m.load(&OffsetSet::single(500), 4).get_num().is_top());
}

#[test]
fn test_bot_store_loads_nothing() {
    let m = MemDom::bot();
    assert!(m.load(&OffsetSet::single(504), 8).is_bot());
    assert!(m.is_bot());
}

#[test]
fn test_meet_bot_absorbs() {
    let mut a = MemDom::empty();
    store_at(&mut a, 504, 8, num(1));
    a.meet(&MemDom::bot());
    assert!(a.is_bot());
}

#[test]
fn test_display_sorted_by_offset() {
    let mut m = MemDom::empty();
    store_at(&mut m, 504, 8, num(1));
    store_at(&mut m, 496, 4, num(2));
    let s = format!("{}", m);
    let i496 = s.find("496").unwrap();
    let i504 = s.find("504").unwrap();
    assert!(i496 < i504);
}
