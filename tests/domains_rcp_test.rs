// SPDX-License-Identifier: GPL-2.0
//! Tests for rcp_verifier::domains::rcp

use rcp_verifier::prelude::*;

fn samples() -> Vec<RcpDomain> {
    let mut both = RcpDomain::with_num(0);
    both.join(&RcpDomain::with_map(0, 0));
    vec![
        RcpDomain::bot(),
        RcpDomain::with_num(0),
        RcpDomain::with_num_top(),
        RcpDomain::with_ctx(0),
        RcpDomain::with_stack(512),
        RcpDomain::with_packet(3),
        RcpDomain::with_packet_end(),
        RcpDomain::with_fd(1),
        RcpDomain::with_map(0, 4),
        both,
    ]
}

#[test]
fn test_join_commutative() {
    for a in samples() {
        for b in samples() {
            let mut ab = a.clone();
            ab.join(&b);
            let mut ba = b.clone();
            ba.join(&a);
            assert_eq!(ab, ba);
        }
    }
}

#[test]
fn test_join_associative() {
    for a in samples() {
        for b in samples() {
            for c in samples() {
                let mut l = a.clone();
                l.join(&b);
                l.join(&c);
                let mut bc = b.clone();
                bc.join(&c);
                let mut r = a.clone();
                r.join(&bc);
                assert_eq!(l, r);
            }
        }
    }
}

#[test]
fn test_join_upper_bound_and_bot_identity() {
    for a in samples() {
        let mut j = RcpDomain::bot();
        j.join(&a);
        assert_eq!(j, a);
        for b in samples() {
            let mut ab = a.clone();
            ab.join(&b);
            assert!(a.leq(&ab));
        }
    }
}

#[test]
fn test_add_monotone() {
    // growing an operand can only grow the result
    let small = RcpDomain::with_stack(504);
    let mut big = small.clone();
    big.join(&RcpDomain::with_stack(508));
    let d = RcpDomain::with_num(4);
    let rs = &small + &d;
    let rb = &big + &d;
    assert!(rs.leq(&rb));
}

#[test]
fn test_sub_same_region_is_offset_difference() {
    let mut a = RcpDomain::with_packet(10);
    a.join(&RcpDomain::with_packet(14));
    let b = RcpDomain::with_packet(3);
    let d = &a - &b;
    assert_eq!(*d.get_num(), NumSet::from_slice(&[7, 11]));
}

#[test]
fn test_sub_cross_region_is_unknown_num() {
    let a = RcpDomain::with_stack(504);
    let b = RcpDomain::with_ctx(0);
    assert!((&a - &b).get_num().is_top());
}

#[test]
fn test_fd_does_not_survive_arithmetic() {
    let fd = RcpDomain::with_fd(1);
    let r = &fd + &RcpDomain::with_num(1);
    assert!(r.get_fd().is_bot());
    assert!(r.get_num().is_top());
}

#[test]
fn test_linear_bound_shapes() {
    // reg + offset + width <= end, phrased as reg <= zero + (end - width - offset)
    let reg = RcpDomain::with_stack(504);
    let end = RcpDomain::with_num(512);
    let width = RcpDomain::with_num(8);
    let offset = RcpDomain::with_num(0);
    let right = &reg.zero() + &(&(&end - &width) - &offset);
    assert!(RcpDomain::satisfied_cmp(&reg, CmpOp::Le, &right, TypeSet::STACK));

    let too_wide = RcpDomain::with_num(16);
    let right = &reg.zero() + &(&(&end - &too_wide) - &offset);
    assert!(!RcpDomain::satisfied_cmp(&reg, CmpOp::Le, &right, TypeSet::STACK));
}

#[test]
fn test_when_mask_scopes_the_check() {
    // a value that may be num or stack: the stack-scoped bound ignores
    // the num component entirely
    let mut v = RcpDomain::with_stack(504);
    v.join(&RcpDomain::with_num(9999));
    let right = &v.zero() + &RcpDomain::with_num(504);
    assert!(RcpDomain::satisfied_cmp(&v, CmpOp::Le, &right, TypeSet::STACK));
}

#[test]
fn test_assume_does_not_touch_outside_mask() {
    let mut v = RcpDomain::with_num(5);
    v.join(&RcpDomain::with_map(0, 0));
    let zero = RcpDomain::with_num(0);
    // scoped to num: the map component must survive
    RcpDomain::assume_cmp(&mut v, CmpOp::Eq, &zero, TypeSet::NUM);
    assert!(v.may_be(TypeSet::map(0)));
    assert!(v.get_num().is_bot());
}

#[test]
fn test_satisfied_type_vacuous_on_bot() {
    assert!(RcpDomain::satisfied_type(&RcpDomain::bot(), TypeSet::NUM));
    assert!(!RcpDomain::satisfied_type(&RcpDomain::with_ctx(0), TypeSet::NUM));
}

#[test]
fn test_zero_preserves_shape() {
    let mut v = RcpDomain::with_map(0, 12);
    v.join(&RcpDomain::with_num_top());
    let z = v.zero();
    assert_eq!(z.get_map(0), OffsetSet::single(0));
    assert_eq!(*z.get_num(), NumSet::single(0));
    assert!(z.get_stack().is_bot());
}

#[test]
fn test_top_is_absorbing_for_join() {
    let top = RcpDomain::top(1);
    for a in samples() {
        let mut j = a.clone();
        j.join(&top);
        assert_eq!(j, top);
    }
}
