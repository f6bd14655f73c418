// SPDX-License-Identifier: GPL-2.0
//! Tests for rcp_verifier::domains::numset

use rcp_verifier::prelude::*;

fn samples() -> Vec<NumSet> {
    vec![
        NumSet::bot(),
        NumSet::top(),
        NumSet::single(0),
        NumSet::single(-1),
        NumSet::from_slice(&[1, 2]),
        NumSet::from_slice(&[0, 4, 8]),
        NumSet::from_slice(&[-8, -4, 0, 4]),
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
            assert_eq!(ab, ba, "join({a}, {b})");
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
                assert_eq!(l, r, "join assoc ({a}, {b}, {c})");
            }
        }
    }
}

#[test]
fn test_join_is_upper_bound() {
    for a in samples() {
        for b in samples() {
            let mut j = a.clone();
            j.join(&b);
            assert!(a.leq(&j), "{a} <= join({a}, {b})");
            assert!(b.leq(&j));
        }
    }
}

#[test]
fn test_meet_is_lower_bound() {
    for a in samples() {
        for b in samples() {
            let mut m = a.clone();
            m.meet(&b);
            assert!(m.leq(&a), "meet({a}, {b}) <= {a}");
            assert!(m.leq(&b));
        }
    }
}

#[test]
fn test_bounded_precision() {
    // joining more than MAX_ELEMS singletons must widen to top
    let mut s = NumSet::bot();
    for v in 0..16 {
        s.join(&NumSet::single(v));
    }
    assert!(s.is_top());

    for x in samples() {
        assert!(x.is_top() || x.elems().len() <= 4);
    }
}

#[test]
fn test_assume_is_sound() {
    // every concrete value retained by assume satisfies the predicate
    // against some right-hand value, and none satisfying it is dropped
    let ops = [CmpOp::Eq, CmpOp::Ne, CmpOp::Lt, CmpOp::Le, CmpOp::Gt, CmpOp::Ge];
    let lefts = [-2i64, -1, 0, 1, 2];
    let rights = [-1i64, 0, 1];
    for op in ops {
        for r in rights {
            let mut s = NumSet::from_slice(&lefts[..4]);
            let rhs = NumSet::single(r);
            let before: Vec<i64> = s.elems().to_vec();
            s.assume(op, &rhs);
            for l in before {
                let holds = match op {
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                    CmpOp::Lt => l < r,
                    CmpOp::Le => l <= r,
                    CmpOp::Gt => l > r,
                    CmpOp::Ge => l >= r,
                    _ => unreachable!(),
                };
                assert_eq!(s.contains(l), holds, "{op:?} {l} vs {r}");
            }
        }
    }
}

#[test]
fn test_satisfied_matches_all_pairs() {
    let a = NumSet::from_slice(&[4, 8]);
    let b = NumSet::from_slice(&[0, 4]);
    assert!(a.satisfied(CmpOp::Ge, &b));
    assert!(!a.satisfied(CmpOp::Gt, &b));
    assert!(!a.satisfied(CmpOp::Eq, &b));
}

#[test]
fn test_arith_top_bot_rules() {
    let fin = NumSet::from_slice(&[1, 2]);
    assert!(fin.plus(&NumSet::bot()).is_bot());
    assert!(NumSet::bot().minus(&fin).is_bot());
    assert!(fin.plus(&NumSet::top()).is_top());
    assert!(fin.exec(BinOp::Mul, &NumSet::top()).is_top());
}

#[test]
fn test_offset_alias_behaves_like_numset() {
    let o: OffsetSet = OffsetSet::from_slice(&[504, 508]);
    assert_eq!(o.min_elem(), Some(504));
    assert_eq!(o.max_elem(), Some(508));
}
