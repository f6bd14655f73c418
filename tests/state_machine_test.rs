// SPDX-License-Identifier: GPL-2.0
//! Tests for rcp_verifier::state::machine

use rcp_verifier::check::helpers;
use rcp_verifier::prelude::*;

fn entry(info: ProgramInfo) -> Machine {
    let mut m = Machine::new(info);
    m.init();
    m
}

fn socket_entry() -> Machine {
    entry(ProgramInfo::with_type(ProgramType::SocketFilter))
}

fn mov(dst: u8, v: i64) -> Instruction {
    Instruction::Bin { op: BinOp::Mov, dst: Reg(dst), v: Value::Imm(v) }
}

fn run(m: &mut Machine, prog: &[Instruction]) {
    for ins in prog {
        m.visit(ins).unwrap();
    }
}

#[test]
fn test_entry_register_file() {
    let m = socket_entry();
    assert_eq!(*m.regs.at(Reg(1)).unwrap(), RcpDomain::with_ctx(0));
    assert_eq!(*m.regs.at(Reg::FP).unwrap(), RcpDomain::with_stack(STACK_SIZE));
    assert!(m.regs.at(Reg::DATA_END).unwrap().get_num().is_top());
    assert!(m.regs.at(Reg(0)).is_err());
    assert_eq!(m.min_size.size(), 0);
}

#[test]
fn test_transfer_monotone_bin() {
    let mut m1 = socket_entry();
    m1.regs.assign(Reg(0), RcpDomain::with_num(1)).unwrap();
    let mut m2 = socket_entry();
    let mut v = RcpDomain::with_num(1);
    v.join(&RcpDomain::with_num(2));
    m2.regs.assign(Reg(0), v).unwrap();
    assert!(m1.leq(&m2));

    let ins = Instruction::Bin { op: BinOp::Add, dst: Reg(0), v: Value::Imm(1) };
    m1.visit(&ins).unwrap();
    m2.visit(&ins).unwrap();
    assert!(m1.leq(&m2));
}

#[test]
fn test_transfer_monotone_assume() {
    let mut m1 = socket_entry();
    m1.regs.assign(Reg(0), RcpDomain::with_num(2)).unwrap();
    let mut m2 = socket_entry();
    let mut v = RcpDomain::with_num(0);
    v.join(&RcpDomain::with_num(2));
    m2.regs.assign(Reg(0), v).unwrap();

    let ins = Instruction::Assume(Condition {
        left: Reg(0),
        op: CmpOp::Eq,
        right: Value::Imm(2),
    });
    m1.visit(&ins).unwrap();
    m2.visit(&ins).unwrap();
    assert!(m1.leq(&m2));
    assert_eq!(*m2.regs.at(Reg(0)).unwrap(), RcpDomain::with_num(2));
}

#[test]
fn test_transfer_monotone_load() {
    // m1 knows the cell exactly; m2 joined two stores
    let base = [
        mov(0, 1),
        Instruction::Bin { op: BinOp::Mov, dst: Reg(2), v: Value::Reg(Reg::FP) },
        Instruction::Bin { op: BinOp::Add, dst: Reg(2), v: Value::Imm(-8) },
        Instruction::Mem {
            access: Deref { basereg: Reg(2), offset: 0, width: 8 },
            value: Value::Reg(Reg(0)),
            is_load: false,
        },
    ];
    let mut m1 = socket_entry();
    run(&mut m1, &base);
    let mut m2 = m1.clone();
    let mut other = socket_entry();
    run(&mut other, &base[..1]);
    other.visit(&mov(0, 2)).unwrap();
    run(&mut other, &base[1..]);
    m2.join(&other);
    assert!(m1.leq(&m2));

    let load = Instruction::Mem {
        access: Deref { basereg: Reg(2), offset: 0, width: 8 },
        value: Value::Reg(Reg(3)),
        is_load: true,
    };
    m1.visit(&load).unwrap();
    m2.visit(&load).unwrap();
    assert!(m1.leq(&m2));
    assert_eq!(*m2.regs.at(Reg(3)).unwrap().get_num(), NumSet::from_slice(&[1, 2]));
}

#[test]
fn test_spill_fill_pointer() {
    let mut m = socket_entry();
    let prog = [
        Instruction::Bin { op: BinOp::Mov, dst: Reg(2), v: Value::Reg(Reg::FP) },
        Instruction::Bin { op: BinOp::Add, dst: Reg(2), v: Value::Imm(-8) },
        Instruction::Mem {
            access: Deref { basereg: Reg(2), offset: 0, width: 8 },
            value: Value::Reg(Reg(1)),
            is_load: false,
        },
        Instruction::Mem {
            access: Deref { basereg: Reg(2), offset: 0, width: 8 },
            value: Value::Reg(Reg(3)),
            is_load: true,
        },
    ];
    run(&mut m, &prog);
    assert_eq!(*m.regs.at(Reg(3)).unwrap(), RcpDomain::with_ctx(0));
}

#[test]
fn test_ctx_field_loads() {
    let mut m = entry(ProgramInfo::with_type(ProgramType::Xdp));
    let prog = [
        Instruction::Mem {
            access: Deref { basereg: Reg(1), offset: 0, width: 4 },
            value: Value::Reg(Reg(2)),
            is_load: true,
        },
        Instruction::Mem {
            access: Deref { basereg: Reg(1), offset: 4, width: 4 },
            value: Value::Reg(Reg(3)),
            is_load: true,
        },
        Instruction::Mem {
            access: Deref { basereg: Reg(1), offset: 8, width: 4 },
            value: Value::Reg(Reg(4)),
            is_load: true,
        },
        Instruction::Mem {
            access: Deref { basereg: Reg(1), offset: 16, width: 4 },
            value: Value::Reg(Reg(5)),
            is_load: true,
        },
    ];
    run(&mut m, &prog);
    assert_eq!(*m.regs.at(Reg(2)).unwrap(), RcpDomain::with_packet(3));
    assert!(m.regs.at(Reg(3)).unwrap().is_packet_end());
    assert_eq!(*m.regs.at(Reg(4)).unwrap(), RcpDomain::with_packet(0));
    assert!(m.regs.at(Reg(5)).unwrap().get_num().is_top());
}

#[test]
fn test_call_transfer_processes_every_pair() {
    // both memory arguments of csum_diff are written through, even
    // though only the first gets extracted assertions
    let mut m = socket_entry();
    let prog = [
        mov(0, 1),
        Instruction::Bin { op: BinOp::Mov, dst: Reg(1), v: Value::Reg(Reg::FP) },
        Instruction::Bin { op: BinOp::Add, dst: Reg(1), v: Value::Imm(-8) },
        Instruction::Mem {
            access: Deref { basereg: Reg(1), offset: 0, width: 8 },
            value: Value::Reg(Reg(0)),
            is_load: false,
        },
        Instruction::Bin { op: BinOp::Mov, dst: Reg(3), v: Value::Reg(Reg::FP) },
        Instruction::Bin { op: BinOp::Add, dst: Reg(3), v: Value::Imm(-16) },
        Instruction::Mem {
            access: Deref { basereg: Reg(3), offset: 0, width: 8 },
            value: Value::Reg(Reg(0)),
            is_load: false,
        },
        mov(2, 8),
        mov(4, 8),
        mov(5, 0),
        Instruction::Call(helpers::csum_diff()),
    ];
    run(&mut m, &prog);
    // both spilled cells were havocked by the call
    for off in [STACK_SIZE - 8, STACK_SIZE - 16] {
        m.regs.assign(Reg(6), RcpDomain::with_stack(off)).unwrap();
        let fill = Instruction::Mem {
            access: Deref { basereg: Reg(6), offset: 0, width: 8 },
            value: Value::Reg(Reg(8)),
            is_load: true,
        };
        m.visit(&fill).unwrap();
        assert!(m.regs.at(Reg(8)).unwrap().get_num().is_top());
    }
}

#[test]
fn test_min_size_join_takes_weaker_bound() {
    let mut a = entry(ProgramInfo::with_type(ProgramType::Xdp));
    let mut b = a.clone();
    a.min_size.assume_larger_than(&OffsetSet::single(20));
    b.min_size.assume_larger_than(&OffsetSet::single(10));
    a.join(&b);
    assert_eq!(a.min_size.size(), 10);
}

#[test]
fn test_assert_is_assumed_for_later_code() {
    use rcp_verifier::check::assertions::{Constraint, TypeConstraint, TypeOf};
    let mut m = entry(ProgramInfo::with_maps(
        ProgramType::SocketFilter,
        vec![MapDef { key_size: 4, value_size: 8 }],
    ));
    let mut v = RcpDomain::with_num(0);
    v.join(&RcpDomain::with_map(0, 0));
    m.regs.assign(Reg(0), v).unwrap();

    let cst = Constraint::Type(TypeConstraint {
        then: TypeOf { reg: Reg(0), types: TypeSet::PTR },
        given: None,
    });
    assert_eq!(m.satisfied(&cst), Ok(false));
    m.assume_constraint(&cst).unwrap();
    assert!(m.regs.at(Reg(0)).unwrap().must_be(TypeSet::map(0)));
    assert_eq!(m.satisfied(&cst), Ok(true));
}
