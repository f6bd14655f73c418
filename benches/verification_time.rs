//! Verification throughput benchmarks
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rcp_verifier::check::helpers;
use rcp_verifier::prelude::*;

fn mov(dst: u8, v: i64) -> Instruction {
    Instruction::Bin { op: BinOp::Mov, dst: Reg(dst), v: Value::Imm(v) }
}

/// A straight-line program: stores and reloads across the frame.
fn linear_program(size: usize) -> Vec<Instruction> {
    let mut prog = vec![
        mov(0, 1),
        Instruction::Bin { op: BinOp::Mov, dst: Reg(2), v: Value::Reg(Reg(10)) },
        Instruction::Bin { op: BinOp::Add, dst: Reg(2), v: Value::Imm(-64) },
    ];
    for i in 0..size {
        let off = (i % 8) as i64 * 8;
        prog.push(Instruction::Mem {
            access: Deref { basereg: Reg(2), offset: off, width: 8 },
            value: Value::Reg(Reg(0)),
            is_load: false,
        });
        prog.push(Instruction::Mem {
            access: Deref { basereg: Reg(2), offset: off, width: 8 },
            value: Value::Reg(Reg(3)),
            is_load: true,
        });
    }
    prog.push(mov(0, 0));
    prog.push(Instruction::Exit);
    prog
}

/// A chain of null-checked map lookups: every link forks and joins.
fn branchy_program(forks: usize) -> Vec<Instruction> {
    let mut prog = Vec::new();
    for _ in 0..forks {
        let base = prog.len();
        prog.push(Instruction::LoadMapFd { dst: Reg(1), mapfd: 0 });
        prog.push(Instruction::Bin { op: BinOp::Mov, dst: Reg(2), v: Value::Reg(Reg(10)) });
        prog.push(Instruction::Bin { op: BinOp::Add, dst: Reg(2), v: Value::Imm(-4) });
        prog.push(Instruction::Mem {
            access: Deref { basereg: Reg(2), offset: 0, width: 4 },
            value: Value::Imm(0),
            is_load: false,
        });
        prog.push(Instruction::Call(helpers::map_lookup_elem()));
        prog.push(Instruction::Jmp {
            cond: Some(Condition { left: Reg(0), op: CmpOp::Eq, right: Value::Imm(0) }),
            target: base + 7,
        });
        prog.push(Instruction::Mem {
            access: Deref { basereg: Reg(0), offset: 0, width: 4 },
            value: Value::Reg(Reg(3)),
            is_load: true,
        });
    }
    prog.push(mov(0, 0));
    prog.push(Instruction::Exit);
    prog
}

fn bench_linear(c: &mut Criterion) {
    let info = ProgramInfo::with_type(ProgramType::SocketFilter);
    let mut group = c.benchmark_group("linear");
    for size in [16usize, 64, 256] {
        let prog = linear_program(size);
        group.throughput(Throughput::Elements(prog.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &prog, |b, prog| {
            b.iter(|| {
                let opts = VerifierOptions { simplify: true, ..VerifierOptions::default() };
                let mut log = VerifierLog::default();
                let ok =
                    verify_program(black_box(prog.clone()), &info, &opts, &mut log).unwrap();
                black_box(ok)
            })
        });
    }
    group.finish();
}

fn bench_branchy(c: &mut Criterion) {
    let info = ProgramInfo::with_maps(
        ProgramType::SocketFilter,
        vec![MapDef { key_size: 4, value_size: 8 }],
    );
    let mut group = c.benchmark_group("branchy");
    for forks in [4usize, 16, 64] {
        let prog = branchy_program(forks);
        group.throughput(Throughput::Elements(prog.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(forks), &prog, |b, prog| {
            b.iter(|| {
                let opts = VerifierOptions { simplify: true, ..VerifierOptions::default() };
                let mut log = VerifierLog::default();
                let ok =
                    verify_program(black_box(prog.clone()), &info, &opts, &mut log).unwrap();
                black_box(ok)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_linear, bench_branchy);
criterion_main!(benches);
