// SPDX-License-Identifier: GPL-2.0

//! The worklist fixpoint and the assertion-discharge sweep.
//!
//! The analyzer keeps one machine per block boundary (`pre` and `post`).
//! The worklist propagates until nothing changes; termination relies on
//! the graph being acyclic and every transfer function being monotone.
//! A second, single pass per block then evaluates each assertion against
//! the state flowing into it and records the verdict on the instruction.

use crate::analysis::cfg::{BasicBlock, Cfg, Label};
use crate::core::error::{Result, VerifierError};
use crate::core::insn::Instruction;
use crate::core::log::VerifierLog;
use crate::core::types::{ProgramInfo, VerifierOptions, MAX_MAPS};
use crate::domains::lattice::Lattice;
use crate::state::machine::Machine;
use crate::stdlib::{format, BTreeMap, Vec, VecDeque};

/// Per-block machine states of the fixpoint.
#[derive(Debug)]
pub struct Analyzer {
    /// State flowing into each block.
    pub pre: BTreeMap<Label, Machine>,
    /// State flowing out of each block.
    pub post: BTreeMap<Label, Machine>,
}

impl Analyzer {
    /// All states bottom, except the entry pre-state which is the
    /// initial register file.
    pub fn new(cfg: &Cfg, info: &ProgramInfo) -> Analyzer {
        let mut pre = BTreeMap::new();
        let mut post = BTreeMap::new();
        for l in cfg.keys() {
            pre.insert(l, Machine::new(info.clone()));
            post.insert(l, Machine::new(info.clone()));
        }
        pre.get_mut(&cfg.entry()).expect("entry not in cfg").init();
        Analyzer { pre, post }
    }

    /// Re-run the block's transfer from its pre-state; returns whether
    /// the post-state changed.
    pub fn recompute(&mut self, l: Label, bb: &BasicBlock) -> Result<bool> {
        let mut dom = self.pre[&l].clone();
        for ins in &bb.insts {
            dom.visit(ins)?;
        }
        let changed = self.post[&l] != dom;
        self.post.insert(l, dom);
        Ok(changed)
    }

    /// Fold the predecessors' post-states into a block's pre-state.
    pub fn join_into(&mut self, prevs: &[Label], into: Label) {
        let mut new_pre = self.pre[&into].clone();
        for p in prevs {
            new_pre.join(&self.post[p]);
        }
        self.pre.insert(into, new_pre);
    }
}

fn dedup_consecutive(w: &mut VecDeque<Label>) {
    let mut v: Vec<Label> = w.drain(..).collect();
    v.dedup();
    w.extend(v);
}

/// Drive the fixpoint. Only works with DAGs.
pub fn worklist(cfg: &Cfg, analyzer: &mut Analyzer) -> Result<()> {
    let mut w: VecDeque<Label> = VecDeque::new();
    w.push_back(cfg.entry());
    let mut count: BTreeMap<Label, usize> = cfg.keys().into_iter().map(|l| (l, 0)).collect();
    while let Some(label) = w.pop_front() {
        let bb = cfg.block(label);
        analyzer.join_into(&bb.prevs, label);
        if analyzer.recompute(label, bb)? {
            for &next in &bb.nexts {
                let c = count.get_mut(&next).expect("label not in cfg");
                *c += 1;
                if *c >= cfg.block(next).prevs.len() {
                    w.push_back(next);
                }
            }
            dedup_consecutive(&mut w);
        }
    }
    Ok(())
}

/// Run the fixpoint, then mark every assertion satisfied or not.
///
/// With `print_invariants` the pre-state of every instruction and the
/// block's final state are dumped to the log; with `print_failures`
/// every unproven assertion is reported.
pub fn analyze_rcp(
    cfg: &mut Cfg,
    info: &ProgramInfo,
    opts: &VerifierOptions,
    log: &mut VerifierLog,
) -> Result<()> {
    if info.map_defs.len() > MAX_MAPS {
        return Err(VerifierError::TooManyMaps(info.map_defs.len()));
    }
    let mut analyzer = Analyzer::new(cfg, info);
    worklist(cfg, &mut analyzer)?;

    for l in cfg.keys() {
        let mut dom = analyzer.pre[&l].clone();
        if opts.print_invariants {
            log.info(&format!("{}:", l));
        }
        let bb = cfg.block_mut(l);
        for ins in bb.insts.iter_mut() {
            if let Instruction::Assert(a) = ins {
                if !a.satisfied {
                    a.satisfied = dom.satisfied(&a.cst)?;
                    if !a.satisfied && opts.print_failures {
                        log.error(&format!("{}: unproven: {}", l, a.cst));
                    }
                }
            }
            if opts.print_invariants {
                log.info(&format!("  {}", dom));
                log.info(&format!("  {}", ins));
            }
            dom.visit(ins)?;
        }
        if opts.print_invariants {
            log.info(&format!("  {}", dom));
            let nexts: Vec<_> = bb.nexts.iter().map(|n| format!("{}", n)).collect();
            log.info(&format!("  -> {}", nexts.join(",")));
        }
    }
    Ok(())
}
