// SPDX-License-Identifier: GPL-2.0

//! The control-flow graph.
//!
//! Blocks are keyed by [`Label`]: the instruction index for ordinary
//! blocks, plus synthetic edge labels for the arms of a conditional jump
//! after [`Cfg::to_nondet`]. `keys()` yields labels in topological order
//! starting at the entry; the analysis only supports acyclic graphs and
//! construction fails on a back edge.

use crate::core::error::{Result, VerifierError};
use crate::core::insn::Instruction;
use crate::stdlib::{BTreeMap, Vec, VecDeque};
use core::fmt;

/// A block label: an instruction index, or a branch arm of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    /// Instruction index this block originates from.
    pub pc: usize,
    /// For an edge block, the successor index the arm leads to.
    pub succ: Option<usize>,
}

impl Label {
    /// An ordinary block label.
    pub fn new(pc: usize) -> Label {
        Label { pc, succ: None }
    }

    /// An edge-block label for the arm `pc -> succ`.
    pub fn edge(pc: usize, succ: usize) -> Label {
        Label { pc, succ: Some(succ) }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.succ {
            None => write!(f, "{}", self.pc),
            Some(s) => write!(f, "{}:{}", self.pc, s),
        }
    }
}

/// One basic block: an ordered instruction list plus its neighbors.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    /// Instructions, in execution order. Assertion insertion rewrites
    /// this in place.
    pub insts: Vec<Instruction>,
    /// Predecessor labels.
    pub prevs: Vec<Label>,
    /// Successor labels.
    pub nexts: Vec<Label>,
}

/// A labelled directed acyclic graph of basic blocks.
#[derive(Debug, Clone, Default)]
pub struct Cfg {
    blocks: BTreeMap<Label, BasicBlock>,
    order: Vec<Label>,
}

impl Cfg {
    /// The entry label.
    pub fn entry(&self) -> Label {
        self.order[0]
    }

    /// All labels in topological order, entry first.
    pub fn keys(&self) -> Vec<Label> {
        self.order.clone()
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the graph has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The block at `l`.
    pub fn block(&self, l: Label) -> &BasicBlock {
        self.blocks.get(&l).expect("label not in cfg")
    }

    /// Mutable access to the block at `l`.
    pub fn block_mut(&mut self, l: Label) -> &mut BasicBlock {
        self.blocks.get_mut(&l).expect("label not in cfg")
    }

    /// Build the deterministic CFG of an instruction sequence: one block
    /// per instruction, jump targets resolved to labels.
    pub fn from_instructions(prog: Vec<Instruction>) -> Result<Cfg> {
        if prog.is_empty() {
            return Err(VerifierError::EmptyProgram);
        }
        let n = prog.len();
        let mut cfg = Cfg::default();
        for (i, ins) in prog.into_iter().enumerate() {
            let nexts: Vec<Label> = match &ins {
                Instruction::Exit => Vec::new(),
                Instruction::Jmp { cond, target } => {
                    if *target >= n {
                        return Err(VerifierError::InvalidJumpTarget(*target));
                    }
                    match cond {
                        None => crate::stdlib::vec![Label::new(*target)],
                        Some(_) => {
                            if i + 1 >= n {
                                return Err(VerifierError::FallThroughExit(i));
                            }
                            crate::stdlib::vec![Label::new(*target), Label::new(i + 1)]
                        }
                    }
                }
                _ => {
                    if i + 1 >= n {
                        return Err(VerifierError::FallThroughExit(i));
                    }
                    crate::stdlib::vec![Label::new(i + 1)]
                }
            };
            cfg.blocks.insert(
                Label::new(i),
                BasicBlock { insts: crate::stdlib::vec![ins], prevs: Vec::new(), nexts },
            );
        }
        cfg.prune_unreachable();
        cfg.rebuild_prevs();
        cfg.recompute_order()?;
        Ok(cfg)
    }

    /// Drop blocks no path from the entry reaches. The worklist counts
    /// predecessor recomputations, so a dead predecessor would starve a
    /// live block forever.
    fn prune_unreachable(&mut self) {
        let entry = Label::new(0);
        let mut reachable = crate::stdlib::BTreeSet::new();
        let mut stack = crate::stdlib::vec![entry];
        while let Some(l) = stack.pop() {
            if !reachable.insert(l) {
                continue;
            }
            if let Some(bb) = self.blocks.get(&l) {
                stack.extend(bb.nexts.iter().copied());
            }
        }
        self.blocks.retain(|l, _| reachable.contains(l));
    }

    /// Replace every conditional jump by a pair of edge blocks holding
    /// the assumed condition of each arm; drop the jump instructions.
    pub fn to_nondet(mut self) -> Result<Cfg> {
        let labels = self.keys();
        for l in labels {
            let bb = self.blocks.get_mut(&l).expect("label not in cfg");
            let Some(Instruction::Jmp { cond, target }) = bb.insts.last().cloned() else {
                continue;
            };
            bb.insts.pop();
            let Some(cond) = cond else { continue };
            let fall = bb.nexts[1].pc;
            if target == fall {
                // Both arms land on the same block; the branch refines
                // nothing.
                bb.nexts = crate::stdlib::vec![Label::new(fall)];
                continue;
            }
            let taken = Label::edge(l.pc, target);
            let fallen = Label::edge(l.pc, fall);
            bb.nexts = crate::stdlib::vec![taken, fallen];
            self.blocks.insert(
                taken,
                BasicBlock {
                    insts: crate::stdlib::vec![Instruction::Assume(cond)],
                    prevs: Vec::new(),
                    nexts: crate::stdlib::vec![Label::new(target)],
                },
            );
            self.blocks.insert(
                fallen,
                BasicBlock {
                    insts: crate::stdlib::vec![Instruction::Assume(cond.negate())],
                    prevs: Vec::new(),
                    nexts: crate::stdlib::vec![Label::new(fall)],
                },
            );
        }
        self.rebuild_prevs();
        self.recompute_order()?;
        Ok(self)
    }

    /// Merge straight-line chains: a block with a single successor whose
    /// only predecessor it is absorbs that successor.
    pub fn simplify(&mut self) -> Result<()> {
        loop {
            let mut merged = false;
            for l in self.keys() {
                if !self.blocks.contains_key(&l) {
                    continue;
                }
                loop {
                    let bb = &self.blocks[&l];
                    if bb.nexts.len() != 1 {
                        break;
                    }
                    let n = bb.nexts[0];
                    if n == l || n == self.entry() || self.blocks[&n].prevs.len() != 1 {
                        break;
                    }
                    let absorbed = self.blocks.remove(&n).expect("label not in cfg");
                    let bb = self.blocks.get_mut(&l).expect("label not in cfg");
                    bb.insts.extend(absorbed.insts);
                    bb.nexts = absorbed.nexts;
                    merged = true;
                }
            }
            if !merged {
                break;
            }
        }
        self.rebuild_prevs();
        self.recompute_order()
    }

    fn rebuild_prevs(&mut self) {
        let edges: Vec<(Label, Label)> = self
            .blocks
            .iter()
            .flat_map(|(&l, bb)| bb.nexts.iter().map(move |&n| (l, n)))
            .collect();
        for bb in self.blocks.values_mut() {
            bb.prevs.clear();
        }
        for (from, to) in edges {
            if let Some(bb) = self.blocks.get_mut(&to) {
                bb.prevs.push(from);
            }
        }
    }

    fn recompute_order(&mut self) -> Result<()> {
        let mut indeg: BTreeMap<Label, usize> =
            self.blocks.iter().map(|(&l, bb)| (l, bb.prevs.len())).collect();
        let mut queue: VecDeque<Label> =
            indeg.iter().filter(|(_, &d)| d == 0).map(|(&l, _)| l).collect();
        let mut order = Vec::with_capacity(self.blocks.len());
        while let Some(l) = queue.pop_front() {
            order.push(l);
            for &n in &self.blocks[&l].nexts {
                let d = indeg.get_mut(&n).expect("label not in cfg");
                *d -= 1;
                if *d == 0 {
                    queue.push_back(n);
                }
            }
        }
        if order.len() != self.blocks.len() {
            return Err(VerifierError::BackEdgeDetected);
        }
        self.order = order;
        Ok(())
    }
}
