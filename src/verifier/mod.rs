// SPDX-License-Identifier: GPL-2.0

//! Top-level drivers.
//!
//! `abs_validate` runs the fixpoint and the discharge sweep over an
//! already-prepared CFG and returns the verdict. `verify_program` is the
//! full pipeline from an instruction sequence: CFG construction,
//! assertion extraction, assume-edge conversion, optional
//! simplification, then validation.

use crate::analysis::analyzer::analyze_rcp;
use crate::analysis::cfg::Cfg;
use crate::check::extract::{explicate_assertions_with, AssertionExtractor};
use crate::core::error::Result;
use crate::core::insn::Instruction;
use crate::core::log::VerifierLog;
use crate::core::types::{ProgramInfo, VerifierOptions};
use crate::stdlib::Vec;

/// Run the fixpoint and discharge over a prepared CFG.
///
/// Returns `Ok(true)` iff every assertion in every block was proven.
/// Errors are analysis failures (malformed program), not safety
/// violations.
pub fn abs_validate(
    cfg: &mut Cfg,
    info: &ProgramInfo,
    opts: &VerifierOptions,
    log: &mut VerifierLog,
) -> Result<bool> {
    analyze_rcp(cfg, info, opts, log)?;
    let mut accepted = true;
    for l in cfg.keys() {
        for ins in &cfg.block(l).insts {
            if let Instruction::Assert(a) = ins {
                accepted &= a.satisfied;
            }
        }
    }
    Ok(accepted)
}

/// Verify an instruction sequence end to end.
pub fn verify_program(
    prog: Vec<Instruction>,
    info: &ProgramInfo,
    opts: &VerifierOptions,
    log: &mut VerifierLog,
) -> Result<bool> {
    let mut det = Cfg::from_instructions(prog)?;
    let extractor = AssertionExtractor::new(info.clone())?.privileged(opts.privileged);
    explicate_assertions_with(&mut det, &extractor);
    let mut cfg = det.to_nondet()?;
    if opts.simplify {
        cfg.simplify()?;
    }
    abs_validate(&mut cfg, info, opts, log)
}
