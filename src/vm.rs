//! # Virtual Machine
//!
//! Runs a compiled [`Program`] against a candidate URI string via a
//! Thompson NFA simulation over sparse-set thread lists (spec §4.5,
//! component E) — no backtracking, so matching is linear in the input
//! length times the program size.
//!
//! Grounded on the `machine.add`/`machine.step`/`machine.match` shape in
//! `examples/original_source/match.go`. That Go snapshot declares a `cap`
//! field on its thread type but its `add`/`step` never write to it and
//! `Match` returns only `bool` — the capture recording and decoding here
//! (`crate::vm::captures`) is designed fresh from spec §4.4/§4.5.
//!
//! `JmpIfNotDefined`/`JmpIfNotFirst`/`JmpIfNotEmpty` are treated exactly
//! like `Split` here (spec §4.3): the epsilon-closure forks to both
//! targets without inspecting any capture state. The compiler relies on
//! concrete input to disambiguate which branch was "right".

mod captures;
mod sparse;

use log::trace;

use crate::bytecode::{Instr, Program};
use crate::value::Values;
use captures::Thread;
use sparse::ThreadList;

/// Safety limits on pathological matches (spec §4.9 "safety limits").
///
/// The VM itself is O(|program| · |input|) in time and O(|program|) in
/// space — the sparse-set dedup in [`ThreadList`] already caps live
/// threads at the program size, so there is nothing to bound at
/// simulation time. These limits instead reject oversized inputs before
/// the simulation starts at all, which is the hard ceiling spec §4.9
/// calls for.
#[derive(Clone, Copy, Debug)]
pub struct MatchLimits {
    /// Maximum number of compiled instructions a program may contain.
    pub max_program_ops: usize,
    /// Maximum candidate-string length, in bytes.
    pub max_input_len: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        MatchLimits {
            max_program_ops: 16_384,
            max_input_len: 1_048_576,
        }
    }
}

/// Match `input` against `program`, returning the recovered variables on
/// success (spec §4.5, §6 `Template::match_str`).
pub fn run(program: &Program, input: &str, limits: &MatchLimits) -> Option<Values> {
    if program.len() > limits.max_program_ops || input.len() > limits.max_input_len {
        trace!(
            "rejecting match: program_ops={} input_len={} exceeds limits {:?}",
            program.len(),
            input.len(),
            limits
        );
        return None;
    }

    let len = input.len();
    let mut clist = ThreadList::new(program.len());
    let mut nlist = ThreadList::new(program.len());

    add_closure(program, &mut clist, 0, 0, len, Thread::default());

    for (pos, ch) in input.char_indices() {
        if clist.is_empty() {
            break;
        }
        nlist.clear();
        let next_pos = pos + ch.len_utf8();
        for &(pc, ref thread) in clist.entries() {
            match &program.code[pc] {
                Instr::Rune(r) if *r == ch => {
                    add_closure(program, &mut nlist, pc + 1, next_pos, len, thread.clone());
                }
                Instr::RuneClass(rc) if rc.matches(ch) => {
                    add_closure(program, &mut nlist, pc + 1, next_pos, len, thread.clone());
                }
                _ => {}
            }
        }
        std::mem::swap(&mut clist, &mut nlist);
        trace!("byte offset {}: {} live threads", next_pos, clist.entries().len());
    }

    clist
        .entries()
        .iter()
        .find(|&&(pc, _)| matches!(program.code[pc], Instr::End))
        .map(|(_, thread)| captures::decode(input, &thread.spans))
}

/// Epsilon-closure from `pc`: follow every non-consuming instruction until
/// reaching a consuming one ([`Instr::Rune`]/[`Instr::RuneClass`]) or
/// [`Instr::End`], adding each such terminal `pc` to `list` at most once
/// (sparse-set dedup preserves leftmost-first priority: the first thread
/// to reach a given `pc` during this closure wins).
fn add_closure(program: &Program, list: &mut ThreadList, pc: usize, pos: usize, len: usize, mut thread: Thread) {
    if list.contains(pc) {
        return;
    }
    match &program.code[pc] {
        Instr::LineBegin => {
            if pos == 0 {
                add_closure(program, list, pc + 1, pos, len, thread);
            }
        }
        Instr::LineEnd => {
            if pos == len {
                add_closure(program, list, pc + 1, pos, len, thread);
            }
        }
        Instr::CapStart(key) => {
            thread.cap_start(key, pos);
            add_closure(program, list, pc + 1, pos, len, thread);
        }
        Instr::CapEnd(key) => {
            thread.cap_end(key, pos);
            add_closure(program, list, pc + 1, pos, len, thread);
        }
        Instr::Split(a, b) => {
            add_closure(program, list, *a, pos, len, thread.clone());
            add_closure(program, list, *b, pos, len, thread);
        }
        Instr::Jmp(target) => {
            add_closure(program, list, *target, pos, len, thread);
        }
        // Nondeterministic forks during matching, identical to `Split`
        // (spec §4.3): both branches are explored and whichever one goes
        // on to match concrete input wins. The `name` operand is not read
        // here — it exists for the compiler's own bookkeeping/diagnostics.
        Instr::JmpIfNotFirst(_, target)
        | Instr::JmpIfNotDefined(_, target)
        | Instr::JmpIfNotEmpty(_, target) => {
            add_closure(program, list, pc + 1, pos, len, thread.clone());
            add_closure(program, list, *target, pos, len, thread);
        }
        Instr::Rune(_) | Instr::RuneClass(_) | Instr::End => {
            list.push(pc, thread);
        }
    }
}
