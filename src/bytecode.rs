//! # Bytecode ISA
//!
//! The instruction set the compiler (`crate::compiler`) emits and the VM
//! (`crate::vm`) interprets (spec §4.3, component E). Unlike the teacher's
//! `Instr`, there is no on-disk encoding here — `crate::compiler::compile`
//! builds a [`Program`] directly in memory, so this module is just the ISA
//! plus the program container.
//!
//! Each instruction is either a *consuming* op (advances the input position:
//! [`Instr::Rune`], [`Instr::RuneClass`]) or an *epsilon* op (pure
//! control-flow, taken without consuming input: everything else). The VM's
//! sparse-set epsilon-closure (`crate::vm::sparse`) follows epsilon ops
//! until it reaches a consuming op or [`Instr::End`].
//!
//! `JmpIfNotDefined`/`JmpIfNotFirst`/`JmpIfNotEmpty` are *conditional*
//! during expansion but purely *nondeterministic* during matching (spec
//! §4.3): the match VM forks to both `pc+1` and their jump target, exactly
//! like [`Instr::Split`]. Matching runs over concrete input, so which
//! branch was "correct" is resolved by whichever one goes on to match, not
//! by inspecting recorded capture state. Their extra operand is a
//! diagnostic label (which variable the fork is about) that plays no role
//! in the VM's control flow. They have no counterpart in
//! `examples/original_source/match.go`, whose captures are never
//! populated; see `DESIGN.md`.

use crate::runeclass::RuneClass;

/// One bytecode instruction (spec §4.3).
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// Match exactly this rune literally.
    Rune(char),
    /// Match one rune belonging to `RuneClass`, or (for `RuneClass::HEX`)
    /// one hex digit of a `%XX` triplet the compiler splits into three
    /// consecutive `RuneClass(HEX)`-guarded runes around a literal `%`.
    RuneClass(RuneClass),
    /// Only matches at input position 0.
    LineBegin,
    /// Only matches at end of input.
    LineEnd,
    /// Begin recording a capture under `key` (spec §4.4's `name`/`name:n`
    /// keying scheme, see [`crate::ast::Varspec::spec_name`]).
    CapStart(String),
    /// End the most recently opened capture under `key`.
    CapEnd(String),
    /// Nondeterministic branch: try `a` first, then `b` (leftmost-first,
    /// spec §4.5).
    Split(usize, usize),
    /// Unconditional jump.
    Jmp(usize),
    /// Nondeterministic fork to `pc+1` and `target`, exactly like
    /// [`Instr::Split`]; the variable name is diagnostic only. Compiled
    /// where a varspec may or may not be present at all.
    JmpIfNotDefined(String, usize),
    /// Nondeterministic fork to `pc+1` and `target`, exactly like
    /// [`Instr::Split`]. Compiled where a varspec may or may not be the
    /// first one to contribute to its expression.
    JmpIfNotFirst(String, usize),
    /// Nondeterministic fork to `pc+1` and `target`, exactly like
    /// [`Instr::Split`]; the variable name is diagnostic only. Compiled
    /// where a named varspec's value may or may not be empty.
    JmpIfNotEmpty(String, usize),
    /// Successful terminal state.
    End,
}

impl Instr {
    /// Whether this instruction consumes one rune of input.
    pub fn is_consuming(&self) -> bool {
        matches!(self, Instr::Rune(_) | Instr::RuneClass(_))
    }
}

/// A compiled template: a flat instruction vector plus the number of
/// distinct capture keys it defines (spec §4.3, §4.4).
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub code: Vec<Instr>,
    /// Capture keys in first-CapStart-occurrence order, used by
    /// `Template::var_names` (spec §6) without re-walking the AST.
    pub cap_names: Vec<String>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}
