//! # Compiler
//!
//! Lowers a [`TemplateAst`] into a [`Program`] the VM can run (spec §4.3,
//! §4.4, component E). Grounded on the size/compile function pairing in
//! `examples/original_source/compile.go` (`sizeString`/`compileString`,
//! `sizeRuneClass`/`compileRuneClass`,
//! `sizeRuneClassInfinite`/`compileRuneClassInfinite`,
//! `sizeVarspecValue`/`compileVarspecValue`, `sizeVarspec`/`compileVarspec`,
//! `compileExpression`) for the shape of each emitted fragment, and on
//! spec §4.4's own `compileExpression` pseudocode for the declared-order
//! per-varspec block structure.
//!
//! Jump targets are resolved by forward-patching: a placeholder `Jmp`/
//! `Split`/`JmpIfNot*` is pushed with a dummy target, its index remembered,
//! and the target overwritten once the code it needs to reach has been
//! emitted. This keeps emission a single linear pass without precomputing
//! fragment sizes up front the way the Go source's paired size/compile
//! functions do.
//!
//! `JmpIfNotDefined`/`JmpIfNotFirst`/`JmpIfNotEmpty` are nondeterministic
//! forks during matching, identical to `Split` (spec §4.3): the VM simply
//! explores both `pc+1` and the jump target, and whichever branch goes on
//! to match concrete input is the one that turns out to be "correct". The
//! compiler reaches for them instead of a plain `Split` purely so the
//! emitted program stays self-documenting about *why* a fork exists — is
//! this varspec present at all, is this the first varspec to contribute,
//! is this value empty — not because the VM gives them different behavior.
//!
//! ## Known limitation (recorded in DESIGN.md)
//! A non-exploded composite ([`Value::List`]/[`Value::Kv`]) and a scalar
//! ([`Value::String`]) are textually indistinguishable on the wire (both
//! are comma-joined atoms), so matching always recovers a non-exploded
//! varspec as [`Value::String`]. Exploded varspecs recover as
//! [`Value::List`], one element per matched iteration. `Value::Kv` is
//! never produced by matching.

use crate::ast::{Expression, Node, TemplateAst, Varspec};
use crate::bytecode::{Instr, Program};
use crate::runeclass::RuneClass;
use log::debug;

/// Compile `ast` into a runnable [`Program`] (spec §4.3).
pub fn compile(ast: &TemplateAst) -> Program {
    let mut code = Vec::new();
    let mut cap_names = Vec::new();
    code.push(Instr::LineBegin);
    for node in &ast.nodes {
        match node {
            Node::Literal(lit) => compile_literal(lit, &mut code),
            Node::Expression(expr) => compile_expression(expr, &mut code, &mut cap_names),
        }
    }
    code.push(Instr::LineEnd);
    code.push(Instr::End);
    debug!(
        "compiled {} nodes into {} instructions",
        ast.nodes.len(),
        code.len()
    );
    Program { code, cap_names }
}

/// A literal run of text: matched rune by rune, with `%XX` triplets
/// relaxed to accept either hex case (spec §4.3 "literal matching").
fn compile_literal(lit: &str, code: &mut Vec<Instr>) {
    let mut chars = lit.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            code.push(Instr::Rune('%'));
            code.push(Instr::RuneClass(RuneClass::HEX));
            code.push(Instr::RuneClass(RuneClass::HEX));
            chars.next();
            chars.next();
        } else {
            code.push(Instr::Rune(c));
        }
    }
}

/// Push a placeholder epsilon op and return its index for later patching.
fn placeholder(code: &mut Vec<Instr>, instr: Instr) -> usize {
    let idx = code.len();
    code.push(instr);
    idx
}

/// "One allow-class rune, or one `%XX` triplet" — the repeated unit every
/// varspec value is built from (spec §4.3's rune-class alternation).
fn emit_atom(code: &mut Vec<Instr>, allow: RuneClass) {
    let split_idx = placeholder(code, Instr::Split(0, 0));
    let rune_class_start = code.len();
    code.push(Instr::RuneClass(allow));
    let jmp_idx = placeholder(code, Instr::Jmp(0));
    let pct_start = code.len();
    code.push(Instr::Rune('%'));
    code.push(Instr::RuneClass(RuneClass::HEX));
    code.push(Instr::RuneClass(RuneClass::HEX));
    let after = code.len();
    code[split_idx] = Instr::Split(rune_class_start, pct_start);
    code[jmp_idx] = Instr::Jmp(after);
}

/// Zero-or-more atoms (grounded on `compileRuneClassInfinite`).
fn emit_value_unbounded(code: &mut Vec<Instr>, allow: RuneClass) {
    let loop_start = code.len();
    let split_idx = placeholder(code, Instr::Split(0, 0));
    let body_start = code.len();
    emit_atom(code, allow);
    code.push(Instr::Jmp(loop_start));
    let after = code.len();
    code[split_idx] = Instr::Split(body_start, after);
}

/// At most `n` atoms (grounded on `compileRuneClass`'s bounded `:n` form).
fn emit_value_bounded(code: &mut Vec<Instr>, allow: RuneClass, n: u16) {
    let mut split_indices = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let split_idx = placeholder(code, Instr::Split(0, 0));
        let body_start = code.len();
        emit_atom(code, allow);
        code[split_idx] = Instr::Split(body_start, 0); // `skip` patched below
        split_indices.push(split_idx);
    }
    let after = code.len();
    for idx in split_indices {
        if let Instr::Split(body, _) = code[idx] {
            code[idx] = Instr::Split(body, after);
        }
    }
}

/// Like [`emit_value_unbounded`] but requires at least one atom.
fn emit_value_at_least_one(code: &mut Vec<Instr>, allow: RuneClass) {
    emit_atom(code, allow);
    emit_value_unbounded(code, allow);
}

/// The bare value pattern for one varspec occurrence (no capture wrapping),
/// honoring a prefix modifier's `maxlen` (spec §4.4).
fn emit_value(code: &mut Vec<Instr>, allow: RuneClass, maxlen: u16) {
    if maxlen > 0 {
        emit_value_bounded(code, allow, maxlen);
    } else {
        emit_value_unbounded(code, allow);
    }
}

/// One non-exploded varspec's contribution inside an expression: `CapStart`/
/// `CapEnd` around the value pattern, with the `named`/`ifemp` prefix
/// wrapping spec §4.2 describes (mirrored onto the matcher).
///
/// For a named operator the block always emits `name` followed by a fork
/// between `"=" + value` (preferred) and the operator's `ifemp` literal
/// alone — both are tried, so whichever the candidate text actually
/// contains is the one the match follows. This reproduces every operator's
/// real expansion text: semicolon's `ifemp == ""` lets `;name` match with
/// no trailing `=`, and question/ampersand's `ifemp == "="` makes the two
/// branches coincide on `name=` for an empty value.
fn compile_varspec_item(expr: &Expression, varspec: &Varspec, code: &mut Vec<Instr>) -> String {
    let key = varspec.spec_name();
    if expr.named {
        compile_literal(&varspec.name, code);
        let split_idx = placeholder(code, Instr::JmpIfNotEmpty(key.clone(), 0));
        let eq_branch = code.len();
        code.push(Instr::Rune('='));
        code.push(Instr::CapStart(key.clone()));
        emit_value(code, expr.allow, varspec.maxlen);
        code.push(Instr::CapEnd(key.clone()));
        let jmp_idx = placeholder(code, Instr::Jmp(0));
        let ifemp_branch = code.len();
        compile_literal(expr.ifemp, code);
        let after = code.len();
        code[split_idx] = Instr::JmpIfNotEmpty(key.clone(), ifemp_branch);
        code[jmp_idx] = Instr::Jmp(after);
        let _ = eq_branch;
    } else {
        code.push(Instr::CapStart(key.clone()));
        emit_value(code, expr.allow, varspec.maxlen);
        code.push(Instr::CapEnd(key.clone()));
    }
    key
}

/// Compile one `{...}` expression (spec §4.2/§4.4, `compileExpression`).
///
/// Each varspec is wrapped in its own `JmpIfNotDefined` fork (try including
/// it, or skip it entirely — both explored) so an expression whose
/// variables are all absent contributes nothing at all. The first varspec
/// that does contribute is preceded by `expr.first`; every one after it is
/// preceded by `expr.sep`, chosen via a `JmpIfNotFirst` fork between the two
/// rather than by inspecting which earlier varspecs matched.
fn compile_expression(expr: &Expression, code: &mut Vec<Instr>, cap_names: &mut Vec<String>) {
    for (i, varspec) in expr.vars.iter().enumerate() {
        let skip_idx = placeholder(code, Instr::JmpIfNotDefined(varspec.name.clone(), 0));
        let include_start = code.len();

        if i == 0 {
            compile_literal(expr.first, code);
        } else {
            compile_prefix_or_sep(expr, code);
        }

        let key = if varspec.explode {
            compile_exploded_varspec(expr, varspec, code)
        } else {
            compile_varspec_item(expr, varspec, code)
        };
        if !cap_names.contains(&key) {
            cap_names.push(key);
        }

        let skip_target = code.len();
        code[skip_idx] = Instr::JmpIfNotDefined(varspec.name.clone(), skip_target);
        let _ = include_start;
    }
}

/// Fork between `expr.first` and `expr.sep` for a varspec that isn't the
/// expression's first declared one — both branches are explored, so the
/// one that matches the candidate's actual separator text wins (spec §4.4).
fn compile_prefix_or_sep(expr: &Expression, code: &mut Vec<Instr>) {
    let not_first_idx = placeholder(code, Instr::JmpIfNotFirst(String::new(), 0));
    compile_literal(expr.first, code);
    let jmp_idx = placeholder(code, Instr::Jmp(0));
    let sep_branch = code.len();
    compile_literal(expr.sep, code);
    let after = code.len();
    code[not_first_idx] = Instr::JmpIfNotFirst(String::new(), sep_branch);
    code[jmp_idx] = Instr::Jmp(after);
}

/// An exploded varspec's repeated-item loop: the whole defined region is a
/// loop whose back-edge re-enters at the `name=` prefix (for a named
/// operator) or the bare value pattern (otherwise), separated by `expr.sep`
/// between iterations (spec §4.4). Whether the loop runs at all (zero vs.
/// one-or-more iterations) is decided by the enclosing `JmpIfNotDefined` in
/// [`compile_expression`], not by anything inside this function.
///
/// For a named operator, each item gets the same `"=" + value` vs. `ifemp`
/// fork as [`compile_varspec_item`] (spec §4.2's "elements equal to `""`
/// emit `name<ifemp>`" rule for named explode) — without it, an exploded
/// item whose value is empty could only be recovered by requiring a
/// trailing `=` that a spec-conformant `expand` never emits for operators
/// like semicolon (`ifemp == ""`).
fn compile_exploded_varspec(expr: &Expression, varspec: &Varspec, code: &mut Vec<Instr>) -> String {
    let key = varspec.spec_name();
    let loop_start = code.len();
    if expr.named {
        compile_literal(&varspec.name, code);
        let split_idx = placeholder(code, Instr::JmpIfNotEmpty(key.clone(), 0));
        let eq_branch = code.len();
        code.push(Instr::Rune('='));
        code.push(Instr::CapStart(key.clone()));
        emit_value_at_least_one(code, expr.allow);
        code.push(Instr::CapEnd(key.clone()));
        let jmp_idx = placeholder(code, Instr::Jmp(0));
        let ifemp_branch = code.len();
        compile_literal(expr.ifemp, code);
        let after_value = code.len();
        code[split_idx] = Instr::JmpIfNotEmpty(key.clone(), ifemp_branch);
        code[jmp_idx] = Instr::Jmp(after_value);
        let _ = eq_branch;
    } else {
        code.push(Instr::CapStart(key.clone()));
        emit_value_at_least_one(code, expr.allow);
        code.push(Instr::CapEnd(key.clone()));
    }
    let more_idx = placeholder(code, Instr::Split(0, 0));
    let more_branch = code.len();
    compile_literal(expr.sep, code);
    code.push(Instr::Jmp(loop_start));
    let after = code.len();
    code[more_idx] = Instr::Split(more_branch, after);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn compiles_without_panicking_for_every_operator() {
        for tmpl in [
            "{var}",
            "{+path}",
            "{#frag}",
            "{.who}",
            "{/who}",
            "{;x,y}",
            "{?x,y,empty}",
            "{&x,y}",
            "{list*}",
            "{?list*}",
            "{term:3}",
            "literal{var}literal",
        ] {
            let ast = parse(tmpl).unwrap();
            let program = compile(&ast);
            assert!(!program.is_empty());
            assert!(matches!(program.code.last(), Some(Instr::End)));
        }
    }

    #[test]
    fn records_capture_names_in_declaration_order() {
        let ast = parse("{x,y:3,list*}").unwrap();
        let program = compile(&ast);
        assert_eq!(program.cap_names, vec!["x", "y:3", "list"]);
    }
}
