//! # Template AST
//!
//! This module defines the typed representation a parsed URI Template is
//! turned into (spec §3, component B): an ordered sequence of [`Node`]s,
//! each either a [`Literal`] run or an [`Expression`]. Per spec §9 ("sum
//! types for AST and Values"), both are closed enums so the compiler
//! (`crate::compiler`) and the expander (`crate::expand`) can match
//! exhaustively.

use std::fmt;

use crate::runeclass::RuneClass;

/// One of the eight RFC 6570 operators (spec §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// No leading character: `{var}`.
    Simple,
    /// `{+var}`.
    Plus,
    /// `{#var}`.
    Crosshatch,
    /// `{.var}`.
    Dot,
    /// `{/var}`.
    Slash,
    /// `{;var}`.
    Semicolon,
    /// `{?var}`.
    Question,
    /// `{&var}`.
    Ampersand,
}

impl Operator {
    /// The leading character the operator parses from, or `None` for
    /// [`Operator::Simple`].
    pub fn leading_char(self) -> Option<char> {
        match self {
            Operator::Simple => None,
            Operator::Plus => Some('+'),
            Operator::Crosshatch => Some('#'),
            Operator::Dot => Some('.'),
            Operator::Slash => Some('/'),
            Operator::Semicolon => Some(';'),
            Operator::Question => Some('?'),
            Operator::Ampersand => Some('&'),
        }
    }

    /// The `first`/`sep`/`named`/`ifemp`/`allow` table from spec §6.
    pub fn table(self) -> OperatorProps {
        match self {
            Operator::Simple => OperatorProps {
                first: "",
                sep: ",",
                named: false,
                ifemp: "",
                allow: RuneClass::U,
            },
            Operator::Plus => OperatorProps {
                first: "",
                sep: ",",
                named: false,
                ifemp: "",
                allow: RuneClass::UR,
            },
            Operator::Crosshatch => OperatorProps {
                first: "#",
                sep: ",",
                named: false,
                ifemp: "",
                allow: RuneClass::UR,
            },
            Operator::Dot => OperatorProps {
                first: ".",
                sep: ".",
                named: false,
                ifemp: "",
                allow: RuneClass::U,
            },
            Operator::Slash => OperatorProps {
                first: "/",
                sep: "/",
                named: false,
                ifemp: "",
                allow: RuneClass::U,
            },
            Operator::Semicolon => OperatorProps {
                first: ";",
                sep: ";",
                named: true,
                ifemp: "",
                allow: RuneClass::U,
            },
            Operator::Question => OperatorProps {
                first: "?",
                sep: "&",
                named: true,
                ifemp: "=",
                allow: RuneClass::U,
            },
            Operator::Ampersand => OperatorProps {
                first: "&",
                sep: "&",
                named: true,
                ifemp: "=",
                allow: RuneClass::U,
            },
        }
    }
}

/// The fixed per-operator properties from spec §6's table.
#[derive(Clone, Copy, Debug)]
pub struct OperatorProps {
    pub first: &'static str,
    pub sep: &'static str,
    pub named: bool,
    pub ifemp: &'static str,
    pub allow: RuneClass,
}

/// One variable reference inside an expression (spec §3 `Varspec`).
///
/// Invariant: `explode && maxlen > 0` never occurs — the grammar makes the
/// two forms (`:n` and `*`) syntactically disjoint (spec §3, §4.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Varspec {
    pub name: String,
    /// `0` means "no prefix"; otherwise `1..=9999`.
    pub maxlen: u16,
    pub explode: bool,
}

impl Varspec {
    /// The capture/lookup key used by the VM and by `Template::match_str`:
    /// `"name:maxlen"` when a prefix is present, else plain `name` (spec
    /// §4.4, §6 "Match API").
    pub fn spec_name(&self) -> String {
        if !self.explode && self.maxlen > 0 {
            format!("{}:{}", self.name, self.maxlen)
        } else {
            self.name.clone()
        }
    }
}

/// A `{...}` expression: an operator plus one or more varspecs, with the
/// operator's derived fields cached at construction (spec §3 `Expression`).
#[derive(Clone, Debug)]
pub struct Expression {
    pub op: Operator,
    pub vars: Vec<Varspec>,
    pub first: &'static str,
    pub sep: &'static str,
    pub named: bool,
    pub ifemp: &'static str,
    pub allow: RuneClass,
}

impl Expression {
    pub fn new(op: Operator, vars: Vec<Varspec>) -> Self {
        let props = op.table();
        Expression {
            op,
            vars,
            first: props.first,
            sep: props.sep,
            named: props.named,
            ifemp: props.ifemp,
            allow: props.allow,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        if let Some(c) = self.op.leading_char() {
            write!(f, "{}", c)?;
        }
        for (i, v) in self.vars.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v.name)?;
            if v.explode {
                write!(f, "*")?;
            } else if v.maxlen > 0 {
                write!(f, ":{}", v.maxlen)?;
            }
        }
        write!(f, "}}")
    }
}

/// One element of a parsed [`Template`]: either a run of literal bytes or
/// an expression (spec §3 `Literal`/`Expression`, §9 "sum types for AST").
#[derive(Clone, Debug)]
pub enum Node {
    Literal(String),
    Expression(Expression),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(s) => write!(f, "{}", s),
            Node::Expression(e) => write!(f, "{}", e),
        }
    }
}

/// An ordered, immutable sequence of [`Node`]s (spec §3 `Template`).
///
/// Keeps the original source string alongside the parsed nodes so
/// `Template::as_str` can hand back the exact input without
/// re-stringifying (the parse–print round-trip property in spec §8 still
/// holds via [`Node`]'s `Display`, which `Template`'s own `Display`
/// delegates to, node by node).
#[derive(Clone, Debug)]
pub struct TemplateAst {
    pub raw: String,
    pub nodes: Vec<Node>,
}

impl fmt::Display for TemplateAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}
