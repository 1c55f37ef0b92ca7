//! # Error Handling
//!
//! This module defines the error kinds used throughout parsing and
//! expansion. Matching has no error channel (spec §7) — it returns
//! `Option<Values>` and a `None` covers every "didn't match" case.
//!
//! ## Design
//! - [`ParseErrorKind`] / [`ExpandErrorKind`] are closed enumerations of
//!   *categories* of failure, matching the taxonomy in spec §7.
//! - [`ParseError`] / [`ExpandError`] pair a kind with the 1-based byte
//!   offset into the offending string, per spec §4.1/§6.
//! - Both implement [`fmt::Display`] by hand and [`std::error::Error`], the
//!   same shape as the teacher's `RuntimeError` — no `thiserror`/`anyhow`.

use std::fmt;

/// Categories of template-parse failure (spec §4.1, §7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// One of the op-reserved characters (`= , ! @ |`) appeared where an
    /// operator was expected.
    UnsupportedOperator,
    /// A varname byte was not `ALPHA / DIGIT / "_"` and not a valid
    /// pct-encoded triplet.
    InvalidVarname,
    /// A `%` was not followed by two ASCII hex digits.
    InvalidPctEncoded,
    /// A literal-run byte was outside the `literals` class (spec §6).
    InvalidLiterals,
    /// The input was not valid UTF-8 at the offending position.
    InvalidUtf8,
    /// A `:n` prefix's `n` was `0` or exceeded `9999`.
    MaxLengthOutOfRange,
    /// Input ended mid-expression (unterminated `{...}`).
    IncompleteTemplate,
    /// A variable-list separator was neither `,` nor `}`.
    InvalidVariableList,
}

impl ParseErrorKind {
    fn message(self) -> &'static str {
        match self {
            ParseErrorKind::UnsupportedOperator => "unsupported operator",
            ParseErrorKind::InvalidVarname => "invalid varname",
            ParseErrorKind::InvalidPctEncoded => "invalid pct-encoded",
            ParseErrorKind::InvalidLiterals => "invalid literals",
            ParseErrorKind::InvalidUtf8 => "invalid UTF-8",
            ParseErrorKind::MaxLengthOutOfRange => "max-length must be (0, 9999]",
            ParseErrorKind::IncompleteTemplate => "incomplete template",
            ParseErrorKind::InvalidVariableList => "invalid variable-list",
        }
    }
}

/// A template parse failure at a specific 1-based byte offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based byte offset into the template string.
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(offset: usize, kind: ParseErrorKind) -> Self {
        ParseError { offset, kind }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte offset {}", self.kind.message(), self.offset)
    }
}

impl std::error::Error for ParseError {}

/// Categories of expansion failure (spec §7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpandErrorKind {
    /// A supplied variable value was not valid UTF-8 at the offending byte.
    InvalidUtf8,
}

impl ExpandErrorKind {
    fn message(self) -> &'static str {
        match self {
            ExpandErrorKind::InvalidUtf8 => "invalid encoding",
        }
    }
}

/// An expansion failure, carrying the byte offset into the offending
/// variable value (not into the template).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandError {
    pub offset: usize,
    pub kind: ExpandErrorKind,
}

impl ExpandError {
    pub(crate) fn new(offset: usize, kind: ExpandErrorKind) -> Self {
        ExpandError { offset, kind }
    }
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte offset {}", self.kind.message(), self.offset)
    }
}

impl std::error::Error for ExpandError {}
