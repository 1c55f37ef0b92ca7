//! # URI Templates (RFC 6570)
//!
//! Parse, expand, and match URI Templates. "Match" is the direction RFC
//! 6570 itself doesn't specify: given a template and a concrete URI
//! string, recover the variable bindings that could have produced it, via
//! a compiled bytecode VM running a Thompson NFA simulation
//! (`crate::vm`) instead of backtracking.
//!
//! ```
//! use uritemplate::{Template, Value, Values};
//!
//! let tmpl = Template::parse("/users/{id}{?active}").unwrap();
//!
//! let mut vars = Values::new();
//! vars.set("id", Value::string("42"));
//! vars.set("active", Value::string("true"));
//! assert_eq!(tmpl.expand(&vars).unwrap(), "/users/42?active=true");
//!
//! let recovered = tmpl.match_str("/users/42?active=true").unwrap();
//! assert_eq!(recovered.get("id"), Some(&Value::string("42")));
//! ```

mod ast;
mod bytecode;
mod compiler;
mod error;
mod expand;
mod parser;
mod runeclass;
mod value;
mod vm;

use once_cell::sync::OnceCell;

pub use ast::TemplateAst;
pub use bytecode::Program;
pub use error::{ExpandError, ExpandErrorKind, ParseError, ParseErrorKind};
pub use value::{Value, Values};
pub use vm::MatchLimits;

/// A parsed and compiled URI Template (spec §3 `Template`, §6 public API).
///
/// Parsing and compiling both happen once, in [`Template::parse`];
/// `expand`/`match_str` are then cheap to call repeatedly.
pub struct Template {
    ast: TemplateAst,
    program: Program,
    var_names: OnceCell<Vec<String>>,
}

impl Template {
    /// Parse and compile a template string (spec §4.1 parsing, §4.3
    /// compiling). Compiling happens eagerly so `match_str` never needs a
    /// `&mut self`.
    pub fn parse(src: &str) -> Result<Template, ParseError> {
        let ast = parser::parse(src)?;
        let program = compiler::compile(&ast);
        Ok(Template {
            ast,
            program,
            var_names: OnceCell::new(),
        })
    }

    /// The original template string.
    pub fn as_str(&self) -> &str {
        &self.ast.raw
    }

    /// Expand this template against `vars` (spec §4.2, component D).
    pub fn expand(&self, vars: &Values) -> Result<String, ExpandError> {
        expand::expand(&self.ast, vars)
    }

    /// Match `candidate` against this template, recovering the variables
    /// that could have expanded to it (spec §4.5, component E), using
    /// [`MatchLimits::default`].
    pub fn match_str(&self, candidate: &str) -> Option<Values> {
        self.match_str_with_limits(candidate, &MatchLimits::default())
    }

    /// Like [`Template::match_str`], with explicit [`MatchLimits`] (spec
    /// §4.9 "safety limits").
    pub fn match_str_with_limits(&self, candidate: &str, limits: &MatchLimits) -> Option<Values> {
        vm::run(&self.program, candidate, limits)
    }

    /// The capture keys this template defines, in declaration order
    /// (`"name"`, or `"name:maxlen"` for a prefixed varspec — spec §4.4).
    /// Computed once and memoized: many callers call this in a loop (e.g.
    /// to build a routing table) without re-walking the AST each time.
    pub fn var_names(&self) -> &[String] {
        self.var_names.get_or_init(|| self.program.cap_names.clone())
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ast)
    }
}
