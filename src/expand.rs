//! # Expansion
//!
//! Turns a [`TemplateAst`] plus a set of [`Values`] into the expanded URI
//! string (component D, spec §4.2). Each [`Expression`] is expanded
//! independently of its neighbors; literal [`Node`]s are copied through
//! verbatim (they were already validated to be {@link literal} bytes by the
//! parser).
//!
//! The per-operator `first`/`sep`/`named`/`ifemp`/`allow` fields cached on
//! [`Expression`] at parse time (spec §6's operator table) drive every rule
//! below — this module itself only implements the per-[`Value`] formatting
//! rules (spec §4.2) since `examples/original_source/expression.go`'s
//! `exp*` family is entirely stubbed with `TODO(yosida95): implement here`.

use crate::ast::{Expression, Node, TemplateAst, Varspec};
use crate::error::ExpandError;
use crate::runeclass::{encode_except_unreserved, encode_except_unreserved_and_reserved, RuneClass};
use crate::value::{Value, Values};

/// Expand `ast` against `vars`, producing the URI string (spec §4.2).
///
/// Currently infallible — every [`Value`] variant is already valid UTF-8 by
/// construction in Rust — but returns `Result` to keep the public surface
/// stable against a future byte-oriented `Value` variant (spec §7's error
/// taxonomy already reserves [`crate::error::ExpandErrorKind::InvalidUtf8`]
/// for that case).
pub fn expand(ast: &TemplateAst, vars: &Values) -> Result<String, ExpandError> {
    let mut out = String::with_capacity(ast.raw.len());
    for node in &ast.nodes {
        match node {
            Node::Literal(lit) => out.push_str(lit),
            Node::Expression(expr) => expand_expression(expr, vars, &mut out),
        }
    }
    Ok(out)
}

fn expand_expression(expr: &Expression, vars: &Values, out: &mut String) {
    let mut parts: Vec<String> = Vec::with_capacity(expr.vars.len());
    for varspec in &expr.vars {
        if let Some(value) = vars.get(&varspec.name) {
            if value.is_defined() {
                parts.push(expand_varspec(expr, varspec, value));
            }
        }
    }
    if parts.is_empty() {
        return;
    }
    out.push_str(expr.first);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(expr.sep);
        }
        out.push_str(part);
    }
}

fn encode(allow: RuneClass, v: &str) -> String {
    if allow.contains(RuneClass::R) {
        encode_except_unreserved_and_reserved(v)
    } else {
        encode_except_unreserved(v)
    }
}

/// Truncate `s` to at most `maxlen` Unicode scalar values (spec §4.2's
/// prefix modifier is defined in terms of characters, not bytes).
fn truncate(s: &str, maxlen: u16) -> &str {
    if maxlen == 0 {
        return s;
    }
    match s.char_indices().nth(maxlen as usize) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

fn expand_varspec(expr: &Expression, varspec: &Varspec, value: &Value) -> String {
    match value {
        Value::String(s) => {
            let truncated = truncate(s, varspec.maxlen);
            let encoded = encode(expr.allow, truncated);
            if expr.named {
                if encoded.is_empty() {
                    format!("{}{}", varspec.name, expr.ifemp)
                } else {
                    format!("{}={}", varspec.name, encoded)
                }
            } else {
                encoded
            }
        }
        Value::List(items) => {
            if varspec.explode {
                items
                    .iter()
                    .map(|item| {
                        let encoded = encode(expr.allow, item);
                        if expr.named {
                            if encoded.is_empty() {
                                format!("{}{}", varspec.name, expr.ifemp)
                            } else {
                                format!("{}={}", varspec.name, encoded)
                            }
                        } else {
                            encoded
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(expr.sep)
            } else {
                let joined = items
                    .iter()
                    .map(|item| encode(expr.allow, item))
                    .collect::<Vec<_>>()
                    .join(",");
                if expr.named {
                    if joined.is_empty() {
                        format!("{}{}", varspec.name, expr.ifemp)
                    } else {
                        format!("{}={}", varspec.name, joined)
                    }
                } else {
                    joined
                }
            }
        }
        Value::Kv(pairs) => {
            if varspec.explode {
                pairs
                    .chunks(2)
                    .map(|kv| {
                        let key = encode(expr.allow, &kv[0]);
                        let encoded = encode(expr.allow, &kv[1]);
                        if encoded.is_empty() {
                            format!("{}{}", key, expr.ifemp)
                        } else {
                            format!("{}={}", key, encoded)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(expr.sep)
            } else {
                let joined = pairs
                    .chunks(2)
                    .map(|kv| {
                        format!(
                            "{},{}",
                            encode(expr.allow, &kv[0]),
                            encode(expr.allow, &kv[1])
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                if expr.named {
                    format!("{}={}", varspec.name, joined)
                } else {
                    joined
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn vars() -> Values {
        let mut v = Values::new();
        v.set("count", Value::list(["one", "two", "three"]));
        v.set("dom", Value::list(["example", "com"]));
        v.set("dub", Value::string("me/too"));
        v.set("hello", Value::string("Hello World!"));
        v.set("half", Value::string("50%"));
        v.set("var", Value::string("value"));
        v.set("who", Value::string("fred"));
        v.set("base", Value::string("http://example.com/home/"));
        v.set("path", Value::string("/foo/bar"));
        v.set("list", Value::list(["red", "green", "blue"]));
        v.set("keys", Value::kv(["semi", ";", "dot", ".", "comma", ","]));
        v.set("v", Value::string("6"));
        v.set("x", Value::string("1024"));
        v.set("y", Value::string("768"));
        v.set("empty", Value::string(""));
        v.set("empty_keys", Value::kv(Vec::<String>::new()));
        v.set("empty_list", Value::list(["", "b"]));
        v.set("empty_kv", Value::kv(["a", "", "b", "2"]));
        v
    }

    fn check(tmpl: &str, expected: &str) {
        let ast = parse(tmpl).unwrap();
        let got = expand(&ast, &vars()).unwrap();
        assert_eq!(got, expected, "expanding {:?}", tmpl);
    }

    #[test]
    fn level1_simple_string_expansion() {
        check("{var}", "value");
        check("{hello}", "Hello%20World%21");
    }

    #[test]
    fn level2_reserved_and_fragment() {
        check("{+var}", "value");
        check("{+hello}", "Hello%20World!");
        check("{+path}/here", "/foo/bar/here");
        check("X{#var}", "X#value");
        check("X{#hello}", "X#Hello%20World!");
    }

    #[test]
    fn level3_multiple_variables_and_dotted_forms() {
        check("{?var,hello}", "?var=value&hello=Hello%20World%21");
        check("map?{x,y}", "map?1024,768");
        check("{x,hello,y}", "1024,Hello%20World%21,768");
        check("{.who}", ".fred");
        check("{/who}", "/fred");
        check("{;x,y}", ";x=1024;y=768");
        check("{;x,y,empty}", ";x=1024;y=768;empty");
        check("{?x,y,empty}", "?x=1024&y=768&empty=");
    }

    #[test]
    fn level4_explode_and_prefix() {
        check("{var:3}", "val");
        check("{list}", "red,green,blue");
        check("{list*}", "red,green,blue");
        check("{keys}", "semi,%3B,dot,.,comma,%2C");
        check("{keys*}", "semi=%3B,dot=.,comma=%2C");
    }

    #[test]
    fn named_explode_uses_ifemp_for_empty_elements() {
        // semicolon's ifemp is "": an empty exploded element emits the bare
        // name, not a trailing "=".
        check("{;empty_list*}", ";empty_list;empty_list=b");
        check("{;empty_kv*}", ";a;b=2");
        // question's ifemp is "=": an empty exploded element keeps the "=".
        check("{?empty_list*}", "?empty_list=&empty_list=b");
    }

    #[test]
    fn undefined_variables_drop_the_expression() {
        check("{undef}", "");
        check("X{undef}Y", "XY");
    }

    #[test]
    fn empty_composite_values_are_undefined() {
        check("{empty_keys*}", "");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn template_strategy() -> impl Strategy<Value = String> {
            let op = prop_oneof![
                Just(""),
                Just("+"),
                Just("#"),
                Just("."),
                Just("/"),
                Just(";"),
                Just("?"),
                Just("&"),
            ];
            let varname = "[a-zA-Z][a-zA-Z0-9_]{0,3}";
            (op, proptest::collection::vec(varname, 1..=3))
                .prop_map(|(op, names)| format!("{{{}{}}}", op, names.join(",")))
        }

        fn values_strategy() -> impl Strategy<Value = Values> {
            proptest::collection::hash_map("[a-zA-Z][a-zA-Z0-9_]{0,3}", "[a-zA-Z0-9]{0,6}", 0..=4)
                .prop_map(|map| {
                    let mut values = Values::new();
                    for (k, v) in map {
                        values.set(k, Value::string(v));
                    }
                    values
                })
        }

        proptest! {
            /// Expansion is a pure function of `(ast, vars)` (spec.md §8's
            /// "expand determinism" property): expanding the same pair
            /// twice must produce byte-identical output.
            #[test]
            fn expand_is_deterministic(tmpl_str in template_strategy(), vars in values_strategy()) {
                let ast = parse(&tmpl_str).unwrap();
                let first = expand(&ast, &vars).unwrap();
                let second = expand(&ast, &vars).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }
}
