//! # Value Representation
//!
//! This module defines [`Value`], the tagged variant RFC 6570 expansion and
//! matching pass variable bindings around as, and [`Values`], the name →
//! `Value` map threaded through `Template::expand`/`Template::match_str`.
//!
//! ## Supported types (spec §3, §4.6)
//! - `String(String)` — a scalar value.
//! - `List(Vec<String>)` — an ordered composite value.
//! - `Kv(Vec<String>)` — an associative composite value, stored flat as
//!   `[key, value, key, value, ...]`.
//!
//! ## Definedness
//! A `Value` is *defined* when: `String` always; `List`/`Kv` when
//! non-empty. Expansion skips undefined values entirely (spec §3); matching
//! never produces an undefined `Value` (absent varspecs are simply absent
//! from the returned map rather than present-but-empty).

use std::collections::HashMap;

/// A variable binding: a scalar string, an ordered list, or a flat
/// key/value sequence (spec §3 `Value`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// A scalar string value.
    String(String),
    /// An ordered composite value.
    List(Vec<String>),
    /// An associative composite value, flattened as `[k, v, k, v, ...]`.
    Kv(Vec<String>),
}

impl Value {
    /// Construct a [`Value::String`].
    pub fn string(v: impl Into<String>) -> Value {
        Value::String(v.into())
    }

    /// Construct a [`Value::List`] from its elements.
    pub fn list<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Construct a [`Value::Kv`] from a flat `k, v, k, v, ...` sequence.
    ///
    /// # Panics
    /// Panics if the number of arguments is odd. Per spec §4.6/§7 this is a
    /// programming bug in the caller, not a recoverable error — it mirrors
    /// the original Go `KV(...)` constructor's `panic` in
    /// `examples/original_source/value.go`.
    pub fn kv<I, S>(pairs: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let flat: Vec<String> = pairs.into_iter().map(Into::into).collect();
        assert!(
            flat.len() % 2 == 0,
            "uritemplate: Value::kv requires an even number of elements, got {}",
            flat.len()
        );
        Value::Kv(flat)
    }

    /// Whether this value is *defined* (spec §3): `String` always is;
    /// `List`/`Kv` are defined only when non-empty.
    pub fn is_defined(&self) -> bool {
        match self {
            Value::String(_) => true,
            Value::List(items) => !items.is_empty(),
            Value::Kv(pairs) => !pairs.is_empty(),
        }
    }
}

/// The name → [`Value`] map passed to `expand` and returned by `match_str`.
///
/// Lookup of an absent name yields no value (undefined), which expansion
/// skips (spec §3, §4.2). Per SPEC_FULL.md §9 / the original Go source's
/// own TODO, names are looked up byte-for-byte: pct-encoded bytes within a
/// template variable name are *not* canonicalized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Values(HashMap<String, Value>);

impl Values {
    /// An empty variable map.
    pub fn new() -> Self {
        Values(HashMap::new())
    }

    /// Bind `name` to `value`.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Look up `name`. Returns `None` for an undefined (absent) variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Values(iter.into_iter().collect())
    }
}

impl IntoIterator for Values {
    type Item = (String, Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_always_defined() {
        assert!(Value::string("").is_defined());
        assert!(Value::string("x").is_defined());
    }

    #[test]
    fn list_and_kv_definedness_depends_on_emptiness() {
        assert!(!Value::list(Vec::<String>::new()).is_defined());
        assert!(Value::list(vec!["a"]).is_defined());
        assert!(!Value::kv(Vec::<String>::new()).is_defined());
        assert!(Value::kv(vec!["k", "v"]).is_defined());
    }

    #[test]
    #[should_panic]
    fn kv_with_odd_length_panics() {
        Value::kv(vec!["k"]);
    }

    #[test]
    fn values_get_set_roundtrip() {
        let mut vars = Values::new();
        vars.set("x", Value::string("1024"));
        assert_eq!(vars.get("x"), Some(&Value::String("1024".to_string())));
        assert_eq!(vars.get("undef"), None);
    }
}
