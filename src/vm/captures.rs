//! Per-thread capture bookkeeping and post-match decoding into typed
//! [`Value`]s (spec §4.4, §4.5). `examples/original_source/match.go`
//! declares a `cap` field on its thread type but never writes to it; the
//! recording and decoding here is designed fresh, directly from spec
//! §4.2's expansion rules run in reverse.
//!
//! Only `CapStart`/`CapEnd` touch this state during matching —
//! `JmpIfNotDefined`/`JmpIfNotFirst`/`JmpIfNotEmpty` are nondeterministic
//! forks at the VM level (`crate::vm`) and never read it.

use std::collections::HashMap;

use crate::runeclass::pct_decode;
use crate::value::{Value, Values};

/// One simulation thread's capture state: a stack of currently-open
/// captures (supports nested/sequential `CapStart`/`CapEnd` pairs within
/// one thread) and the completed byte-offset spans recorded so far,
/// keyed by capture name ([`crate::ast::Varspec::spec_name`]).
#[derive(Clone, Debug, Default)]
pub struct Thread {
    open: Vec<(String, usize)>,
    pub spans: HashMap<String, Vec<(usize, usize)>>,
}

impl Thread {
    pub fn cap_start(&mut self, key: &str, pos: usize) {
        self.open.push((key.to_string(), pos));
    }

    /// Closes the most recently opened capture under `key`. A `CapEnd`
    /// with no matching open `CapStart` is a compiler bug, not a runtime
    /// condition to recover from, so it is silently ignored here rather
    /// than panicking on untrusted input.
    pub fn cap_end(&mut self, key: &str, pos: usize) {
        if let Some(idx) = self.open.iter().rposition(|(k, _)| k == key) {
            let (_, start) = self.open.remove(idx);
            self.spans
                .entry(key.to_string())
                .or_default()
                .push((start, pos));
        }
    }
}

/// Turn a matched thread's raw byte spans into typed `Values` (spec
/// §4.4).
///
/// A single completed span decodes to [`Value::String`]; more than one
/// (an exploded varspec, one span per matched iteration) decodes to
/// [`Value::List`]. [`Value::Kv`] is never produced by matching — see the
/// limitation recorded in `crate::compiler`'s module docs and
/// `DESIGN.md`.
pub fn decode(input: &str, spans: &HashMap<String, Vec<(usize, usize)>>) -> Values {
    let mut out = Values::new();
    let bytes = input.as_bytes();
    for (key, ranges) in spans {
        if ranges.is_empty() {
            continue;
        }
        if ranges.len() == 1 {
            let (s, e) = ranges[0];
            out.set(key.clone(), Value::string(pct_decode(&bytes[s..e])));
        } else {
            let items: Vec<String> = ranges
                .iter()
                .map(|&(s, e)| pct_decode(&bytes[s..e]))
                .collect();
            out.set(key.clone(), Value::list(items));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_start_and_end_record_a_completed_span() {
        let mut t = Thread::default();
        assert!(t.spans.is_empty());
        t.cap_start("x", 0);
        assert!(t.spans.is_empty()); // still open, not yet completed
        t.cap_end("x", 3);
        assert_eq!(t.spans.get("x"), Some(&vec![(0, 3)]));
    }

    #[test]
    fn cap_end_without_matching_start_is_ignored() {
        let mut t = Thread::default();
        t.cap_end("x", 5);
        assert!(t.spans.is_empty());
    }

    #[test]
    fn decode_skips_empty_span_lists() {
        let mut spans = HashMap::new();
        spans.insert("ghost".to_string(), Vec::new());
        spans.insert("var".to_string(), vec![(0, 5)]);
        let vars = decode("hello", &spans);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("var"), Some(&Value::string("hello")));
    }

    #[test]
    fn decode_multiple_spans_as_list() {
        let mut spans = HashMap::new();
        spans.insert("list".to_string(), vec![(0, 3), (4, 7)]);
        let vars = decode("red,abc", &spans);
        assert_eq!(vars.get("list"), Some(&Value::list(["red", "abc"])));
    }
}
