//! Sparse thread list for one step of the NFA simulation (spec §4.5, §9
//! "Sparse-set invariant").
//!
//! Insertion order is match priority: the first thread added at a given
//! `pc` during a step wins, later duplicates at the same `pc` within the
//! same step are dropped (leftmost-first semantics, spec §4.5). Grounded
//! on the `threadList`/`add` dedup behavior in
//! `examples/original_source/match.go`, generalized to carry a
//! [`Thread`] payload instead of Go's unused `cap` field.
//!
//! `sparse[pc]` is never reset between `clear()` calls — only `dense` is
//! truncated. Membership is sound anyway: `sparse[pc]` is only trusted
//! when it indexes into the *current* `dense` and that slot's own `pc`
//! matches, so stale garbage left over from an earlier step can never be
//! mistaken for a live entry (Russ Cox's sparse-set trick). This makes
//! `clear()` O(1) instead of the O(program_len) full-array reset a plain
//! `Vec<bool>` would need every input position.

use super::captures::Thread;

pub struct ThreadList {
    /// Indexed by `pc`; valid only when it points at a `dense` slot whose
    /// own `pc` field equals the index. Never cleared.
    sparse: Vec<usize>,
    dense: Vec<(usize, Thread)>,
}

impl ThreadList {
    pub fn new(program_len: usize) -> Self {
        ThreadList {
            sparse: vec![0; program_len],
            dense: Vec::new(),
        }
    }

    /// Reset for the next input position — truncates `dense` only;
    /// `sparse` keeps whatever it held from prior steps.
    pub fn clear(&mut self) {
        self.dense.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Whether `pc` was already added during the current step.
    pub fn contains(&self, pc: usize) -> bool {
        let idx = self.sparse[pc];
        idx < self.dense.len() && self.dense[idx].0 == pc
    }

    /// Record `pc` as visited and queue `(pc, thread)`.
    pub fn push(&mut self, pc: usize, thread: Thread) {
        self.sparse[pc] = self.dense.len();
        self.dense.push((pc, thread));
    }

    pub fn entries(&self) -> &[(usize, Thread)] {
        &self.dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_false_for_stale_sparse_slots_across_clears() {
        let mut list = ThreadList::new(4);
        list.push(2, Thread::default());
        assert!(list.contains(2));
        list.clear();
        // `sparse[2]` still holds the index from before `clear()`, but
        // `dense` is now empty, so the slot must not resolve as present.
        assert!(!list.contains(2));
        assert!(list.is_empty());
    }

    #[test]
    fn push_after_clear_reuses_the_same_pc_safely() {
        let mut list = ThreadList::new(4);
        list.push(1, Thread::default());
        list.clear();
        list.push(3, Thread::default());
        assert!(!list.contains(1));
        assert!(list.contains(3));
        assert_eq!(list.entries().len(), 1);
    }

    #[test]
    fn duplicate_push_at_same_pc_is_rejected_by_caller_via_contains() {
        let mut list = ThreadList::new(4);
        list.push(0, Thread::default());
        assert!(list.contains(0));
        // A well-behaved caller checks `contains` before `push`; this test
        // only documents that `contains` reflects the first insertion.
        assert_eq!(list.entries()[0].0, 0);
    }
}
