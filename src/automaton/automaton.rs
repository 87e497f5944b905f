//! Deterministic automaton over ordered label ranges.
//!
//! States are created with [`Automaton::create_state`] and numbered from 0
//! without gaps. Transitions for a state are accumulated with
//! [`Automaton::add_transition`] and compacted when the state is finished:
//! ranges that share a destination and touch or overlap are merged, and the
//! result is kept sorted by `(min, max, dest)` so [`Automaton::step`] can
//! binary search it.
//!
//! # Examples
//!
//! ```
//! use lokisearch::automaton::Automaton;
//!
//! let mut automaton = Automaton::new();
//! let start = automaton.create_state();
//! let end = automaton.create_state();
//! automaton.set_accept(end, true).unwrap();
//!
//! automaton.add_transition(start, end, 'a' as u32, 'c' as u32).unwrap();
//! automaton.add_transition(start, end, 'd' as u32, 'f' as u32).unwrap();
//! automaton.finish_state().unwrap();
//!
//! // The two ranges were merged into a single a..=f transition.
//! assert_eq!(automaton.transitions(start).len(), 1);
//! assert_eq!(automaton.step(start, 'e' as u32), Some(end));
//! assert_eq!(automaton.step(start, 'z' as u32), None);
//! ```

use std::collections::BTreeSet;

use crate::error::{LokiSearchError, Result};

/// Identifier of an automaton state.
pub type StateId = u32;

/// Smallest label value.
pub const MIN_CODE_POINT: u32 = 0;

/// Largest label value (the last Unicode scalar value).
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// A transition to `dest` on any label in `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    /// Destination state.
    pub dest: StateId,
    /// Inclusive lower bound of the label range.
    pub min: u32,
    /// Inclusive upper bound of the label range.
    pub max: u32,
}

impl Transition {
    /// Create a new transition.
    pub fn new(dest: StateId, min: u32, max: u32) -> Self {
        Transition { dest, min, max }
    }

    /// Check whether `label` falls inside this transition's range.
    pub fn contains(&self, label: u32) -> bool {
        self.min <= label && label <= self.max
    }
}

/// A deterministic finite automaton with range-labelled transitions.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    /// Finalized transitions, indexed by state.
    transitions: Vec<Vec<Transition>>,
    /// Accept flags, indexed by state.
    accept: Vec<bool>,
    /// Transitions of the state currently being built.
    pending: Vec<Transition>,
    /// The state whose transitions are being accumulated.
    current: Option<StateId>,
}

impl Automaton {
    /// Create an empty automaton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new state and return its id.
    pub fn create_state(&mut self) -> StateId {
        let id = self.transitions.len() as StateId;
        self.transitions.push(Vec::new());
        self.accept.push(false);
        id
    }

    /// Add or remove `state` from the accept set.
    pub fn set_accept(&mut self, state: StateId, accept: bool) -> Result<()> {
        self.check_state(state)?;
        self.accept[state as usize] = accept;
        Ok(())
    }

    /// Check whether `state` is accepting.
    pub fn is_accept(&self, state: StateId) -> bool {
        self.accept.get(state as usize).copied().unwrap_or(false)
    }

    /// Queue a transition `source --[min, max]--> dest`.
    ///
    /// Transitions of one source state must be added contiguously: switching
    /// to a different source finalizes the previous one, and a finalized
    /// state cannot receive further transitions.
    pub fn add_transition(
        &mut self,
        source: StateId,
        dest: StateId,
        min: u32,
        max: u32,
    ) -> Result<()> {
        self.check_state(source)?;
        self.check_state(dest)?;
        if min > max {
            return Err(LokiSearchError::automaton_build(format!(
                "invalid label range {min}..={max}"
            )));
        }
        if max > MAX_CODE_POINT {
            return Err(LokiSearchError::automaton_build(format!(
                "label {max} exceeds the maximum code point"
            )));
        }

        if self.current != Some(source) {
            self.finish_state()?;
            if !self.transitions[source as usize].is_empty() {
                return Err(LokiSearchError::automaton_build(format!(
                    "transitions for state {source} must be added contiguously"
                )));
            }
            self.current = Some(source);
        }

        self.pending.push(Transition::new(dest, min, max));
        Ok(())
    }

    /// Finalize the state currently being built, if any.
    pub fn finish_state(&mut self) -> Result<()> {
        match self.current.take() {
            Some(state) => self.finish_current_state(state),
            None => Ok(()),
        }
    }

    fn finish_current_state(&mut self, state: StateId) -> Result<()> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_unstable_by_key(|t| (t.dest, t.min, t.max));

        let mut merged: Vec<Transition> = Vec::with_capacity(pending.len());
        for t in pending {
            match merged.last_mut() {
                Some(prev) if prev.dest == t.dest && t.min <= prev.max.saturating_add(1) => {
                    if t.max > prev.max {
                        prev.max = t.max;
                    }
                }
                _ => merged.push(t),
            }
        }

        merged.sort_unstable_by_key(|t| (t.min, t.max, t.dest));

        if let Some(pair) = merged.windows(2).find(|w| w[1].min <= w[0].max) {
            return Err(LokiSearchError::automaton_build(format!(
                "state {state} has overlapping transitions to {} and {}",
                pair[0].dest, pair[1].dest
            )));
        }

        self.transitions[state as usize] = merged;
        Ok(())
    }

    /// Follow the transition of `state` that covers `label`.
    ///
    /// Returns `None` when no transition covers the label. Only finalized
    /// states can be stepped.
    pub fn step(&self, state: StateId, label: u32) -> Option<StateId> {
        let transitions = self.transitions.get(state as usize)?;
        let idx = transitions.partition_point(|t| t.max < label);
        transitions
            .get(idx)
            .filter(|t| t.min <= label)
            .map(|t| t.dest)
    }

    /// Smallest label `>= label` that has a transition out of `state`.
    pub fn next_label(&self, state: StateId, label: u32) -> Option<u32> {
        let transitions = self.transitions.get(state as usize)?;
        let idx = transitions.partition_point(|t| t.max < label);
        transitions.get(idx).map(|t| t.min.max(label))
    }

    /// Sorted set of every label where some state's behaviour may change.
    pub fn start_points(&self) -> Vec<u32> {
        let mut points = BTreeSet::new();
        points.insert(MIN_CODE_POINT);

        for t in self.transitions.iter().flatten() {
            points.insert(t.min);
            if t.max < MAX_CODE_POINT {
                points.insert(t.max + 1);
            }
        }

        points.into_iter().collect()
    }

    /// Number of allocated states.
    pub fn num_states(&self) -> usize {
        self.transitions.len()
    }

    /// Total number of finalized transitions.
    pub fn num_transitions(&self) -> usize {
        self.transitions.iter().map(Vec::len).sum()
    }

    /// Finalized transitions of `state`, sorted by `(min, max, dest)`.
    pub fn transitions(&self, state: StateId) -> &[Transition] {
        self.transitions
            .get(state as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Run the automaton from state 0 over the chars of `input`.
    pub fn run(&self, input: &str) -> bool {
        if self.transitions.is_empty() {
            return false;
        }

        let mut state = 0;
        for ch in input.chars() {
            match self.step(state, ch as u32) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accept(state)
    }

    fn check_state(&self, state: StateId) -> Result<()> {
        if (state as usize) < self.transitions.len() {
            Ok(())
        } else {
            Err(LokiSearchError::automaton_build(format!(
                "state {state} has not been created"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_create_state_numbering() {
        let mut automaton = Automaton::new();
        assert_eq!(automaton.create_state(), 0);
        assert_eq!(automaton.create_state(), 1);
        assert_eq!(automaton.create_state(), 2);
        assert_eq!(automaton.num_states(), 3);
    }

    #[test]
    fn test_accept_toggle() {
        let mut automaton = Automaton::new();
        let s = automaton.create_state();

        assert!(!automaton.is_accept(s));
        automaton.set_accept(s, true).unwrap();
        assert!(automaton.is_accept(s));
        automaton.set_accept(s, false).unwrap();
        assert!(!automaton.is_accept(s));

        assert!(automaton.set_accept(42, true).is_err());
        assert!(!automaton.is_accept(42));
    }

    #[test]
    fn test_merge_adjacent_and_overlapping() {
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();
        let s1 = automaton.create_state();
        let s2 = automaton.create_state();

        automaton.add_transition(s0, s1, 10, 20).unwrap();
        automaton.add_transition(s0, s2, 30, 40).unwrap();
        automaton.add_transition(s0, s1, 21, 25).unwrap(); // adjacent
        automaton.add_transition(s0, s1, 15, 22).unwrap(); // overlapping
        automaton.add_transition(s0, s2, 45, 50).unwrap(); // gap, stays separate
        automaton.finish_state().unwrap();

        assert_eq!(
            automaton.transitions(s0),
            &[
                Transition::new(s1, 10, 25),
                Transition::new(s2, 30, 40),
                Transition::new(s2, 45, 50),
            ]
        );
        assert_eq!(automaton.step(s0, 9), None);
        assert_eq!(automaton.step(s0, 10), Some(s1));
        assert_eq!(automaton.step(s0, 25), Some(s1));
        assert_eq!(automaton.step(s0, 26), None);
        assert_eq!(automaton.step(s0, 42), None);
        assert_eq!(automaton.step(s0, 50), Some(s2));
    }

    #[test]
    fn test_switching_source_finishes_previous_state() {
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();
        let s1 = automaton.create_state();

        automaton.add_transition(s0, s1, 'a' as u32, 'a' as u32).unwrap();
        automaton.add_transition(s1, s0, 'b' as u32, 'b' as u32).unwrap();
        automaton.finish_state().unwrap();

        assert_eq!(automaton.step(s0, 'a' as u32), Some(s1));
        assert_eq!(automaton.step(s1, 'b' as u32), Some(s0));

        // s0 is already finalized
        let result = automaton.add_transition(s0, s1, 'c' as u32, 'c' as u32);
        assert!(matches!(result, Err(LokiSearchError::AutomatonBuild(_))));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();

        assert!(automaton.add_transition(s0, 7, 0, 1).is_err());
        assert!(automaton.add_transition(s0, s0, 5, 4).is_err());
        assert!(automaton.add_transition(s0, s0, 0, MAX_CODE_POINT + 1).is_err());
    }

    #[test]
    fn test_nondeterministic_ranges_rejected() {
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();
        let s1 = automaton.create_state();
        let s2 = automaton.create_state();

        automaton.add_transition(s0, s1, 0, 10).unwrap();
        automaton.add_transition(s0, s2, 5, 15).unwrap();
        assert!(automaton.finish_state().is_err());
    }

    #[test]
    fn test_dead_state_returns_none() {
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();
        assert_eq!(automaton.step(s0, 0), None);
        assert_eq!(automaton.step(s0, MAX_CODE_POINT), None);
        assert_eq!(automaton.next_label(s0, 0), None);
        assert_eq!(automaton.step(99, 0), None);
    }

    #[test]
    fn test_start_points() {
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();
        let s1 = automaton.create_state();

        automaton.add_transition(s0, s1, 'a' as u32, 'c' as u32).unwrap();
        automaton.add_transition(s1, s1, 'x' as u32, MAX_CODE_POINT).unwrap();
        automaton.finish_state().unwrap();

        assert_eq!(
            automaton.start_points(),
            vec![0, 'a' as u32, 'd' as u32, 'x' as u32]
        );
    }

    #[test]
    fn test_next_label() {
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();
        let s1 = automaton.create_state();

        automaton.add_transition(s0, s1, 10, 20).unwrap();
        automaton.add_transition(s0, s1, 40, 50).unwrap();
        automaton.finish_state().unwrap();

        assert_eq!(automaton.next_label(s0, 0), Some(10));
        assert_eq!(automaton.next_label(s0, 15), Some(15));
        assert_eq!(automaton.next_label(s0, 21), Some(40));
        assert_eq!(automaton.next_label(s0, 51), None);
    }

    #[test]
    fn test_run() {
        // Accepts "ab" and "abb...".
        let mut automaton = Automaton::new();
        let s0 = automaton.create_state();
        let s1 = automaton.create_state();
        let s2 = automaton.create_state();
        automaton.set_accept(s2, true).unwrap();

        automaton.add_transition(s0, s1, 'a' as u32, 'a' as u32).unwrap();
        automaton.add_transition(s1, s2, 'b' as u32, 'b' as u32).unwrap();
        automaton.add_transition(s2, s2, 'b' as u32, 'b' as u32).unwrap();
        automaton.finish_state().unwrap();

        assert!(automaton.run("ab"));
        assert!(automaton.run("abbb"));
        assert!(!automaton.run("a"));
        assert!(!automaton.run("ba"));
        assert!(!automaton.run(""));
    }

    #[test]
    fn test_random_transitions_partition_labels() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let mut automaton = Automaton::new();
            let source = automaton.create_state();
            let dests: Vec<StateId> = (0..4).map(|_| automaton.create_state()).collect();

            // Disjoint base segments over 0..300, each owned by one destination.
            let mut cuts: Vec<u32> = (0..8).map(|_| rng.random_range(0..300)).collect();
            cuts.sort_unstable();
            cuts.dedup();

            let mut expected = vec![None; 300];
            let mut pending = Vec::new();
            for pair in cuts.windows(2) {
                if rng.random_bool(0.3) {
                    continue;
                }
                let (lo, hi) = (pair[0], pair[1] - 1);
                let dest = dests[rng.random_range(0..dests.len())];
                for label in lo..=hi {
                    expected[label as usize] = Some(dest);
                }

                // Cover the segment with several overlapping pieces.
                pending.push((dest, lo, hi));
                for _ in 0..rng.random_range(0..3) {
                    let a = rng.random_range(lo..=hi);
                    let b = rng.random_range(a..=hi);
                    pending.push((dest, a, b));
                }
            }

            // Insertion order must not matter.
            for i in (1..pending.len()).rev() {
                let j = rng.random_range(0..=i);
                pending.swap(i, j);
            }
            for (dest, min, max) in pending {
                automaton.add_transition(source, dest, min, max).unwrap();
            }
            automaton.finish_state().unwrap();

            let transitions = automaton.transitions(source);
            for w in transitions.windows(2) {
                assert!(w[0].max < w[1].min, "overlap in {:?}", transitions);
            }
            for label in 0..300u32 {
                assert_eq!(automaton.step(source, label), expected[label as usize]);
            }
        }
    }
}
