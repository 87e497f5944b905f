//! Levenshtein automata for fuzzy term lookup.
//!
//! A [`LevenshteinAutomaton`] is a deterministic [`Automaton`] that accepts
//! exactly the strings within `max_edits` insertions, deletions or
//! substitutions of a fixed term, and optionally adjacent transpositions
//! (optimal string alignment distance). It is built by subset construction
//! over the classic position NFA, where a position `(consumed, edits)` says
//! how many chars of the term have been consumed and how many edits were
//! spent. Each accepting DFA state remembers the smallest edit distance it
//! represents.
//!
//! Matching against a dictionary does not test every term. The dictionary is
//! walked in sorted order, and when a candidate falls off the automaton the
//! walk seeks straight to the next string the automaton could still accept,
//! skipping every term that shares the dead prefix.
//!
//! # Examples
//!
//! ```
//! use lokisearch::automaton::LevenshteinAutomaton;
//!
//! let automaton = LevenshteinAutomaton::new("quick", 1, 0, true).unwrap();
//! assert_eq!(automaton.distance("qiuck"), Some(1));
//! assert_eq!(automaton.distance("quack"), Some(1));
//! assert_eq!(automaton.distance("quick"), Some(0));
//!
//! let strict = LevenshteinAutomaton::new("quick", 1, 0, false).unwrap();
//! assert_eq!(strict.distance("qiuck"), None);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;

use ahash::AHashMap;
use log::debug;

use crate::automaton::automaton::{Automaton, MAX_CODE_POINT, StateId};
use crate::error::{LokiSearchError, Result};

/// Largest edit distance a fuzzy lookup may ask for.
pub const MAX_SUPPORTED_EDITS: u32 = 2;

/// The start state of every Levenshtein automaton.
const START: StateId = 0;

/// An NFA position: `(chars of the term consumed, edits spent, mid-transposition)`.
///
/// A transposition position has read the term's next-but-one char and still
/// expects the skipped one.
type Position = (usize, u32, bool);

/// A dictionary term accepted by a [`LevenshteinAutomaton`].
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryMatch<'a, V> {
    /// The matching dictionary term.
    pub term: &'a str,
    /// Edit distance between the term and the query.
    pub distance: u32,
    /// The dictionary value stored under the term.
    pub value: &'a V,
}

/// A deterministic automaton accepting every string within a bounded edit
/// distance of a term.
#[derive(Debug, Clone)]
pub struct LevenshteinAutomaton {
    term: String,
    max_edits: u32,
    prefix_length: usize,
    transpositions: bool,
    automaton: Automaton,
    /// Minimal edit distance of each accepting state.
    distances: Vec<Option<u32>>,
}

impl LevenshteinAutomaton {
    /// Build the automaton for `term`.
    ///
    /// # Arguments
    ///
    /// * `term` - The string to match against
    /// * `max_edits` - Maximum edit distance (0, 1, or 2)
    /// * `prefix_length` - Number of leading chars that must match exactly
    /// * `transpositions` - Whether swapping two adjacent chars counts as one edit
    pub fn new(
        term: &str,
        max_edits: u32,
        prefix_length: usize,
        transpositions: bool,
    ) -> Result<Self> {
        if max_edits > MAX_SUPPORTED_EDITS {
            return Err(LokiSearchError::automaton_build(format!(
                "max_edits {max_edits} exceeds the supported maximum of {MAX_SUPPORTED_EDITS}"
            )));
        }

        let chars: Vec<char> = term.chars().collect();
        let prefix_length = prefix_length.min(chars.len());
        let mut builder = DfaBuilder::new(&chars, max_edits, prefix_length, transpositions);
        builder.build()?;

        debug!(
            "built levenshtein automaton for {:?} (k={}, prefix={}): {} states, {} transitions",
            term,
            max_edits,
            prefix_length,
            builder.automaton.num_states(),
            builder.automaton.num_transitions()
        );

        Ok(LevenshteinAutomaton {
            term: term.to_string(),
            max_edits,
            prefix_length,
            transpositions,
            automaton: builder.automaton,
            distances: builder.distances,
        })
    }

    /// Get the term this automaton matches against.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Get the maximum edit distance.
    pub fn max_edits(&self) -> u32 {
        self.max_edits
    }

    /// Get the exact-match prefix length.
    pub fn prefix_length(&self) -> usize {
        self.prefix_length
    }

    /// Check if transpositions are enabled.
    pub fn uses_transpositions(&self) -> bool {
        self.transpositions
    }

    /// Get the underlying automaton.
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Edit distance between `candidate` and the term, if within bounds.
    pub fn distance(&self, candidate: &str) -> Option<u32> {
        let mut state = START;
        for ch in candidate.chars() {
            state = self.automaton.step(state, ch as u32)?;
        }
        self.state_distance(state)
    }

    fn state_distance(&self, state: StateId) -> Option<u32> {
        self.distances.get(state as usize).copied().flatten()
    }

    /// Find every key of `dictionary` accepted by this automaton, in key order.
    pub fn intersect<'a, V>(&self, dictionary: &'a BTreeMap<String, V>) -> Vec<DictionaryMatch<'a, V>> {
        let mut matches = Vec::new();
        let mut visited = 0usize;
        let mut lower = String::new();
        let mut states: Vec<StateId> = Vec::new();
        let mut chars: Vec<char> = Vec::new();

        loop {
            let Some((term, value)) = dictionary
                .range::<str, _>((Bound::Included(lower.as_str()), Bound::Unbounded))
                .next()
            else {
                break;
            };
            visited += 1;

            chars.clear();
            chars.extend(term.chars());
            states.clear();
            states.push(START);

            let mut dead_at = None;
            for (i, &ch) in chars.iter().enumerate() {
                match self.automaton.step(states[i], ch as u32) {
                    Some(next) => states.push(next),
                    None => {
                        dead_at = Some(i);
                        break;
                    }
                }
            }

            match dead_at {
                None => {
                    if let Some(distance) = states.last().and_then(|&s| self.state_distance(s)) {
                        matches.push(DictionaryMatch {
                            term: term.as_str(),
                            distance,
                            value,
                        });
                    }
                    // Smallest string strictly greater than the term.
                    lower.clear();
                    lower.push_str(term);
                    lower.push('\0');
                }
                Some(pos) => match self.seek_target(&chars, &states, pos) {
                    Some(target) => lower = target,
                    None => break,
                },
            }
        }

        debug!(
            "fuzzy walk for {:?}: visited {} of {} terms, {} matches",
            self.term,
            visited,
            dictionary.len(),
            matches.len()
        );

        matches
    }

    /// Smallest string greater than every string starting with
    /// `chars[..=dead]` that the automaton could still accept a prefix of.
    fn seek_target(&self, chars: &[char], states: &[StateId], dead: usize) -> Option<String> {
        let mut pos = dead;
        loop {
            let label = chars[pos] as u32 + 1;
            if let Some(next) = self.next_char(states[pos], label) {
                let mut target: String = chars[..pos].iter().collect();
                target.push(next);
                return Some(target);
            }
            if pos == 0 {
                return None;
            }
            pos -= 1;
        }
    }

    /// Smallest char `>= label` with a transition out of `state`.
    fn next_char(&self, state: StateId, mut label: u32) -> Option<char> {
        while label <= MAX_CODE_POINT {
            let next = self.automaton.next_label(state, label)?;
            match char::from_u32(next) {
                Some(ch) => return Some(ch),
                // Surrogate code points are not chars.
                None => label = 0xE000,
            }
        }
        None
    }
}

/// Subset construction from the position NFA.
struct DfaBuilder<'a> {
    term: &'a [char],
    max_edits: u32,
    prefix_length: usize,
    transpositions: bool,
    automaton: Automaton,
    distances: Vec<Option<u32>>,
    ids: AHashMap<Vec<Position>, StateId>,
    queue: VecDeque<Vec<Position>>,
}

impl<'a> DfaBuilder<'a> {
    fn new(term: &'a [char], max_edits: u32, prefix_length: usize, transpositions: bool) -> Self {
        DfaBuilder {
            term,
            max_edits,
            prefix_length,
            transpositions,
            automaton: Automaton::new(),
            distances: Vec::new(),
            ids: AHashMap::new(),
            queue: VecDeque::new(),
        }
    }

    fn build(&mut self) -> Result<()> {
        let classes = self.label_classes();
        let start = self.close(vec![(0, 0, false)]);
        self.state_for(start)?;

        while let Some(positions) = self.queue.pop_front() {
            let source = self.ids[&positions];
            for &(min, max, ch) in &classes {
                let next = self.advance(&positions, ch);
                if next.is_empty() {
                    continue;
                }
                let dest = self.state_for(next)?;
                self.automaton.add_transition(source, dest, min, max)?;
            }
            self.automaton.finish_state()?;
        }

        Ok(())
    }

    /// Partition the label space into the term's chars and the gaps between
    /// them. Gap labels behave identically, so they carry no char.
    fn label_classes(&self) -> Vec<(u32, u32, Option<char>)> {
        let mut alphabet: Vec<char> = self.term.to_vec();
        alphabet.sort_unstable();
        alphabet.dedup();

        let mut classes = Vec::with_capacity(alphabet.len() * 2 + 1);
        let mut next_free = 0u32;
        for ch in alphabet {
            let code = ch as u32;
            if code > next_free {
                classes.push((next_free, code - 1, None));
            }
            classes.push((code, code, Some(ch)));
            next_free = code + 1;
        }
        if next_free <= MAX_CODE_POINT {
            classes.push((next_free, MAX_CODE_POINT, None));
        }
        classes
    }

    fn state_for(&mut self, positions: Vec<Position>) -> Result<StateId> {
        if let Some(&id) = self.ids.get(&positions) {
            return Ok(id);
        }

        let id = self.automaton.create_state();
        let distance = self.accept_distance(&positions);
        if distance.is_some() {
            self.automaton.set_accept(id, true)?;
        }
        self.distances.push(distance);
        self.ids.insert(positions.clone(), id);
        self.queue.push_back(positions);
        Ok(id)
    }

    fn editable(&self, consumed: usize) -> bool {
        consumed >= self.prefix_length
    }

    /// Consume one input char from every position.
    fn advance(&self, positions: &[Position], ch: Option<char>) -> Vec<Position> {
        let n = self.term.len();
        let mut next = Vec::with_capacity(positions.len() * 3);

        for &(i, e, swapping) in positions {
            if swapping {
                if Some(self.term[i]) == ch {
                    next.push((i + 2, e, false));
                }
                continue;
            }
            if i < n && Some(self.term[i]) == ch {
                next.push((i + 1, e, false));
            }
            if self.editable(i) && e < self.max_edits {
                // insertion
                next.push((i, e + 1, false));
                // substitution
                if i < n {
                    next.push((i + 1, e + 1, false));
                }
                if self.transpositions && i + 1 < n && Some(self.term[i + 1]) == ch {
                    next.push((i, e + 1, true));
                }
            }
        }

        self.close(next)
    }

    /// Add deletion moves, then keep the cheapest edit count per position.
    ///
    /// Only positions that share a consumed count are compared. A cheaper
    /// position elsewhere in the term does not cover the deletions that have
    /// to be replayed from this one before the next char is read.
    fn close(&self, mut positions: Vec<Position>) -> Vec<Position> {
        let n = self.term.len();
        let mut stack = positions.clone();
        while let Some((i, e, swapping)) = stack.pop() {
            if !swapping && self.editable(i) && i < n && e < self.max_edits {
                let deleted = (i + 1, e + 1, false);
                positions.push(deleted);
                stack.push(deleted);
            }
        }

        positions.sort_unstable_by_key(|&(i, e, swapping)| (i, swapping, e));
        positions.dedup_by_key(|&mut (i, _, swapping)| (i, swapping));
        positions.sort_unstable();
        positions
    }

    fn accept_distance(&self, positions: &[Position]) -> Option<u32> {
        let n = self.term.len();
        positions
            .iter()
            .filter(|&&(i, _, swapping)| !swapping && (i == n || self.editable(i)))
            .map(|&(i, e, _)| e + (n - i) as u32)
            .filter(|&d| d <= self.max_edits)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Optimal string alignment distance.
    fn osa_distance(a: &str, b: &str, transpositions: bool) -> u32 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let mut d = vec![vec![0u32; b.len() + 1]; a.len() + 1];

        for (i, row) in d.iter_mut().enumerate() {
            row[0] = i as u32;
        }
        for j in 0..=b.len() {
            d[0][j] = j as u32;
        }
        for i in 1..=a.len() {
            for j in 1..=b.len() {
                let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
                let mut best = (d[i - 1][j] + 1)
                    .min(d[i][j - 1] + 1)
                    .min(d[i - 1][j - 1] + cost);
                if transpositions && i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1]
                {
                    best = best.min(d[i - 2][j - 2] + 1);
                }
                d[i][j] = best;
            }
        }
        d[a.len()][b.len()]
    }

    fn dictionary(words: &[&str]) -> BTreeMap<String, usize> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), i))
            .collect()
    }

    #[test]
    fn test_levenshtein_automaton() {
        let automaton = LevenshteinAutomaton::new("hello", 1, 0, true).unwrap();

        assert_eq!(automaton.distance("hello"), Some(0)); // exact match
        assert_eq!(automaton.distance("helo"), Some(1)); // 1 deletion
        assert_eq!(automaton.distance("hallo"), Some(1)); // 1 substitution
        assert_eq!(automaton.distance("helllo"), Some(1)); // 1 insertion
        assert_eq!(automaton.distance("ehllo"), Some(1)); // 1 transposition

        assert_eq!(automaton.distance("world"), None); // too different
        assert_eq!(automaton.distance("hi"), None); // too different (2 edits)
    }

    #[test]
    fn test_without_transpositions() {
        let automaton = LevenshteinAutomaton::new("hello", 1, 0, false).unwrap();
        assert_eq!(automaton.distance("ehllo"), None);
        assert_eq!(automaton.distance("hallo"), Some(1));
        assert!(!automaton.uses_transpositions());
    }

    #[test]
    fn test_zero_edits_is_exact() {
        let automaton = LevenshteinAutomaton::new("fox", 0, 0, true).unwrap();
        assert_eq!(automaton.distance("fox"), Some(0));
        assert_eq!(automaton.distance("fo"), None);
        assert_eq!(automaton.distance("ofx"), None);
        assert_eq!(automaton.distance("foxes"), None);
    }

    #[test]
    fn test_prefix_constraint() {
        let automaton = LevenshteinAutomaton::new("hello", 2, 2, true).unwrap();

        assert_eq!(automaton.distance("hello"), Some(0)); // exact match
        assert_eq!(automaton.distance("heLLo"), Some(2)); // 2 edits, prefix "he" matches
        assert_eq!(automaton.distance("helol"), Some(1)); // swap after the prefix

        assert_eq!(automaton.distance("xello"), None); // prefix doesn't match
        assert_eq!(automaton.distance("ehllo"), None); // swap inside the prefix
        assert_eq!(automaton.distance("hllo"), None); // deletion inside the prefix
        assert_eq!(automaton.distance("world"), None);
    }

    #[test]
    fn test_prefix_longer_than_term() {
        let automaton = LevenshteinAutomaton::new("ab", 1, 10, true).unwrap();
        assert_eq!(automaton.prefix_length(), 2);
        assert_eq!(automaton.distance("ab"), Some(0));
        assert_eq!(automaton.distance("abc"), Some(1));
        assert_eq!(automaton.distance("a"), None);
    }

    #[test]
    fn test_empty_term() {
        let automaton = LevenshteinAutomaton::new("", 1, 0, true).unwrap();
        assert_eq!(automaton.distance(""), Some(0));
        assert_eq!(automaton.distance("a"), Some(1));
        assert_eq!(automaton.distance("ab"), None);
    }

    #[test]
    fn test_unsupported_edits() {
        let result = LevenshteinAutomaton::new("hello", MAX_SUPPORTED_EDITS + 1, 0, true);
        assert!(matches!(result, Err(LokiSearchError::AutomatonBuild(_))));
    }

    #[test]
    fn test_transitions_are_compacted() {
        let automaton = LevenshteinAutomaton::new("abc", 1, 0, true).unwrap();
        let dfa = automaton.automaton();
        for state in 0..dfa.num_states() as StateId {
            for w in dfa.transitions(state).windows(2) {
                assert!(w[0].max < w[1].min);
            }
        }
        assert!(!dfa.is_accept(0));
    }

    #[test]
    fn test_intersect_finds_only_close_terms() {
        let dict = dictionary(&["dog", "fox", "quick", "quiet", "quirk", "the"]);

        let automaton = LevenshteinAutomaton::new("qiuck", 1, 0, true).unwrap();
        let terms: Vec<_> = automaton.intersect(&dict).iter().map(|m| m.term).collect();
        assert_eq!(terms, vec!["quick"]);

        let automaton = LevenshteinAutomaton::new("qiuck", 1, 0, false).unwrap();
        assert!(automaton.intersect(&dict).is_empty());

        let automaton = LevenshteinAutomaton::new("quiek", 2, 0, true).unwrap();
        let found: Vec<_> = automaton
            .intersect(&dict)
            .iter()
            .map(|m| (m.term, m.distance))
            .collect();
        assert_eq!(found, vec![("quick", 1), ("quiet", 1), ("quirk", 1)]);
    }

    #[test]
    fn test_intersect_handles_non_ascii() {
        let dict = dictionary(&["café", "cafe", "caff", "résumé", "日本語", "日本"]);

        let automaton = LevenshteinAutomaton::new("cafe", 1, 0, true).unwrap();
        let terms: Vec<_> = automaton.intersect(&dict).iter().map(|m| m.term).collect();
        assert_eq!(terms, vec!["cafe", "caff", "café"]);

        let automaton = LevenshteinAutomaton::new("日本語", 1, 0, true).unwrap();
        let terms: Vec<_> = automaton.intersect(&dict).iter().map(|m| m.term).collect();
        assert_eq!(terms, vec!["日本", "日本語"]);
    }

    #[test]
    fn test_deletion_followed_by_match() {
        let automaton = LevenshteinAutomaton::new("zczz", 2, 0, false).unwrap();
        assert_eq!(automaton.distance("zz"), Some(2));
        assert_eq!(automaton.distance("zcz"), Some(1));
        assert_eq!(automaton.distance("czc"), Some(2));
        assert_eq!(automaton.distance("c"), None);

        let dict = dictionary(&["a", "czc", "zz"]);
        let terms: Vec<_> = automaton
            .intersect(&dict)
            .iter()
            .map(|m| (m.term, m.distance))
            .collect();
        assert_eq!(terms, vec![("czc", 2), ("zz", 2)]);

        let automaton = LevenshteinAutomaton::new("ab", 1, 0, true).unwrap();
        assert_eq!(automaton.distance("b"), Some(1));
        assert_eq!(automaton.distance("a"), Some(1));

        let automaton = LevenshteinAutomaton::new("abcd", 2, 1, true).unwrap();
        assert_eq!(automaton.distance("ad"), Some(2));
        assert_eq!(automaton.distance("acd"), Some(1));
        assert_eq!(automaton.distance("bcd"), None);
    }

    #[test]
    fn test_distance_matches_brute_force_with_prefix() {
        let queries = [
            "", "a", "ab", "aba", "abcd", "bcab", "zczz",
            "\u{10ffff}c\u{10ffff}\u{10ffff}",
        ];
        let candidates = [
            "", "a", "b", "aa", "ab", "ba", "bb", "aab", "abb", "acd", "bad", "bcd", "zz", "czc",
            "zcz", "abcd", "bacd", "acbd", "\u{10ffff}\u{10ffff}", "\u{10ffff}c\u{10ffff}",
        ];

        for transpositions in [false, true] {
            for query in queries {
                for k in 0..=MAX_SUPPORTED_EDITS {
                    for prefix in 0..=3usize {
                        let automaton =
                            LevenshteinAutomaton::new(query, k, prefix, transpositions).unwrap();
                        let head: String = query.chars().take(prefix).collect();
                        for candidate in candidates {
                            let d = osa_distance(query, candidate, transpositions);
                            let expected = (candidate.starts_with(&head) && d <= k).then_some(d);
                            assert_eq!(
                                automaton.distance(candidate),
                                expected,
                                "query {query:?} candidate {candidate:?} k={k} p={prefix} t={transpositions}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_intersect_matches_brute_force() {
        let words = [
            "a", "ab", "abc", "abd", "acb", "b", "ba", "bab", "bac", "bad", "bca", "cab", "cabd",
            "ccc", "abcd", "abdc", "dcba", "aabb", "abab", "bbbb", "bacd", "acbd",
        ];
        let dict = dictionary(&words);
        let queries = ["", "a", "ab", "abc", "bad", "cabd", "zzz", "abcde", "bacd"];

        for transpositions in [false, true] {
            for query in queries {
                for k in 0..=MAX_SUPPORTED_EDITS {
                    let automaton = LevenshteinAutomaton::new(query, k, 0, transpositions).unwrap();
                    let found: Vec<_> = automaton
                        .intersect(&dict)
                        .iter()
                        .map(|m| (m.term.to_string(), m.distance))
                        .collect();
                    let expected: Vec<_> = dict
                        .keys()
                        .map(|w| (w.clone(), osa_distance(query, w, transpositions)))
                        .filter(|(_, d)| *d <= k)
                        .collect();
                    assert_eq!(found, expected, "query {query:?} k={k} t={transpositions}");
                }
            }
        }
    }
}
