//! Finite-state automata used for approximate term matching.
//!
//! [`automaton::Automaton`] is a generic deterministic transducer over ordered
//! label ranges (Unicode scalar values). [`levenshtein::LevenshteinAutomaton`]
//! builds one that accepts every string within a bounded edit distance of a
//! query term and walks a sorted term dictionary with it.

pub mod automaton;
pub mod levenshtein;

pub use automaton::{Automaton, MAX_CODE_POINT, MIN_CODE_POINT, StateId, Transition};
pub use levenshtein::{DictionaryMatch, LevenshteinAutomaton, MAX_SUPPORTED_EDITS};
