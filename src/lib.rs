//! # lokisearch
//!
//! Embeddable full-text search over JSON documents.
//!
//! ## Features
//!
//! - One incrementally maintained inverted index per declared field
//! - Pluggable text analysis pipeline
//! - Fuzzy term matching with Levenshtein automata
//! - Term, prefix, wildcard, match and boolean queries
//! - JSON snapshots for any storage adapter

pub mod analysis;
pub mod automaton;
pub mod error;
pub mod full_text_search;
pub mod index;
pub mod query;

pub mod prelude {
    pub use crate::analysis::{Analyzer, PipelineAnalyzer, StandardAnalyzer};
    pub use crate::error::{LokiSearchError, Result};
    pub use crate::full_text_search::{FieldExtractor, FnExtractor, FullTextSearch, PropertyExtractor};
    pub use crate::index::FieldOptions;
    pub use crate::query::{Operator, Query, QueryBuilder, ScoredDoc};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
