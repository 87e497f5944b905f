//! Inverted indexes, one per declared field.

pub mod field;
pub mod inverted_index;
pub mod posting;
pub mod wildcard;

pub use field::{FieldConfig, FieldOptions};
pub use inverted_index::{FuzzyMatch, IndexPayload, InvertedIndex};
pub use posting::{Posting, PostingList};
pub use wildcard::WildcardPattern;
