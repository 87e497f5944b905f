//! The full-text search facade.
//!
//! [`search::FullTextSearch`] owns one inverted index per declared field,
//! keeps them in sync with host documents, answers queries and converts to
//! and from the persisted [`serialization::SearchPayload`].

pub mod document;
pub mod search;
pub mod serialization;

pub use document::{DEFAULT_ID_PROPERTY, FieldExtractor, FnExtractor, PropertyExtractor};
pub use search::FullTextSearch;
pub use serialization::SearchPayload;
