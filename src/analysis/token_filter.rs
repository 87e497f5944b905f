//! Token filter implementations for token transformation.
//!
//! Filters transform the token streams produced by tokenizers.
//!
//! # Available Filters
//!
//! - [`lowercase::LowercaseFilter`] - Converts tokens to lowercase
//! - [`stop::StopFilter`] - Removes stop words
//!
//! # Filter Chaining
//!
//! Filters are chained in an analyzer:
//!
//! ```text
//! Tokenizer → Lowercase → Stop Words → Index
//! ```

use crate::analysis::config::FilterConfig;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
///
/// # Examples
///
/// Implementing a custom filter:
///
/// ```
/// use lokisearch::analysis::token::{Token, TokenStream};
/// use lokisearch::analysis::token_filter::Filter;
/// use lokisearch::error::Result;
///
/// struct ReverseFilter;
///
/// impl Filter for ReverseFilter {
///     fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
///         let reversed: Vec<Token> = tokens
///             .map(|mut t| {
///                 t.text = t.text.chars().rev().collect();
///                 t
///             })
///             .collect();
///         Ok(Box::new(reversed.into_iter()))
///     }
///
///     fn name(&self) -> &'static str {
///         "reverse"
///     }
/// }
/// ```
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Serializable configuration that rebuilds this filter, if any.
    fn config(&self) -> Option<FilterConfig> {
        None
    }
}

pub mod lowercase;
pub mod stop;

pub use lowercase::LowercaseFilter;
pub use stop::StopFilter;
