//! Tokenizer implementations for text analysis.
//!
//! Tokenizers are the first step of the analysis pipeline: they split field
//! text into tokens and record each token's position and byte offsets.
//!
//! # Available Tokenizers
//!
//! - [`regex::RegexTokenizer`] - Extracts regex matches (default `\w+`)
//! - [`whitespace::WhitespaceTokenizer`] - Splits on whitespace characters
//! - [`unicode_word::UnicodeWordTokenizer`] - Uses Unicode word boundaries
//!
//! # Examples
//!
//! ```
//! use lokisearch::analysis::tokenizer::Tokenizer;
//! use lokisearch::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use crate::analysis::config::TokenizerConfig;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokenizers must be pure: tokenizing the same text twice yields the same
/// stream, and no state is carried between calls.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Serializable configuration that rebuilds this tokenizer, if any.
    ///
    /// Custom tokenizers return `None` and must be supplied again by the
    /// caller when a persisted index is loaded.
    fn config(&self) -> Option<TokenizerConfig> {
        None
    }
}

pub mod regex;
pub mod unicode_word;
pub mod whitespace;

pub use regex::RegexTokenizer;
pub use unicode_word::UnicodeWordTokenizer;
pub use whitespace::WhitespaceTokenizer;
