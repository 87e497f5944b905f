//! Serializable analyzer configuration.
//!
//! Field declarations persist the configuration of their analyzer so that a
//! loaded index tokenizes new documents exactly like the one that was saved.
//! Built-in analyzers round-trip through [`AnalyzerConfig`]; analyzers built
//! from custom parts are persisted by name only and must be handed back by the
//! caller at load time.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::analyzer::standard::StandardAnalyzer;
use crate::analysis::token_filter::Filter;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
use crate::analysis::tokenizer::whitespace::WhitespaceTokenizer;
use crate::error::{LokiSearchError, Result};

/// Configuration of a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TokenizerConfig {
    /// A [`RegexTokenizer`].
    Regex {
        /// Token (or separator, with `gaps`) pattern.
        pattern: String,
        /// Whether the pattern matches separators instead of tokens.
        #[serde(default)]
        gaps: bool,
    },
    /// A [`WhitespaceTokenizer`].
    Whitespace,
    /// A [`UnicodeWordTokenizer`].
    UnicodeWord,
}

impl TokenizerConfig {
    /// Build the tokenizer this configuration describes.
    pub fn build(&self) -> Result<Arc<dyn Tokenizer>> {
        Ok(match self {
            TokenizerConfig::Regex { pattern, gaps: false } => {
                Arc::new(RegexTokenizer::with_pattern(pattern)?)
            }
            TokenizerConfig::Regex { pattern, gaps: true } => {
                Arc::new(RegexTokenizer::with_gaps(pattern)?)
            }
            TokenizerConfig::Whitespace => Arc::new(WhitespaceTokenizer::new()),
            TokenizerConfig::UnicodeWord => Arc::new(UnicodeWordTokenizer::new()),
        })
    }
}

/// Configuration of a token filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterConfig {
    /// A [`LowercaseFilter`].
    Lowercase,
    /// A [`StopFilter`].
    #[serde(rename_all = "camelCase")]
    Stop {
        /// The stop words.
        words: Vec<String>,
        /// Remove stopped tokens instead of marking them.
        #[serde(default = "default_true")]
        remove_stopped: bool,
    },
}

fn default_true() -> bool {
    true
}

impl FilterConfig {
    /// Build the filter this configuration describes.
    pub fn build(&self) -> Arc<dyn Filter> {
        match self {
            FilterConfig::Lowercase => Arc::new(LowercaseFilter::new()),
            FilterConfig::Stop {
                words,
                remove_stopped,
            } => Arc::new(StopFilter::from_words(words.iter().cloned()).remove_stopped(*remove_stopped)),
        }
    }
}

/// Configuration of a field analyzer, as persisted with the field options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnalyzerConfig {
    /// The [`StandardAnalyzer`]: alphanumeric split, lowercase.
    #[default]
    Standard,
    /// A [`PipelineAnalyzer`] made of built-in parts.
    Pipeline {
        /// The tokenizer.
        tokenizer: TokenizerConfig,
        /// Filters, applied in order.
        #[serde(default)]
        filters: Vec<FilterConfig>,
    },
    /// An analyzer supplied by the caller, identified by name.
    Custom {
        /// Name the caller registers the analyzer under.
        name: String,
    },
}

impl AnalyzerConfig {
    /// Build the analyzer this configuration describes.
    ///
    /// `Custom` configurations are resolved through `custom`, keyed by name;
    /// a missing entry is a schema mismatch.
    pub fn build(
        &self,
        custom: &AHashMap<String, Arc<dyn Analyzer>>,
    ) -> Result<Arc<dyn Analyzer>> {
        match self {
            AnalyzerConfig::Standard => Ok(Arc::new(StandardAnalyzer::new()?)),
            AnalyzerConfig::Pipeline { tokenizer, filters } => {
                let analyzer = filters
                    .iter()
                    .fold(PipelineAnalyzer::new(tokenizer.build()?), |analyzer, filter| {
                        analyzer.add_filter(filter.build())
                    });
                Ok(Arc::new(analyzer))
            }
            AnalyzerConfig::Custom { name } => custom.get(name).cloned().ok_or_else(|| {
                LokiSearchError::schema_mismatch(format!(
                    "custom analyzer '{name}' was not supplied"
                ))
            }),
        }
    }
}
