//! Text analysis: turning field text into normalized index terms.
//!
//! A [`tokenizer::Tokenizer`] splits text into tokens, [`token_filter::Filter`]s
//! rewrite the token stream, and an [`analyzer::Analyzer`] ties them together.
//! Each declared field owns one analyzer.

pub mod analyzer;
pub mod config;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, PipelineAnalyzer, StandardAnalyzer};
pub use config::{AnalyzerConfig, FilterConfig, TokenizerConfig};
pub use token::{Token, TokenStream};
