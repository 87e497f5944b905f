//! Analyzers combine a tokenizer with a chain of token filters.
//!
//! An [`analyzer::Analyzer`] is what a field uses to turn its text into index
//! terms. [`standard::StandardAnalyzer`] is the default for every field.

#[allow(clippy::module_inception)]
pub mod analyzer;
pub mod pipeline;
pub mod standard;

pub use analyzer::Analyzer;
pub use pipeline::PipelineAnalyzer;
pub use standard::StandardAnalyzer;
