//! The analyzer trait.

use std::any::Any;
use std::fmt::Debug;

use crate::analysis::config::AnalyzerConfig;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that turn field text into index tokens.
///
/// Analyzers must be pure: analyzing the same text twice yields the same
/// tokens.
pub trait Analyzer: Send + Sync + Debug {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer.
    fn name(&self) -> &str;

    /// Configuration persisted alongside the field declaration.
    ///
    /// Defaults to a `Custom` entry keyed by [`Analyzer::name`].
    fn config(&self) -> AnalyzerConfig {
        AnalyzerConfig::Custom {
            name: self.name().to_string(),
        }
    }

    /// Get this analyzer as Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}
