//! Field declarations.
//!
//! A [`FieldOptions`] declares one indexed field: its name, whether its
//! postings are persisted, which removal path its index uses, how its text is
//! analyzed, and how that text is pulled out of a document.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::standard::StandardAnalyzer;
use crate::analysis::config::AnalyzerConfig;
use crate::error::Result;
use crate::full_text_search::document::{FieldExtractor, PropertyExtractor};

/// Options of one indexed field.
///
/// # Examples
///
/// ```
/// use lokisearch::index::field::FieldOptions;
///
/// let options = FieldOptions::new("title")
///     .with_store(false)
///     .with_optimize_changes(false);
/// assert_eq!(options.name(), "title");
/// assert!(!options.store());
/// ```
#[derive(Clone)]
pub struct FieldOptions {
    name: String,
    store: bool,
    optimize_changes: bool,
    analyzer: Arc<dyn Analyzer>,
    extractor: Arc<dyn FieldExtractor>,
}

impl FieldOptions {
    /// Declare a field with the default options: stored, optimized for
    /// changes, analyzed by [`StandardAnalyzer`], read from the property of
    /// the same name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        FieldOptions {
            extractor: Arc::new(PropertyExtractor::new(name.clone())),
            name,
            store: true,
            optimize_changes: true,
            analyzer: Arc::new(StandardAnalyzer::default()),
        }
    }

    /// Persist the postings of this field (default `true`). Unstored fields
    /// are rebuilt by replaying documents after a load.
    pub fn with_store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    /// Keep a doc id to term set map for cheap removals (default `true`).
    pub fn with_optimize_changes(mut self, optimize_changes: bool) -> Self {
        self.optimize_changes = optimize_changes;
        self
    }

    /// Set the analyzer.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Set how the field text is read from a document.
    pub fn with_extractor(mut self, extractor: Arc<dyn FieldExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> bool {
        self.store
    }

    pub fn optimize_changes(&self) -> bool {
        self.optimize_changes
    }

    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    pub fn extractor(&self) -> &Arc<dyn FieldExtractor> {
        &self.extractor
    }

    /// The serializable part of these options.
    pub fn config(&self) -> FieldConfig {
        FieldConfig {
            name: self.name.clone(),
            store: self.store,
            optimize_changes: self.optimize_changes,
            tokenizer: self.analyzer.config(),
        }
    }

    /// Rebuild options from a persisted declaration.
    ///
    /// Custom analyzers are looked up by name in `analyzers`. The extractor is
    /// always the default property extractor.
    pub fn from_config(
        config: &FieldConfig,
        analyzers: &AHashMap<String, Arc<dyn Analyzer>>,
    ) -> Result<Self> {
        Ok(FieldOptions::new(config.name.clone())
            .with_store(config.store)
            .with_optimize_changes(config.optimize_changes)
            .with_analyzer(config.tokenizer.build(analyzers)?))
    }
}

impl std::fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldOptions")
            .field("name", &self.name)
            .field("store", &self.store)
            .field("optimize_changes", &self.optimize_changes)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

/// Persisted form of a field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub store: bool,
    #[serde(default = "default_true")]
    pub optimize_changes: bool,
    #[serde(default)]
    pub tokenizer: AnalyzerConfig,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FieldOptions::new("body");
        assert!(options.store());
        assert!(options.optimize_changes());
        assert_eq!(options.analyzer().name(), "standard");

        let config = options.config();
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            serde_json::json!({
                "name": "body",
                "store": true,
                "optimizeChanges": true,
                "tokenizer": { "type": "standard" }
            })
        );
    }

    #[test]
    fn test_config_defaults_on_load() {
        let config: FieldConfig = serde_json::from_str(r#"{"name":"title"}"#).unwrap();
        let options = FieldOptions::from_config(&config, &AHashMap::new()).unwrap();

        assert_eq!(options.name(), "title");
        assert!(options.store());
        assert_eq!(options.config(), config);
    }
}
