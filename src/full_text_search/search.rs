//! Full-text search over host documents.
//!
//! # Examples
//!
//! ```
//! use lokisearch::full_text_search::search::FullTextSearch;
//! use lokisearch::index::field::FieldOptions;
//! use lokisearch::query::query::Query;
//! use serde_json::json;
//!
//! let mut fts = FullTextSearch::new(vec![FieldOptions::new("title")]).unwrap();
//! fts.add_document(&json!({ "$loki": 1, "title": "The quick fox" }), None).unwrap();
//! fts.add_document(&json!({ "$loki": 2, "title": "The quick dog" }), None).unwrap();
//!
//! let hits = fts.search(&Query::term("title", "quick")).unwrap();
//! let ids: Vec<u64> = hits.iter().map(|hit| hit.doc_id).collect();
//! assert_eq!(ids, vec![1, 2]);
//! ```

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, trace, warn};
use serde_json::Value;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::error::{LokiSearchError, Result};
use crate::full_text_search::document::{DEFAULT_ID_PROPERTY, FieldExtractor, resolve_doc_id};
use crate::full_text_search::serialization::SearchPayload;
use crate::index::field::FieldOptions;
use crate::index::inverted_index::InvertedIndex;
use crate::query::builder::{QueryBuilder, validate_query};
use crate::query::evaluator::{QueryEvaluator, ScoredDoc};
use crate::query::query::Query;

/// Keeps one inverted index per declared field in sync with host documents.
#[derive(Debug, Clone)]
pub struct FullTextSearch {
    id_property: String,
    /// Declaration order.
    field_names: Vec<String>,
    indexes: AHashMap<String, InvertedIndex>,
    dirty: bool,
}

impl FullTextSearch {
    /// Create a search over the given fields.
    ///
    /// Field names must be unique.
    pub fn new(fields: Vec<FieldOptions>) -> Result<Self> {
        let mut search = FullTextSearch {
            id_property: DEFAULT_ID_PROPERTY.to_string(),
            field_names: Vec::with_capacity(fields.len()),
            indexes: AHashMap::with_capacity(fields.len()),
            dirty: false,
        };

        for options in fields {
            let name = options.name().to_string();
            if search.indexes.contains_key(&name) {
                return Err(LokiSearchError::invalid_argument(format!(
                    "field '{name}' declared twice"
                )));
            }
            search.indexes.insert(name.clone(), InvertedIndex::new(options));
            search.field_names.push(name);
        }

        Ok(search)
    }

    /// Read document ids from `name` instead of `$loki`.
    pub fn with_id_property<S: Into<String>>(mut self, name: S) -> Self {
        self.id_property = name.into();
        self
    }

    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.field_names.iter().map(String::as_str).collect()
    }

    /// Whether the in-memory state differs from the last persisted snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag once the storage adapter reports a successful
    /// save.
    pub fn mark_persisted(&mut self) {
        self.dirty = false;
    }

    /// Get the index of a declared field.
    pub fn index(&self, field: &str) -> Result<&InvertedIndex> {
        self.indexes
            .get(field)
            .ok_or_else(|| LokiSearchError::unknown_field(field))
    }

    /// Replace the extractor of a declared field. Loaded searches start with
    /// property extractors, so hosts re-attach custom ones here.
    pub fn set_extractor(&mut self, field: &str, extractor: Arc<dyn FieldExtractor>) -> Result<()> {
        self.indexes
            .get_mut(field)
            .ok_or_else(|| LokiSearchError::unknown_field(field))?
            .set_extractor(extractor);
        Ok(())
    }

    /// A query builder that validates against the declared fields.
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.field_names.iter().cloned())
    }

    /// Analyze every declared field of `doc`, in declaration order.
    ///
    /// Nothing is mutated, so a failure here leaves the search untouched.
    fn analyze_document(&self, doc: &Value) -> Result<Vec<(String, Option<Vec<Token>>)>> {
        self.field_names
            .iter()
            .filter_map(|name| self.indexes.get(name).map(|index| (name, index)))
            .map(|(name, index)| -> Result<(String, Option<Vec<Token>>)> {
                let tokens = match index.options().extractor().extract(doc) {
                    Some(text) => Some(index.analyze(&text)?),
                    None => None,
                };
                Ok((name.clone(), tokens))
            })
            .collect()
    }

    /// Index a document.
    ///
    /// An explicit `id` overrides the id property of the document. Fields the
    /// document has no text for are skipped.
    pub fn add_document(&mut self, doc: &Value, id: Option<u64>) -> Result<()> {
        let doc_id = resolve_doc_id(doc, id, &self.id_property)?;
        let analyzed = self.analyze_document(doc)?;

        for (field, tokens) in analyzed {
            if let (Some(index), Some(tokens)) = (self.indexes.get_mut(&field), tokens) {
                index.insert(doc_id, tokens);
            }
        }

        trace!("added doc {doc_id}");
        self.dirty = true;
        Ok(())
    }

    /// Remove a document from every field. Removing an unknown document is a
    /// no-op and leaves the dirty flag untouched.
    pub fn remove_document(&mut self, doc: &Value, id: Option<u64>) -> Result<()> {
        let doc_id = resolve_doc_id(doc, id, &self.id_property)?;

        let mut removed = false;
        for index in self.indexes.values_mut() {
            removed |= index.remove(doc_id);
        }

        if removed {
            trace!("removed doc {doc_id}");
            self.dirty = true;
        }
        Ok(())
    }

    /// Replace the indexed content of a document.
    ///
    /// The whole document is analyzed before any index changes, so either
    /// every field reflects the new document or none does.
    pub fn update_document(&mut self, doc: &Value, id: Option<u64>) -> Result<()> {
        let doc_id = resolve_doc_id(doc, id, &self.id_property)?;
        let analyzed = self.analyze_document(doc)?;

        for (field, tokens) in analyzed {
            if let Some(index) = self.indexes.get_mut(&field) {
                match tokens {
                    Some(tokens) => index.update(doc_id, tokens),
                    None => {
                        index.remove(doc_id);
                    }
                }
            }
        }

        trace!("updated doc {doc_id}");
        self.dirty = true;
        Ok(())
    }

    /// Index a document into the unstored fields only.
    ///
    /// Used after a load to rebuild fields whose postings were not persisted;
    /// it does not mark the search dirty.
    pub fn replay_document(&mut self, doc: &Value, id: Option<u64>) -> Result<()> {
        let doc_id = resolve_doc_id(doc, id, &self.id_property)?;
        let analyzed = self.analyze_document(doc)?;

        for (field, tokens) in analyzed {
            if let Some(index) = self.indexes.get_mut(&field) {
                if let (false, Some(tokens)) = (index.options().store(), tokens) {
                    index.insert(doc_id, tokens);
                }
            }
        }
        Ok(())
    }

    /// Drop every posting of every field.
    pub fn clear(&mut self) {
        for index in self.indexes.values_mut() {
            index.clear();
        }
        debug!("cleared {} field indexes", self.indexes.len());
        self.dirty = true;
    }

    /// Run a query. Fails with `UnknownField` if it references an undeclared
    /// field.
    pub fn search(&self, query: &Query) -> Result<Vec<ScoredDoc>> {
        validate_query(query, |field| self.indexes.contains_key(field))?;
        QueryEvaluator::new(&self.indexes).evaluate(query)
    }

    /// Snapshot the search.
    pub fn to_payload(&self) -> SearchPayload {
        let fields = self
            .field_names
            .iter()
            .filter_map(|name| self.indexes.get(name))
            .map(|index| index.options().config())
            .collect();

        let indexes = self
            .field_names
            .iter()
            .filter_map(|name| {
                let payload = self.indexes.get(name)?.serialize()?;
                Some((name.clone(), payload))
            })
            .collect();

        SearchPayload {
            id_property: (self.id_property != DEFAULT_ID_PROPERTY).then(|| self.id_property.clone()),
            fields,
            dirty: self.dirty,
            indexes,
        }
    }

    /// Snapshot the search as a JSON value.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_payload())?)
    }

    /// Snapshot the search as a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_payload())?)
    }

    /// Rebuild a search from a snapshot.
    ///
    /// `analyzers` supplies every custom analyzer by name. Unstored fields
    /// start empty; rebuild them with [`FullTextSearch::replay_document`].
    pub fn from_payload(payload: SearchPayload, analyzers: &[Arc<dyn Analyzer>]) -> Result<Self> {
        let custom: AHashMap<String, Arc<dyn Analyzer>> = analyzers
            .iter()
            .map(|analyzer| (analyzer.name().to_string(), Arc::clone(analyzer)))
            .collect();

        let SearchPayload {
            id_property,
            fields,
            dirty,
            mut indexes,
        } = payload;

        if let Some(field) = indexes
            .keys()
            .find(|name| !fields.iter().any(|config| &config.name == *name))
        {
            return Err(LokiSearchError::schema_mismatch(format!(
                "persisted index for undeclared field '{field}'"
            )));
        }

        let mut search = FullTextSearch {
            id_property: id_property.unwrap_or_else(|| DEFAULT_ID_PROPERTY.to_string()),
            field_names: Vec::with_capacity(fields.len()),
            indexes: AHashMap::with_capacity(fields.len()),
            // Unstored fields load empty until documents are replayed.
            dirty: dirty || fields.iter().any(|config| !config.store),
        };

        for config in &fields {
            if search.indexes.contains_key(&config.name) {
                return Err(LokiSearchError::schema_mismatch(format!(
                    "field '{}' declared twice",
                    config.name
                )));
            }

            let options = FieldOptions::from_config(config, &custom)?;
            if !options.store() {
                warn!(
                    "field '{}' is not stored; replay documents to rebuild it",
                    config.name
                );
            }
            let index = InvertedIndex::deserialize(options, indexes.remove(&config.name));
            search.indexes.insert(config.name.clone(), index);
            search.field_names.push(config.name.clone());
        }

        debug!("loaded full-text search over {} fields", search.field_names.len());
        Ok(search)
    }

    /// Rebuild a search from a JSON snapshot.
    pub fn from_json_object(payload: Value, analyzers: &[Arc<dyn Analyzer>]) -> Result<Self> {
        Self::from_payload(serde_json::from_value(payload)?, analyzers)
    }

    /// Rebuild a search from a JSON string snapshot.
    pub fn from_json_str(payload: &str, analyzers: &[Arc<dyn Analyzer>]) -> Result<Self> {
        Self::from_payload(serde_json::from_str(payload)?, analyzers)
    }
}
