//! Per-field inverted index.
//!
//! The term dictionary is a `BTreeMap` so that fuzzy, prefix and wildcard
//! lookups can walk it in order. When the field is declared with
//! `optimize_changes`, a reverse map from doc id to term set lets removals
//! touch only the terms of the removed document; otherwise removals scan the
//! whole dictionary. Both paths leave the index in the same state.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::automaton::levenshtein::LevenshteinAutomaton;
use crate::error::Result;
use crate::full_text_search::document::FieldExtractor;
use crate::index::field::FieldOptions;
use crate::index::posting::PostingList;
use crate::index::wildcard::WildcardPattern;

/// A dictionary term within the requested edit distance of a fuzzy term.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatch<'a> {
    /// The matched dictionary term.
    pub term: &'a str,
    /// Its edit distance to the fuzzy term.
    pub distance: u32,
    /// Its postings.
    pub postings: &'a PostingList,
}

/// Persisted postings of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPayload {
    pub doc_count: usize,
    pub terms: BTreeMap<String, PostingList>,
}

/// The inverted index of one declared field.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
    options: FieldOptions,
    /// Term dictionary.
    terms: BTreeMap<String, PostingList>,
    /// Indexed token count per document; its keys are the field universe.
    field_lengths: AHashMap<u64, u32>,
    /// Terms per document, maintained only with `optimize_changes`.
    doc_terms: AHashMap<u64, AHashSet<String>>,
}

impl InvertedIndex {
    /// Create an empty index for a field.
    pub fn new(options: FieldOptions) -> Self {
        InvertedIndex {
            options,
            terms: BTreeMap::new(),
            field_lengths: AHashMap::new(),
            doc_terms: AHashMap::new(),
        }
    }

    /// Get the field options.
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Replace how the field text is read from documents.
    pub fn set_extractor(&mut self, extractor: Arc<dyn FieldExtractor>) {
        self.options = self.options.clone().with_extractor(extractor);
    }

    /// Analyze `text` with the field analyzer.
    pub fn analyze(&self, text: &str) -> Result<Vec<Token>> {
        Ok(self.options.analyzer().analyze(text)?.collect())
    }

    /// Index the tokens of a document.
    ///
    /// Stopped tokens keep their positions but are not indexed. A document
    /// that yields no indexable token is not part of the field universe.
    /// Inserting a document that is already indexed replaces it.
    pub fn insert<I>(&mut self, doc_id: u64, tokens: I)
    where
        I: IntoIterator<Item = Token>,
    {
        if self.field_lengths.contains_key(&doc_id) {
            debug!(
                "field '{}': doc {} already indexed, replacing it",
                self.options.name(),
                doc_id
            );
            self.remove(doc_id);
        }

        let mut field_length = 0u32;
        let mut doc_terms = AHashSet::new();

        for token in tokens.into_iter().filter(|t| !t.is_stopped()) {
            field_length += 1;
            self.terms
                .entry(token.text.clone())
                .or_default()
                .add_occurrence(doc_id, token.position as u32);
            if self.options.optimize_changes() {
                doc_terms.insert(token.text);
            }
        }

        if field_length == 0 {
            trace!("field '{}': doc {} has no terms", self.options.name(), doc_id);
            return;
        }

        trace!(
            "field '{}': indexed doc {} ({} tokens)",
            self.options.name(),
            doc_id,
            field_length
        );
        self.field_lengths.insert(doc_id, field_length);
        if self.options.optimize_changes() {
            self.doc_terms.insert(doc_id, doc_terms);
        }
    }

    /// Analyze `text` and index it for `doc_id`.
    pub fn insert_text(&mut self, doc_id: u64, text: &str) -> Result<()> {
        let tokens = self.analyze(text)?;
        self.insert(doc_id, tokens);
        Ok(())
    }

    /// Remove a document. Returns `false` if it was not indexed.
    pub fn remove(&mut self, doc_id: u64) -> bool {
        if self.field_lengths.remove(&doc_id).is_none() {
            return false;
        }

        if self.options.optimize_changes() {
            let doc_terms = self.doc_terms.remove(&doc_id).unwrap_or_default();
            for term in &doc_terms {
                if let Some(postings) = self.terms.get_mut(term) {
                    postings.remove(doc_id);
                    if postings.is_empty() {
                        self.terms.remove(term);
                    }
                }
            }
            trace!(
                "field '{}': removed doc {} via term set ({} terms)",
                self.options.name(),
                doc_id,
                doc_terms.len()
            );
        } else {
            self.terms.retain(|_, postings| {
                postings.remove(doc_id);
                !postings.is_empty()
            });
            trace!(
                "field '{}': removed doc {} via dictionary scan",
                self.options.name(),
                doc_id
            );
        }

        true
    }

    /// Replace the indexed tokens of a document. Behaves as an insert for an
    /// unseen doc id.
    pub fn update<I>(&mut self, doc_id: u64, tokens: I)
    where
        I: IntoIterator<Item = Token>,
    {
        self.remove(doc_id);
        self.insert(doc_id, tokens);
    }

    /// Analyze `text` and replace the indexed tokens of `doc_id` with it.
    ///
    /// Analysis happens before the index is touched, so a failing analyzer
    /// leaves the old document in place.
    pub fn update_text(&mut self, doc_id: u64, text: &str) -> Result<()> {
        let tokens = self.analyze(text)?;
        self.update(doc_id, tokens);
        Ok(())
    }

    /// Get the postings of an exact term.
    pub fn lookup(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    /// Every term within `max_edits` of `term`, with transpositions counted
    /// as one edit.
    pub fn lookup_fuzzy(&self, term: &str, max_edits: u32) -> Result<Vec<FuzzyMatch<'_>>> {
        self.lookup_fuzzy_with_prefix(term, max_edits, 0)
    }

    /// Like [`InvertedIndex::lookup_fuzzy`], but the first `prefix_length`
    /// chars must match exactly.
    pub fn lookup_fuzzy_with_prefix(
        &self,
        term: &str,
        max_edits: u32,
        prefix_length: usize,
    ) -> Result<Vec<FuzzyMatch<'_>>> {
        let automaton = LevenshteinAutomaton::new(term, max_edits, prefix_length, true)?;
        let matches: Vec<FuzzyMatch<'_>> = automaton
            .intersect(&self.terms)
            .into_iter()
            .map(|m| FuzzyMatch {
                term: m.term,
                distance: m.distance,
                postings: m.value,
            })
            .collect();

        debug!(
            "field '{}': fuzzy '{}'~{} matched {} of {} terms",
            self.options.name(),
            term,
            max_edits,
            matches.len(),
            self.terms.len()
        );
        Ok(matches)
    }

    /// Every term starting with `prefix`, in dictionary order.
    pub fn lookup_prefix(&self, prefix: &str) -> Vec<(&str, &PostingList)> {
        self.terms
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(term, _)| term.starts_with(prefix))
            .map(|(term, postings)| (term.as_str(), postings))
            .collect()
    }

    /// Every term matching a wildcard pattern (`*`, `?`), in dictionary order.
    pub fn lookup_wildcard(&self, pattern: &str) -> Result<Vec<(&str, &PostingList)>> {
        let pattern = WildcardPattern::new(pattern)?;
        Ok(self
            .lookup_prefix(pattern.literal_prefix())
            .into_iter()
            .filter(|(term, _)| pattern.matches(term))
            .collect())
    }

    /// The documents indexed in this field, ascending.
    pub fn doc_ids(&self) -> Vec<u64> {
        let mut doc_ids: Vec<u64> = self.field_lengths.keys().copied().collect();
        doc_ids.sort_unstable();
        doc_ids
    }

    /// Check whether a document is indexed in this field.
    pub fn contains_doc(&self, doc_id: u64) -> bool {
        self.field_lengths.contains_key(&doc_id)
    }

    /// Number of indexed tokens of a document.
    pub fn field_length(&self, doc_id: u64) -> Option<u32> {
        self.field_lengths.get(&doc_id).copied()
    }

    /// The dictionary terms, in order.
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.keys().map(String::as_str)
    }

    /// Get the number of indexed documents.
    pub fn doc_count(&self) -> usize {
        self.field_lengths.len()
    }

    /// Get the number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Drop every posting.
    pub fn clear(&mut self) {
        self.terms.clear();
        self.field_lengths.clear();
        self.doc_terms.clear();
    }

    /// Persisted postings, or `None` for a field declared with `store = false`.
    pub fn serialize(&self) -> Option<IndexPayload> {
        if !self.options.store() {
            return None;
        }
        Some(IndexPayload {
            doc_count: self.doc_count(),
            terms: self.terms.clone(),
        })
    }

    /// Rebuild an index from persisted postings.
    ///
    /// Unstored fields always start empty and are refilled by replaying
    /// documents.
    pub fn deserialize(options: FieldOptions, payload: Option<IndexPayload>) -> Self {
        let mut index = InvertedIndex::new(options);

        let payload = match payload {
            Some(payload) if index.options.store() => payload,
            Some(_) => {
                warn!(
                    "field '{}' is not stored, ignoring persisted postings",
                    index.options.name()
                );
                return index;
            }
            None => {
                if index.options.store() {
                    warn!(
                        "stored field '{}' has no persisted postings, starting empty",
                        index.options.name()
                    );
                }
                return index;
            }
        };

        for (term, mut postings) in payload.terms {
            postings.normalize();
            if postings.is_empty() {
                continue;
            }
            for posting in &postings {
                *index.field_lengths.entry(posting.doc_id).or_default() += posting.frequency;
                if index.options.optimize_changes() {
                    index
                        .doc_terms
                        .entry(posting.doc_id)
                        .or_default()
                        .insert(term.clone());
                }
            }
            index.terms.insert(term, postings);
        }

        if index.doc_count() != payload.doc_count {
            warn!(
                "field '{}': persisted doc count {} differs from {} documents in postings",
                index.options.name(),
                payload.doc_count,
                index.doc_count()
            );
        }
        debug!(
            "field '{}': loaded {} terms for {} documents",
            index.options.name(),
            index.term_count(),
            index.doc_count()
        );

        index
    }
}
