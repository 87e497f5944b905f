//! Query evaluation.
//!
//! Leaves resolve to a map from doc id to score; composites merge those maps.
//! Scores are plain sums of term frequencies, so results are reproducible and
//! independent of collection statistics.

use std::cmp::Ordering;

use ahash::{AHashMap, AHashSet};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LokiSearchError, Result};
use crate::index::inverted_index::InvertedIndex;
use crate::index::posting::PostingList;
use crate::query::query::{Operator, Query};

/// A matched document and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDoc {
    pub doc_id: u64,
    pub score: f32,
}

type Scores = AHashMap<u64, f32>;

/// Evaluates queries against a set of field indexes.
pub struct QueryEvaluator<'a> {
    indexes: &'a AHashMap<String, InvertedIndex>,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(indexes: &'a AHashMap<String, InvertedIndex>) -> Self {
        QueryEvaluator { indexes }
    }

    /// Evaluate `query`, returning matches by descending score, ties broken by
    /// ascending doc id.
    pub fn evaluate(&self, query: &Query) -> Result<Vec<ScoredDoc>> {
        let scores = self.scores(query)?;
        let mut results: Vec<ScoredDoc> = scores
            .into_iter()
            .map(|(doc_id, score)| ScoredDoc { doc_id, score })
            .collect();
        results.sort_by(compare_scored);

        debug!("query matched {} documents", results.len());
        Ok(results)
    }

    fn index(&self, field: &str) -> Result<&'a InvertedIndex> {
        self.indexes
            .get(field)
            .ok_or_else(|| LokiSearchError::unknown_field(field))
    }

    fn scores(&self, query: &Query) -> Result<Scores> {
        match query {
            Query::Term { field, value } => Ok(term_scores(self.index(field)?, value)),
            Query::Terms { field, values } => {
                let index = self.index(field)?;
                let distinct: AHashSet<&String> = values.iter().collect();
                Ok(sum_all(distinct.into_iter().map(|value| term_scores(index, value))))
            }
            Query::Fuzzy {
                field,
                value,
                fuzziness,
                prefix_length,
            } => {
                let mut scores = Scores::new();
                for m in self
                    .index(field)?
                    .lookup_fuzzy_with_prefix(value, *fuzziness, *prefix_length)?
                {
                    let weight = 1.0 / (1.0 + m.distance as f32);
                    for posting in m.postings {
                        let score = posting.frequency as f32 * weight;
                        let entry = scores.entry(posting.doc_id).or_insert(score);
                        *entry = entry.max(score);
                    }
                }
                Ok(scores)
            }
            Query::Prefix { field, value } => {
                let mut scores = Scores::new();
                for (_, postings) in self.index(field)?.lookup_prefix(value) {
                    add_postings(&mut scores, postings);
                }
                Ok(scores)
            }
            Query::Wildcard { field, value } => {
                let mut scores = Scores::new();
                for (_, postings) in self.index(field)?.lookup_wildcard(value)? {
                    add_postings(&mut scores, postings);
                }
                Ok(scores)
            }
            Query::Match {
                field,
                value,
                operator,
            } => {
                let index = self.index(field)?;
                let mut seen = AHashSet::new();
                let per_term: Vec<Scores> = index
                    .analyze(value)?
                    .into_iter()
                    .filter(|token| !token.is_stopped() && seen.insert(token.text.clone()))
                    .map(|token| term_scores(index, &token.text))
                    .collect();
                Ok(match operator {
                    Operator::Or => sum_all(per_term),
                    Operator::And => intersect_all(per_term),
                })
            }
            Query::Exists { field } => Ok(constant_scores(self.index(field)?.doc_ids(), 1.0)),
            Query::MatchAll => Ok(constant_scores(
                self.indexes.values().flat_map(|index| index.doc_ids()),
                1.0,
            )),
            Query::And { queries } => {
                let children = queries
                    .iter()
                    .map(|q| self.scores(q))
                    .collect::<Result<Vec<_>>>()?;
                Ok(intersect_all(children))
            }
            Query::Or { queries } => {
                let children = queries
                    .iter()
                    .map(|q| self.scores(q))
                    .collect::<Result<Vec<_>>>()?;
                Ok(sum_all(children))
            }
            Query::Not { query } => {
                let excluded = self.scores(query)?;
                let universe = self.universe(query)?;
                Ok(constant_scores(
                    universe.into_iter().filter(|doc_id| !excluded.contains_key(doc_id)),
                    0.0,
                ))
            }
        }
    }

    /// The documents of every field referenced by `query`, or of every field
    /// when it contains a `MatchAll`.
    fn universe(&self, query: &Query) -> Result<AHashSet<u64>> {
        if query.contains_match_all() {
            return Ok(self.indexes.values().flat_map(|index| index.doc_ids()).collect());
        }
        let mut universe = AHashSet::new();
        for field in query.fields() {
            universe.extend(self.index(field)?.doc_ids());
        }
        Ok(universe)
    }
}

fn compare_scored(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

fn term_scores(index: &InvertedIndex, term: &str) -> Scores {
    let mut scores = Scores::new();
    if let Some(postings) = index.lookup(term) {
        add_postings(&mut scores, postings);
    }
    scores
}

fn add_postings(scores: &mut Scores, postings: &PostingList) {
    for posting in postings {
        *scores.entry(posting.doc_id).or_insert(0.0) += posting.frequency as f32;
    }
}

fn constant_scores<I: IntoIterator<Item = u64>>(doc_ids: I, score: f32) -> Scores {
    doc_ids.into_iter().map(|doc_id| (doc_id, score)).collect()
}

fn sum_all<I: IntoIterator<Item = Scores>>(children: I) -> Scores {
    let mut merged = Scores::new();
    for child in children {
        for (doc_id, score) in child {
            *merged.entry(doc_id).or_insert(0.0) += score;
        }
    }
    merged
}

/// Score-summed intersection; no children means no matches.
fn intersect_all(mut children: Vec<Scores>) -> Scores {
    // Start from the smallest child to keep the working set small.
    children.sort_by_key(|child| child.len());
    let mut iter = children.into_iter();
    let Some(mut merged) = iter.next() else {
        return Scores::new();
    };
    for child in iter {
        merged.retain(|doc_id, score| match child.get(doc_id) {
            Some(other) => {
                *score += other;
                true
            }
            None => false,
        });
    }
    merged
}
