//! Posting lists.
//!
//! A [`PostingList`] holds one [`Posting`] per document that contains a term,
//! kept sorted by document id so lookups and merges are binary searches.

use serde::{Deserialize, Serialize};

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document ID.
    #[serde(rename = "d")]
    pub doc_id: u64,
    /// Term frequency in the document.
    #[serde(rename = "f")]
    pub frequency: u32,
    /// Token positions of the term in the document, ascending.
    #[serde(rename = "p", default)]
    pub positions: Vec<u32>,
}

impl Posting {
    /// Create a new posting with no occurrences yet.
    pub fn new(doc_id: u64) -> Self {
        Posting {
            doc_id,
            frequency: 0,
            positions: Vec::new(),
        }
    }

    /// Create a posting with positions.
    pub fn with_positions(doc_id: u64, positions: Vec<u32>) -> Self {
        Posting {
            doc_id,
            frequency: positions.len() as u32,
            positions,
        }
    }

    /// Add a position to this posting.
    pub fn add_position(&mut self, position: u32) {
        self.positions.push(position);
        self.frequency += 1;
    }

    /// Get the term frequency.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Get the positions.
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }
}

/// The postings of one term, unique per document and ordered by document id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    /// Create a new empty posting list.
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    /// Record one occurrence of the term in `doc_id` at `position`.
    pub fn add_occurrence(&mut self, doc_id: u64, position: u32) {
        match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(pos) => self.postings[pos].add_position(position),
            Err(pos) => {
                let mut posting = Posting::new(doc_id);
                posting.add_position(position);
                self.postings.insert(pos, posting);
            }
        }
    }

    /// Remove the posting of `doc_id`, returning it if present.
    pub fn remove(&mut self, doc_id: u64) -> Option<Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|pos| self.postings.remove(pos))
    }

    /// Get the posting of `doc_id`.
    pub fn get(&self, doc_id: u64) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    /// Check whether `doc_id` has a posting.
    pub fn contains(&self, doc_id: u64) -> bool {
        self.get(doc_id).is_some()
    }

    /// Get the length of the posting list (the document frequency).
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the posting list is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Total occurrences of the term across all documents.
    pub fn total_frequency(&self) -> u64 {
        self.postings.iter().map(|p| p.frequency as u64).sum()
    }

    /// Get an iterator over the postings.
    pub fn iter(&'_ self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    /// Get an iterator over the document ids, ascending.
    pub fn doc_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.postings.iter().map(|p| p.doc_id)
    }

    /// Restore the ordering and uniqueness guarantees after deserialization.
    ///
    /// Postings for the same document are merged.
    pub fn normalize(&mut self) {
        self.postings.sort_by_key(|p| p.doc_id);
        let mut merged: Vec<Posting> = Vec::with_capacity(self.postings.len());
        for posting in self.postings.drain(..) {
            match merged.last_mut() {
                Some(last) if last.doc_id == posting.doc_id => {
                    last.positions.extend(posting.positions);
                    last.frequency += posting.frequency;
                }
                _ => merged.push(posting),
            }
        }
        for posting in &mut merged {
            posting.positions.sort_unstable();
        }
        self.postings = merged;
    }
}

impl<'a> IntoIterator for &'a PostingList {
    type Item = &'a Posting;
    type IntoIter = std::slice::Iter<'a, Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
