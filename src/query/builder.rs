//! Building and validating queries.
//!
//! A [`QueryBuilder`] knows the declared fields of the index it was created
//! for. Clauses are collected like a boolean query and [`QueryBuilder::build`]
//! checks the whole tree before handing out an immutable [`Query`].

use ahash::AHashSet;

use crate::automaton::levenshtein::MAX_SUPPORTED_EDITS;
use crate::error::{LokiSearchError, Result};
use crate::index::wildcard::WildcardPattern;
use crate::query::query::Query;

/// Check every field reference and every fuzzy parameter of `query`.
///
/// Fails with `UnknownField` on the first undeclared field, and with
/// `AutomatonBuild` on a fuzziness above [`MAX_SUPPORTED_EDITS`].
pub fn validate_query<F>(query: &Query, is_declared: F) -> Result<()>
where
    F: Fn(&str) -> bool,
{
    let mut error = None;
    query.visit(&mut |node| {
        if error.is_some() {
            return;
        }
        if let Some(field) = node.field() {
            if !is_declared(field) {
                error = Some(LokiSearchError::unknown_field(field));
                return;
            }
        }
        match node {
            Query::Fuzzy { fuzziness, .. } if *fuzziness > MAX_SUPPORTED_EDITS => {
                error = Some(LokiSearchError::automaton_build(format!(
                    "fuzziness {fuzziness} exceeds the supported maximum of {MAX_SUPPORTED_EDITS}"
                )));
            }
            Query::Wildcard { value, .. } => {
                if let Err(e) = WildcardPattern::new(value) {
                    error = Some(e);
                }
            }
            _ => {}
        }
    });

    match error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Builder for validated queries.
///
/// # Examples
///
/// ```
/// use lokisearch::query::builder::QueryBuilder;
/// use lokisearch::query::query::Query;
///
/// let query = QueryBuilder::new(["title", "body"])
///     .must(Query::term("title", "quick"))
///     .must_not(Query::term("body", "dog"))
///     .build()
///     .unwrap();
/// assert_eq!(query.fields(), vec!["body", "title"]);
///
/// let err = QueryBuilder::new(["title"])
///     .must(Query::term("author", "ann"))
///     .build();
/// assert!(err.is_err());
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    fields: AHashSet<String>,
    must: Vec<Query>,
    should: Vec<Query>,
    must_not: Vec<Query>,
}

impl QueryBuilder {
    /// Create a builder for an index with the given declared fields.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryBuilder {
            fields: fields.into_iter().map(Into::into).collect(),
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
        }
    }

    /// Add a clause every result must match.
    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    /// Add a clause of which at least one must match.
    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    /// Add a clause no result may match.
    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    /// Validate the clauses and combine them into one query.
    ///
    /// A single clause is returned as is; should clauses are grouped under an
    /// `Or` that is itself required when other clauses exist. A builder without
    /// clauses yields an empty `And`, which matches nothing.
    pub fn build(self) -> Result<Query> {
        let QueryBuilder {
            fields,
            must,
            mut should,
            must_not,
        } = self;

        let mut clauses = must;
        match should.len() {
            0 => {}
            1 => clauses.extend(should.pop()),
            _ => clauses.push(Query::or(should)),
        }
        clauses.extend(must_not.into_iter().map(Query::not));

        let query = if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Query::and(clauses)
        };

        validate_query(&query, |field| fields.contains(field))?;
        Ok(query)
    }
}
