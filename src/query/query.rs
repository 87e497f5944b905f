//! The query tree.
//!
//! Leaves address one field each and never analyze their value, except
//! [`Query::Match`] which runs the field analyzer over its text. Composite
//! queries combine child results by score.
//!
//! # Examples
//!
//! ```
//! use lokisearch::query::query::Query;
//!
//! let query = Query::and(vec![
//!     Query::term("title", "quick"),
//!     Query::not(Query::fuzzy("title", "dgo").with_fuzziness(1)),
//! ]);
//! assert_eq!(query.fields(), vec!["title"]);
//! ```

use serde::{Deserialize, Serialize};

/// Default fuzziness of a [`Query::Fuzzy`].
pub const DEFAULT_FUZZINESS: u32 = 2;

fn default_fuzziness() -> u32 {
    DEFAULT_FUZZINESS
}

/// How the terms of a [`Query::Match`] combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    /// Any term matches; scores are summed.
    #[default]
    Or,
    /// Every term must match; scores are summed.
    And,
}

/// A query over one or more field indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Query {
    /// Documents containing an exact term.
    Term { field: String, value: String },
    /// Documents containing any of several exact terms.
    Terms { field: String, values: Vec<String> },
    /// Documents containing a term within `fuzziness` edits of `value`.
    #[serde(rename_all = "camelCase")]
    Fuzzy {
        field: String,
        value: String,
        #[serde(default = "default_fuzziness")]
        fuzziness: u32,
        #[serde(default)]
        prefix_length: usize,
    },
    /// Documents containing a term that starts with `value`.
    Prefix { field: String, value: String },
    /// Documents containing a term matching a `*`/`?` pattern.
    Wildcard { field: String, value: String },
    /// Documents matching the analyzed terms of `value`.
    Match {
        field: String,
        value: String,
        #[serde(default)]
        operator: Operator,
    },
    /// Documents indexed in `field`.
    Exists { field: String },
    /// Documents indexed in any field.
    MatchAll,
    /// Documents matching every child.
    And { queries: Vec<Query> },
    /// Documents matching any child.
    Or { queries: Vec<Query> },
    /// Documents of the child's fields that do not match the child.
    Not { query: Box<Query> },
}

impl Query {
    pub fn term<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<F, I, V>(field: F, values: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Query::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// A fuzzy query with [`DEFAULT_FUZZINESS`] and no exact prefix.
    pub fn fuzzy<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Query::Fuzzy {
            field: field.into(),
            value: value.into(),
            fuzziness: DEFAULT_FUZZINESS,
            prefix_length: 0,
        }
    }

    pub fn prefix<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Query::Prefix {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn wildcard<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Query::Wildcard {
            field: field.into(),
            value: value.into(),
        }
    }

    /// A match query with the [`Operator::Or`] operator.
    pub fn match_text<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Query::Match {
            field: field.into(),
            value: value.into(),
            operator: Operator::Or,
        }
    }

    pub fn exists<F: Into<String>>(field: F) -> Self {
        Query::Exists {
            field: field.into(),
        }
    }

    pub fn match_all() -> Self {
        Query::MatchAll
    }

    pub fn and(queries: Vec<Query>) -> Self {
        Query::And { queries }
    }

    pub fn or(queries: Vec<Query>) -> Self {
        Query::Or { queries }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(query: Query) -> Self {
        Query::Not {
            query: Box::new(query),
        }
    }

    /// Set the fuzziness of a fuzzy query. No effect on other queries.
    pub fn with_fuzziness(mut self, edits: u32) -> Self {
        if let Query::Fuzzy { fuzziness, .. } = &mut self {
            *fuzziness = edits;
        }
        self
    }

    /// Set the exact prefix length of a fuzzy query. No effect on other
    /// queries.
    pub fn with_prefix_length(mut self, length: usize) -> Self {
        if let Query::Fuzzy { prefix_length, .. } = &mut self {
            *prefix_length = length;
        }
        self
    }

    /// Set the operator of a match query. No effect on other queries.
    pub fn with_operator(mut self, op: Operator) -> Self {
        if let Query::Match { operator, .. } = &mut self {
            *operator = op;
        }
        self
    }

    /// The field a leaf addresses; `None` for composites and `MatchAll`.
    pub fn field(&self) -> Option<&str> {
        match self {
            Query::Term { field, .. }
            | Query::Terms { field, .. }
            | Query::Fuzzy { field, .. }
            | Query::Prefix { field, .. }
            | Query::Wildcard { field, .. }
            | Query::Match { field, .. }
            | Query::Exists { field } => Some(field),
            Query::MatchAll | Query::And { .. } | Query::Or { .. } | Query::Not { .. } => None,
        }
    }

    /// Direct children of a composite query.
    pub fn children(&self) -> Vec<&Query> {
        match self {
            Query::And { queries } | Query::Or { queries } => queries.iter().collect(),
            Query::Not { query } => vec![query.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Every field referenced anywhere in the tree, sorted and deduplicated.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.visit(&mut |query| fields.extend(query.field()));
        fields.sort_unstable();
        fields.dedup();
        fields
    }

    /// Whether a `MatchAll` appears anywhere in the tree.
    pub fn contains_match_all(&self) -> bool {
        let mut found = false;
        self.visit(&mut |query| found |= matches!(query, Query::MatchAll));
        found
    }

    /// Call `f` on this query and every descendant, parents first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Query)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}
