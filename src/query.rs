//! Queries over the field indexes.

pub mod builder;
pub mod evaluator;
#[allow(clippy::module_inception)]
pub mod query;

pub use builder::{QueryBuilder, validate_query};
pub use evaluator::{QueryEvaluator, ScoredDoc};
pub use query::{DEFAULT_FUZZINESS, Operator, Query};
