//! Error types for the lokisearch library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`LokiSearchError`] enum. Structural errors (unknown fields, invalid fuzzy
//! parameters) are raised synchronously by the call that detects them; nothing
//! in this crate retries.
//!
//! # Examples
//!
//! ```
//! use lokisearch::error::{LokiSearchError, Result};
//!
//! fn lookup(field: &str) -> Result<()> {
//!     Err(LokiSearchError::unknown_field(field))
//! }
//!
//! match lookup("title") {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for lokisearch operations.
#[derive(Error, Debug)]
pub enum LokiSearchError {
    /// A query or payload references a field that was never declared.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A persisted payload disagrees with the declared field set.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Neither an explicit id nor a usable id property was available.
    #[error("Id resolution failed: {0}")]
    IdResolution(String),

    /// Fuzzy automaton parameters are outside the supported bounds,
    /// or transitions were added inconsistently.
    #[error("Automaton build failed: {0}")]
    AutomatonBuild(String),

    /// Analysis-related errors (invalid tokenizer pattern, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error. The crate never raises it itself; it lets host
    /// code such as custom tokenizers or extractors bubble up `anyhow` errors
    /// with `?`.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with LokiSearchError.
pub type Result<T> = std::result::Result<T, LokiSearchError>;

impl LokiSearchError {
    /// Create a new unknown field error.
    pub fn unknown_field<S: Into<String>>(field: S) -> Self {
        LokiSearchError::UnknownField(field.into())
    }

    /// Create a new schema mismatch error.
    pub fn schema_mismatch<S: Into<String>>(msg: S) -> Self {
        LokiSearchError::SchemaMismatch(msg.into())
    }

    /// Create a new id resolution error.
    pub fn id_resolution<S: Into<String>>(msg: S) -> Self {
        LokiSearchError::IdResolution(msg.into())
    }

    /// Create a new automaton build error.
    pub fn automaton_build<S: Into<String>>(msg: S) -> Self {
        LokiSearchError::AutomatonBuild(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        LokiSearchError::Analysis(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LokiSearchError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LokiSearchError::Other(format!("Invalid argument: {}", msg.into()))
    }
}
