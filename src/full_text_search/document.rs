//! Reading field text and ids out of host documents.
//!
//! Documents are arbitrary JSON values. Each declared field carries a
//! [`FieldExtractor`] that pulls its text out of a document; the default
//! [`PropertyExtractor`] follows a dotted property path.
//!
//! # Examples
//!
//! ```
//! use lokisearch::full_text_search::document::{FieldExtractor, PropertyExtractor};
//! use serde_json::json;
//!
//! let doc = json!({ "meta": { "tags": ["rust", "search"] } });
//! let extractor = PropertyExtractor::new("meta.tags");
//! assert_eq!(extractor.extract(&doc), Some("rust search".to_string()));
//! ```

use serde_json::Value;

use crate::error::{LokiSearchError, Result};

/// Default name of the document id property.
pub const DEFAULT_ID_PROPERTY: &str = "$loki";

/// Pulls the text of one field out of a document.
pub trait FieldExtractor: Send + Sync {
    /// The field text, or `None` if the document has no value for it.
    fn extract(&self, doc: &Value) -> Option<String>;
}

/// Reads a string property by dotted path (`"a.b.c"`).
///
/// Numeric path segments index into arrays. A string array is joined with
/// single spaces; non-string values yield no text.
#[derive(Debug, Clone)]
pub struct PropertyExtractor {
    path: Vec<String>,
}

impl PropertyExtractor {
    pub fn new<S: AsRef<str>>(path: S) -> Self {
        PropertyExtractor {
            path: path.as_ref().split('.').map(str::to_string).collect(),
        }
    }

    /// The path segments.
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl FieldExtractor for PropertyExtractor {
    fn extract(&self, doc: &Value) -> Option<String> {
        let value = self.path.iter().try_fold(doc, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })?;

        match value {
            Value::String(text) => Some(text.clone()),
            Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                (!parts.is_empty()).then(|| parts.join(" "))
            }
            _ => None,
        }
    }
}

/// Adapts a closure into a [`FieldExtractor`].
pub struct FnExtractor<F>(pub F);

impl<F> FieldExtractor for FnExtractor<F>
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    fn extract(&self, doc: &Value) -> Option<String> {
        (self.0)(doc)
    }
}

/// Resolve the id of a document.
///
/// An explicit id wins. Otherwise the `id_property` of the document must hold
/// an unsigned integer or a string that parses as one.
pub fn resolve_doc_id(doc: &Value, id: Option<u64>, id_property: &str) -> Result<u64> {
    if let Some(id) = id {
        return Ok(id);
    }

    match doc.get(id_property) {
        Some(Value::Number(number)) => number.as_u64().ok_or_else(|| {
            LokiSearchError::id_resolution(format!(
                "property '{id_property}' is not an unsigned integer: {number}"
            ))
        }),
        Some(Value::String(text)) => text.trim().parse::<u64>().map_err(|e| {
            LokiSearchError::id_resolution(format!(
                "property '{id_property}' is not an integer string '{text}': {e}"
            ))
        }),
        Some(other) => Err(LokiSearchError::id_resolution(format!(
            "property '{id_property}' has unsupported type: {other}"
        ))),
        None => Err(LokiSearchError::id_resolution(format!(
            "no explicit id and no '{id_property}' property"
        ))),
    }
}
