//! Persisted form of a [`FullTextSearch`](crate::full_text_search::search::FullTextSearch).
//!
//! The payload is plain JSON so that any storage adapter can hold it:
//!
//! ```text
//! {
//!   "idProperty": "key",                 // omitted for "$loki"
//!   "fields": [ { "name", "store", "optimizeChanges", "tokenizer" } ],
//!   "dirty": false,
//!   "indexes": { "title": { "docCount": 2, "terms": { "quick": [ { "d": 1, "f": 1, "p": [1] } ] } } }
//! }
//! ```
//!
//! Only stored fields appear under `indexes`.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::field::FieldConfig;
use crate::index::inverted_index::IndexPayload;

/// Snapshot of a full-text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    /// Id property name, when it is not the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_property: Option<String>,
    /// Field declarations, in declaration order.
    pub fields: Vec<FieldConfig>,
    /// Dirty flag at the time of the snapshot.
    #[serde(default)]
    pub dirty: bool,
    /// Postings of the stored fields.
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexPayload>,
}

impl SearchPayload {
    /// Write the payload as JSON.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read a JSON payload.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::config::AnalyzerConfig;

    #[test]
    fn test_default_id_property_is_omitted() {
        let payload = SearchPayload {
            id_property: None,
            fields: vec![FieldConfig {
                name: "title".to_string(),
                store: false,
                optimize_changes: true,
                tokenizer: AnalyzerConfig::Standard,
            }],
            dirty: true,
            indexes: BTreeMap::new(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("idProperty").is_none());
        assert_eq!(json["fields"][0]["store"], false);
        assert_eq!(json["dirty"], true);
    }

    #[test]
    fn test_write_and_read() {
        let mut payload = SearchPayload {
            id_property: Some("key".to_string()),
            fields: Vec::new(),
            dirty: false,
            indexes: BTreeMap::new(),
        };
        payload.indexes.insert("title".to_string(), IndexPayload::default());

        let mut buffer = Vec::new();
        payload.write_to(&mut buffer).unwrap();
        let read = SearchPayload::read_from(buffer.as_slice()).unwrap();

        assert_eq!(read, payload);
    }
}
