//! Stored memory entries and their payload representation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form structured metadata attached to an entry
pub type Metadata = Map<String, Value>;

/// Payload key holding the entry text
pub const DOCUMENT_KEY: &str = "document";
/// Payload key holding the entry metadata
pub const METADATA_KEY: &str = "metadata";

/// A unit of stored memory. Immutable: a change is a new entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    content: String,
    #[serde(default)]
    metadata: Option<Metadata>,
}

impl Entry {
    pub fn new(content: impl Into<String>, metadata: Option<Metadata>) -> Self {
        Entry {
            content: content.into(),
            metadata,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Payload written next to the vector: `{document, metadata}`
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(DOCUMENT_KEY.to_string(), Value::String(self.content.clone()));
        payload.insert(
            METADATA_KEY.to_string(),
            self.metadata.clone().map(Value::Object).unwrap_or(Value::Null),
        );
        payload
    }

    /// Rebuild an entry from a stored payload; `None` if there is no document text
    pub fn from_payload(mut payload: Map<String, Value>) -> Option<Self> {
        let content = match payload.remove(DOCUMENT_KEY) {
            Some(Value::String(s)) => s,
            _ => return None,
        };
        let metadata = match payload.remove(METADATA_KEY) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        };
        Some(Entry { content, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let mut metadata = Metadata::new();
        metadata.insert("language".into(), json!("python"));
        let entry = Entry::new("Use a context manager for file handles", Some(metadata));

        let payload = Value::Object(entry.to_payload());
        assert_eq!(
            payload,
            json!({
                "document": "Use a context manager for file handles",
                "metadata": { "language": "python" }
            })
        );
    }

    #[test]
    fn test_missing_metadata_is_null() {
        let entry = Entry::new("plain", None);
        assert_eq!(entry.to_payload()[METADATA_KEY], Value::Null);
        assert_eq!(Entry::from_payload(entry.to_payload()), Some(entry));
    }

    #[test]
    fn test_payload_without_document_is_skipped() {
        let mut payload = Map::new();
        payload.insert("text".into(), json!("written by another tool"));
        assert!(Entry::from_payload(payload).is_none());
    }
}
