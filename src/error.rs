//! Error types for mcp-server-qdrant
//!
//! Every failure in the crate is an [`Error`] carrying an [`ErrorKind`], a
//! human-readable message and a structured context map. Errors are logged
//! once, where they are first detected (see [`Error::log`]); frames further up
//! may merge extra context but never log the same error again.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::correlation::CorrelationContext;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Structured diagnostic context attached to an error
pub type ErrorContext = BTreeMap<String, Value>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Closed set of failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or missing settings
    Configuration,
    /// Failure to reach or authenticate with the vector-search service
    Connection,
    /// Failure during text-to-vector conversion
    Embedding,
    /// Failure creating or inspecting a collection
    Collection,
    /// Failure during a store operation
    Store,
    /// Failure during a find operation
    Search,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Connection => "connection",
            ErrorKind::Embedding => "embedding",
            ErrorKind::Collection => "collection",
            ErrorKind::Store => "store",
            ErrorKind::Search => "search",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for mcp-server-qdrant
#[derive(Error, Debug)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: ErrorContext,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            context: ErrorContext::new(),
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Embedding, message)
    }

    pub fn collection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Collection, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, message)
    }

    pub fn search(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Search, message)
    }

    /// Attach the underlying cause
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Merge one context entry, overwriting an existing key
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Merge several context entries at once
    pub fn with_context_map(mut self, context: ErrorContext) -> Self {
        self.context.extend(context);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Message safe to hand to a protocol client: no context, no cause chain
    pub fn client_message(&self) -> &str {
        &self.message
    }

    /// Emit this error once, tagged with the active correlation id.
    ///
    /// Call this where the failure is detected and return the result; callers
    /// that receive an already-logged error only add context.
    pub fn log(self, ctx: CorrelationContext) -> Self {
        let context = Value::Object(
            self.context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        let cause = self
            .source
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default();

        tracing::error!(
            correlation_id = %ctx,
            kind = %self.kind,
            context = %context,
            cause = %cause,
            "{}",
            self.message
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = Error::store("Failed to store entry in collection 'notes'");
        assert_eq!(
            err.to_string(),
            "store error: Failed to store entry in collection 'notes'"
        );
    }

    #[test]
    fn test_context_merge_overwrites() {
        let err = Error::search("boom")
            .with_context("collection_name", "a")
            .with_context("limit", 5)
            .with_context("collection_name", "b");

        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()["collection_name"], "b");
        assert_eq!(err.context()["limit"], 5);
    }

    #[test]
    fn test_client_message_hides_context() {
        let err = Error::embedding("Failed to generate embeddings for query")
            .with_context("query", "secret text");
        assert_eq!(
            err.client_message(),
            "Failed to generate embeddings for query"
        );
        assert!(!err.client_message().contains("secret"));
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::collection("Failed to create collection 'x'").with_source(io);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk on fire"));
    }
}
