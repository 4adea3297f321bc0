//! Storage seam between the connector and a concrete vector engine
//!
//! Implement [`VectorBackend`] for anything that can hold named-vector
//! collections with cosine distance and JSON payloads.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a backend, classified for the connector
#[derive(Debug, Error)]
pub enum BackendError {
    /// Service unreachable, timed out, or refused our credentials
    #[error("connection failed: {0}")]
    Connection(String),
    /// Target already exists (collection creation race)
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Target collection does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// Service understood the request and refused it
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// A point to upsert
#[derive(Debug, Clone)]
pub struct PointRecord {
    pub id: Uuid,
    pub vector_name: String,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

/// A search hit; the vector itself is never returned
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub score: f32,
    pub payload: Map<String, Value>,
}

/// Abstract interface for vector storage
#[async_trait]
pub trait VectorBackend: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool, BackendError>;

    /// Create a collection with one named vector of `size` dimensions, cosine distance
    async fn create_collection(
        &self,
        name: &str,
        vector_name: &str,
        size: usize,
    ) -> Result<(), BackendError>;

    /// Insert or replace a single point
    async fn upsert(&self, collection: &str, point: PointRecord) -> Result<(), BackendError>;

    /// Closest points first, at most `limit`
    async fn search(
        &self,
        collection: &str,
        vector_name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, BackendError>;
}
