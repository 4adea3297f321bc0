//! In-process vector backend
//!
//! Serves `QDRANT_URL=:memory:` and `QDRANT_LOCAL_PATH`. Ranking is a
//! brute-force cosine scan, which is fine for the few thousand memories a
//! single assistant accumulates. With a path, the whole store is written as a
//! JSON snapshot after every mutation and reloaded on open.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::backend::{BackendError, PointRecord, ScoredRecord, VectorBackend};

const SNAPSHOT_FILE: &str = "collections.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPoint {
    id: Uuid,
    vector: Vec<f32>,
    payload: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalCollection {
    vector_name: String,
    size: usize,
    /// Insertion order; equal scores keep this order
    points: Vec<StoredPoint>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    collections: HashMap<String, LocalCollection>,
}

/// Vector backend living inside the server process
pub struct LocalBackend {
    collections: RwLock<HashMap<String, LocalCollection>>,
    path: Option<PathBuf>,
}

impl LocalBackend {
    /// Volatile store, lost when the process exits
    pub fn in_memory() -> Self {
        LocalBackend {
            collections: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// Store persisted under `dir`, loading any previous snapshot
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, BackendError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            BackendError::Connection(format!(
                "Failed to create local storage directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let file = dir.join(SNAPSHOT_FILE);
        let collections = match tokio::fs::read_to_string(&file).await {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
                    BackendError::Connection(format!(
                        "Corrupt local storage snapshot {}: {}",
                        file.display(),
                        e
                    ))
                })?;
                info!(
                    path = %file.display(),
                    collections = snapshot.collections.len(),
                    "Loaded local vector storage"
                );
                snapshot.collections
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(BackendError::Connection(format!(
                    "Failed to read local storage snapshot {}: {}",
                    file.display(),
                    e
                )))
            }
        };

        Ok(LocalBackend {
            collections: RwLock::new(collections),
            path: Some(dir),
        })
    }

    /// Write the snapshot; called with the write lock held so writers never interleave
    async fn persist(&self, collections: &HashMap<String, LocalCollection>) -> Result<(), BackendError> {
        let Some(dir) = &self.path else {
            return Ok(());
        };

        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            collections: &'a HashMap<String, LocalCollection>,
        }

        let content = serde_json::to_string(&SnapshotRef { collections })
            .map_err(|e| BackendError::Rejected(format!("Failed to serialize snapshot: {}", e)))?;

        let file = dir.join(SNAPSHOT_FILE);
        let tmp = dir.join(format!("{}.tmp", SNAPSHOT_FILE));
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| BackendError::Connection(format!("Failed to write snapshot: {}", e)))?;
        tokio::fs::rename(&tmp, &file)
            .await
            .map_err(|e| BackendError::Connection(format!("Failed to replace snapshot: {}", e)))?;

        debug!(path = %file.display(), "Persisted local vector storage");
        Ok(())
    }
}

#[async_trait]
impl VectorBackend for LocalBackend {
    async fn collection_exists(&self, name: &str) -> Result<bool, BackendError> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_name: &str,
        size: usize,
    ) -> Result<(), BackendError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(BackendError::AlreadyExists(format!(
                "Collection `{}` already exists",
                name
            )));
        }

        collections.insert(
            name.to_string(),
            LocalCollection {
                vector_name: vector_name.to_string(),
                size,
                points: Vec::new(),
            },
        );

        if let Err(e) = self.persist(&collections).await {
            collections.remove(name);
            return Err(e);
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: PointRecord) -> Result<(), BackendError> {
        let mut collections = self.collections.write().await;
        let target = collections.get_mut(collection).ok_or_else(|| {
            BackendError::NotFound(format!("Collection `{}` doesn't exist", collection))
        })?;

        if point.vector_name != target.vector_name {
            return Err(BackendError::Rejected(format!(
                "Vector `{}` is not configured in collection `{}`",
                point.vector_name, collection
            )));
        }
        if point.vector.len() != target.size {
            return Err(BackendError::Rejected(format!(
                "Vector dimension error: expected dim: {}, got {}",
                target.size,
                point.vector.len()
            )));
        }

        let stored = StoredPoint {
            id: point.id,
            vector: point.vector,
            payload: point.payload,
        };
        let previous = match target.points.iter().position(|p| p.id == stored.id) {
            Some(index) => Some((index, std::mem::replace(&mut target.points[index], stored))),
            None => {
                target.points.push(stored);
                None
            }
        };

        if let Err(e) = self.persist(&collections).await {
            // Keep memory and disk in agreement
            if let Some(target) = collections.get_mut(collection) {
                match previous {
                    Some((index, old)) => target.points[index] = old,
                    None => {
                        target.points.pop();
                    }
                }
            }
            return Err(e);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector_name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, BackendError> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| {
            BackendError::NotFound(format!("Collection `{}` doesn't exist", collection))
        })?;

        if vector_name != target.vector_name {
            return Err(BackendError::Rejected(format!(
                "Vector `{}` is not configured in collection `{}`",
                vector_name, collection
            )));
        }
        if vector.len() != target.size {
            return Err(BackendError::Rejected(format!(
                "Vector dimension error: expected dim: {}, got {}",
                target.size,
                vector.len()
            )));
        }

        let mut scored: Vec<(f32, &StoredPoint)> = target
            .points
            .iter()
            .map(|p| (cosine_similarity(&vector, &p.vector), p))
            .collect();
        // Stable sort: ties keep insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, p)| ScoredRecord {
                score,
                payload: p.payload.clone(),
            })
            .collect())
    }
}

/// Cosine similarity; zero-length vectors score 0
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
