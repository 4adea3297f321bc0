//! Store and search entries in a vector collection
//!
//! The connector owns the embedding provider and a [`VectorBackend`] handle.
//! It creates collections lazily and is the first frame holding a correlation
//! id, so failures coming from the provider or the backend are logged here.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backend::{BackendError, PointRecord, VectorBackend};
use super::entry::Entry;
use super::local::LocalBackend;
use super::remote::QdrantBackend;
use crate::config::{QdrantConfig, QdrantLocation};
use crate::correlation::CorrelationContext;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, ErrorKind, Result};

/// Results returned when a find request names no limit
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Upper bound on results requested from the backend
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Entry point for all vector-store interaction
pub struct QdrantConnector {
    backend: Arc<dyn VectorBackend>,
    provider: Arc<dyn EmbeddingProvider>,
    default_collection: String,
    default_limit: usize,
    max_limit: usize,
    /// Serializes check-then-create within this process
    create_lock: Mutex<()>,
}

impl QdrantConnector {
    /// Connect to the location described by `config`
    pub async fn connect(config: &QdrantConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let location = config.location();
        let backend: Arc<dyn VectorBackend> = match &location {
            QdrantLocation::Remote(url) => Arc::new(
                QdrantBackend::connect(url, config.api_key.as_ref())
                    .map_err(|e| connect_error(&location, e))?,
            ),
            QdrantLocation::LocalPath(path) => Arc::new(
                LocalBackend::open(path)
                    .await
                    .map_err(|e| connect_error(&location, e))?,
            ),
            QdrantLocation::InMemory => Arc::new(LocalBackend::in_memory()),
        };

        info!(
            location = %location,
            collection_name = %config.collection_name,
            embedding = %provider.describe(),
            "Vector store connector ready"
        );

        Ok(Self::new(backend, provider, &config.collection_name))
    }

    /// Build a connector over an existing backend
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        provider: Arc<dyn EmbeddingProvider>,
        default_collection: impl Into<String>,
    ) -> Self {
        QdrantConnector {
            backend,
            provider,
            default_collection: default_collection.into(),
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: MAX_SEARCH_LIMIT,
            create_lock: Mutex::new(()),
        }
    }

    /// Override the default and maximum number of search results
    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self.default_limit = default_limit.clamp(1, self.max_limit);
        self
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    /// Number of results actually requested for a caller-supplied limit
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit)
    }

    fn resolve<'a>(&'a self, collection_name: Option<&'a str>) -> &'a str {
        collection_name.unwrap_or(&self.default_collection)
    }

    /// Create the collection if it is missing.
    ///
    /// Safe to call before every operation. Another process may create the
    /// same collection between our check and our create; the resulting
    /// "already exists" answer counts as success.
    pub async fn ensure_collection(&self, ctx: CorrelationContext, collection_name: &str) -> Result<()> {
        if self.exists(ctx, collection_name, ErrorKind::Collection).await? {
            return Ok(());
        }

        let _guard = self.create_lock.lock().await;
        if self.exists(ctx, collection_name, ErrorKind::Collection).await? {
            return Ok(());
        }

        let vector_name = self.provider.vector_name();
        let vector_size = self.provider.vector_size();

        match self
            .backend
            .create_collection(collection_name, vector_name, vector_size)
            .await
        {
            Ok(()) => {
                info!(
                    correlation_id = %ctx,
                    collection_name,
                    vector_name,
                    vector_size,
                    "Created collection"
                );
                Ok(())
            }
            Err(BackendError::AlreadyExists(message)) => {
                debug!(
                    correlation_id = %ctx,
                    collection_name,
                    "Collection created concurrently: {}",
                    message
                );
                Ok(())
            }
            Err(e) => Err(backend_failure(
                ErrorKind::Collection,
                format!("Failed to create collection '{}'", collection_name),
                e,
            )
            .with_context("collection_name", collection_name)
            .with_context("vector_name", vector_name)
            .with_context("vector_size", vector_size)
            .log(ctx)),
        }
    }

    async fn exists(&self, ctx: CorrelationContext, collection_name: &str, kind: ErrorKind) -> Result<bool> {
        self.backend
            .collection_exists(collection_name)
            .await
            .map_err(|e| {
                backend_failure(
                    kind,
                    format!("Failed to check collection '{}'", collection_name),
                    e,
                )
                .with_context("collection_name", collection_name)
                .log(ctx)
            })
    }

    /// Embed and persist one entry under a fresh point id.
    ///
    /// The content is embedded before anything is sent to the backend, so an
    /// entry that cannot be embedded leaves no trace.
    pub async fn store(
        &self,
        ctx: CorrelationContext,
        entry: &Entry,
        collection_name: Option<&str>,
    ) -> Result<()> {
        let collection_name = self.resolve(collection_name);

        let vector = self
            .provider
            .embed_documents(&[entry.content().to_string()])
            .await
            .and_then(|vectors| {
                vectors
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::embedding("Embedding provider returned no vector"))
            })
            .map_err(|e| {
                e.with_context("operation", "store")
                    .with_context("collection_name", collection_name)
                    .with_context("provider", self.provider.describe())
                    .log(ctx)
            })?;

        self.ensure_collection(ctx, collection_name)
            .await
            .map_err(|e| e.with_context("operation", "store"))?;

        let point_id = Uuid::new_v4();
        let point = PointRecord {
            id: point_id,
            vector_name: self.provider.vector_name().to_string(),
            vector,
            payload: entry.to_payload(),
        };

        self.backend
            .upsert(collection_name, point)
            .await
            .map_err(|e| {
                backend_failure(
                    ErrorKind::Store,
                    format!("Failed to store entry in collection '{}'", collection_name),
                    e,
                )
                .with_context("collection_name", collection_name)
                .with_context("point_id", point_id.to_string())
                .log(ctx)
            })?;

        info!(
            correlation_id = %ctx,
            collection_name,
            point_id = %point_id,
            "Stored entry"
        );
        Ok(())
    }

    /// Entries most similar to `query`, closest first.
    ///
    /// A collection that does not exist yet holds no entries; it is not
    /// created by a search.
    pub async fn search(
        &self,
        ctx: CorrelationContext,
        query: &str,
        collection_name: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let collection_name = self.resolve(collection_name);
        let limit = self.effective_limit(limit);

        if !self.exists(ctx, collection_name, ErrorKind::Search).await? {
            debug!(
                correlation_id = %ctx,
                collection_name,
                "Collection does not exist, nothing to search"
            );
            return Ok(Vec::new());
        }

        let vector = self.provider.embed_query(query).await.map_err(|e| {
            e.with_context("operation", "search")
                .with_context("collection_name", collection_name)
                .with_context("provider", self.provider.describe())
                .log(ctx)
        })?;

        let hits = match self
            .backend
            .search(collection_name, self.provider.vector_name(), vector, limit)
            .await
        {
            Ok(hits) => hits,
            Err(BackendError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => {
                return Err(backend_failure(
                    ErrorKind::Search,
                    format!("Failed to search collection '{}'", collection_name),
                    e,
                )
                .with_context("collection_name", collection_name)
                .with_context("limit", limit)
                .log(ctx))
            }
        };

        let total = hits.len();
        let entries: Vec<Entry> = hits
            .into_iter()
            .filter_map(|hit| {
                let entry = Entry::from_payload(hit.payload);
                if entry.is_none() {
                    warn!(
                        correlation_id = %ctx,
                        collection_name,
                        score = hit.score,
                        "Skipping point without a document payload"
                    );
                }
                entry
            })
            .collect();

        info!(
            correlation_id = %ctx,
            collection_name,
            limit,
            results = entries.len(),
            skipped = total - entries.len(),
            "Search completed"
        );
        Ok(entries)
    }
}

/// Map a backend failure onto the crate taxonomy; unreachable services are always `Connection`
fn backend_failure(kind: ErrorKind, message: String, err: BackendError) -> Error {
    match err {
        BackendError::Connection(_) => {
            Error::connection(format!("{}: vector store unreachable", message)).with_source(err)
        }
        other => Error::new(kind, message).with_source(other),
    }
}

fn connect_error(location: &QdrantLocation, err: BackendError) -> Error {
    Error::connection(format!("Failed to connect to vector store at {}", location))
        .with_context("location", location.to_string())
        .with_source(err)
}
