//! Local embedding generation via fastembed
//!
//! Models are ONNX exports that auto-download on first use. The model handle
//! is created lazily, once, even under concurrent first calls.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{validate_inputs, EmbeddingProvider, EmbeddingVector};
use crate::error::{Error, Result};

/// Local embedding provider wrapping fastembed
pub struct FastEmbedProvider {
    model_name: String,
    model: EmbeddingModel,
    dimensions: usize,
    vector_name: String,
    cache_dir: PathBuf,
    prefixes: Option<(&'static str, &'static str)>,
    engine: OnceCell<Arc<TextEmbedding>>,
}

impl FastEmbedProvider {
    /// Resolve `model_name` against fastembed's catalogue without downloading anything
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self> {
        let (model, dimensions) = resolve_model(model_name).ok_or_else(|| {
            Error::configuration(format!("Unsupported fastembed model: {}", model_name))
                .with_context("model", model_name)
        })?;

        Ok(FastEmbedProvider {
            model_name: model_name.to_string(),
            model,
            dimensions,
            vector_name: vector_name_for(model_name),
            cache_dir,
            prefixes: instruction_prefixes(model_name),
            engine: OnceCell::new(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Load the model on first use
    async fn engine(&self) -> Result<Arc<TextEmbedding>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                info!(model = %self.model_name, cache_dir = %self.cache_dir.display(), "Loading embedding model");

                let options = InitOptions::new(self.model.clone())
                    .with_cache_dir(self.cache_dir.clone())
                    .with_show_download_progress(false);

                let model_name = self.model_name.clone();
                tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
                    .await
                    .map_err(|e| {
                        Error::embedding(format!("Embedding init task join error: {}", e))
                            .with_context("model", model_name.clone())
                    })?
                    .map(Arc::new)
                    .map_err(|e| {
                        Error::embedding(format!("Failed to init embedding model: {}", e))
                            .with_context("model", model_name)
                    })
            })
            .await?;

        Ok(Arc::clone(engine))
    }

    async fn embed_raw(&self, texts: Vec<String>) -> Result<Vec<EmbeddingVector>> {
        let engine = self.engine().await?;
        let count = texts.len();

        let embeddings = tokio::task::spawn_blocking(move || engine.embed(texts, None))
            .await
            .map_err(|e| Error::embedding(format!("Embedding task join error: {}", e)))?
            .map_err(|e| {
                Error::embedding(format!("Embedding error: {}", e))
                    .with_context("model", self.model_name.clone())
                    .with_context("input_count", count)
            })?;

        if embeddings.len() != count {
            return Err(Error::embedding(format!(
                "Model returned {} embeddings for {} inputs",
                embeddings.len(),
                count
            )));
        }

        debug!(count, model = %self.model_name, "Generated embeddings");
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        validate_inputs(texts)?;
        let inputs = match self.prefixes {
            Some((_, passage)) => texts.iter().map(|t| format!("{}{}", passage, t)).collect(),
            None => texts.to_vec(),
        };
        self.embed_raw(inputs).await
    }

    async fn embed_query(&self, text: &str) -> Result<EmbeddingVector> {
        validate_inputs(&[text.to_string()])?;
        let input = match self.prefixes {
            Some((query, _)) => format!("{}{}", query, text),
            None => text.to_string(),
        };
        self.embed_raw(vec![input])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("No embedding returned"))
    }

    fn vector_size(&self) -> usize {
        self.dimensions
    }

    fn vector_name(&self) -> &str {
        &self.vector_name
    }

    fn describe(&self) -> String {
        format!("fastembed:{}", self.model_name)
    }
}

/// Last path segment, lowercased, without an `-onnx` suffix
fn normalize_model_name(name: &str) -> String {
    let last = name.rsplit('/').next().unwrap_or(name).to_lowercase();
    last.trim_end_matches("-onnx").to_string()
}

/// Find the catalogue entry for a model name such as `sentence-transformers/all-MiniLM-L6-v2`
fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    let supported = TextEmbedding::list_supported_models();

    if let Some(info) = supported
        .iter()
        .find(|info| info.model_code.eq_ignore_ascii_case(name))
    {
        return Some((info.model.clone(), info.dim));
    }

    let wanted = normalize_model_name(name);
    supported
        .iter()
        .find(|info| normalize_model_name(&info.model_code) == wanted)
        .map(|info| (info.model.clone(), info.dim))
}

/// Vector field name, stable across restarts for the same model
fn vector_name_for(model_name: &str) -> String {
    let last = model_name.rsplit('/').next().unwrap_or(model_name);
    format!("fast-{}", last.to_lowercase())
}

/// (query, passage) prefixes for models trained with instruction prefixes
fn instruction_prefixes(model_name: &str) -> Option<(&'static str, &'static str)> {
    let normalized = normalize_model_name(model_name);
    if normalized.contains("e5-") {
        Some(("query: ", "passage: "))
    } else if normalized.starts_with("nomic-embed-text") {
        Some(("search_query: ", "search_document: "))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_vector_name() {
        assert_eq!(
            vector_name_for("sentence-transformers/all-MiniLM-L6-v2"),
            "fast-all-minilm-l6-v2"
        );
        assert_eq!(vector_name_for("BAAI/bge-small-en-v1.5"), "fast-bge-small-en-v1.5");
        assert_eq!(vector_name_for("plain-name"), "fast-plain-name");
    }

    #[test]
    fn test_default_model_resolves_without_download() {
        let provider = FastEmbedProvider::new(
            "sentence-transformers/all-MiniLM-L6-v2",
            std::env::temp_dir(),
        )
        .unwrap();
        assert_eq!(provider.vector_size(), 384);
        assert_eq!(provider.vector_name(), "fast-all-minilm-l6-v2");
        assert_eq!(
            provider.describe(),
            "fastembed:sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn test_unknown_model_is_configuration_error() {
        let err = match FastEmbedProvider::new("acme/does-not-exist", std::env::temp_dir()) {
            Ok(_) => panic!("unknown model accepted"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.context()["model"], "acme/does-not-exist");
    }

    #[test]
    fn test_instruction_prefixes() {
        assert_eq!(
            instruction_prefixes("intfloat/multilingual-e5-small"),
            Some(("query: ", "passage: "))
        );
        assert_eq!(instruction_prefixes("sentence-transformers/all-MiniLM-L6-v2"), None);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_model_load() {
        let provider = FastEmbedProvider::new(
            "sentence-transformers/all-MiniLM-L6-v2",
            std::env::temp_dir(),
        )
        .unwrap();

        let err = provider.embed_query("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
        assert!(provider.engine.get().is_none());
    }

    // Downloads the model (~90MB); run with `--ignored`
    #[tokio::test]
    #[ignore]
    async fn test_real_embeddings() {
        let provider = FastEmbedProvider::new(
            "sentence-transformers/all-MiniLM-L6-v2",
            crate::config::model_cache_dir(),
        )
        .unwrap();

        let docs = provider
            .embed_documents(&["hello world".to_string(), "goodbye".to_string()])
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].len(), 384);
    }
}
