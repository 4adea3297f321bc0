//! Embedding providers - text to fixed-dimension vectors
//!
//! - **fastembed**: local ONNX models, downloaded on first use
//! - **openai**: any OpenAI-compatible `/embeddings` endpoint
//!
//! Providers return errors without logging them; the connector is the first
//! frame that holds a correlation id and logs on their behalf.

mod factory;
mod local;
mod openai;

use async_trait::async_trait;

use crate::error::{Error, Result};

pub use factory::{create_provider, EmbeddingProviderType};
pub use local::FastEmbedProvider;
pub use openai::OpenAiProvider;

/// A single embedding
pub type EmbeddingVector = Vec<f32>;

/// Converts text into vectors of a fixed dimension
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed documents for storage; output order matches input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>>;

    /// Embed a search query. May differ from the document embedding of the same text.
    async fn embed_query(&self, text: &str) -> Result<EmbeddingVector>;

    /// Dimension of every vector this provider produces
    fn vector_size(&self) -> usize;

    /// Name of the vector field in the collection
    fn vector_name(&self) -> &str;

    /// Short description for diagnostics, e.g. `fastembed:BAAI/bge-small-en-v1.5`
    fn describe(&self) -> String;
}

/// Reject empty or whitespace-only inputs, reporting the first offender
pub(crate) fn validate_inputs(texts: &[String]) -> Result<()> {
    if let Some(index) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(Error::embedding("Cannot embed empty text")
            .with_context("input_index", index)
            .with_context("input_count", texts.len()));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::HashingProvider;
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_validate_inputs_reports_index() {
        let texts = vec!["fine".to_string(), "   ".to_string()];
        let err = validate_inputs(&texts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
        assert_eq!(err.context()["input_index"], 1);
    }

    #[tokio::test]
    async fn test_embed_documents_preserves_order() {
        let provider = HashingProvider::new(64);
        let t1 = "rust ownership rules".to_string();
        let t2 = "python context managers".to_string();

        let batch = provider
            .embed_documents(&[t1.clone(), t2.clone()])
            .await
            .unwrap();
        let first = provider.embed_documents(&[t1]).await.unwrap();
        let second = provider.embed_documents(&[t2]).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], first[0]);
        assert_eq!(batch[1], second[0]);
    }

    #[tokio::test]
    async fn test_query_and_document_embeddings_may_differ() {
        // Asymmetric providers embed queries differently from documents;
        // callers must not assume embed_documents([t])[0] == embed_query(t).
        let provider = HashingProvider::new(64);
        let text = "how to open a file".to_string();

        let doc = provider.embed_documents(&[text.clone()]).await.unwrap();
        let query = provider.embed_query(&text).await.unwrap();
        assert_ne!(doc[0], query);
        assert_eq!(doc[0].len(), query.len());
    }

    #[tokio::test]
    async fn test_embeddings_are_deterministic() {
        let provider = HashingProvider::new(32);
        let a = provider.embed_query("same input").await.unwrap();
        let b = provider.embed_query("same input").await.unwrap();
        assert_eq!(a, b);
    }
}
