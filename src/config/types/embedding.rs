//! Embedding provider configuration types

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider (`fastembed` or `openai`)
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Vector dimension; required for remote providers
    pub dimensions: Option<usize>,
    /// API key for remote providers
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
    /// Base URL for remote providers
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    /// Where local models are downloaded
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: None,
            api_key: None,
            base_url: default_embedding_base_url(),
            cache_dir: None,
        }
    }
}

fn default_embedding_provider() -> String {
    "fastembed".to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
