//! Provider selection from configuration

use std::sync::Arc;

use tracing::info;

use super::{EmbeddingProvider, FastEmbedProvider, OpenAiProvider};
use crate::config::{model_cache_dir, EmbeddingConfig};
use crate::error::{Error, Result};

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderType {
    /// Local ONNX models via fastembed
    FastEmbed,
    /// OpenAI-compatible HTTP API
    OpenAi,
}

impl std::str::FromStr for EmbeddingProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fastembed" => Ok(EmbeddingProviderType::FastEmbed),
            "openai" => Ok(EmbeddingProviderType::OpenAi),
            _ => Err(Error::configuration(format!(
                "Unsupported embedding provider: {}. Valid options: fastembed, openai",
                s
            ))
            .with_context("provider", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProviderType::FastEmbed => write!(f, "fastembed"),
            EmbeddingProviderType::OpenAi => write!(f, "openai"),
        }
    }
}

/// Build the configured embedding provider
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider_type: EmbeddingProviderType = config.provider.parse()?;

    let provider: Arc<dyn EmbeddingProvider> = match provider_type {
        EmbeddingProviderType::FastEmbed => {
            let cache_dir = config.cache_dir.clone().unwrap_or_else(model_cache_dir);
            Arc::new(FastEmbedProvider::new(&config.model, cache_dir)?)
        }
        EmbeddingProviderType::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                Error::configuration("OpenAI embedding provider requires an API key")
                    .with_context("provider", provider_type.to_string())
            })?;
            let dimensions = config.dimensions.filter(|d| *d > 0).ok_or_else(|| {
                Error::configuration("OpenAI embedding provider requires embedding dimensions")
                    .with_context("provider", provider_type.to_string())
                    .with_context("model", config.model.clone())
            })?;
            Arc::new(OpenAiProvider::new(
                api_key,
                &config.base_url,
                &config.model,
                dimensions,
            ))
        }
    };

    info!(
        provider = %provider_type,
        model = %config.model,
        vector_name = provider.vector_name(),
        vector_size = provider.vector_size(),
        "Using embedding provider"
    );

    Ok(provider)
}
