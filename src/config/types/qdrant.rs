//! Vector store configuration types

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location value selecting the in-process, non-persistent backend
pub const IN_MEMORY_LOCATION: &str = ":memory:";

/// Qdrant connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Server URL (gRPC endpoint), or `:memory:`
    pub url: Option<String>,
    /// API key for Qdrant Cloud or secured deployments
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
    /// Collection used when a request names none
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// Directory for the local, file-backed store
    pub local_path: Option<PathBuf>,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        QdrantConfig {
            url: None,
            api_key: None,
            collection_name: default_collection_name(),
            local_path: None,
        }
    }
}

fn default_collection_name() -> String {
    "memories".to_string()
}

/// Where the connector keeps its vectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QdrantLocation {
    /// Remote Qdrant server
    Remote(String),
    /// In-process store persisted under a directory
    LocalPath(PathBuf),
    /// In-process store, lost at exit
    InMemory,
}

impl QdrantConfig {
    /// Resolve the effective location; a remote default is used when nothing is set
    pub fn location(&self) -> QdrantLocation {
        match (&self.url, &self.local_path) {
            (Some(url), _) if url == IN_MEMORY_LOCATION => QdrantLocation::InMemory,
            (Some(url), _) => QdrantLocation::Remote(url.trim_end_matches('/').to_string()),
            (None, Some(path)) => QdrantLocation::LocalPath(path.clone()),
            (None, None) => QdrantLocation::Remote(default_url()),
        }
    }
}

/// Default gRPC endpoint of a local Qdrant
pub fn default_url() -> String {
    "http://localhost:6334".to_string()
}

impl std::fmt::Display for QdrantLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QdrantLocation::Remote(url) => write!(f, "{}", url),
            QdrantLocation::LocalPath(path) => write!(f, "local:{}", path.display()),
            QdrantLocation::InMemory => write!(f, "{}", IN_MEMORY_LOCATION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_resolution() {
        let mut config = QdrantConfig::default();
        assert_eq!(
            config.location(),
            QdrantLocation::Remote("http://localhost:6334".into())
        );

        config.local_path = Some(PathBuf::from("/tmp/qdrant"));
        assert_eq!(
            config.location(),
            QdrantLocation::LocalPath(PathBuf::from("/tmp/qdrant"))
        );

        config.local_path = None;
        config.url = Some(":memory:".into());
        assert_eq!(config.location(), QdrantLocation::InMemory);

        config.url = Some("https://example.cloud.qdrant.io:6334/".into());
        assert_eq!(
            config.location(),
            QdrantLocation::Remote("https://example.cloud.qdrant.io:6334".into())
        );
    }
}
