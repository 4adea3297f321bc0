//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

const APP_DIR: &str = "mcp-server-qdrant";

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("MCP_QDRANT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".mcp-server-qdrant"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    // Check for explicit override
    if let Ok(path) = std::env::var("MCP_QDRANT_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}

/// Default download directory for local embedding models
pub fn model_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR).join("models"))
        .unwrap_or_else(|| PathBuf::from(".fastembed_cache"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        // Just ensure these don't panic
        let _ = config_dir();
        let _ = model_cache_dir();
        assert!(config_path().to_string_lossy().len() > 0);
    }
}
