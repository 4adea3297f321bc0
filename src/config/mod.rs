//! Configuration module
//!
//! Split into focused modules:
//! - types/: configuration types (Config, QdrantConfig, EmbeddingConfig, ...)
//! - io.rs: loading from files and environment variables
//! - validation.rs: configuration validation
//! - paths.rs: configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{Config, LogConfig, LogFormat, ServerConfig, ToolConfig};

// Re-export store and embedding types
pub use types::embedding::EmbeddingConfig;
pub use types::qdrant::{QdrantConfig, QdrantLocation, IN_MEMORY_LOCATION};

// Re-export IO and utilities
pub use io::{apply_env_overrides, load_config, load_config_from_path};
pub use paths::{config_dir, config_path, model_cache_dir};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};

impl Config {
    /// Load and validate; any validation error is fatal.
    ///
    /// Returns the configuration together with the non-fatal warnings.
    pub fn load_validated() -> crate::error::Result<(Self, Vec<ValidationIssue>)> {
        let config = load_config()?;
        let warnings = validate_config(&config).into_result()?;
        Ok((config, warnings))
    }
}
