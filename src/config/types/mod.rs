//! Configuration types module
//!
//! Split by concern: the vector store in `qdrant.rs`, embedding providers in
//! `embedding.rs`; tool, server and log settings live here.

pub mod embedding;
pub mod qdrant;

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Vector store settings
    #[serde(default)]
    pub qdrant: qdrant::QdrantConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: embedding::EmbeddingConfig,

    /// Tool descriptions and search limits
    #[serde(default)]
    pub tools: ToolConfig,

    /// Network settings for the SSE transport
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from defaults, the config file and the environment
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Settings for the two exposed tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Description advertised for `qdrant-store`
    #[serde(default = "default_store_description")]
    pub store_description: String,
    /// Description advertised for `qdrant-find`
    #[serde(default = "default_find_description")]
    pub find_description: String,
    /// Result count when the caller gives no limit
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
    /// Upper bound applied to every search
    #[serde(default = "default_max_search_limit")]
    pub max_limit: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            store_description: default_store_description(),
            find_description: default_find_description(),
            default_limit: default_search_limit(),
            max_limit: default_max_search_limit(),
        }
    }
}

fn default_store_description() -> String {
    "Keep the memory for later use, when you are asked to remember something.".to_string()
}

fn default_find_description() -> String {
    "Look up memories in Qdrant. Use this tool when you need to: \n \
     - Find memories by their content \n \
     - Access memories for further analysis \n \
     - Get some personal information about the user"
        .to_string()
}

fn default_search_limit() -> usize {
    10
}

fn default_max_search_limit() -> usize {
    100
}

/// SSE transport binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per event
    #[default]
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "plain" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(crate::error::Error::configuration(format!(
                "Invalid log format: {}. Valid options: pretty, json",
                s
            ))),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LogConfig {
    /// Lowercase a level name and map the Python-style aliases
    /// (`warning`, `critical`) onto tracing levels
    pub fn normalize_level(level: &str) -> String {
        match level.trim().to_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            other => other.to_string(),
        }
    }
}
