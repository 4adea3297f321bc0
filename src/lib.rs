//! # mcp-server-qdrant
//!
//! Semantic memory for language-model clients, served over the Model Context
//! Protocol and backed by Qdrant.
//!
//! ## Features
//!
//! - **Two tools:** `qdrant-store` remembers text with optional metadata,
//!   `qdrant-find` recalls the most similar entries
//! - **Pluggable embeddings:** local fastembed models or any OpenAI-compatible API
//! - **Lazy collections:** created on first store with the provider's vector size
//! - **Traceable:** every request carries a correlation id through its log lines
//! - **Two transports:** stdio and server-sent events

pub mod config;
pub mod correlation;
pub mod embedding;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod qdrant;
pub mod tools;

pub use config::Config;
pub use correlation::CorrelationContext;
pub use error::{Error, ErrorKind, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
