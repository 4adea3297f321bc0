//! Configuration I/O - Loading configuration
//!
//! Handles reading configuration from files and environment variables.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use secrecy::SecretString;

use super::types::{Config, LogConfig};
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file if it exists, otherwise defaults
/// 2. Environment variable overrides (includes `.env`)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    // Apply environment variable overrides (highest precedence)
    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::configuration(format!("Failed to read config file {}: {}", path.display(), e))
            .with_context("path", path.display().to_string())
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Invalid TOML config: {}", e)))?
    } else {
        // JSON5 is more lenient than strict JSON
        json5::from_str(&content)
            .map_err(|e| Error::configuration(format!("Invalid JSON config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` first, then overlays any set variables. Env vars have the
/// highest precedence: defaults < file < env.
///
/// A variable that is set but cannot be parsed is a configuration error.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    dotenvy::dotenv().ok();
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Overlay values from an arbitrary variable lookup
pub(crate) fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let mut invalid: Vec<(&'static str, String)> = Vec::new();

    // Qdrant overrides
    if let Some(url) = lookup("QDRANT_URL") {
        config.qdrant.url = Some(url);
    }
    if let Some(api_key) = lookup("QDRANT_API_KEY") {
        config.qdrant.api_key = Some(SecretString::from(api_key));
    }
    if let Some(name) = lookup("COLLECTION_NAME") {
        config.qdrant.collection_name = name;
    }
    if let Some(path) = lookup("QDRANT_LOCAL_PATH") {
        config.qdrant.local_path = Some(path.into());
    }

    // Embedding overrides
    if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
        config.embedding.provider = provider;
    }
    if let Some(model) = lookup("EMBEDDING_MODEL") {
        config.embedding.model = model;
    }
    if let Some(api_key) = lookup("EMBEDDING_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
        config.embedding.api_key = Some(SecretString::from(api_key));
    }
    if let Some(url) = lookup("EMBEDDING_BASE_URL") {
        config.embedding.base_url = url;
    }
    if let Some(dims) = parse_var(&lookup, "EMBEDDING_DIMENSIONS", &mut invalid) {
        config.embedding.dimensions = Some(dims);
    }
    if let Some(dir) = lookup("FASTEMBED_CACHE_DIR") {
        config.embedding.cache_dir = Some(dir.into());
    }

    // Tool overrides
    if let Some(description) = lookup("TOOL_STORE_DESCRIPTION") {
        config.tools.store_description = description;
    }
    if let Some(description) = lookup("TOOL_FIND_DESCRIPTION") {
        config.tools.find_description = description;
    }
    if let Some(limit) = parse_var(&lookup, "QDRANT_SEARCH_LIMIT", &mut invalid) {
        config.tools.default_limit = limit;
    }
    if let Some(limit) = parse_var(&lookup, "QDRANT_MAX_SEARCH_LIMIT", &mut invalid) {
        config.tools.max_limit = limit;
    }

    // Server overrides
    if let Some(host) = lookup("FASTMCP_HOST") {
        config.server.host = host;
    }
    if let Some(port) = parse_var(&lookup, "FASTMCP_PORT", &mut invalid) {
        config.server.port = port;
    }

    // Log overrides
    if let Some(level) = lookup("LOG_LEVEL") {
        config.log.level = LogConfig::normalize_level(&level);
    }
    if let Some(format) = parse_var(&lookup, "LOG_FORMAT", &mut invalid) {
        config.log.format = format;
    }

    if invalid.is_empty() {
        return Ok(());
    }

    let summary = invalid
        .iter()
        .map(|(key, reason)| format!("{}: {}", key, reason))
        .collect::<Vec<_>>()
        .join("; ");
    let mut err = Error::configuration(format!("Invalid environment variables: {}", summary));
    for (key, reason) in invalid {
        err = err.with_context(key, reason);
    }
    Err(err)
}

/// Parse a set variable, recording the failure instead of dropping it
fn parse_var<F, T>(
    lookup: &F,
    key: &'static str,
    invalid: &mut Vec<(&'static str, String)>,
) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            invalid.push((key, format!("'{}' ({})", raw, e)));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_json5_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                // comments are fine in JSON5
                qdrant: { url: "http://qdrant:6334", collection_name: "notes" },
                tools: { default_limit: 3 },
            }"#,
        )
        .unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.qdrant.url.as_deref(), Some("http://qdrant:6334"));
        assert_eq!(config.qdrant.collection_name, "notes");
        assert_eq!(config.tools.default_limit, 3);
        assert_eq!(config.tools.max_limit, 100);
    }

    #[test]
    fn test_load_toml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndimensions = 1536\n",
        )
        .unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.embedding.dimensions, Some(1536));
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("QDRANT_URL", "http://remote:6334"),
                ("QDRANT_API_KEY", "s3cret"),
                ("COLLECTION_NAME", "snippets"),
                ("EMBEDDING_MODEL", "BAAI/bge-small-en-v1.5"),
                ("TOOL_STORE_DESCRIPTION", "store code snippets"),
                ("QDRANT_SEARCH_LIMIT", "5"),
                ("FASTMCP_PORT", "9000"),
                ("LOG_LEVEL", "DEBUG"),
                ("LOG_FORMAT", "pretty"),
            ]),
        )
        .unwrap();

        assert_eq!(config.qdrant.url.as_deref(), Some("http://remote:6334"));
        assert_eq!(
            config.qdrant.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
        assert_eq!(config.qdrant.collection_name, "snippets");
        assert_eq!(config.embedding.model, "BAAI/bge-small-en-v1.5");
        assert_eq!(config.tools.store_description, "store code snippets");
        assert_eq!(config.tools.default_limit, 5);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, crate::config::LogFormat::Pretty);
    }

    #[test]
    fn test_unparseable_values_are_fatal() {
        let mut config = Config::default();
        let err = apply_overrides(
            &mut config,
            lookup_from(&[
                ("QDRANT_SEARCH_LIMIT", "ten"),
                ("FASTMCP_PORT", "99999"),
                ("COLLECTION_NAME", "notes"),
            ]),
        )
        .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert!(err.to_string().contains("QDRANT_SEARCH_LIMIT"));
        assert!(err.to_string().contains("FASTMCP_PORT"));
        assert!(err.context().contains_key("FASTMCP_PORT"));
    }

    #[test]
    fn test_each_numeric_variable_is_checked() {
        for key in [
            "EMBEDDING_DIMENSIONS",
            "QDRANT_SEARCH_LIMIT",
            "QDRANT_MAX_SEARCH_LIMIT",
            "FASTMCP_PORT",
            "LOG_FORMAT",
        ] {
            let mut config = Config::default();
            let result = apply_overrides(&mut config, lookup_from(&[(key, "not-a-value")]));
            assert!(result.is_err(), "{} should be rejected", key);
        }
    }
}
