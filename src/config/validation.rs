//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::qdrant::{QdrantLocation, IN_MEMORY_LOCATION};
use super::types::Config;
use crate::embedding::EmbeddingProviderType;
use crate::error::{Error, ErrorContext, Result};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }

    /// Turn collected errors into a single Configuration error
    pub fn into_result(self) -> Result<Vec<ValidationIssue>> {
        if self.valid {
            return Ok(self.warnings);
        }

        let mut context = ErrorContext::new();
        for issue in &self.errors {
            context.insert(issue.path.clone(), issue.message.clone().into());
        }
        let summary = self
            .errors
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        Err(Error::configuration(format!("Invalid configuration: {}", summary))
            .with_context_map(context))
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_qdrant_config(config, result);
    result = validate_embedding_config(config, result);
    result = validate_tool_config(config, result);
    result = validate_log_config(config, result);

    result
}

fn validate_qdrant_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let qdrant = &config.qdrant;

    if qdrant.collection_name.trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("qdrant.collection_name", "Collection name must not be empty")
                .with_suggestion("Set COLLECTION_NAME"),
        );
    }

    if qdrant.url.is_some() && qdrant.local_path.is_some() {
        result = result.with_error(
            ValidationIssue::new(
                "qdrant.url",
                "QDRANT_URL and QDRANT_LOCAL_PATH are mutually exclusive",
            )
            .with_suggestion("Unset one of them"),
        );
    }

    if let Some(ref raw) = qdrant.url {
        if raw != IN_MEMORY_LOCATION {
            match url::Url::parse(raw) {
                Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
                Ok(parsed) => {
                    result = result.with_error(ValidationIssue::new(
                        "qdrant.url",
                        format!("Unsupported URL scheme '{}'", parsed.scheme()),
                    ));
                }
                Err(e) => {
                    result = result.with_error(
                        ValidationIssue::new("qdrant.url", format!("Invalid URL '{}': {}", raw, e))
                            .with_suggestion("Use a URL like http://localhost:6334 or :memory:"),
                    );
                }
            }
        }
    }

    if let QdrantLocation::Remote(ref url) = qdrant.location() {
        if url.starts_with("https://") && qdrant.api_key.is_none() {
            result = result.with_warning(
                ValidationIssue::new("qdrant.api_key", "Remote HTTPS Qdrant configured without an API key")
                    .with_suggestion("Set QDRANT_API_KEY if the server requires authentication"),
            );
        }
    }

    result
}

fn validate_embedding_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let embedding = &config.embedding;

    if embedding.model.trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("embedding.model", "Embedding model must not be empty")
                .with_suggestion("Set EMBEDDING_MODEL"),
        );
    }

    match embedding.provider.parse::<EmbeddingProviderType>() {
        Ok(EmbeddingProviderType::OpenAi) => {
            if embedding.api_key.is_none() {
                result = result.with_error(
                    ValidationIssue::new("embedding.api_key", "OpenAI embedding provider requires an API key")
                        .with_suggestion("Set EMBEDDING_API_KEY or OPENAI_API_KEY"),
                );
            }
            if embedding.dimensions.unwrap_or(0) == 0 {
                result = result.with_error(
                    ValidationIssue::new(
                        "embedding.dimensions",
                        "OpenAI embedding provider requires a positive vector dimension",
                    )
                    .with_suggestion("Set EMBEDDING_DIMENSIONS, e.g. 1536 for text-embedding-3-small"),
                );
            }
        }
        Ok(EmbeddingProviderType::FastEmbed) => {}
        Err(e) => {
            result = result.with_error(ValidationIssue::new("embedding.provider", e.message().to_string()));
        }
    }

    result
}

fn validate_tool_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let tools = &config.tools;

    if tools.max_limit == 0 {
        result = result.with_error(ValidationIssue::new(
            "tools.max_limit",
            "Maximum search limit must be at least 1",
        ));
    }

    if tools.default_limit == 0 || tools.default_limit > tools.max_limit {
        result = result.with_error(
            ValidationIssue::new(
                "tools.default_limit",
                format!(
                    "Default search limit {} must be between 1 and {}",
                    tools.default_limit, tools.max_limit
                ),
            )
            .with_suggestion("Adjust QDRANT_SEARCH_LIMIT or QDRANT_MAX_SEARCH_LIMIT"),
        );
    }

    if tools.store_description.trim().is_empty() || tools.find_description.trim().is_empty() {
        result = result.with_warning(ValidationIssue::new(
            "tools",
            "Empty tool description; clients may not know when to call the tool",
        ));
    }

    result
}

fn validate_log_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        result = result.with_error(
            ValidationIssue::new("log.level", format!("Unknown log level '{}'", config.log.level))
                .with_suggestion("Use one of trace, debug, info, warn, error"),
        );
    }

    result
}
