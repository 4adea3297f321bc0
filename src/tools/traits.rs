//! Core tool trait and result types

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationContext;
use crate::error::Result;
use crate::mcp::McpTool;

/// A tool exposed to MCP clients
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the JSON Schema for tool parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool. `ctx` identifies the request in every log line.
    async fn execute(&self, ctx: CorrelationContext, args: Value) -> Result<ToolResult>;

    /// Convert to an MCP tool definition
    fn to_definition(&self) -> McpTool {
        McpTool {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution was successful
    pub success: bool,
    /// Text blocks returned to the client, in order
    pub content: Vec<String>,
    /// Error message (for failed execution)
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result with one text block
    pub fn success(content: impl Into<String>) -> Self {
        Self::success_blocks(vec![content.into()])
    }

    /// Create a successful result with several text blocks
    pub fn success_blocks(content: Vec<String>) -> Self {
        ToolResult {
            success: true,
            content,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>) -> Self {
        ToolResult {
            success: false,
            content: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Blocks to send over the wire; a failure is a single block holding the error
    pub fn blocks(&self) -> Vec<String> {
        if self.success {
            self.content.clone()
        } else {
            vec![self.error.clone().unwrap_or_default()]
        }
    }
}

impl std::fmt::Display for ToolResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.success {
            write!(f, "{}", self.content.join("\n"))
        } else {
            write!(f, "Error: {}", self.error.as_deref().unwrap_or_default())
        }
    }
}

/// JSON Schema for an argument struct, without the root-only keys
pub(crate) fn schema_for<T: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
    }
    schema
}

/// Parse tool arguments, describing the problem in client terms on failure
pub(crate) fn parse_arguments<T: DeserializeOwned>(tool: &str, args: Value) -> std::result::Result<T, String> {
    // Some clients send `null` instead of `{}` for tools without required arguments
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments for {}: {}", tool, e))
}

/// Arguments accepted by `qdrant-store`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StoreArgs {
    /// Information to remember
    pub information: String,
    /// Optional structured data stored alongside the information
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, Value>>,
}

/// Arguments accepted by `qdrant-find`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FindArgs {
    /// What to search for
    pub query: String,
    /// Maximum number of results
    #[serde(default)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result() {
        let success = ToolResult::success("Done!");
        assert!(success.success);
        assert_eq!(success.blocks(), vec!["Done!".to_string()]);

        let failure = ToolResult::failure("Oops!");
        assert!(!failure.success);
        assert_eq!(failure.blocks(), vec!["Oops!".to_string()]);
        assert_eq!(failure.to_string(), "Error: Oops!");
    }

    #[test]
    fn test_store_schema() {
        let schema = schema_for::<StoreArgs>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["information"]));
        assert!(schema["properties"]["metadata"].is_object());
        assert!(schema["properties"].get("collection_name").is_none());
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn test_parse_arguments() {
        let args: FindArgs =
            parse_arguments("qdrant-find", json!({"query": "files", "limit": 3})).unwrap();
        assert_eq!(args.query, "files");
        assert_eq!(args.limit, Some(3));

        let err = parse_arguments::<FindArgs>("qdrant-find", json!({"limit": 3})).unwrap_err();
        assert!(err.starts_with("Invalid arguments for qdrant-find"));

        let err = parse_arguments::<FindArgs>("qdrant-find", Value::Null).unwrap_err();
        assert!(err.contains("query"));
    }
}
