//! Tool registry - manages the tools served over MCP

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{warn, Instrument};

use crate::config::ToolConfig;
use crate::correlation::CorrelationContext;
use crate::mcp::McpTool;
use crate::qdrant::QdrantConnector;

use super::memory::{QdrantFindTool, QdrantStoreTool};
use super::traits::{Tool, ToolResult};

/// Registry of available tools, ordered by name
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ToolRegistry {
            tools: BTreeMap::new(),
        }
    }

    /// Registry holding `qdrant-store` and `qdrant-find`
    pub fn with_memory_tools(connector: Arc<QdrantConnector>, config: &ToolConfig) -> Self {
        let mut registry = Self::new();
        registry.register(QdrantStoreTool::new(
            connector.clone(),
            config.store_description.clone(),
        ));
        registry.register(QdrantFindTool::new(connector, config.find_description.clone()));
        registry
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions
    pub fn definitions(&self) -> Vec<McpTool> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Run one tool call under a fresh correlation id.
    ///
    /// Returns `None` when no tool has that name.
    pub async fn execute(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tool = self.get(name)?;
        let ctx = CorrelationContext::new();

        let result = match tool.execute(ctx, args).instrument(ctx.span(name)).await {
            Ok(result) => result,
            Err(e) => ToolResult::failure(e.client_message()),
        };

        if !result.success {
            warn!(correlation_id = %ctx, tool = name, "Tool call failed");
        }
        Some(result)
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// List tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::HashingProvider;
    use crate::error::{Error, Result};
    use crate::qdrant::LocalBackend;
    use async_trait::async_trait;
    use serde_json::json;

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn parameters_schema(&self) -> Value {
            json!({ "type": "object" })
        }
        async fn execute(&self, _ctx: CorrelationContext, _args: Value) -> Result<ToolResult> {
            Err(Error::search("Search backend exploded").with_context("secret", "internal detail"))
        }
    }

    fn registry() -> ToolRegistry {
        let connector = Arc::new(QdrantConnector::new(
            Arc::new(LocalBackend::in_memory()),
            Arc::new(HashingProvider::new(32)),
            "memories",
        ));
        ToolRegistry::with_memory_tools(connector, &ToolConfig::default())
    }

    #[test]
    fn test_memory_tools_registered() {
        let registry = registry();
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.names(), vec!["qdrant-find", "qdrant-store"]);

        let definitions = registry.definitions();
        assert_eq!(
            definitions[1].description,
            ToolConfig::default().store_description
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        assert!(registry().execute("qdrant-delete", json!({})).await.is_none());
    }

    #[tokio::test]
    async fn test_errors_become_client_safe_failures() {
        let mut registry = ToolRegistry::new();
        registry.register(Broken);

        let result = registry.execute("broken", json!({})).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Search backend exploded"));
    }

    #[tokio::test]
    async fn test_execute_store() {
        let result = tokio_test::assert_ok!(
            tokio::time::timeout(
                std::time::Duration::from_secs(5),
                registry().execute("qdrant-store", json!({ "information": "remember me" }))
            )
            .await
        );
        assert_eq!(result.unwrap().content, vec!["Remembered: remember me".to_string()]);
    }
}
