//! Memory tools - `qdrant-store` and `qdrant-find`
//!
//! Thin adapters between MCP tool calls and [`QdrantConnector`]. Both tools
//! always work on the configured collection. Failures are already logged with
//! full context by the connector; clients only receive the error's message.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::correlation::CorrelationContext;
use crate::error::Result;
use crate::qdrant::{Entry, QdrantConnector};
use crate::tools::traits::{parse_arguments, schema_for, FindArgs, StoreArgs, Tool, ToolResult};

pub const STORE_TOOL_NAME: &str = "qdrant-store";
pub const FIND_TOOL_NAME: &str = "qdrant-find";

/// Tool to save information to the vector store
pub struct QdrantStoreTool {
    connector: Arc<QdrantConnector>,
    description: String,
}

impl QdrantStoreTool {
    pub fn new(connector: Arc<QdrantConnector>, description: impl Into<String>) -> Self {
        QdrantStoreTool {
            connector,
            description: description.into(),
        }
    }
}

#[async_trait]
impl Tool for QdrantStoreTool {
    fn name(&self) -> &str {
        STORE_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        schema_for::<StoreArgs>()
    }

    async fn execute(&self, ctx: CorrelationContext, args: Value) -> Result<ToolResult> {
        let args: StoreArgs = match parse_arguments(STORE_TOOL_NAME, args) {
            Ok(args) => args,
            Err(message) => return Ok(ToolResult::failure(message)),
        };

        info!(
            correlation_id = %ctx,
            information_length = args.information.len(),
            has_metadata = args.metadata.is_some(),
            "Received store request"
        );

        let entry = Entry::new(args.information, args.metadata);
        match self.connector.store(ctx, &entry, None).await {
            Ok(()) => Ok(ToolResult::success(format!(
                "Remembered: {}",
                entry.content()
            ))),
            Err(e) => Ok(ToolResult::failure(format!(
                "Failed to store information: {}",
                e.client_message()
            ))),
        }
    }
}

/// Tool to look up stored information by meaning
pub struct QdrantFindTool {
    connector: Arc<QdrantConnector>,
    description: String,
}

impl QdrantFindTool {
    pub fn new(connector: Arc<QdrantConnector>, description: impl Into<String>) -> Self {
        QdrantFindTool {
            connector,
            description: description.into(),
        }
    }
}

#[async_trait]
impl Tool for QdrantFindTool {
    fn name(&self) -> &str {
        FIND_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        schema_for::<FindArgs>()
    }

    async fn execute(&self, ctx: CorrelationContext, args: Value) -> Result<ToolResult> {
        let args: FindArgs = match parse_arguments(FIND_TOOL_NAME, args) {
            Ok(args) => args,
            Err(message) => return Ok(ToolResult::failure(message)),
        };

        info!(
            correlation_id = %ctx,
            query_length = args.query.len(),
            limit = ?args.limit,
            "Received find request"
        );

        let entries = match self.connector.search(ctx, &args.query, None, args.limit).await {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(ToolResult::failure(format!(
                    "Failed to search for information: {}",
                    e.client_message()
                )))
            }
        };

        if entries.is_empty() {
            debug!(correlation_id = %ctx, "No results for query");
            return Ok(ToolResult::success(format!(
                "No information found for the query '{}'",
                args.query
            )));
        }

        let mut blocks = Vec::with_capacity(entries.len() + 1);
        blocks.push(format!("Results for the query '{}'", args.query));
        blocks.extend(entries.iter().map(format_entry));

        Ok(ToolResult::success_blocks(blocks))
    }
}

/// Render one entry for the client
fn format_entry(entry: &Entry) -> String {
    let metadata = entry
        .metadata()
        .filter(|m| !m.is_empty())
        .and_then(|m| serde_json::to_string(m).ok())
        .unwrap_or_default();
    format!(
        "<entry><content>{}</content><metadata>{}</metadata></entry>",
        entry.content(),
        metadata
    )
}
