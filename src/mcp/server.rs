//! MCP request dispatch
//!
//! Transport-independent: both stdio and SSE hand raw JSON text to
//! [`McpServer::handle_message`] and write back whatever it returns.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::protocol::{
    CallToolParams, McpContent, McpRequest, McpResponse, McpToolResult, RequestId,
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;

/// Protocol revisions a client may negotiate
const SUPPORTED_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Answers MCP requests using a tool registry
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        McpServer {
            registry,
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw message. Notifications produce no response.
    pub async fn handle_message(&self, raw: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable MCP message: {}", e);
                return Some(McpResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e)));
            }
        };

        // Responses from the client (e.g. to server-initiated pings) carry no method
        if value.get("method").is_none()
            && (value.get("result").is_some() || value.get("error").is_some())
        {
            debug!("Ignoring client response");
            return None;
        }

        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
        match serde_json::from_value::<McpRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(McpResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {}", e),
            )),
        }
    }

    /// Handle a parsed request
    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        debug!(method = %request.method, "MCP request");

        if request.is_notification() {
            if request.method != "notifications/initialized" {
                debug!(method = %request.method, "Ignoring notification");
            }
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => McpResponse::success(id, self.initialize(request.params.as_ref())),
            "ping" => McpResponse::success(id, json!({})),
            "tools/list" => McpResponse::success(
                id,
                json!({ "tools": self.registry.definitions() }),
            ),
            "tools/call" => self.call_tool(id, request.params).await,
            other => McpResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        };
        Some(response)
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str());
        let version = match requested {
            Some(v) if SUPPORTED_VERSIONS.contains(&v) => v,
            _ => PROTOCOL_VERSION,
        };

        json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.name, "version": self.version }
        })
    }

    async fn call_tool(&self, id: Option<RequestId>, params: Option<Value>) -> McpResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return McpResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
            None => return McpResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let Some(result) = self.registry.execute(&params.name, arguments).await else {
            return McpResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {}", params.name));
        };

        let result = McpToolResult {
            content: result.blocks().into_iter().map(McpContent::text).collect(),
            is_error: !result.success,
        };
        match serde_json::to_value(&result) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => McpResponse::error(
                id,
                super::protocol::INTERNAL_ERROR,
                format!("Failed to encode tool result: {}", e),
            ),
        }
    }
}
