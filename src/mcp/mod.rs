//! MCP (Model Context Protocol) module
//!
//! Serves the tool registry to MCP clients.
//!
//! ## Architecture
//!
//! - **protocol**: Wire protocol types (JSON-RPC based)
//! - **server**: Method dispatch (`initialize`, `ping`, `tools/list`, `tools/call`)
//! - **stdio**: Newline-delimited JSON over stdin/stdout
//! - **sse**: Server-sent events over HTTP
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_server_qdrant::mcp::{serve_stdio, McpServer};
//! use mcp_server_qdrant::tools::ToolRegistry;
//!
//! # async fn example(registry: ToolRegistry) -> mcp_server_qdrant::Result<()> {
//! let server = Arc::new(McpServer::new(Arc::new(registry)));
//! serve_stdio(server).await?;
//! # Ok(())
//! # }
//! ```

mod protocol;
mod server;
mod sse;
mod stdio;

pub use protocol::{
    CallToolParams, McpContent, McpError, McpRequest, McpResponse, McpTool, McpToolResult,
    RequestId, PROTOCOL_VERSION,
};
pub use server::McpServer;
pub use sse::{router as sse_router, serve_sse};
pub use stdio::{serve as serve_stdio_with, serve_stdio};
