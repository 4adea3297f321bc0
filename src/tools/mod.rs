//! Tools module - the operations exposed to MCP clients
//!
//! Each tool implements the `Tool` trait and is registered into a
//! `ToolRegistry`, which the MCP server consults for `tools/list` and
//! `tools/call`.
//!
//! ## Built-in Tools
//!
//! - **qdrant-store**: remember a piece of information with optional metadata
//! - **qdrant-find**: look up remembered information by meaning

mod memory;
mod registry;
mod traits;

// Core trait and types
pub use traits::{FindArgs, StoreArgs, Tool, ToolResult};

// Registry
pub use registry::ToolRegistry;

// Memory tools
pub use memory::{QdrantFindTool, QdrantStoreTool, FIND_TOOL_NAME, STORE_TOOL_NAME};
