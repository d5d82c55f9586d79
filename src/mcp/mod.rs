//! MCP (Model Context Protocol) implementation.
//!
//! Exposes the converter as three tools: `convert_url_to_bibtex`,
//! `list_handlers` and `health`.

pub mod server;
mod tools;

pub use server::McpServer;
pub use tools::{Tool, ToolHandler, ToolRegistry};
