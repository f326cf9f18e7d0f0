//! Pyrus MCP Server library.
//!
//! Provides the [`server::PyrusMcpServer`] MCP server handler and the tool
//! parameter types and operations behind it. Used by the `pyrus-mcp` binary
//! and available for integration testing.

pub mod server;
pub mod tools;
