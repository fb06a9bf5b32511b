// MCP (Model Context Protocol) server exposing OCI registry tools
// Transport-agnostic: the HTTP+SSE transport lives in the server crate

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
