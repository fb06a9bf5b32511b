// MCP method router: maps JSON-RPC requests onto the tool registry

use crate::protocol::{
    CallToolParams, CancelledParams, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, JSONRPC_VERSION, PROTOCOL_VERSION,
};
use crate::tools::{ToolContext, ToolRegistry};
use serde::Serialize;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_PING: &str = "ping";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";
pub const NOTIFICATION_CANCELLED: &str = "notifications/cancelled";

/// Transport-independent MCP server.
///
/// Holds no per-client state; any number of requests may be handled
/// concurrently.
pub struct McpServer {
    info: ServerInfo,
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            tools,
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one JSON-RPC message. Notifications yield `None`.
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        ctx: &ToolContext,
    ) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "Received notification");
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        let params = request.params.unwrap_or(serde_json::Value::Null);
        let result = match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(params),
            METHOD_PING => Ok(serde_json::json!({})),
            METHOD_TOOLS_LIST => to_result(&ListToolsResult {
                tools: self.tools.list_schemas(),
            }),
            METHOD_TOOLS_CALL => self.call_tool(params, ctx).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: serde_json::Value) -> Result<serde_json::Value, JsonRpcError> {
        let params: InitializeParams = if params.is_null() {
            InitializeParams::default()
        } else {
            serde_json::from_value(params)
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)))?
        };

        if let Some(client) = &params.client_info {
            tracing::info!(client = %client.name, version = %client.version, "Client initialized");
        }

        to_result(&InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
        })
    }

    async fn call_tool(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)))?;

        let tool = self
            .tools
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        tracing::info!(tool = %params.name, "Calling tool");
        let result = tool.execute(ctx, params.arguments).await;
        tracing::info!(tool = %params.name, is_error = result.is_error(), "Tool call finished");

        to_result(&result)
    }
}

/// Id of the request a `notifications/cancelled` message refers to.
pub fn cancelled_request_id(request: &JsonRpcRequest) -> Option<serde_json::Value> {
    if request.method != NOTIFICATION_CANCELLED {
        return None;
    }
    let params = request.params.clone()?;
    serde_json::from_value::<CancelledParams>(params)
        .ok()
        .map(|p| p.request_id)
}

fn to_result(value: &impl Serialize) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}
