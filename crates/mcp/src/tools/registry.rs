// MCP tool trait and registry

use crate::protocol::{CallToolResult, ToolSchema};
use http::HeaderMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-invocation context handed to tools by the transport.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Headers of the inbound HTTP request carrying the call.
    pub headers: HeaderMap,
}

impl ToolContext {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

/// Tool executor trait
///
/// Execution never fails at the RPC level; every failure is reported as a
/// [`CallToolResult`] with `is_error` set.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, ctx: &ToolContext, arguments: serde_json::Value) -> CallToolResult;
}

/// Tool registry for managing available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, ordered by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

/// Extract a required, non-empty string argument.
///
/// The error is the user-visible `"<name> is required"` result.
pub fn required_string(arguments: &serde_json::Value, name: &str) -> Result<String, CallToolResult> {
    arguments
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CallToolResult::error(format!("{} is required", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".to_string(),
                description: "Echo the message argument".to_string(),
                input_schema: json_schema_object(
                    serde_json::json!({ "message": json_schema_string("Text to echo") }),
                    vec!["message"],
                ),
            }
        }

        async fn execute(&self, _ctx: &ToolContext, arguments: serde_json::Value) -> CallToolResult {
            match required_string(&arguments, "message") {
                Ok(message) => CallToolResult::text(message),
                Err(result) => result,
            }
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert!(registry.get("missing").is_none());

        let schemas = registry.list_schemas();
        assert_eq!(schemas[0].input_schema["required"], serde_json::json!(["message"]));
    }

    #[tokio::test]
    async fn test_execute_via_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let tool = registry.get("echo").unwrap();
        let result = tool
            .execute(&ToolContext::default(), serde_json::json!({"message": "hi"}))
            .await;
        assert_eq!(result.first_text(), Some("hi"));
    }

    #[test]
    fn test_required_string() {
        let args = serde_json::json!({"image_ref": "alpine", "empty": "", "number": 3});

        assert_eq!(required_string(&args, "image_ref").unwrap(), "alpine");

        for name in ["empty", "number", "missing"] {
            let err = required_string(&args, name).unwrap_err();
            assert!(err.is_error());
            assert_eq!(err.first_text(), Some(format!("{} is required", name).as_str()));
        }

        let err = required_string(&serde_json::Value::Null, "repository").unwrap_err();
        assert_eq!(err.first_text(), Some("repository is required"));
    }
}
