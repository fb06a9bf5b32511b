// Repository tag listing tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::output::{failure, json_block, with_deadline};
use crate::tools::{json_schema_object, json_schema_string, required_string, Tool, ToolContext};
use ocireg_core::ClientFactory;
use std::sync::Arc;

pub const LIST_TAGS: &str = "list_tags";

const REPOSITORY_ARG: &str = "repository";

/// Tool to list the tags of a repository
pub struct ListTagsTool {
    clients: Arc<dyn ClientFactory>,
}

impl ListTagsTool {
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }
}

#[async_trait::async_trait]
impl Tool for ListTagsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: LIST_TAGS.to_string(),
            description: "List tags for a repository".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    REPOSITORY_ARG: json_schema_string(
                        "The repository name (e.g., docker.io/library/alpine)"
                    )
                }),
                vec![REPOSITORY_ARG],
            ),
        }
    }

    async fn execute(&self, ctx: &ToolContext, arguments: serde_json::Value) -> CallToolResult {
        let repository = match required_string(&arguments, REPOSITORY_ARG) {
            Ok(repository) => repository,
            Err(result) => return result,
        };

        let client = self.clients.client(&ctx.headers);
        let tags = match with_deadline(client.list_tags(&repository)).await {
            Ok(tags) => tags,
            Err(e) => return failure("failed to list tags", e),
        };

        if tags.is_empty() {
            return CallToolResult::text(format!("No tags found for repository {}", repository));
        }

        json_block("Tags", &repository, &tags)
    }
}
