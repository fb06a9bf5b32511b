// Image tools: summary info, manifest and config

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::output::{failure, json_block, with_deadline};
use crate::tools::{json_schema_object, json_schema_string, required_string, Tool, ToolContext};
use ocireg_core::{ClientFactory, ImageInfo};
use std::sync::Arc;

pub const GET_IMAGE_INFO: &str = "get_image_info";
pub const GET_IMAGE_MANIFEST: &str = "get_image_manifest";
pub const GET_IMAGE_CONFIG: &str = "get_image_config";

const IMAGE_REF_ARG: &str = "image_ref";

fn image_ref_schema(name: &str, description: &str) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json_schema_object(
            serde_json::json!({
                IMAGE_REF_ARG: json_schema_string(
                    "The image reference (e.g., docker.io/library/alpine:latest)"
                )
            }),
            vec![IMAGE_REF_ARG],
        ),
    }
}

/// Tool to summarize an image: config digest and size, platform, creation
/// time and layer count
pub struct GetImageInfoTool {
    clients: Arc<dyn ClientFactory>,
}

impl GetImageInfoTool {
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }
}

#[async_trait::async_trait]
impl Tool for GetImageInfoTool {
    fn schema(&self) -> ToolSchema {
        image_ref_schema(GET_IMAGE_INFO, "Get information about an OCI image")
    }

    async fn execute(&self, ctx: &ToolContext, arguments: serde_json::Value) -> CallToolResult {
        let image_ref = match required_string(&arguments, IMAGE_REF_ARG) {
            Ok(image_ref) => image_ref,
            Err(result) => return result,
        };

        let client = self.clients.client(&ctx.headers);
        let image = match with_deadline(client.get_image(&image_ref)).await {
            Ok(image) => image,
            Err(e) => return failure("failed to get image", e),
        };

        match ImageInfo::from_image(&image) {
            Ok(info) => json_block("Image information", &image_ref, &info),
            Err(e) => failure("failed to get config", e),
        }
    }
}

/// Tool to fetch an image manifest
pub struct GetImageManifestTool {
    clients: Arc<dyn ClientFactory>,
}

impl GetImageManifestTool {
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }
}

#[async_trait::async_trait]
impl Tool for GetImageManifestTool {
    fn schema(&self) -> ToolSchema {
        image_ref_schema(GET_IMAGE_MANIFEST, "Get the manifest for an OCI image")
    }

    async fn execute(&self, ctx: &ToolContext, arguments: serde_json::Value) -> CallToolResult {
        let image_ref = match required_string(&arguments, IMAGE_REF_ARG) {
            Ok(image_ref) => image_ref,
            Err(result) => return result,
        };

        let client = self.clients.client(&ctx.headers);
        match with_deadline(client.get_manifest(&image_ref)).await {
            Ok(manifest) => json_block("Manifest", &image_ref, &manifest),
            Err(e) => failure("failed to get manifest", e),
        }
    }
}

/// Tool to fetch an image config
pub struct GetImageConfigTool {
    clients: Arc<dyn ClientFactory>,
}

impl GetImageConfigTool {
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }
}

#[async_trait::async_trait]
impl Tool for GetImageConfigTool {
    fn schema(&self) -> ToolSchema {
        image_ref_schema(GET_IMAGE_CONFIG, "Get the config for an OCI image")
    }

    async fn execute(&self, ctx: &ToolContext, arguments: serde_json::Value) -> CallToolResult {
        let image_ref = match required_string(&arguments, IMAGE_REF_ARG) {
            Ok(image_ref) => image_ref,
            Err(result) => return result,
        };

        let client = self.clients.client(&ctx.headers);
        match with_deadline(client.get_config(&image_ref)).await {
            Ok(config) => json_block("Config", &image_ref, &config),
            Err(e) => failure("failed to get config", e),
        }
    }
}
