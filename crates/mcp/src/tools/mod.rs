pub mod image;
mod output;
mod registry;
pub mod tags;
#[cfg(test)]
pub(crate) mod testing;

pub use image::{GetImageConfigTool, GetImageInfoTool, GetImageManifestTool};
pub use output::CALL_TIMEOUT;
pub use registry::{
    json_schema_object, json_schema_string, required_string, Tool, ToolContext, ToolRegistry,
};
pub use tags::ListTagsTool;

use ocireg_core::ClientFactory;
use std::sync::Arc;

/// Registry holding the four OCI registry tools, all sharing `clients`.
pub fn registry_tools(clients: Arc<dyn ClientFactory>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GetImageInfoTool::new(clients.clone())));
    registry.register(Arc::new(ListTagsTool::new(clients.clone())));
    registry.register(Arc::new(GetImageManifestTool::new(clients.clone())));
    registry.register(Arc::new(GetImageConfigTool::new(clients)));
    registry
}
