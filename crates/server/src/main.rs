use anyhow::Result;
use clap::Parser;
use ocireg_core::EnvClientFactory;
use ocireg_mcp::{tools::registry_tools, McpServer};
use std::sync::Arc;

mod api;
mod config;
mod shutdown;
mod sse;

use config::{ServerConfig, DEFAULT_HOST, MCP_PORT_ENV};

#[derive(Parser, Debug)]
#[command(name = "ocireg-mcp", version)]
#[command(about = "MCP server for inspecting OCI container registries", long_about = None)]
struct Args {
    /// Port to listen on (must be between 0 and 65535) [env: MCP_PORT, default: 8080]
    #[arg(short, long, allow_negative_numbers = true)]
    port: Option<i64>,

    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocireg=info,tower_http=info".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let env_port = config::port_from_env(std::env::var(MCP_PORT_ENV).ok().as_deref());
    let port = config::resolve_port(args.port, env_port);
    let config = ServerConfig::new(args.host, port);

    let tools = registry_tools(Arc::new(EnvClientFactory::new()));
    let mcp = McpServer::new(config.name.clone(), config.version.clone(), tools);
    tracing::info!("Registered {} tools", mcp.tools().len());

    api::serve(&config, mcp, shutdown::signal()).await
}
