//! CodeClaw MCP Server
//!
//! Serves search and similarity tools over past coding-assistant sessions via MCP (stdio).
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "codeclaw": {
//!       "command": "codeclaw-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use clap::Parser;
use codeclaw_graph::GraphBackendKind;
use codeclaw_mcp::build_server;
use codeclaw_mcp::config::ServerConfig;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codeclaw-mcp")]
#[command(about = "MCP server for searching past coding-assistant sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// CodeClaw home directory (overrides CODECLAW_HOME)
    #[arg(long)]
    home: Option<PathBuf>,

    /// Graph backend: petgraph or adjacency (overrides CODECLAW_GRAPH_BACKEND)
    #[arg(long)]
    graph_backend: Option<GraphBackendKind>,

    /// Load the archive before accepting requests instead of on first use
    #[arg(long)]
    eager: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = ServerConfig::from_env();
    if let Some(home) = cli.home {
        config.home = home;
    }
    if cli.graph_backend.is_some() {
        config.graph_backend = cli.graph_backend;
    }

    log::info!(
        "Starting CodeClaw MCP server (home: {}, backend: {})",
        config.home.display(),
        config.backend()
    );

    let service = build_server(&config);
    if cli.eager {
        let tools = service.tools().clone();
        let meta = tokio::task::spawn_blocking(move || tools.service().refresh()).await?;
        log::info!("Preloaded {} sessions", meta.session_count);
    }

    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("CodeClaw MCP server stopped");
    Ok(())
}
