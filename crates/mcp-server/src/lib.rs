//! CodeClaw MCP server library.
//!
//! ## Tools
//!
//! - `refresh_index` - rebuild the session cache and graph index
//! - `search_past_solutions` - free-text search over cached sessions
//! - `find_similar_sessions` - graph similarity over `tool:`/`file:`/`error:` nodes
//! - `get_project_patterns` - per-project tool usage counts
//! - `get_trajectory_stats` - session counts per trajectory type
//! - `get_session` - full session record by id

pub mod classifier;
pub mod config;
pub mod handlers;
pub mod service;
pub mod sources;
pub mod tools;

#[cfg(test)]
mod test_support;

use codeclaw_graph::GraphIndex;
use config::ServerConfig;
use handlers::SessionTools;
use service::{Redactor, SessionIndex, SessionIndexService};
use sources::{ArchiveDiscovery, HomeDirAnonymizer, JsonlSessionParser};
use std::sync::Arc;
use tools::CodeClawServer;

/// Session service over the archive under `config.home`.
pub fn build_service(config: &ServerConfig) -> SessionIndexService {
    let backend = config.backend();
    let usernames = config.redact_usernames.clone();
    SessionIndexService::new(
        ArchiveDiscovery::new(config.home.clone()),
        JsonlSessionParser,
        move || Box::new(HomeDirAnonymizer::new(&usernames)) as Box<dyn Redactor>,
        move || Box::new(GraphIndex::with_backend(backend)) as Box<dyn SessionIndex>,
    )
}

pub fn build_server(config: &ServerConfig) -> CodeClawServer {
    CodeClawServer::new(SessionTools::new(Arc::new(build_service(config))))
}
