//! MCP tools for CodeClaw
//!
//! Exposes the session query operations to AI agents over the MCP protocol.

use crate::handlers::{SessionTools, DEFAULT_MAX_RESULTS};
use codeclaw_protocol::ToolEnvelope;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;

/// CodeClaw MCP service
#[derive(Clone)]
pub struct CodeClawServer {
    tools: SessionTools,
    /// Tool router
    tool_router: ToolRouter<Self>,
}

impl CodeClawServer {
    pub fn new(tools: SessionTools) -> Self {
        Self {
            tools,
            tool_router: Self::tool_router(),
        }
    }

    pub fn tools(&self) -> &SessionTools {
        &self.tools
    }

    /// Run a query operation on the blocking pool; cold loads read the archive from disk.
    async fn run<F>(&self, op: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&SessionTools) -> ToolEnvelope + Send + 'static,
    {
        let tools = self.tools.clone();
        match tokio::task::spawn_blocking(move || op(&tools)).await {
            Ok(envelope) => Ok(render(&envelope)),
            Err(err) => {
                log::error!("Tool task failed: {err}");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Internal error: {err}"
                ))]))
            }
        }
    }
}

fn render(envelope: &ToolEnvelope) -> CallToolResult {
    let text = envelope.to_json_pretty();
    if envelope.ok {
        CallToolResult::success(vec![Content::text(text)])
    } else {
        CallToolResult::error(vec![Content::text(text)])
    }
}

#[tool_handler]
impl ServerHandler for CodeClawServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("CodeClaw searches your past coding-assistant sessions. Use 'search_past_solutions' for free-text lookup, 'find_similar_sessions' with tool:/file:/error: nodes for structural matches, 'get_session' for full transcripts, and 'refresh_index' after new sessions are archived.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Request types
// ============================================================================

fn default_max_results() -> i64 {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Free text matched against message content and project names
    #[schemars(description = "Case-insensitive text to look for")]
    pub query: String,

    /// Maximum number of sessions to return (default: 5)
    #[serde(default = "default_max_results")]
    #[schemars(description = "Limit number of results (must be > 0)")]
    pub max_results: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SimilarRequest {
    /// Comma-separated graph nodes, e.g. `tool:bash, file:src/app.py, error:keyerror`
    #[schemars(description = "Comma-separated nodes prefixed with tool:, file:, or error:")]
    pub context: String,

    /// Maximum number of sessions to return (default: 5)
    #[serde(default = "default_max_results")]
    #[schemars(description = "Limit number of results (must be > 0)")]
    pub max_results: i64,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct PatternsRequest {
    /// Restrict statistics to one project
    #[schemars(description = "Project name filter (omit for all projects)")]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SessionRequest {
    #[schemars(description = "Session identifier")]
    pub session_id: String,
}

// ============================================================================
// Tools
// ============================================================================

#[tool_router]
impl CodeClawServer {
    #[tool(description = "Rebuild the session cache and graph index from the local archive.")]
    pub async fn refresh_index(&self) -> Result<CallToolResult, McpError> {
        self.run(|tools| tools.refresh_index()).await
    }

    #[tool(description = "Find past sessions whose messages or project name contain the query text.")]
    pub async fn search_past_solutions(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.search_past_solutions(&request.query, request.max_results))
            .await
    }

    #[tool(description = "Find structurally similar sessions from graph context nodes (tool:, file:, error:).")]
    pub async fn find_similar_sessions(
        &self,
        Parameters(request): Parameters<SimilarRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.find_similar_sessions(&request.context, request.max_results))
            .await
    }

    #[tool(description = "Per-project session counts and tool usage counts.")]
    pub async fn get_project_patterns(
        &self,
        Parameters(request): Parameters<PatternsRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.get_project_patterns(request.project.as_deref()))
            .await
    }

    #[tool(description = "Count cached sessions per trajectory type.")]
    pub async fn get_trajectory_stats(&self) -> Result<CallToolResult, McpError> {
        self.run(|tools| tools.get_trajectory_stats()).await
    }

    #[tool(description = "Return the full record of one session by id.")]
    pub async fn get_session(
        &self,
        Parameters(request): Parameters<SessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.run(move |tools| tools.get_session(&request.session_id))
            .await
    }
}
