use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod session;

pub use session::{Message, ProjectDescriptor, Session, ToolUse};

/// Number of tool names kept in a session summary.
pub const SUMMARY_TOOL_LIMIT: usize = 20;

/// Flat metadata object attached to every tool envelope.
pub type Meta = Map<String, Value>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidQuery,
    InvalidMaxResults,
    InvalidContext,
    InvalidProject,
    InvalidSessionId,
    SessionNotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidQuery => "invalid_query",
            ErrorCode::InvalidMaxResults => "invalid_max_results",
            ErrorCode::InvalidContext => "invalid_context",
            ErrorCode::InvalidProject => "invalid_project",
            ErrorCode::InvalidSessionId => "invalid_session_id",
            ErrorCode::SessionNotFound => "session_not_found",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub message: String,
}

/// Uniform result of every query operation: `{ok, results, meta}` or `{ok, error, meta}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolEnvelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub meta: Meta,
}

impl ToolEnvelope {
    pub fn success(results: Value, meta: Meta) -> Self {
        Self {
            ok: true,
            results: Some(results),
            error: None,
            meta,
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>, meta: Meta) -> Self {
        Self {
            ok: false,
            results: None,
            error: Some(ErrorEnvelope {
                code,
                message: message.into(),
            }),
            meta,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Compact view of a session returned by search and similarity results.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct SessionSummary {
    pub session_id: Option<String>,
    pub project: Option<String>,
    pub trajectory_type: Option<String>,
    pub model: Option<String>,
    pub start_time: Option<String>,
    pub message_count: usize,
    pub tool_sequence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl SessionSummary {
    pub fn from_session(session: &Session, rank: Option<usize>) -> Self {
        Self {
            session_id: session.session_id.clone(),
            project: session.project.clone(),
            trajectory_type: session.trajectory_type.clone(),
            model: session.model.clone(),
            start_time: session.start_time.clone(),
            message_count: session.message_count(),
            tool_sequence: session
                .tool_names()
                .take(SUMMARY_TOOL_LIMIT)
                .map(str::to_string)
                .collect(),
            rank,
        }
    }
}
