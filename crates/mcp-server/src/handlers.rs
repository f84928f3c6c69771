//! The six query operations, independent of any transport.
//!
//! Every operation returns a [`ToolEnvelope`]; invalid input is reported as data with an
//! [`ErrorCode`], never as a Rust error. `meta` carries operation fields first, then the service
//! counters from [`SessionIndexService::meta`].

use crate::classifier::classify_trajectory;
use crate::service::SessionIndexService;
use codeclaw_graph::NodeKind;
use codeclaw_protocol::{ErrorCode, Meta, Session, SessionSummary, ToolEnvelope};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

pub const DEFAULT_MAX_RESULTS: i64 = 5;
/// Project label for sessions with a missing or empty project.
pub const UNKNOWN_PROJECT: &str = "unknown";

pub type TrajectoryClassifier = Arc<dyn Fn(&Session) -> String + Send + Sync>;

/// Valid graph nodes parsed from a `find_similar_sessions` context string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextNodes {
    pub nodes: Vec<String>,
    /// Tokens rejected for a missing `:`, an unknown prefix or an empty value, as written
    pub invalid_tokens: Vec<String>,
}

/// Split `tool:bash, file:src/a.py` into node ids, keeping bad tokens aside.
pub fn parse_context_nodes(context: &str) -> ContextNodes {
    let mut parsed = ContextNodes::default();
    let mut seen: HashSet<String> = HashSet::new();

    for token in context.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let lowered = token.to_lowercase();
        let node = lowered.split_once(':').and_then(|(prefix, value)| {
            let value = value.trim();
            match NodeKind::from_prefix(prefix) {
                Some(kind) if !value.is_empty() => Some(kind.node(value)),
                _ => None,
            }
        });

        match node {
            Some(node) => {
                if seen.insert(node.clone()) {
                    parsed.nodes.push(node);
                }
            }
            None => parsed.invalid_tokens.push(token.to_string()),
        }
    }
    parsed
}

#[derive(Clone)]
pub struct SessionTools {
    service: Arc<SessionIndexService>,
    classify: TrajectoryClassifier,
}

impl SessionTools {
    pub fn new(service: Arc<SessionIndexService>) -> Self {
        Self::with_classifier(service, |session| {
            classify_trajectory(session).to_string()
        })
    }

    pub fn with_classifier(
        service: Arc<SessionIndexService>,
        classify: impl Fn(&Session) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            service,
            classify: Arc::new(classify),
        }
    }

    pub fn service(&self) -> &Arc<SessionIndexService> {
        &self.service
    }

    pub fn refresh_index(&self) -> ToolEnvelope {
        let mut meta = fields([("action", json!("index_refreshed"))]);
        meta.extend(self.service.refresh().into_meta());
        ToolEnvelope::success(json!([]), meta)
    }

    pub fn search_past_solutions(&self, query: &str, max_results: i64) -> ToolEnvelope {
        let needle = query.to_lowercase().trim().to_string();
        if needle.is_empty() {
            return self.failure(
                ErrorCode::InvalidQuery,
                "query must be non-empty text.",
                [("provided_query", json!(query))],
            );
        }
        let Some(limit) = positive_limit(max_results) else {
            return self.invalid_max_results(max_results);
        };

        let mut summaries: Vec<SessionSummary> = Vec::new();
        for session in self.service.sessions().iter() {
            if summaries.len() >= limit {
                break;
            }
            let content_match = session
                .messages
                .iter()
                .any(|message| message.content.to_lowercase().contains(&needle));
            let project_match = session
                .project
                .as_deref()
                .is_some_and(|project| project.to_lowercase().contains(&needle));
            if content_match || project_match {
                summaries.push(SessionSummary::from_session(session, Some(summaries.len() + 1)));
            }
        }

        let returned = summaries.len();
        self.success(
            json!(summaries),
            [
                ("query", json!(needle)),
                ("returned", json!(returned)),
                ("max_results", json!(max_results)),
            ],
        )
    }

    pub fn find_similar_sessions(&self, context: &str, max_results: i64) -> ToolEnvelope {
        let Some(limit) = positive_limit(max_results) else {
            return self.invalid_max_results(max_results);
        };

        let ContextNodes {
            nodes,
            invalid_tokens,
        } = parse_context_nodes(context);
        if nodes.is_empty() {
            return self.failure(
                ErrorCode::InvalidContext,
                "context must include at least one node (tool:, file:, or error:).",
                [
                    ("invalid_tokens", json!(invalid_tokens)),
                    ("context", json!(context)),
                ],
            );
        }

        let matches = self.service.index().query(&nodes, limit);
        let results: Vec<SessionSummary> = matches
            .iter()
            .enumerate()
            .map(|(i, session)| SessionSummary::from_session(session, Some(i + 1)))
            .collect();

        let returned = results.len();
        self.success(
            json!(results),
            [
                ("context_nodes", json!(nodes)),
                ("invalid_tokens", json!(invalid_tokens)),
                ("returned", json!(returned)),
                ("max_results", json!(max_results)),
                ("ranking", json!("graph_similarity")),
            ],
        )
    }

    pub fn get_project_patterns(&self, project: Option<&str>) -> ToolEnvelope {
        let project_filter = match project {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return self.failure(
                        ErrorCode::InvalidProject,
                        "project filter must be non-empty when provided.",
                        [("project", json!(raw))],
                    );
                }
                Some(trimmed)
            }
            None => None,
        };

        let mut per_project: Map<String, Value> = Map::new();
        for session in self.service.sessions().iter() {
            let name = session
                .project
                .as_deref()
                .filter(|project| !project.is_empty())
                .unwrap_or(UNKNOWN_PROJECT);
            if project_filter.is_some_and(|filter| filter != name) {
                continue;
            }

            let stats = per_project
                .entry(name.to_string())
                .or_insert_with(|| json!({"session_count": 0, "tool_counts": {}}));
            let session_count = stats["session_count"].as_u64().unwrap_or(0) + 1;
            stats["session_count"] = json!(session_count);
            if let Some(tool_counts) = stats["tool_counts"].as_object_mut() {
                for tool in session.tool_names() {
                    let count = tool_counts.get(tool).and_then(Value::as_u64).unwrap_or(0);
                    tool_counts.insert(tool.to_string(), json!(count + 1));
                }
            }
        }

        let matched = per_project.len();
        self.success(
            Value::Object(per_project),
            [
                ("project_filter", json!(project_filter)),
                ("matched_projects", json!(matched)),
            ],
        )
    }

    pub fn get_trajectory_stats(&self) -> ToolEnvelope {
        let mut counts: Map<String, Value> = Map::new();
        for session in self.service.sessions().iter() {
            let label = (self.classify)(session);
            let count = counts.get(&label).and_then(Value::as_u64).unwrap_or(0);
            counts.insert(label, json!(count + 1));
        }

        let unique = counts.len();
        self.success(
            Value::Object(counts),
            [("unique_trajectories", json!(unique))],
        )
    }

    pub fn get_session(&self, session_id: &str) -> ToolEnvelope {
        let lookup = session_id.trim();
        if lookup.is_empty() {
            return self.failure(
                ErrorCode::InvalidSessionId,
                "session_id must be non-empty.",
                [("session_id", json!(session_id))],
            );
        }

        let sessions = self.service.sessions();
        let found = sessions
            .iter()
            .find(|session| session.session_id.as_deref() == Some(lookup));
        match found {
            Some(session) => self.success(json!(session), [("session_id", json!(lookup))]),
            None => self.failure(
                ErrorCode::SessionNotFound,
                "Session ID was not found in the local cache.",
                [("session_id", json!(lookup))],
            ),
        }
    }

    fn invalid_max_results(&self, max_results: i64) -> ToolEnvelope {
        self.failure(
            ErrorCode::InvalidMaxResults,
            "max_results must be greater than 0.",
            [("max_results", json!(max_results))],
        )
    }

    fn success<const N: usize>(&self, results: Value, op_fields: [(&str, Value); N]) -> ToolEnvelope {
        ToolEnvelope::success(results, self.meta_with(op_fields))
    }

    fn failure<const N: usize>(
        &self,
        code: ErrorCode,
        message: &str,
        op_fields: [(&str, Value); N],
    ) -> ToolEnvelope {
        ToolEnvelope::failure(code, message, self.meta_with(op_fields))
    }

    fn meta_with<const N: usize>(&self, op_fields: [(&str, Value); N]) -> Meta {
        let mut meta = fields(op_fields);
        meta.extend(self.service.meta().into_meta());
        meta
    }
}

fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Meta {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn positive_limit(max_results: i64) -> Option<usize> {
    if max_results <= 0 {
        return None;
    }
    Some(usize::try_from(max_results).unwrap_or(usize::MAX))
}
