use anyhow::Result;
use codeclaw_graph::{GraphBackendKind, GraphIndex};
use codeclaw_mcp::handlers::SessionTools;
use codeclaw_mcp::service::{
    Redactor, SessionDiscovery, SessionIndex, SessionIndexService, SessionParser,
};
use codeclaw_protocol::{ErrorCode, Message, ProjectDescriptor, Session, ToolEnvelope};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

struct SingleProject;

impl SessionDiscovery for SingleProject {
    fn discover_projects(&self) -> Result<Vec<ProjectDescriptor>> {
        Ok(vec![ProjectDescriptor {
            dir_name: "fixture".to_string(),
            display_name: "fixture".to_string(),
            source: "test".to_string(),
        }])
    }
}

struct Fixture;

impl SessionParser for Fixture {
    fn parse_project_sessions(
        &self,
        _project: &ProjectDescriptor,
        _redactor: &dyn Redactor,
    ) -> Result<Vec<Session>> {
        Ok(vec![
            Session {
                session_id: Some("s1".to_string()),
                project: Some("alpha".to_string()),
                trajectory_type: Some("debugging_trace".to_string()),
                model: Some("claude-3".to_string()),
                messages: vec![
                    Message::new("user", "Fix the login bug in src/auth.py"),
                    Message::new("assistant", "Looking")
                        .with_tool("Read", "src/auth.py")
                        .with_tool("Bash", "pytest"),
                    Message::new("tool_result", "Error: KeyError in auth"),
                ],
                ..Default::default()
            },
            Session {
                session_id: Some("s2".to_string()),
                project: Some("beta".to_string()),
                messages: vec![
                    Message::new("user", "add usage docs"),
                    Message::new("assistant", "Done").with_tool("Edit", "README.md"),
                ],
                ..Default::default()
            },
            Session {
                session_id: Some("s3".to_string()),
                messages: vec![
                    Message::new("user", "Refactor the parser module"),
                    Message::new("assistant", "Ok").with_tool("Bash", "cargo test"),
                ],
                ..Default::default()
            },
        ])
    }
}

struct Passthrough;

impl Redactor for Passthrough {
    fn redact(&self, text: &str) -> String {
        text.to_string()
    }
}

fn tools() -> SessionTools {
    let service = SessionIndexService::new(
        SingleProject,
        Fixture,
        || Box::new(Passthrough) as Box<dyn Redactor>,
        || Box::new(GraphIndex::with_backend(GraphBackendKind::Adjacency)) as Box<dyn SessionIndex>,
    );
    SessionTools::new(Arc::new(service))
}

fn result_ids(envelope: &ToolEnvelope) -> Vec<String> {
    envelope
        .results
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["session_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn assert_failure(envelope: &ToolEnvelope, code: ErrorCode) {
    assert!(!envelope.ok);
    assert!(envelope.results.is_none());
    assert_eq!(envelope.error_code(), Some(code));
    assert!(envelope.meta.contains_key("session_count"));
}

#[test]
fn refresh_index_reports_action() {
    let tools = tools();
    let envelope = tools.refresh_index();
    assert!(envelope.ok);
    assert_eq!(envelope.results, Some(json!([])));
    assert_eq!(envelope.meta["action"], json!("index_refreshed"));
    assert_eq!(envelope.meta["refresh_count"], json!(1));
    assert_eq!(envelope.meta["session_count"], json!(3));

    let again = tools.refresh_index();
    assert_eq!(again.meta["refresh_count"], json!(2));
}

#[test]
fn search_rejects_blank_query_without_loading() {
    let tools = tools();
    let envelope = tools.search_past_solutions("   ", 5);
    assert_failure(&envelope, ErrorCode::InvalidQuery);
    assert_eq!(envelope.meta["provided_query"], json!("   "));
    assert_eq!(envelope.meta["refresh_count"], json!(0));
    assert!(!tools.service().is_loaded());
}

#[test]
fn search_rejects_non_positive_limits() {
    let tools = tools();
    for bad in [0, -1] {
        let envelope = tools.search_past_solutions("auth", bad);
        assert_failure(&envelope, ErrorCode::InvalidMaxResults);
        assert_eq!(envelope.meta["max_results"], json!(bad));
    }
}

#[test]
fn search_matches_content_and_project() {
    let tools = tools();

    let envelope = tools.search_past_solutions("  AUTH ", 5);
    assert!(envelope.ok);
    assert_eq!(result_ids(&envelope), vec!["s1"]);
    assert_eq!(envelope.meta["query"], json!("auth"));
    assert_eq!(envelope.meta["returned"], json!(1));

    let by_project = tools.search_past_solutions("beta", 5);
    assert_eq!(result_ids(&by_project), vec!["s2"]);

    let results = envelope.results.unwrap();
    assert_eq!(results[0]["rank"], json!(1));
    assert_eq!(results[0]["tool_sequence"], json!(["Read", "Bash"]));
    assert_eq!(results[0]["message_count"], json!(3));
}

#[test]
fn search_stops_at_max_results() {
    let tools = tools();
    let envelope = tools.search_past_solutions("e", 2);
    assert_eq!(result_ids(&envelope), vec!["s1", "s2"]);
    assert_eq!(envelope.meta["returned"], json!(2));
    assert_eq!(envelope.meta["max_results"], json!(2));
}

#[test]
fn similar_sessions_rank_by_graph_score() {
    let tools = tools();
    let envelope = tools.find_similar_sessions("tool:bash, file:x.py, badtoken", 5);

    assert!(envelope.ok);
    assert_eq!(result_ids(&envelope), vec!["s1", "s3"]);
    assert_eq!(envelope.meta["context_nodes"], json!(["tool:bash", "file:x.py"]));
    assert_eq!(envelope.meta["invalid_tokens"], json!(["badtoken"]));
    assert_eq!(envelope.meta["ranking"], json!("graph_similarity"));
    assert_eq!(envelope.meta["returned"], json!(2));

    let results = envelope.results.unwrap();
    assert_eq!(results[1]["rank"], json!(2));
}

#[test]
fn similar_sessions_respect_limit() {
    let tools = tools();
    let envelope = tools.find_similar_sessions("tool:bash", 1);
    assert_eq!(result_ids(&envelope), vec!["s1"]);
}

#[test]
fn similar_sessions_need_a_valid_node() {
    let tools = tools();

    let envelope = tools.find_similar_sessions("symbol:foo, nonsense", 5);
    assert_failure(&envelope, ErrorCode::InvalidContext);
    assert_eq!(envelope.meta["invalid_tokens"], json!(["symbol:foo", "nonsense"]));
    assert_eq!(envelope.meta["context"], json!("symbol:foo, nonsense"));

    let limit = tools.find_similar_sessions("tool:bash", 0);
    assert_failure(&limit, ErrorCode::InvalidMaxResults);
}

#[test]
fn similar_sessions_with_unknown_nodes_return_nothing() {
    let tools = tools();
    let envelope = tools.find_similar_sessions("tool:nonexistent", 5);
    assert!(envelope.ok);
    assert_eq!(envelope.results, Some(json!([])));
}

#[test]
fn project_patterns_aggregate_tool_usage() {
    let tools = tools();
    let envelope = tools.get_project_patterns(None);

    assert!(envelope.ok);
    assert_eq!(
        envelope.results,
        Some(json!({
            "alpha": {"session_count": 1, "tool_counts": {"Bash": 1, "Read": 1}},
            "beta": {"session_count": 1, "tool_counts": {"Edit": 1}},
            "unknown": {"session_count": 1, "tool_counts": {"Bash": 1}},
        }))
    );
    assert_eq!(envelope.meta["project_filter"], Value::Null);
    assert_eq!(envelope.meta["matched_projects"], json!(3));
}

#[test]
fn project_patterns_filter() {
    let tools = tools();

    let alpha = tools.get_project_patterns(Some(" alpha "));
    assert_eq!(alpha.meta["project_filter"], json!("alpha"));
    assert_eq!(alpha.meta["matched_projects"], json!(1));

    let unknown = tools.get_project_patterns(Some("unknown"));
    assert_eq!(unknown.meta["matched_projects"], json!(1));

    let missing = tools.get_project_patterns(Some("gamma"));
    assert!(missing.ok);
    assert_eq!(missing.results, Some(json!({})));

    let blank = tools.get_project_patterns(Some("  "));
    assert_failure(&blank, ErrorCode::InvalidProject);
    assert_eq!(blank.meta["project"], json!("  "));
}

#[test]
fn trajectory_stats_count_labels() {
    let envelope = tools().get_trajectory_stats();
    assert!(envelope.ok);
    assert_eq!(
        envelope.results,
        Some(json!({"debugging_trace": 1, "refactor": 1, "sft_clean": 1}))
    );
    assert_eq!(envelope.meta["unique_trajectories"], json!(3));
}

#[test]
fn trajectory_stats_use_the_given_classifier() {
    let base = tools();
    let tools = SessionTools::with_classifier(Arc::clone(base.service()), |_| "bucket".to_string());
    let envelope = tools.get_trajectory_stats();
    assert_eq!(envelope.results, Some(json!({"bucket": 3})));
    assert_eq!(envelope.meta["unique_trajectories"], json!(1));
}

#[test]
fn get_session_by_id() {
    let tools = tools();

    let found = tools.get_session(" s2 ");
    assert!(found.ok);
    assert_eq!(found.meta["session_id"], json!("s2"));
    let record = found.results.unwrap();
    assert_eq!(record["project"], json!("beta"));
    assert_eq!(record["messages"][1]["tool_uses"][0]["tool"], json!("Edit"));

    let missing = tools.get_session("nope");
    assert_failure(&missing, ErrorCode::SessionNotFound);
    assert_eq!(missing.meta["session_id"], json!("nope"));

    let blank = tools.get_session("");
    assert_failure(&blank, ErrorCode::InvalidSessionId);
}

#[test]
fn envelopes_render_as_json() {
    let envelope = tools().get_session("");
    let rendered: Value = serde_json::from_str(&envelope.to_json_pretty()).unwrap();
    assert_eq!(rendered["ok"], json!(false));
    assert_eq!(rendered["error"]["code"], json!("invalid_session_id"));
    assert_eq!(rendered["error"]["message"], json!("session_id must be non-empty."));
}

struct BlankProjectLabels;

impl SessionParser for BlankProjectLabels {
    fn parse_project_sessions(
        &self,
        _project: &ProjectDescriptor,
        _redactor: &dyn Redactor,
    ) -> Result<Vec<Session>> {
        Ok(vec![
            Session {
                session_id: Some("empty".to_string()),
                project: Some(String::new()),
                messages: vec![Message::new("assistant", "").with_tool("Bash", "ls")],
                ..Default::default()
            },
            Session {
                session_id: Some("missing".to_string()),
                messages: vec![Message::new("assistant", "").with_tool("Read", "a.rs")],
                ..Default::default()
            },
        ])
    }
}

#[test]
fn project_patterns_group_empty_labels_as_unknown() {
    let service = SessionIndexService::new(
        SingleProject,
        BlankProjectLabels,
        || Box::new(Passthrough) as Box<dyn Redactor>,
        || Box::new(GraphIndex::with_backend(GraphBackendKind::Adjacency)) as Box<dyn SessionIndex>,
    );
    let tools = SessionTools::new(Arc::new(service));

    let envelope = tools.get_project_patterns(None);
    assert_eq!(
        envelope.results,
        Some(json!({
            "unknown": {"session_count": 2, "tool_counts": {"Bash": 1, "Read": 1}},
        }))
    );
    assert_eq!(envelope.meta["matched_projects"], json!(1));
}
