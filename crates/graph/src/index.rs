use crate::builder::index_session;
use crate::graph::{new_graph, DirectedGraph};
use crate::nodes::normalize;
use crate::types::GraphBackendKind;
use codeclaw_protocol::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Points awarded to a session that directly contributed a queried node.
pub const DIRECT_MATCH_SCORE: u32 = 2;
/// Points awarded per one-hop neighbor of a queried node the session contributed.
pub const NEIGHBOR_MATCH_SCORE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub nodes: usize,
    pub edges: usize,
    pub sessions: usize,
    pub backend: GraphBackendKind,
    pub petgraph_available: bool,
}

/// In-memory graph index over a set of sessions.
///
/// ```
/// use codeclaw_graph::GraphIndex;
/// use codeclaw_protocol::{Message, Session};
///
/// let session = Session {
///     session_id: Some("s1".into()),
///     messages: vec![Message::new("assistant", "").with_tool("Read", "").with_tool("Bash", "")],
///     ..Default::default()
/// };
/// let mut index = GraphIndex::new();
/// index.build(vec![session]);
/// let similar = index.query(&["tool:bash"], 5);
/// assert_eq!(similar[0].session_id.as_deref(), Some("s1"));
/// ```
pub struct GraphIndex {
    backend: GraphBackendKind,
    graph: Box<dyn DirectedGraph>,
    /// node -> contributing session ids, first-appearance order, no duplicates
    node_to_sessions: HashMap<String, Vec<String>>,
    sessions: HashMap<String, Arc<Session>>,
    /// running count of added records, used for fallback ids
    added: usize,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::with_backend(GraphBackendKind::detect())
    }

    pub fn with_backend(backend: GraphBackendKind) -> Self {
        let backend = GraphBackendKind::resolve(Some(backend));
        Self {
            backend,
            graph: new_graph(backend),
            node_to_sessions: HashMap::new(),
            sessions: HashMap::new(),
            added: 0,
        }
    }

    /// Index all `sessions`, discarding everything indexed before.
    pub fn build<I, S>(&mut self, sessions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Session>>,
    {
        self.graph = new_graph(self.backend);
        self.node_to_sessions.clear();
        self.sessions.clear();
        self.added = 0;
        for session in sessions {
            self.add_session(session);
        }
    }

    /// Incrementally add one session. Returns the id it was stored under.
    ///
    /// A session re-added under an existing id replaces the stored record; edges it
    /// contributed earlier are kept.
    pub fn add_session(&mut self, session: impl Into<Arc<Session>>) -> String {
        let session = session.into();
        self.added += 1;

        let tool_sequence = index_session(self.graph.as_mut(), &session);
        let session_id = session
            .session_id
            .clone()
            .unwrap_or_else(|| format!("anon-{}", self.added));

        for tool in tool_sequence {
            let contributors = self.node_to_sessions.entry(tool).or_default();
            if !contributors.contains(&session_id) {
                contributors.push(session_id.clone());
            }
        }
        self.sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Up to `max_results` sessions structurally close to `context_nodes`.
    ///
    /// Each context node awards [`DIRECT_MATCH_SCORE`] to sessions that contributed it and
    /// [`NEIGHBOR_MATCH_SCORE`] to sessions that contributed any of its graph neighbors. Ties keep
    /// the order in which sessions were first scored.
    pub fn query<S: AsRef<str>>(
        &self,
        context_nodes: &[S],
        max_results: usize,
    ) -> Vec<Arc<Session>> {
        if context_nodes.is_empty() {
            return Vec::new();
        }

        let mut scores: Vec<(&str, u32)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for node in context_nodes {
            let norm = normalize(node.as_ref());
            for sid in self.contributors(&norm) {
                add_score(&mut scores, &mut positions, sid, DIRECT_MATCH_SCORE);
            }
            for neighbor in self.graph.neighbors(&norm) {
                for sid in self.contributors(neighbor) {
                    add_score(&mut scores, &mut positions, sid, NEIGHBOR_MATCH_SCORE);
                }
            }
        }

        scores.sort_by(|a, b| b.1.cmp(&a.1));
        scores
            .into_iter()
            .take(max_results)
            .filter_map(|(sid, _)| self.sessions.get(sid).cloned())
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            sessions: self.sessions.len(),
            backend: self.backend,
            petgraph_available: GraphBackendKind::petgraph_available(),
        }
    }

    /// Session ids that contributed `node` (exact, already-normalised id).
    pub fn contributors(&self, node: &str) -> &[String] {
        self.node_to_sessions
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn session(&self, session_id: &str) -> Option<&Arc<Session>> {
        self.sessions.get(session_id)
    }

    pub fn graph(&self) -> &dyn DirectedGraph {
        self.graph.as_ref()
    }

    pub fn backend(&self) -> GraphBackendKind {
        self.backend
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for GraphIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn add_score<'a>(
    scores: &mut Vec<(&'a str, u32)>,
    positions: &mut HashMap<&'a str, usize>,
    session_id: &'a str,
    points: u32,
) {
    match positions.get(session_id) {
        Some(&pos) => scores[pos].1 += points,
        None => {
            positions.insert(session_id, scores.len());
            scores.push((session_id, points));
        }
    }
}
