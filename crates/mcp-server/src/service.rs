//! Cached session list + graph index with lazy first load and atomic refresh.
//!
//! Loaded state is published as one unit, so readers never see a session list paired with
//! an index built from a different refresh. Collaborator I/O and index construction happen
//! outside the state lock; only the final swap is exclusive.

use anyhow::Result;
use codeclaw_graph::{GraphIndex, IndexStats};
use codeclaw_protocol::{Meta, ProjectDescriptor, Session};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Finds the session sources (project log dirs, archive files) to load.
pub trait SessionDiscovery: Send + Sync {
    fn discover_projects(&self) -> Result<Vec<ProjectDescriptor>>;
}

/// Loads the sessions of one discovered project.
pub trait SessionParser: Send + Sync {
    fn parse_project_sessions(
        &self,
        project: &ProjectDescriptor,
        redactor: &dyn Redactor,
    ) -> Result<Vec<Session>>;
}

/// Scrubs identifying text from session content before it is cached.
pub trait Redactor: Send + Sync {
    fn redact(&self, text: &str) -> String;
}

/// What the service needs from a similarity index.
pub trait SessionIndex: Send + Sync {
    fn build(&mut self, sessions: &[Arc<Session>]);

    fn query(&self, context_nodes: &[String], max_results: usize) -> Vec<Arc<Session>>;

    fn stats(&self) -> Result<IndexStats>;
}

impl SessionIndex for GraphIndex {
    fn build(&mut self, sessions: &[Arc<Session>]) {
        GraphIndex::build(self, sessions.iter().cloned());
    }

    fn query(&self, context_nodes: &[String], max_results: usize) -> Vec<Arc<Session>> {
        GraphIndex::query(self, context_nodes, max_results)
    }

    fn stats(&self) -> Result<IndexStats> {
        Ok(GraphIndex::stats(self))
    }
}

pub type RedactorFactory = Box<dyn Fn() -> Box<dyn Redactor> + Send + Sync>;
pub type IndexFactory = Box<dyn Fn() -> Box<dyn SessionIndex> + Send + Sync>;

/// One consistent view of the loaded sessions and the index built from them.
#[derive(Clone)]
pub struct Snapshot {
    pub sessions: Arc<Vec<Arc<Session>>>,
    pub index: Arc<dyn SessionIndex>,
    pub project_count: usize,
}

#[derive(Default)]
struct ServiceState {
    loaded: Option<Snapshot>,
    refresh_count: u64,
    last_refresh_ms: f64,
}

/// Counts and timings of the most recent refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMeta {
    pub session_count: usize,
    pub project_count: usize,
    pub refresh_count: u64,
    pub last_refresh_ms: f64,
    /// Index statistics, `{}` when unavailable
    pub index_stats: Value,
}

impl ServiceMeta {
    pub fn into_meta(self) -> Meta {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Meta::new(),
        }
    }
}

pub struct SessionIndexService {
    discovery: Box<dyn SessionDiscovery>,
    parser: Box<dyn SessionParser>,
    redactor_factory: RedactorFactory,
    index_factory: IndexFactory,
    state: RwLock<ServiceState>,
    /// serialises the lazy first load
    load_lock: Mutex<()>,
}

impl SessionIndexService {
    pub fn new(
        discovery: impl SessionDiscovery + 'static,
        parser: impl SessionParser + 'static,
        redactor_factory: impl Fn() -> Box<dyn Redactor> + Send + Sync + 'static,
        index_factory: impl Fn() -> Box<dyn SessionIndex> + Send + Sync + 'static,
    ) -> Self {
        Self {
            discovery: Box::new(discovery),
            parser: Box::new(parser),
            redactor_factory: Box::new(redactor_factory),
            index_factory: Box::new(index_factory),
            state: RwLock::new(ServiceState::default()),
            load_lock: Mutex::new(()),
        }
    }

    /// Reload every session from the collaborators and swap in a fresh index.
    pub fn refresh(&self) -> ServiceMeta {
        self.refresh_snapshot();
        self.meta()
    }

    fn refresh_snapshot(&self) -> Snapshot {
        let start = Instant::now();
        let redactor = (self.redactor_factory)();

        let projects = match self.discovery.discover_projects() {
            Ok(projects) => projects,
            Err(err) => {
                log::warn!("Session discovery failed, continuing with no projects: {err:#}");
                Vec::new()
            }
        };

        let mut sessions: Vec<Arc<Session>> = Vec::new();
        for project in &projects {
            match self
                .parser
                .parse_project_sessions(project, redactor.as_ref())
            {
                Ok(batch) => sessions.extend(batch.into_iter().map(Arc::new)),
                Err(err) => log::warn!(
                    "Skipping project {} ({}): {err:#}",
                    project.display_name,
                    project.source
                ),
            }
        }

        let mut index = (self.index_factory)();
        index.build(&sessions);

        let snapshot = Snapshot {
            sessions: Arc::new(sessions),
            index: Arc::from(index),
            project_count: projects.len(),
        };
        let elapsed_ms = (start.elapsed().as_secs_f64() * 100_000.0).round() / 100.0;

        {
            let mut state = self.state.write();
            state.loaded = Some(snapshot.clone());
            state.refresh_count += 1;
            state.last_refresh_ms = elapsed_ms;
        }

        log::info!(
            "Indexed {} sessions from {} projects in {elapsed_ms}ms",
            snapshot.sessions.len(),
            snapshot.project_count
        );
        snapshot
    }

    /// Loaded state, triggering exactly one refresh on first access.
    pub fn snapshot(&self) -> Snapshot {
        let loaded = self.state.read().loaded.clone();
        if let Some(snapshot) = loaded {
            return snapshot;
        }

        let _guard = self.load_lock.lock();
        let loaded = self.state.read().loaded.clone();
        if let Some(snapshot) = loaded {
            return snapshot;
        }
        log::debug!("Session cache empty, loading on first access");
        self.refresh_snapshot()
    }

    pub fn sessions(&self) -> Arc<Vec<Arc<Session>>> {
        self.snapshot().sessions
    }

    pub fn index(&self) -> Arc<dyn SessionIndex> {
        self.snapshot().index
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded.is_some()
    }

    /// Current counts and timings. Never triggers a load.
    pub fn meta(&self) -> ServiceMeta {
        let (session_count, project_count, refresh_count, last_refresh_ms, index) = {
            let state = self.state.read();
            (
                state.loaded.as_ref().map_or(0, |s| s.sessions.len()),
                state.loaded.as_ref().map_or(0, |s| s.project_count),
                state.refresh_count,
                state.last_refresh_ms,
                state.loaded.as_ref().map(|s| Arc::clone(&s.index)),
            )
        };

        let index_stats = index
            .and_then(|index| match index.stats() {
                Ok(stats) => serde_json::to_value(stats).ok(),
                Err(err) => {
                    log::warn!("Index stats unavailable: {err:#}");
                    None
                }
            })
            .unwrap_or_else(|| json!({}));

        ServiceMeta {
            session_count,
            project_count,
            refresh_count,
            last_refresh_ms,
            index_stats,
        }
    }
}
