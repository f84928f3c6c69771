use codeclaw_graph::GraphBackendKind;
use std::path::PathBuf;

pub const HOME_ENV: &str = "CODECLAW_HOME";
pub const GRAPH_BACKEND_ENV: &str = "CODECLAW_GRAPH_BACKEND";
pub const REDACT_USERNAMES_ENV: &str = "CODECLAW_REDACT_USERNAMES";

const DEFAULT_HOME_DIR: &str = ".codeclaw";

/// Runtime settings for the server and its default collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// CodeClaw home holding `archive/` and `pending.jsonl`
    pub home: PathBuf,
    /// Requested graph backend; `None` means probe
    pub graph_backend: Option<GraphBackendKind>,
    /// Extra usernames scrubbed from session text
    pub redact_usernames: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let home = lookup(HOME_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_home);

        let graph_backend = lookup(GRAPH_BACKEND_ENV)
            .filter(|value| !value.trim().is_empty())
            .and_then(|value| match value.parse::<GraphBackendKind>() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    log::warn!("Ignoring {GRAPH_BACKEND_ENV}: {err}");
                    None
                }
            });

        let redact_usernames = lookup(REDACT_USERNAMES_ENV)
            .map(|value| parse_usernames(&value))
            .unwrap_or_default();

        Self {
            home,
            graph_backend,
            redact_usernames,
        }
    }

    /// Backend to build indexes with, after availability fallback.
    pub fn backend(&self) -> GraphBackendKind {
        GraphBackendKind::resolve(self.graph_backend)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            graph_backend: None,
            redact_usernames: Vec::new(),
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_HOME_DIR)
}

fn parse_usernames(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}
