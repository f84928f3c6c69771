//! Archive-backed session sources and the default redactor.

use crate::service::{Redactor, SessionDiscovery, SessionParser};
use anyhow::Result;
use codeclaw_graph::{archive_paths, read_sessions_jsonl};
use codeclaw_protocol::{ProjectDescriptor, Session};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const ARCHIVE_SOURCE: &str = "archive";

/// Usernames shorter than this are too likely to match ordinary words.
const MIN_USERNAME_LEN: usize = 3;

/// One project per JSONL file under the CodeClaw home.
#[derive(Debug, Clone)]
pub struct ArchiveDiscovery {
    home: PathBuf,
}

impl ArchiveDiscovery {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }
}

impl SessionDiscovery for ArchiveDiscovery {
    fn discover_projects(&self) -> Result<Vec<ProjectDescriptor>> {
        let projects = archive_paths(&self.home)?
            .into_iter()
            .map(|path| ProjectDescriptor {
                display_name: path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                dir_name: path.to_string_lossy().into_owned(),
                source: ARCHIVE_SOURCE.to_string(),
            })
            .collect();
        Ok(projects)
    }
}

/// Reads a descriptor's JSONL file and redacts message text and tool inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlSessionParser;

impl SessionParser for JsonlSessionParser {
    fn parse_project_sessions(
        &self,
        project: &ProjectDescriptor,
        redactor: &dyn Redactor,
    ) -> Result<Vec<Session>> {
        let mut sessions = read_sessions_jsonl(Path::new(&project.dir_name))?;
        for session in &mut sessions {
            redact_session(session, redactor);
        }
        Ok(sessions)
    }
}

fn redact_session(session: &mut Session, redactor: &dyn Redactor) {
    for message in &mut session.messages {
        message.content = redactor.redact(&message.content);
        for tool_use in &mut message.tool_uses {
            redact_value(&mut tool_use.input, redactor);
        }
    }
}

fn redact_value(value: &mut Value, redactor: &dyn Redactor) {
    match value {
        Value::String(text) => *text = redactor.redact(text),
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| redact_value(item, redactor)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|item| redact_value(item, redactor)),
        _ => {}
    }
}

/// Replaces the home directory with `~` and known usernames with `user`.
#[derive(Debug, Clone)]
pub struct HomeDirAnonymizer {
    home: Option<String>,
    usernames: Option<Regex>,
}

impl HomeDirAnonymizer {
    pub fn new(extra_usernames: &[String]) -> Self {
        Self::with_home(dirs::home_dir(), extra_usernames)
    }

    pub fn with_home(home: Option<PathBuf>, extra_usernames: &[String]) -> Self {
        let home = home
            .map(|path| path.to_string_lossy().trim_end_matches('/').to_string())
            .filter(|path| path.len() > 1);

        let mut names: Vec<String> = Vec::new();
        let home_user = home
            .as_deref()
            .and_then(|path| Path::new(path).file_name())
            .map(|name| name.to_string_lossy().into_owned());
        for name in home_user.into_iter().chain(extra_usernames.iter().cloned()) {
            let name = name.trim().to_string();
            if name.chars().count() >= MIN_USERNAME_LEN && !names.contains(&name) {
                names.push(name);
            }
        }

        let usernames = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|");
            match Regex::new(&format!(r"\b(?:{alternation})\b")) {
                Ok(re) => Some(re),
                Err(err) => {
                    log::warn!("Username redaction disabled: {err}");
                    None
                }
            }
        };

        Self { home, usernames }
    }
}

impl Redactor for HomeDirAnonymizer {
    fn redact(&self, text: &str) -> String {
        let text = match &self.home {
            Some(home) => replace_home(text, home),
            None => text.to_string(),
        };
        match &self.usernames {
            Some(re) => re.replace_all(&text, "user").into_owned(),
            None => text,
        }
    }
}

/// Replace `home` with `~` only where it ends a path component.
fn replace_home(text: &str, home: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(home) {
        let after = &rest[pos + home.len()..];
        let at_boundary = after
            .chars()
            .next()
            .map_or(true, |c| c == '/' || c.is_whitespace());
        out.push_str(&rest[..pos]);
        out.push_str(if at_boundary { "~" } else { home });
        rest = after;
    }
    out.push_str(rest);
    out
}
