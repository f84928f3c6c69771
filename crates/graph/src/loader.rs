use crate::error::{GraphError, Result};
use crate::index::GraphIndex;
use crate::types::GraphBackendKind;
use codeclaw_protocol::Session;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Directory under the CodeClaw home holding exported session batches.
pub const ARCHIVE_DIR: &str = "archive";
/// Sessions exported but not yet published.
pub const PENDING_FILE: &str = "pending.jsonl";

/// Read one JSONL file of sessions.
///
/// A missing file is an empty source. Blank and malformed lines are skipped.
pub fn read_sessions_jsonl(path: &Path) -> Result<Vec<Session>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let io_err = |source: std::io::Error| GraphError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    // raw bytes, so a line of invalid UTF-8 is skipped like any other malformed record
    let mut sessions = Vec::new();
    for (line_no, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(io_err)?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<Session>(&line) {
            Ok(session) => sessions.push(session),
            Err(err) => log::debug!(
                "Skipping malformed session at {}:{}: {err}",
                path.display(),
                line_no + 1
            ),
        }
    }
    Ok(sessions)
}

/// Build an index from JSONL files, in the order given.
pub fn build_index_from_jsonl(paths: &[PathBuf], backend: GraphBackendKind) -> Result<GraphIndex> {
    let mut index = GraphIndex::with_backend(backend);
    for path in paths {
        for session in read_sessions_jsonl(path)? {
            index.add_session(session);
        }
    }
    Ok(index)
}

/// Archive files under `home`: `archive/*.jsonl` sorted by name, then `pending.jsonl`.
pub fn archive_paths(home: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    let archive_dir = home.join(ARCHIVE_DIR);
    if archive_dir.is_dir() {
        let entries = std::fs::read_dir(&archive_dir).map_err(|source| GraphError::Io {
            path: archive_dir.clone(),
            source,
        })?;
        let mut batch: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    log::debug!(
                        "Skipping unreadable entry in {}: {err}",
                        archive_dir.display()
                    );
                    continue;
                }
            };
            if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
                batch.push(path);
            }
        }
        batch.sort();
        paths.extend(batch);
    }

    let pending = home.join(PENDING_FILE);
    if pending.is_file() {
        paths.push(pending);
    }
    Ok(paths)
}

pub fn build_index_from_archive(home: &Path, backend: GraphBackendKind) -> Result<GraphIndex> {
    let paths = archive_paths(home)?;
    log::debug!("Building index from {} archive files", paths.len());
    build_index_from_jsonl(&paths, backend)
}
