//! Node naming and reference extraction.
//!
//! Node ids are namespaced (`tool:`, `file:`, `error:`) and normalised (trimmed, lowercased), so
//! the same text always maps to the same node.

use once_cell::sync::Lazy;
use regex::Regex;

pub const TOOL_PREFIX: &str = "tool:";
pub const FILE_PREFIX: &str = "file:";
pub const ERROR_PREFIX: &str = "error:";

/// Max characters of an error line kept in a node id.
pub const ERROR_TEXT_LIMIT: usize = 60;
pub const MAX_FILE_REFS: usize = 5;
pub const MAX_ERROR_REFS: usize = 3;

static FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w./\-]+\.\w{1,6}").unwrap_or_else(|_| unreachable!()));

static ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(error|exception|traceback|failed)").unwrap_or_else(|_| unreachable!())
});

/// Namespace of a node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Tool,
    File,
    Error,
}

impl NodeKind {
    /// Parse a bare prefix (`tool`, `file`, `error`), already lowercased.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "tool" => Some(NodeKind::Tool),
            "file" => Some(NodeKind::File),
            "error" => Some(NodeKind::Error),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            NodeKind::Tool => TOOL_PREFIX,
            NodeKind::File => FILE_PREFIX,
            NodeKind::Error => ERROR_PREFIX,
        }
    }

    pub fn node(&self, value: &str) -> String {
        match self {
            NodeKind::Tool => tool_node(value),
            NodeKind::File => file_node(value),
            NodeKind::Error => error_node(value),
        }
    }
}

pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

pub fn tool_node(name: &str) -> String {
    format!("{TOOL_PREFIX}{}", normalize(name))
}

pub fn file_node(name: &str) -> String {
    format!("{FILE_PREFIX}{}", normalize(name))
}

pub fn error_node(message: &str) -> String {
    let normalized = normalize(truncate_chars(message, ERROR_TEXT_LIMIT));
    // lowercasing can grow a string
    format!(
        "{ERROR_PREFIX}{}",
        truncate_chars(&normalized, ERROR_TEXT_LIMIT)
    )
}

/// Path-like tokens (`src/auth.py`, `Cargo.toml`), first [`MAX_FILE_REFS`] in order.
pub fn extract_file_refs(text: &str) -> Vec<&str> {
    FILE_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|m| m.contains('/') || m.contains('.'))
        .take(MAX_FILE_REFS)
        .collect()
}

/// Lines mentioning an error, trimmed and capped at [`ERROR_TEXT_LIMIT`] characters.
pub fn extract_error_refs(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| ERROR_RE.is_match(line))
        .map(|line| truncate_chars(line.trim(), ERROR_TEXT_LIMIT))
        .take(MAX_ERROR_REFS)
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tool_node_is_case_and_whitespace_insensitive() {
        assert_eq!(tool_node(" Bash "), "tool:bash");
        assert_eq!(tool_node("bash"), "tool:bash");
        assert_eq!(tool_node("Read"), "tool:read");
        assert_eq!(tool_node(&tool_node("Read")[TOOL_PREFIX.len()..]), "tool:read");
    }

    #[test]
    fn file_node_prefix() {
        assert_eq!(file_node("src/Auth.py"), "file:src/auth.py");
    }

    #[test]
    fn error_node_is_bounded() {
        let long_msg = format!("Error: {}", "x".repeat(200));
        let node = error_node(&long_msg);
        assert!(node.starts_with(ERROR_PREFIX));
        assert_eq!(node.chars().count(), ERROR_PREFIX.len() + ERROR_TEXT_LIMIT);

        let multibyte = "é".repeat(100);
        assert!(error_node(&multibyte).chars().count() <= ERROR_PREFIX.len() + ERROR_TEXT_LIMIT);
    }

    #[test]
    fn file_refs_in_order_and_capped() {
        let text = "edit src/a.rs then b.py, c.toml, d/e.md, f.json and g.yaml";
        assert_eq!(
            extract_file_refs(text),
            vec!["src/a.rs", "b.py", "c.toml", "d/e.md", "f.json"]
        );
        assert!(extract_file_refs("no paths here").is_empty());
    }

    #[test]
    fn error_refs_match_keywords_case_insensitively() {
        let text = "ok\n  TypeError: bad operand  \nBuild FAILED\nfine\nTraceback (most recent call last)\nanother exception";
        assert_eq!(
            extract_error_refs(text),
            vec![
                "TypeError: bad operand",
                "Build FAILED",
                "Traceback (most recent call last)"
            ]
        );
    }

    #[test]
    fn error_refs_truncate_long_lines() {
        let line = format!("error: {}", "y".repeat(100));
        let refs = extract_error_refs(&line);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].chars().count(), ERROR_TEXT_LIMIT);
    }

    #[test]
    fn node_kind_round_trip() {
        assert_eq!(NodeKind::from_prefix("file"), Some(NodeKind::File));
        assert_eq!(NodeKind::from_prefix("symbol"), None);
        assert_eq!(NodeKind::Tool.node(" Write "), "tool:write");
        assert_eq!(NodeKind::Error.prefix(), ERROR_PREFIX);
    }
}
