use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of relationship recorded on an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Existence marker: a node that appeared with no directed relation
    #[serde(rename = "self")]
    SelfLoop,

    /// file -> tool: the tool's input referenced the file
    #[serde(rename = "accessed_by")]
    AccessedBy,

    /// tool -> tool transition inside a successful session
    #[serde(rename = "led_to_success")]
    LedToSuccess,

    /// tool -> tool transition inside a correction loop
    #[serde(rename = "co-occurs")]
    CoOccurs,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::SelfLoop => "self",
            Relation::AccessedBy => "accessed_by",
            Relation::LedToSuccess => "led_to_success",
            Relation::CoOccurs => "co-occurs",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge payload. Repeated insertions bump `weight`; `relation` is fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub relation: Relation,
    pub weight: u32,
}

impl EdgeData {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            weight: 1,
        }
    }
}

/// Which graph implementation backs an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphBackendKind {
    Petgraph,
    Adjacency,
}

impl GraphBackendKind {
    /// Whether the petgraph backend was compiled into this build.
    pub const fn petgraph_available() -> bool {
        cfg!(feature = "petgraph")
    }

    /// Best backend available in this build.
    pub fn detect() -> Self {
        if Self::petgraph_available() {
            GraphBackendKind::Petgraph
        } else {
            GraphBackendKind::Adjacency
        }
    }

    /// Honour an explicit request when possible, otherwise fall back to [`detect`](Self::detect).
    pub fn resolve(requested: Option<Self>) -> Self {
        match requested {
            Some(GraphBackendKind::Petgraph) if !Self::petgraph_available() => {
                log::warn!("petgraph backend requested but not compiled in; using adjacency maps");
                GraphBackendKind::Adjacency
            }
            Some(kind) => kind,
            None => Self::detect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphBackendKind::Petgraph => "petgraph",
            GraphBackendKind::Adjacency => "adjacency",
        }
    }
}

impl fmt::Display for GraphBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "petgraph" | "networkx" => Ok(GraphBackendKind::Petgraph),
            "adjacency" | "pure" | "fallback" => Ok(GraphBackendKind::Adjacency),
            other => Err(format!(
                "unknown graph backend '{other}' (expected 'petgraph' or 'adjacency')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_tags_serialize_as_wire_names() {
        let tags: Vec<String> = [
            Relation::SelfLoop,
            Relation::AccessedBy,
            Relation::LedToSuccess,
            Relation::CoOccurs,
        ]
        .iter()
        .map(|r| serde_json::to_value(r).unwrap().as_str().unwrap().to_string())
        .collect();
        assert_eq!(tags, ["self", "accessed_by", "led_to_success", "co-occurs"]);
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("Adjacency".parse(), Ok(GraphBackendKind::Adjacency));
        assert_eq!(" petgraph ".parse(), Ok(GraphBackendKind::Petgraph));
        assert!("btree".parse::<GraphBackendKind>().is_err());
    }

    #[test]
    fn explicit_adjacency_request_is_honoured() {
        assert_eq!(
            GraphBackendKind::resolve(Some(GraphBackendKind::Adjacency)),
            GraphBackendKind::Adjacency
        );
        assert_eq!(GraphBackendKind::resolve(None), GraphBackendKind::detect());
    }
}
