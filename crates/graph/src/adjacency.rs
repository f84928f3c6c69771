use crate::graph::DirectedGraph;
use crate::types::{EdgeData, GraphBackendKind, Relation};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct NodeEntry {
    successors: Vec<String>,
    predecessors: Vec<String>,
    out_edges: HashMap<String, EdgeData>,
}

/// Dependency-free directed graph backed by adjacency maps.
#[derive(Debug, Default)]
pub struct AdjacencyGraph {
    nodes: HashMap<String, NodeEntry>,
    edge_count: usize,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectedGraph for AdjacencyGraph {
    fn backend(&self) -> GraphBackendKind {
        GraphBackendKind::Adjacency
    }

    fn add_edge(&mut self, src: &str, dst: &str, relation: Relation) {
        if let Some(edge) = self
            .nodes
            .get_mut(src)
            .and_then(|entry| entry.out_edges.get_mut(dst))
        {
            edge.weight += 1;
            return;
        }

        let source = self.nodes.entry(src.to_string()).or_default();
        source.successors.push(dst.to_string());
        source
            .out_edges
            .insert(dst.to_string(), EdgeData::new(relation));

        self.nodes
            .entry(dst.to_string())
            .or_default()
            .predecessors
            .push(src.to_string());

        self.edge_count += 1;
    }

    fn has_edge(&self, src: &str, dst: &str) -> bool {
        self.edge(src, dst).is_some()
    }

    fn edge(&self, src: &str, dst: &str) -> Option<EdgeData> {
        self.nodes.get(src)?.out_edges.get(dst).copied()
    }

    fn successors<'a>(&'a self, node: &str) -> Vec<&'a str> {
        self.nodes
            .get(node)
            .map(|entry| entry.successors.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn predecessors<'a>(&'a self, node: &str) -> Vec<&'a str> {
        self.nodes
            .get(node)
            .map(|entry| entry.predecessors.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn contains(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }
}
