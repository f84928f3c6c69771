use crate::graph::DirectedGraph;
use crate::types::{EdgeData, GraphBackendKind, Relation};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Directed graph backed by `petgraph::DiGraph`.
pub struct PetGraph {
    /// Node weight is the node id, edge weight carries relation + multiplicity
    graph: DiGraph<String, EdgeData>,

    /// Node id -> NodeIndex mapping for fast lookup
    node_index: HashMap<String, NodeIndex>,
}

impl PetGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
        }
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_index.insert(name.to_string(), idx);
        idx
    }

    fn adjacent(&self, node: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_index.get(node) else {
            return Vec::new();
        };
        // petgraph walks the edge list newest-first
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.reverse();
        out
    }
}

impl Default for PetGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectedGraph for PetGraph {
    fn backend(&self) -> GraphBackendKind {
        GraphBackendKind::Petgraph
    }

    fn add_edge(&mut self, src: &str, dst: &str, relation: Relation) {
        let from = self.ensure_node(src);
        let to = self.ensure_node(dst);

        if let Some(existing) = self.graph.find_edge(from, to) {
            if let Some(edge) = self.graph.edge_weight_mut(existing) {
                edge.weight += 1;
            }
            return;
        }
        self.graph.add_edge(from, to, EdgeData::new(relation));
    }

    fn has_edge(&self, src: &str, dst: &str) -> bool {
        self.edge(src, dst).is_some()
    }

    fn edge(&self, src: &str, dst: &str) -> Option<EdgeData> {
        let from = *self.node_index.get(src)?;
        let to = *self.node_index.get(dst)?;
        let idx = self.graph.find_edge(from, to)?;
        self.graph.edge_weight(idx).copied()
    }

    fn successors<'a>(&'a self, node: &str) -> Vec<&'a str> {
        self.adjacent(node, Direction::Outgoing)
    }

    fn predecessors<'a>(&'a self, node: &str) -> Vec<&'a str> {
        self.adjacent(node, Direction::Incoming)
    }

    fn contains(&self, node: &str) -> bool {
        self.node_index.contains_key(node)
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
