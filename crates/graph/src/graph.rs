use crate::adjacency::AdjacencyGraph;
use crate::types::{EdgeData, GraphBackendKind, Relation};

/// Directed graph with weighted, tagged edges and string node ids.
///
/// Nodes exist only as edge endpoints. Adding an edge that is already present bumps its
/// weight instead of creating a parallel edge. Adjacency lists are reported in first-insertion
/// order, and unknown nodes yield empty lists rather than errors.
pub trait DirectedGraph: Send + Sync {
    fn backend(&self) -> GraphBackendKind;

    fn add_edge(&mut self, src: &str, dst: &str, relation: Relation);

    fn has_edge(&self, src: &str, dst: &str) -> bool;

    fn edge(&self, src: &str, dst: &str) -> Option<EdgeData>;

    fn successors<'a>(&'a self, node: &str) -> Vec<&'a str>;

    fn predecessors<'a>(&'a self, node: &str) -> Vec<&'a str>;

    /// Whether the node is an endpoint of any edge.
    fn contains(&self, node: &str) -> bool;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;

    /// Successors followed by predecessors.
    fn neighbors<'a>(&'a self, node: &str) -> Vec<&'a str> {
        if !self.contains(node) {
            return Vec::new();
        }
        let mut out = self.successors(node);
        out.extend(self.predecessors(node));
        out
    }
}

/// Construct an empty graph of the given kind.
pub fn new_graph(kind: GraphBackendKind) -> Box<dyn DirectedGraph> {
    match GraphBackendKind::resolve(Some(kind)) {
        #[cfg(feature = "petgraph")]
        GraphBackendKind::Petgraph => Box::new(crate::petgraph_backend::PetGraph::new()),
        _ => Box::new(AdjacencyGraph::new()),
    }
}
