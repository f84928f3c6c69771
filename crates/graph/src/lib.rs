//! # CodeClaw Graph
//!
//! Structural similarity search over coding-assistant sessions.
//!
//! ## Architecture
//!
//! ```text
//! Session[]
//!     │
//!     ├──> Session indexer (one pass per session)
//!     │      ├─ file references    -> file:<path>  (self loop)
//!     │      ├─ error lines        -> error:<msg>  (self loop)
//!     │      ├─ tool inputs        -> file -> tool (accessed_by)
//!     │      └─ tool transitions   -> tool -> tool (led_to_success | co-occurs)
//!     │
//!     ├──> Directed graph (petgraph or adjacency maps)
//!     │      └─ repeated edges bump a weight, never duplicate
//!     │
//!     └──> GraphIndex
//!            ├─ node -> contributing session ids
//!            └─ query: +2 per direct contributor, +1 per one-hop neighbor contributor
//! ```

mod adjacency;
mod builder;
mod error;
mod graph;
mod index;
mod loader;
pub mod nodes;
#[cfg(feature = "petgraph")]
mod petgraph_backend;
mod types;

pub use adjacency::AdjacencyGraph;
pub use builder::{index_session, CORRECTION_LOOP};
pub use error::{GraphError, Result};
pub use graph::{new_graph, DirectedGraph};
pub use index::{GraphIndex, IndexStats, DIRECT_MATCH_SCORE, NEIGHBOR_MATCH_SCORE};
pub use loader::{
    archive_paths, build_index_from_archive, build_index_from_jsonl, read_sessions_jsonl,
    ARCHIVE_DIR, PENDING_FILE,
};
pub use nodes::{error_node, file_node, normalize, tool_node, NodeKind};
#[cfg(feature = "petgraph")]
pub use petgraph_backend::PetGraph;
pub use types::{EdgeData, GraphBackendKind, Relation};
