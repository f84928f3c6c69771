use crate::graph::DirectedGraph;
use crate::nodes::{error_node, extract_error_refs, extract_file_refs, file_node, tool_node};
use crate::types::Relation;
use codeclaw_protocol::Session;

/// Trajectory label whose tool transitions are not counted as successful.
pub const CORRECTION_LOOP: &str = "correction_loop";

const ERROR_BEARING_ROLES: [&str; 2] = ["user", "tool_result"];

/// Emit the edges contributed by one session into `graph`.
///
/// Returns the session's tool nodes in the order they were used.
pub fn index_session(graph: &mut dyn DirectedGraph, session: &Session) -> Vec<String> {
    let is_successful = session.trajectory_type.as_deref() != Some(CORRECTION_LOOP);
    let mut tool_sequence: Vec<String> = Vec::new();

    for message in &session.messages {
        for file_ref in extract_file_refs(&message.content) {
            let node = file_node(file_ref);
            graph.add_edge(&node, &node, Relation::SelfLoop);
        }

        if ERROR_BEARING_ROLES.contains(&message.role.as_str()) {
            for error_ref in extract_error_refs(&message.content) {
                let node = error_node(error_ref);
                graph.add_edge(&node, &node, Relation::SelfLoop);
            }
        }

        for tool_use in &message.tool_uses {
            let name = tool_use.tool.trim();
            if name.is_empty() {
                continue;
            }
            let tool = tool_node(name);

            let input = tool_use.input_text();
            for file_ref in extract_file_refs(&input) {
                graph.add_edge(&file_node(file_ref), &tool, Relation::AccessedBy);
            }
            tool_sequence.push(tool);
        }
    }

    let relation = if is_successful {
        Relation::LedToSuccess
    } else {
        Relation::CoOccurs
    };
    for pair in tool_sequence.windows(2) {
        graph.add_edge(&pair[0], &pair[1], relation);
    }

    tool_sequence
}
