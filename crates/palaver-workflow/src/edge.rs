use serde::{Deserialize, Serialize};

/// A directed data-routing rule between two nodes.
///
/// Edges carry no state. Port names are routing metadata; the payload
/// a node produces travels along every outgoing edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowEdge {
    /// Source node id.
    pub source_node: String,
    /// Target node id.
    pub target_node: String,
    /// Source output port name.
    pub source_output: String,
    /// Target input port name.
    pub target_input: String,
}

impl WorkflowEdge {
    pub fn new(
        source_node: impl Into<String>,
        target_node: impl Into<String>,
        source_output: impl Into<String>,
        target_input: impl Into<String>,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            target_node: target_node.into(),
            source_output: source_output.into(),
            target_input: target_input.into(),
        }
    }

    /// Edge with the conventional `output` → `input` port names.
    pub fn connect(source_node: impl Into<String>, target_node: impl Into<String>) -> Self {
        Self::new(source_node, target_node, "output", "input")
    }
}
