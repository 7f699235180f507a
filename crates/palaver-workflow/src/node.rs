use serde::{Deserialize, Serialize};

/// Kind of a workflow node, carrying kind-specific configuration.
///
/// A closed set: adding a kind forces every match site to handle it.
/// Live capabilities are never part of the node value; an Agent
/// node's model client and a Tool node's callable are bound in the
/// `WorkflowRegistry` by node id, keeping the graph serializable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry anchor. Passes its payload through unchanged.
    Input,
    /// Exit anchor. Passes its payload through unchanged and
    /// terminates its branch of the traversal.
    Output,
    /// A model-backed agent call.
    Agent {
        model: String,
        system_prompt: String,
    },
    /// A call to a bound tool function.
    Tool,
    /// Case-insensitive substring gate over the upstream `output`
    /// field: met when `condition` appears inside it.
    Condition { condition: String },
}

impl NodeKind {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Agent { .. } => "agent",
            Self::Tool => "tool",
            Self::Condition { .. } => "condition",
        }
    }
}

/// A node in a workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowNode {
    /// Unique identifier within the graph.
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Human-readable display name.
    pub name: String,
    /// Logical input port names.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Logical output port names.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            inputs: vec![],
            outputs: vec![],
        }
    }

    /// Set the logical input ports.
    pub fn with_inputs(mut self, ports: Vec<String>) -> Self {
        self.inputs = ports;
        self
    }

    /// Set the logical output ports.
    pub fn with_outputs(mut self, ports: Vec<String>) -> Self {
        self.outputs = ports;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let node = WorkflowNode::new(
            "researcher",
            "Researcher",
            NodeKind::Agent {
                model: "openai:gpt-4o-mini".into(),
                system_prompt: "You are a research assistant.".into(),
            },
        )
        .with_inputs(vec!["input".into()])
        .with_outputs(vec!["research_findings".into()]);

        assert_eq!(node.id, "researcher");
        assert_eq!(node.kind.label(), "agent");
        assert_eq!(node.inputs, vec!["input"]);
        assert_eq!(node.outputs, vec!["research_findings"]);
    }

    #[test]
    fn test_kind_tag_serialization() {
        let node = WorkflowNode::new("gate", "Error Gate", NodeKind::Condition {
            condition: "error".into(),
        });

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "condition");
        assert_eq!(json["condition"], "error");

        let parsed: WorkflowNode = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn test_pass_through_kinds_serialize_flat() {
        let node = WorkflowNode::new("in", "User Input", NodeKind::Input);
        let json = serde_json::to_string(&node).unwrap();
        let parsed: WorkflowNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind, NodeKind::Input);
    }
}
