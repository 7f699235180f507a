use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use palaver_core::error::{PalaverError, Result};
use palaver_core::traits::{ModelClient, ToolBinding};

use crate::graph::WorkflowGraph;
use crate::node::{NodeKind, WorkflowNode};

/// Holds registered workflow graphs plus the live capabilities their
/// nodes reference by id.
///
/// Graphs are pure data; a node never embeds its model client or tool
/// callable. The executor looks capabilities up here at call time.
/// Mutation requires `&mut self`; the engine owns the registry, so
/// registration and execution cannot race.
pub struct WorkflowRegistry {
    workflows: HashMap<String, Arc<WorkflowGraph>>,
    agents: HashMap<String, Arc<dyn ModelClient>>,
    tools: HashMap<String, ToolBinding>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self {
            workflows: HashMap::new(),
            agents: HashMap::new(),
            tools: HashMap::new(),
        }
    }

    /// Validate and store a graph. Last write wins for a given id.
    pub fn register(&mut self, graph: WorkflowGraph) -> Result<()> {
        graph.validate()?;
        info!(
            workflow_id = %graph.id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "registered workflow"
        );
        self.workflows.insert(graph.id.clone(), Arc::new(graph));
        Ok(())
    }

    /// Fetch a registered graph.
    pub fn get(&self, id: &str) -> Result<Arc<WorkflowGraph>> {
        self.workflows
            .get(id)
            .cloned()
            .ok_or_else(|| PalaverError::WorkflowNotFound(id.to_string()))
    }

    /// Registered workflow ids, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.workflows.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Build an agent node and bind its model client under the node id.
    pub fn create_agent_node(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        client: Arc<dyn ModelClient>,
    ) -> WorkflowNode {
        let id = id.into();
        debug!(node_id = %id, "bound model client for agent node");
        self.agents.insert(id.clone(), client);
        WorkflowNode::new(
            id,
            name,
            NodeKind::Agent {
                model: model.into(),
                system_prompt: system_prompt.into(),
            },
        )
    }

    /// Build a tool node and bind its callable under the node id.
    pub fn create_tool_node(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        binding: ToolBinding,
    ) -> WorkflowNode {
        let id = id.into();
        self.tools.insert(id.clone(), binding);
        WorkflowNode::new(id, name, NodeKind::Tool)
    }

    /// Build an input (entry anchor) node.
    pub fn create_input_node(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> WorkflowNode {
        WorkflowNode::new(id, name, NodeKind::Input)
    }

    /// Build an output (exit anchor) node.
    pub fn create_output_node(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> WorkflowNode {
        WorkflowNode::new(id, name, NodeKind::Output)
    }

    /// Build a condition gate node.
    pub fn create_condition_node(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        condition: impl Into<String>,
    ) -> WorkflowNode {
        WorkflowNode::new(
            id,
            name,
            NodeKind::Condition {
                condition: condition.into(),
            },
        )
    }

    /// Model client bound to an agent node.
    pub fn agent(&self, node_id: &str) -> Option<Arc<dyn ModelClient>> {
        self.agents.get(node_id).cloned()
    }

    /// Tool callable bound to a tool node.
    pub fn tool(&self, node_id: &str) -> Option<&ToolBinding> {
        self.tools.get(node_id)
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
