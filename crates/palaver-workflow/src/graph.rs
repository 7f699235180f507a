use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use palaver_core::error::{PalaverError, Result};

use crate::edge::WorkflowEdge;
use crate::node::{NodeKind, WorkflowNode};

/// A complete workflow definition: nodes, edges, metadata.
///
/// Nodes keep insertion order (start-node resolution picks the first
/// Input-kind node). Immutable once registered: the registry hands
/// out `Arc`s and never mutates a stored graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl WorkflowGraph {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Append a node.
    pub fn with_node(mut self, node: WorkflowNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Append an edge.
    pub fn with_edge(mut self, edge: WorkflowEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Set a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// First Input-kind node in insertion order.
    pub fn first_input_node(&self) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Input)
    }

    /// Outgoing edges of a node, in edge-list order.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> {
        self.edges.iter().filter(move |e| e.source_node == node_id)
    }

    /// Structural validation, run at registration time.
    ///
    /// Duplicate node ids and dangling edge endpoints are hard errors.
    /// A cycle only logs a warning: the engine's visited-set guard
    /// keeps cyclic graphs terminating, and the data model does not
    /// require acyclicity.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(PalaverError::Validation(format!(
                    "duplicate node id '{}' in workflow '{}'",
                    node.id, self.id
                )));
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source_node, &edge.target_node] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(PalaverError::Validation(format!(
                        "edge references unknown node '{}' in workflow '{}'",
                        endpoint, self.id
                    )));
                }
            }
        }

        if self.has_cycle() {
            warn!(
                workflow_id = %self.id,
                "workflow graph contains a cycle; traversal will visit each node at most once"
            );
        }

        Ok(())
    }

    fn has_cycle(&self) -> bool {
        // Iterative DFS with a three-state coloring per node.
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            adjacency
                .entry(edge.source_node.as_str())
                .or_default()
                .push(edge.target_node.as_str());
        }

        let mut done: HashSet<&str> = HashSet::new();
        let mut in_progress: HashSet<&str> = HashSet::new();

        for start in self.nodes.iter().map(|n| n.id.as_str()) {
            if done.contains(start) {
                continue;
            }
            // (node, child index) stack
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            in_progress.insert(start);

            while let Some((node, idx)) = stack.pop() {
                let children = adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[]);
                if idx < children.len() {
                    stack.push((node, idx + 1));
                    let child = children[idx];
                    if in_progress.contains(child) {
                        return true;
                    }
                    if !done.contains(child) {
                        in_progress.insert(child);
                        stack.push((child, 0));
                    }
                } else {
                    in_progress.remove(node);
                    done.insert(node);
                }
            }
        }

        false
    }
}
