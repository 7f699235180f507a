use futures::future::BoxFuture;
use serde_json::json;
use tracing::{debug, info};

use palaver_core::config::RetryConfig;
use palaver_core::error::{PalaverError, Result};
use palaver_core::types::Payload;
use palaver_llm::RetryPolicy;

use crate::executor::{ExecutionContext, NodeExecutor};
use crate::graph::WorkflowGraph;
use crate::node::NodeKind;
use crate::registry::WorkflowRegistry;

/// Drives a workflow graph: resolves the start node, executes each
/// visited node, and follows outgoing edges until every branch
/// reaches a terminal.
///
/// One `execute` call is strictly sequential; independent calls may
/// run concurrently since graphs are read-only after registration and
/// all per-call state lives in an `ExecutionContext`.
pub struct WorkflowEngine {
    registry: WorkflowRegistry,
    retry: RetryPolicy,
}

impl WorkflowEngine {
    pub fn new(registry: WorkflowRegistry, retry_config: RetryConfig) -> Self {
        Self {
            registry,
            retry: RetryPolicy::new(retry_config),
        }
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    /// Single-writer access for registration; unavailable while any
    /// shared borrow (a running `execute`) is alive.
    pub fn registry_mut(&mut self) -> &mut WorkflowRegistry {
        &mut self.registry
    }

    /// Execute a workflow with the given input payload.
    ///
    /// The start node is `start_node` when given, otherwise the first
    /// Input-kind node in the graph. A single terminal returns its
    /// payload directly; multiple terminals return a mapping from
    /// terminal node id to payload.
    pub async fn execute(
        &self,
        workflow_id: &str,
        input: Payload,
        start_node: Option<&str>,
    ) -> Result<Payload> {
        let graph = self.registry.get(workflow_id)?;

        let start = match start_node {
            Some(id) => graph
                .node(id)
                .ok_or_else(|| PalaverError::NodeNotFound(id.to_string()))?
                .id
                .clone(),
            None => graph
                .first_input_node()
                .ok_or_else(|| {
                    PalaverError::Validation(format!(
                        "workflow '{workflow_id}' has no input node"
                    ))
                })?
                .id
                .clone(),
        };

        info!(workflow_id, start_node = %start, "executing workflow");

        let mut ctx = ExecutionContext::new();
        let mut terminals = self.run_node(&graph, start, input, &mut ctx).await?;

        if terminals.len() == 1 {
            return Ok(terminals.remove(0).1);
        }
        let map: serde_json::Map<String, Payload> = terminals.into_iter().collect();
        Ok(Payload::Object(map))
    }

    /// Execute `node_id` and recurse along its outgoing edges.
    ///
    /// Returns the terminal payloads this subtree produced. A node is
    /// marked visited before it runs; an edge whose target was already
    /// visited halts that branch. A subtree whose branches all halt
    /// (or that has no outgoing edges) yields its own node's payload.
    fn run_node<'a>(
        &'a self,
        graph: &'a WorkflowGraph,
        node_id: String,
        input: Payload,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, Result<Vec<(String, Payload)>>> {
        Box::pin(async move {
            let node = graph
                .node(&node_id)
                .ok_or_else(|| PalaverError::NodeNotFound(node_id.clone()))?;

            ctx.visited.insert(node.id.clone());

            let executor = NodeExecutor::new(&self.registry, &self.retry);
            let payload = executor.execute(node, input, ctx).await?;

            if node.kind == NodeKind::Output {
                return Ok(vec![(node.id.clone(), payload)]);
            }

            let mut terminals = Vec::new();
            for edge in graph.outgoing(&node.id) {
                if ctx.visited.contains(&edge.target_node) {
                    debug!(
                        source = %edge.source_node,
                        target = %edge.target_node,
                        "edge target already visited, halting branch"
                    );
                    continue;
                }
                let branch = self
                    .run_node(graph, edge.target_node.clone(), payload.clone(), ctx)
                    .await?;
                terminals.extend(branch);
            }

            if terminals.is_empty() {
                // No outgoing edges, or every branch halted at the
                // cycle guard: this node is the terminal.
                terminals.push((node.id.clone(), payload));
            }

            Ok(terminals)
        })
    }
}

// Convenience for callers that want the conventional input shape.
pub fn message_payload(message: impl Into<String>) -> Payload {
    json!({ "message": message.into() })
}
