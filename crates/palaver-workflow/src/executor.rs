use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use palaver_core::error::{PalaverError, Result};
use palaver_core::types::Payload;
use palaver_llm::RetryPolicy;

use crate::node::{NodeKind, WorkflowNode};
use crate::registry::WorkflowRegistry;

/// Tag on a node's wrapped result payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    AgentResponse,
    ToolResult,
    ConditionResult,
}

/// Wrapped result of an agent or tool node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResult {
    pub output: Payload,
    pub node_id: String,
    pub kind: ResultKind,
}

impl CallResult {
    pub fn into_payload(self) -> Result<Payload> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Per-call execution state.
///
/// `visited` guards against re-entering a node within one `execute`
/// call; `data` accumulates each node's produced payload under its id
/// as a cross-node side channel. Dropped when the call returns.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    pub(crate) visited: HashSet<String>,
    data: HashMap<String, Payload>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload a previously executed node produced, if any.
    pub fn node_output(&self, node_id: &str) -> Option<&Payload> {
        self.data.get(node_id)
    }

    /// All accumulated per-node payloads.
    pub fn data(&self) -> &HashMap<String, Payload> {
        &self.data
    }
}

/// Executes a single node: one handler per `NodeKind` variant.
pub struct NodeExecutor<'a> {
    registry: &'a WorkflowRegistry,
    retry: &'a RetryPolicy,
}

impl<'a> NodeExecutor<'a> {
    pub fn new(registry: &'a WorkflowRegistry, retry: &'a RetryPolicy) -> Self {
        Self { registry, retry }
    }

    /// Produce the node's output payload for the given input payload.
    ///
    /// Side-effect-free apart from whatever the node's own capability
    /// performs; the produced payload is also recorded in `ctx`.
    pub async fn execute(
        &self,
        node: &WorkflowNode,
        input: Payload,
        ctx: &mut ExecutionContext,
    ) -> Result<Payload> {
        debug!(
            node_id = %node.id,
            node_name = %node.name,
            kind = node.kind.label(),
            "executing workflow node"
        );

        let output = match &node.kind {
            // Pass-through anchors: graph entry/exit markers, not
            // transformation steps.
            NodeKind::Input | NodeKind::Output => input,
            NodeKind::Agent { .. } => self.run_agent(node, &input).await?,
            NodeKind::Tool => self.run_tool(node, input).await?,
            NodeKind::Condition { condition } => evaluate_condition(node, condition, input),
        };

        ctx.data.insert(node.id.clone(), output.clone());
        Ok(output)
    }

    async fn run_agent(&self, node: &WorkflowNode, input: &Payload) -> Result<Payload> {
        let client = self.registry.agent(&node.id).ok_or_else(|| {
            PalaverError::Configuration(format!(
                "no model client bound for agent node '{}'",
                node.id
            ))
        })?;

        let prompt = prompt_text(input);
        let reply = self.retry.invoke(client.as_ref(), &prompt).await?;

        CallResult {
            output: Payload::String(reply.text),
            node_id: node.id.clone(),
            kind: ResultKind::AgentResponse,
        }
        .into_payload()
    }

    async fn run_tool(&self, node: &WorkflowNode, input: Payload) -> Result<Payload> {
        let binding = self.registry.tool(&node.id).ok_or_else(|| {
            PalaverError::Configuration(format!("no tool bound for node '{}'", node.id))
        })?;

        let value = binding.call(input).await?;

        CallResult {
            output: value,
            node_id: node.id.clone(),
            kind: ResultKind::ToolResult,
        }
        .into_payload()
    }
}

/// Extract the prompt an agent node sends to its model.
///
/// A mapping with a `message` field uses that field; anything else
/// falls back to the payload's string form.
fn prompt_text(payload: &Payload) -> String {
    match payload {
        Payload::Object(map) => match map.get("message") {
            Some(Payload::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => payload.to_string(),
        },
        Payload::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Boolean gate: met when the configured condition string appears,
/// case-insensitively, inside the string form of the upstream
/// `output` field. An empty condition or missing field never matches.
/// Branch selection downstream is the caller's responsibility.
fn evaluate_condition(node: &WorkflowNode, condition: &str, input: Payload) -> Payload {
    let upstream = match input.get("output") {
        Some(Payload::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let met = !condition.is_empty()
        && upstream.to_lowercase().contains(&condition.to_lowercase());

    json!({
        "condition_met": met,
        "output": input,
        "node_id": node.id,
        "kind": ResultKind::ConditionResult,
    })
}
