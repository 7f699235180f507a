//! End-to-end engine scenarios over scripted model clients.

use std::sync::Arc;

use serde_json::json;

use palaver_core::config::RetryConfig;
use palaver_core::error::{ModelCallError, PalaverError};
use palaver_core::traits::ToolBinding;
use palaver_test_utils::{EchoClient, FailingClient, StaticClient};
use palaver_workflow::{
    message_payload, WorkflowEdge, WorkflowEngine, WorkflowGraph, WorkflowRegistry,
};

fn engine() -> WorkflowEngine {
    WorkflowEngine::new(WorkflowRegistry::new(), RetryConfig::default())
}

#[tokio::test]
async fn test_input_agent_output_chain() {
    let mut engine = engine();
    let client = Arc::new(EchoClient::new());

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("echo_flow", "Echo Flow")
        .with_node(registry.create_input_node("input", "User Input"))
        .with_node(registry.create_agent_node(
            "echo_agent",
            "Echo Agent",
            "test:echo",
            "Echo the prompt.",
            client.clone(),
        ))
        .with_node(registry.create_output_node("output", "Result"))
        .with_edge(WorkflowEdge::connect("input", "echo_agent"))
        .with_edge(WorkflowEdge::connect("echo_agent", "output"));
    registry.register(graph).unwrap();

    let result = engine
        .execute("echo_flow", message_payload("hi"), None)
        .await
        .unwrap();

    // The single Output node passes the agent's wrapped result through
    // unchanged; the engine does not re-wrap a lone terminal.
    assert_eq!(
        result,
        json!({"output": "hi", "node_id": "echo_agent", "kind": "agent_response"})
    );
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_agent_chain_feeds_wrapped_output_forward() {
    let mut engine = engine();
    let first = Arc::new(EchoClient::new());
    let second = Arc::new(EchoClient::new());

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("chain", "Two Agents")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_agent_node(
            "researcher",
            "Researcher",
            "test:echo",
            "Research.",
            first.clone(),
        ))
        .with_node(registry.create_agent_node(
            "summarizer",
            "Summarizer",
            "test:echo",
            "Summarize.",
            second.clone(),
        ))
        .with_edge(WorkflowEdge::connect("input", "researcher"))
        .with_edge(WorkflowEdge::connect("researcher", "summarizer"));
    registry.register(graph).unwrap();

    let result = engine
        .execute("chain", message_payload("topic"), None)
        .await
        .unwrap();

    // The second agent received the first agent's wrapped result,
    // which has no `message` field, so its prompt is the JSON form.
    assert_eq!(result["kind"], json!("agent_response"));
    assert_eq!(result["node_id"], json!("summarizer"));
    let prompt = result["output"].as_str().unwrap();
    assert!(prompt.contains("\"output\":\"topic\""));
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn test_fan_out_returns_mapping_keyed_by_terminal() {
    let mut engine = engine();

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("fan", "Fan Out")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_output_node("left", "Left"))
        .with_node(registry.create_output_node("right", "Right"))
        .with_edge(WorkflowEdge::connect("input", "left"))
        .with_edge(WorkflowEdge::connect("input", "right"));
    registry.register(graph).unwrap();

    let result = engine
        .execute("fan", json!({"message": "both"}), None)
        .await
        .unwrap();

    assert_eq!(
        result,
        json!({
            "left": {"message": "both"},
            "right": {"message": "both"},
        })
    );
}

#[tokio::test]
async fn test_cycle_terminates_and_visits_once() {
    let mut engine = engine();
    let a_client = Arc::new(EchoClient::new());
    let b_client = Arc::new(EchoClient::new());

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("loop", "Cyclic")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_agent_node("a", "A", "test:echo", "A.", a_client.clone()))
        .with_node(registry.create_agent_node("b", "B", "test:echo", "B.", b_client.clone()))
        .with_edge(WorkflowEdge::connect("input", "a"))
        .with_edge(WorkflowEdge::connect("a", "b"))
        .with_edge(WorkflowEdge::connect("b", "a"));
    registry.register(graph).unwrap();

    let result = engine
        .execute("loop", message_payload("go"), None)
        .await
        .unwrap();

    // b's only outgoing edge points back at the visited a, so the
    // branch halts and b itself is the terminal.
    assert_eq!(result["node_id"], json!("b"));
    assert_eq!(a_client.calls(), 1);
    assert_eq!(b_client.calls(), 1);
}

#[tokio::test]
async fn test_condition_gate_reports_boolean() {
    let mut engine = engine();
    let client = Arc::new(StaticClient::new("An ERROR occurred"));

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("gated", "Gated")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_agent_node(
            "worker",
            "Worker",
            "test:static",
            "Work.",
            client,
        ))
        .with_node(registry.create_condition_node("gate", "Error Gate", "error"))
        .with_edge(WorkflowEdge::connect("input", "worker"))
        .with_edge(WorkflowEdge::connect("worker", "gate"));
    registry.register(graph).unwrap();

    let result = engine
        .execute("gated", message_payload("do work"), None)
        .await
        .unwrap();

    assert_eq!(result["condition_met"], json!(true));
    assert_eq!(result["kind"], json!("condition_result"));
    // The gate passes the upstream payload through under `output`.
    assert_eq!(result["output"]["node_id"], json!("worker"));
}

#[tokio::test]
async fn test_condition_gate_false_branch() {
    let mut engine = engine();
    let client = Arc::new(StaticClient::new("all good"));

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("gated", "Gated")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_agent_node(
            "worker",
            "Worker",
            "test:static",
            "Work.",
            client,
        ))
        .with_node(registry.create_condition_node("gate", "Error Gate", "error"))
        .with_edge(WorkflowEdge::connect("input", "worker"))
        .with_edge(WorkflowEdge::connect("worker", "gate"));
    registry.register(graph).unwrap();

    let result = engine
        .execute("gated", message_payload("do work"), None)
        .await
        .unwrap();
    assert_eq!(result["condition_met"], json!(false));
}

#[tokio::test(start_paused = true)]
async fn test_retry_requested_exhaustion_aborts_traversal() {
    let mut engine = engine();
    let client = Arc::new(FailingClient::retry_requested("try again"));

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("flaky", "Flaky")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_agent_node(
            "agent",
            "Agent",
            "test:fail",
            "Fail.",
            client.clone(),
        ))
        .with_node(registry.create_output_node("output", "Out"))
        .with_edge(WorkflowEdge::connect("input", "agent"))
        .with_edge(WorkflowEdge::connect("agent", "output"));
    registry.register(graph).unwrap();

    let err = engine
        .execute("flaky", message_payload("x"), None)
        .await
        .unwrap_err();

    assert_eq!(client.calls(), 3);
    match err {
        PalaverError::AgentRun(msg) => assert!(msg.contains("try again")),
        other => panic!("expected AgentRun, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_transient_exhaustion_surfaces_backend_error() {
    let mut engine = engine();
    let client = Arc::new(FailingClient::transient("503 service unavailable"));

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("down", "Backend Down")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_agent_node(
            "agent",
            "Agent",
            "test:fail",
            "Fail.",
            client.clone(),
        ))
        .with_edge(WorkflowEdge::connect("input", "agent"));
    registry.register(graph).unwrap();

    let err = engine
        .execute("down", message_payload("x"), None)
        .await
        .unwrap_err();

    assert_eq!(client.calls(), 3);
    match err {
        PalaverError::Model(ModelCallError::Transient(msg)) => {
            assert_eq!(msg, "503 service unavailable")
        }
        other => panic!("expected pass-through transient error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_tool_nodes_sync_and_async() {
    let mut engine = engine();

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("tools", "Tools")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_tool_node(
            "count",
            "Count Fields",
            ToolBinding::sync(|input| {
                let n = input.as_object().map(|o| o.len()).unwrap_or(0);
                Ok(json!(n))
            }),
        ))
        .with_node(registry.create_tool_node(
            "tag",
            "Tag",
            ToolBinding::asynchronous(|input| {
                Box::pin(async move { Ok(json!({"tagged": input})) })
            }),
        ))
        .with_edge(WorkflowEdge::connect("input", "count"))
        .with_edge(WorkflowEdge::connect("count", "tag"));
    registry.register(graph).unwrap();

    let result = engine
        .execute("tools", json!({"a": 1, "b": 2}), None)
        .await
        .unwrap();

    assert_eq!(result["kind"], json!("tool_result"));
    assert_eq!(result["node_id"], json!("tag"));
    // The async tool wrapped the sync tool's wrapped result.
    assert_eq!(result["output"]["tagged"]["output"], json!(2));
}

#[tokio::test]
async fn test_unbound_tool_is_configuration_error() {
    let mut engine = engine();

    let registry = engine.registry_mut();
    // Assemble the node by hand so no callable gets bound.
    let graph = WorkflowGraph::new("broken", "Broken")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(palaver_workflow::WorkflowNode::new(
            "orphan",
            "Orphan Tool",
            palaver_workflow::NodeKind::Tool,
        ))
        .with_edge(WorkflowEdge::connect("input", "orphan"));
    registry.register(graph).unwrap();

    let err = engine
        .execute("broken", json!({}), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PalaverError::Configuration(_)));
}

#[tokio::test]
async fn test_tool_failure_aborts_traversal() {
    let mut engine = engine();

    let registry = engine.registry_mut();
    let graph = WorkflowGraph::new("tool_fail", "Tool Fail")
        .with_node(registry.create_input_node("input", "In"))
        .with_node(registry.create_tool_node(
            "boom",
            "Boom",
            ToolBinding::sync(|_input| {
                Err(PalaverError::ToolExecution {
                    tool: "boom".into(),
                    message: "exploded".into(),
                })
            }),
        ))
        .with_node(registry.create_output_node("output", "Out"))
        .with_edge(WorkflowEdge::connect("input", "boom"))
        .with_edge(WorkflowEdge::connect("boom", "output"));
    registry.register(graph).unwrap();

    let err = engine
        .execute("tool_fail", json!({}), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PalaverError::ToolExecution { .. }));
}
