//! Pre-built workflow templates.

use std::sync::Arc;

use serde_json::json;

use palaver_core::error::Result;
use palaver_core::traits::ModelClient;

use crate::edge::WorkflowEdge;
use crate::graph::WorkflowGraph;
use crate::registry::WorkflowRegistry;

pub const SUPPORT_WORKFLOW_ID: &str = "support_workflow";
pub const RESEARCH_WORKFLOW_ID: &str = "research_workflow";

/// Customer support: input → receptionist, who routes to a technical
/// or billing specialist. All agent nodes share the given client.
pub fn support_workflow(
    registry: &mut WorkflowRegistry,
    client: Arc<dyn ModelClient>,
) -> Result<Arc<WorkflowGraph>> {
    let input = registry.create_input_node("input", "User Input");

    let receptionist = registry.create_agent_node(
        "receptionist",
        "Receptionist",
        "openai:gpt-4o-mini",
        "You are a friendly receptionist. Greet users and understand their needs.",
        client.clone(),
    );

    let technical = registry.create_agent_node(
        "technical_support",
        "Technical Support",
        "openai:gpt-4o-mini",
        "You are a technical support specialist. Help users with technical issues.",
        client.clone(),
    );

    let billing = registry.create_agent_node(
        "billing_support",
        "Billing Support",
        "openai:gpt-4o-mini",
        "You are a billing specialist. Help users with billing and payment issues.",
        client,
    );

    let graph = WorkflowGraph::new(SUPPORT_WORKFLOW_ID, "Customer Support Workflow")
        .with_node(input)
        .with_node(receptionist)
        .with_node(technical)
        .with_node(billing)
        .with_edge(WorkflowEdge::new("input", "receptionist", "user_input", "input"))
        .with_edge(WorkflowEdge::new(
            "receptionist",
            "technical_support",
            "technical_issue",
            "input",
        ))
        .with_edge(WorkflowEdge::new(
            "receptionist",
            "billing_support",
            "billing_issue",
            "input",
        ))
        .with_metadata(
            "description",
            json!("Multi-agent customer support workflow"),
        )
        .with_metadata("version", json!("1.0"));

    registry.register(graph)?;
    registry.get(SUPPORT_WORKFLOW_ID)
}

/// Research assistant: input → researcher → summarizer.
pub fn research_workflow(
    registry: &mut WorkflowRegistry,
    client: Arc<dyn ModelClient>,
) -> Result<Arc<WorkflowGraph>> {
    let input = registry.create_input_node("input", "Research Topic");

    let researcher = registry.create_agent_node(
        "researcher",
        "Researcher",
        "openai:gpt-4o-mini",
        "You are a research assistant. Analyze topics and break them down.",
        client.clone(),
    );

    let summarizer = registry.create_agent_node(
        "summarizer",
        "Summarizer",
        "openai:gpt-4o-mini",
        "You summarize research findings concisely.",
        client,
    );

    let graph = WorkflowGraph::new(RESEARCH_WORKFLOW_ID, "Research Assistant Workflow")
        .with_node(input)
        .with_node(researcher)
        .with_node(summarizer)
        .with_edge(WorkflowEdge::new(
            "input",
            "researcher",
            "research_topic",
            "input",
        ))
        .with_edge(WorkflowEdge::new(
            "researcher",
            "summarizer",
            "research_findings",
            "input",
        ))
        .with_metadata("description", json!("Research and summarization workflow"))
        .with_metadata("version", json!("1.0"));

    registry.register(graph)?;
    registry.get(RESEARCH_WORKFLOW_ID)
}
