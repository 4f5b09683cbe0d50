//! Agents and the nodes that serve them.
//!
//! [`register_agent`] turns an [`AgentDefinition`] into an [`AgentNode`] plus, when
//! the agent has tools, a [`ToolNode`] named `"{agent}_tools"` with a static edge
//! back to the agent. [`register_human_input`] adds a [`HumanInputNode`].

mod agent_node;
mod definition;
mod human;
mod tool_node;
mod transfer;

pub use agent_node::AgentNode;
pub use definition::{AgentDefinition, TOOL_NODE_SUFFIX};
pub use human::{HumanInputNode, HUMAN_INPUT_PROMPT};
pub use tool_node::ToolNode;
pub use transfer::TransferTool;

use std::sync::Arc;

use crate::error::AgentError;
use crate::graph::{AgentRegistry, CompilationError};
use crate::llm::LlmClient;
use crate::tool_source::{ToolSource, ToolSourceError};

/// Registers the agent described by `definition`, plus its tool node.
///
/// The agent's tools are looked up by name in `tools`; an unknown name fails with
/// `ToolSourceError::NotFound`. Successors of the agent are its declared ones, its
/// tool node and (with `reiterate_after_run`) itself. The tool node may route to
/// the agent's successors (handoffs) and back to the agent.
pub async fn register_agent(
    registry: &mut AgentRegistry,
    definition: AgentDefinition,
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
) -> Result<(), AgentError> {
    let available = tools.list_tools().await?;
    let mut specs = Vec::with_capacity(definition.tools.len());
    for name in &definition.tools {
        let spec = available
            .iter()
            .find(|s| &s.name == name)
            .cloned()
            .ok_or_else(|| ToolSourceError::NotFound(name.clone()))?;
        specs.push(spec);
    }

    let tool_node_name = definition.tool_node_name();
    let mut agent_successors = definition.successors.clone();
    if !specs.is_empty() {
        agent_successors.push(tool_node_name.clone());
    }
    if definition.reiterate_after_run {
        agent_successors.push(definition.name.clone());
    }

    let mut agent = AgentNode::new(definition.name.clone(), definition.prompt, llm)
        .with_successors(definition.successors.clone())
        .with_router(definition.router)
        .with_reiterate_after_run(definition.reiterate_after_run);
    if !specs.is_empty() {
        agent = agent.with_tools(specs, tool_node_name.clone());
    }
    registry.register(Arc::new(agent), agent_successors)?;

    if !definition.tools.is_empty() {
        let mut tool_successors = definition.successors.clone();
        tool_successors.push(definition.name.clone());
        registry.register(
            Arc::new(ToolNode::new(tool_node_name.clone(), definition.tools, tools)),
            tool_successors,
        )?;
        registry.add_edge(tool_node_name.clone(), definition.name.clone());
    }
    tracing::debug!(agent = %definition.name, "agent registered");
    Ok(())
}

/// Registers a human-input node that may return to any of `successors`.
pub fn register_human_input<I, T>(
    registry: &mut AgentRegistry,
    name: impl Into<String>,
    successors: I,
    termination: Option<&str>,
) -> Result<(), CompilationError>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut node = HumanInputNode::new(name);
    if let Some(keyword) = termination {
        node = node.with_termination(keyword);
    }
    registry.register(Arc::new(node), successors)?;
    Ok(())
}
