//! Email drafting: find a template, pick recipients, send once the user is happy with
//! the draft; "approve" closes the conversation.

use std::sync::Arc;

use crate::agent::{register_agent, register_human_input, AgentDefinition, TransferTool};
use crate::error::AgentError;
use crate::graph::{AgentRegistry, CompiledGraph, GraphLimits};
use crate::llm::LlmClient;
use crate::tools::{
    FindRelevantUserTool, Outbox, SearchTemplatesTool, SendEmailTool, TemplateLibrary,
    ToolRegistry, UserDirectory, TOOL_FIND_RELEVANT_USER, TOOL_SEARCH_TEMPLATES, TOOL_SEND_EMAIL,
};

use super::HUMAN_INPUT_AGENT;

pub const SEARCH_AGENT: &str = "search_agent";
pub const COMPOSE_AGENT: &str = "compose_agent";

/// User input containing this word ends the conversation.
pub const EMAIL_TERMINATION: &str = "approve";

/// Conversation length at which the email run stops.
pub const EMAIL_MAX_MESSAGES: usize = 50;

const SEARCH_PROMPT: &str = "\
I am an email template search agent. I can help you find email templates for various \
scenarios. Please provide me with a scenario and I will provide you with a template. \
Ask the user if they deem the result a good fit by calling human_input_agent.
Once the user picked a template, hand over with the compose_agent-transfer-tool.
Add the agent name you want to call to the end of your message. Use the form \
\"call: <agent_name>\".";

const COMPOSE_PROMPT: &str = "\
Take the selected template and compose an email with it. Use find_relevant_user to look \
up recipients. Ask for user input if required by calling human_input_agent.
When the user is happy with the draft, send it with send_email, then ask the user by \
calling human_input_agent whether anything else is needed; the user ends the conversation \
by saying \"approve\".
If the user wants another template, hand over with the search_agent-transfer-tool.
Add the agent name you want to call to the end of your message. Use the form \
\"call: <agent_name>\".";

/// Registers `search_agent` (entry), `compose_agent` and `human_input_agent`.
///
/// The agents hand over to each other with transfer tools and reach the user by
/// directive; the human node ends the run on [`EMAIL_TERMINATION`]. Runs are capped
/// at [`EMAIL_MAX_MESSAGES`] messages.
pub async fn email_registry(
    llm: Arc<dyn LlmClient>,
    templates: Arc<TemplateLibrary>,
    directory: Arc<UserDirectory>,
    outbox: Arc<Outbox>,
) -> Result<AgentRegistry, AgentError> {
    let to_compose = TransferTool::new(
        COMPOSE_AGENT,
        "Hand the conversation to the compose agent once a template was chosen.",
    );
    let to_search = TransferTool::new(
        SEARCH_AGENT,
        "Hand the conversation back to the search agent to find another template.",
    );
    let to_compose_name = crate::tools::Tool::name(&to_compose).to_string();
    let to_search_name = crate::tools::Tool::name(&to_search).to_string();

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(SearchTemplatesTool::new(templates)))?;
    tools.register(Arc::new(FindRelevantUserTool::new(directory)))?;
    tools.register(Arc::new(SendEmailTool::new(outbox)))?;
    tools.register(Arc::new(to_compose))?;
    tools.register(Arc::new(to_search))?;
    let tools = Arc::new(tools);

    let mut registry = AgentRegistry::new().with_limits(GraphLimits {
        max_messages: Some(EMAIL_MAX_MESSAGES),
        ..GraphLimits::default()
    });
    register_agent(
        &mut registry,
        AgentDefinition::new(SEARCH_AGENT, SEARCH_PROMPT)
            .with_tools([TOOL_SEARCH_TEMPLATES.to_string(), to_compose_name])
            .with_successors([COMPOSE_AGENT, HUMAN_INPUT_AGENT]),
        llm.clone(),
        tools.clone(),
    )
    .await?;
    register_agent(
        &mut registry,
        AgentDefinition::new(COMPOSE_AGENT, COMPOSE_PROMPT)
            .with_tools([
                TOOL_FIND_RELEVANT_USER.to_string(),
                TOOL_SEND_EMAIL.to_string(),
                to_search_name,
            ])
            .with_successors([SEARCH_AGENT, HUMAN_INPUT_AGENT]),
        llm,
        tools,
    )
    .await?;
    register_human_input(
        &mut registry,
        HUMAN_INPUT_AGENT,
        [SEARCH_AGENT, COMPOSE_AGENT],
        Some(EMAIL_TERMINATION),
    )?;
    registry.set_entry(SEARCH_AGENT);
    Ok(registry)
}

pub async fn email_graph(
    llm: Arc<dyn LlmClient>,
    templates: Arc<TemplateLibrary>,
    directory: Arc<UserDirectory>,
    outbox: Arc<Outbox>,
) -> Result<CompiledGraph, AgentError> {
    Ok(email_registry(llm, templates, directory, outbox)
        .await?
        .compile()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::llm::MockLlm;

    /// **Scenario**: Each agent's tool node may hand off to the other agent.
    #[tokio::test]
    async fn transfer_targets_are_declared() {
        let graph = email_graph(
            Arc::new(MockLlm::with_no_tool_calls("call: END")),
            Arc::new(TemplateLibrary::new(Vec::new())),
            Arc::new(UserDirectory::new(Vec::new())),
            Arc::new(Outbox::new()),
        )
        .await
        .unwrap();
        assert_eq!(graph.entry(), SEARCH_AGENT);
        assert_eq!(graph.limits().max_messages, Some(EMAIL_MAX_MESSAGES));
        assert!(graph
            .destinations("search_agent_tools")
            .unwrap()
            .contains(&COMPOSE_AGENT.to_string()));
        assert!(graph
            .destinations("compose_agent_tools")
            .unwrap()
            .contains(&SEARCH_AGENT.to_string()));
    }
}
