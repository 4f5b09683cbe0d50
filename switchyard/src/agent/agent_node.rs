//! Agent node: prompt + conversation → LLM → route.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AgentError;
use crate::graph::{Command, Goto, Node, RunContext, END};
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::router::{route_tool_calls, RouteMapping, Router};
use crate::state::ConversationState;
use crate::tool_source::ToolSpec;

/// One LLM-backed agent.
///
/// Every run sends `[System(prompt + successor list), ...conversation]` with the
/// agent's tool specs. Calls to its own tools go to its tool node; otherwise the
/// `Router` decides.
pub struct AgentNode {
    name: String,
    prompt: String,
    successors: Vec<String>,
    llm: Arc<dyn LlmClient>,
    tools: Vec<ToolSpec>,
    tool_node: Option<String>,
    router: Router,
    reiterate_after_run: bool,
}

impl AgentNode {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            successors: Vec::new(),
            llm,
            tools: Vec::new(),
            tool_node: None,
            router: Router::default(),
            reiterate_after_run: false,
        }
    }

    /// Names listed to the model as possible handoff targets.
    pub fn with_successors(mut self, successors: Vec<String>) -> Self {
        self.successors = successors;
        self
    }

    /// Binds `tools`; calls to them are routed to `tool_node`.
    pub fn with_tools(mut self, tools: Vec<ToolSpec>, tool_node: impl Into<String>) -> Self {
        self.tools = tools;
        self.tool_node = Some(tool_node.into());
        self
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn with_reiterate_after_run(mut self, reiterate: bool) -> Self {
        self.reiterate_after_run = reiterate;
        self
    }

    pub fn system_prompt(&self) -> String {
        if self.successors.is_empty() {
            return self.prompt.clone();
        }
        let names: Vec<&str> = self
            .successors
            .iter()
            .map(|s| if s == END { "END" } else { s.as_str() })
            .collect();
        format!(
            "{}\n\nAgents you can hand the conversation to: {}.",
            self.prompt,
            names.join(", ")
        )
    }

    fn mappings(&self) -> Vec<RouteMapping> {
        match &self.tool_node {
            Some(node) => self
                .tools
                .iter()
                .map(|t| RouteMapping::new(t.name.clone(), node.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    fn calls_own_tool(&self, response: &LlmResponse) -> bool {
        self.tool_node.is_some()
            && response
                .tool_calls
                .iter()
                .any(|c| self.tools.iter().any(|t| t.name == c.name))
    }
}

/// Gives every call an id so tool results can be matched to calls.
fn assign_call_ids(response: &mut LlmResponse) {
    for call in response.tool_calls.iter_mut().filter(|c| c.id.is_none()) {
        call.id = Some(format!("call_{}", uuid::Uuid::new_v4().simple()));
    }
}

#[async_trait]
impl Node for AgentNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        state: &ConversationState,
        _ctx: &RunContext,
    ) -> Result<Command, AgentError> {
        let mut messages = Vec::with_capacity(state.len() + 1);
        messages.push(Message::system(self.system_prompt()));
        messages.extend(state.messages().iter().cloned());

        let mut response = self.llm.invoke(&messages, &self.tools).await?;
        assign_call_ids(&mut response);
        debug!(
            agent = %self.name,
            content_len = response.content.len(),
            tool_calls = response.tool_calls.len(),
            "agent reply"
        );

        if self.calls_own_tool(&response) {
            let goto = route_tool_calls(&response.tool_calls, &self.mappings());
            return Ok(Command::new(vec![response.to_message()], goto));
        }

        let mut command = self
            .router
            .decide(&response)
            .map_err(|source| AgentError::Routing {
                node: self.name.clone(),
                source,
            })?;
        if self.reiterate_after_run && command.goto.is_end() && !response.has_tool_calls() {
            command.goto = Goto::node(self.name.clone());
        }
        Ok(command)
    }
}
