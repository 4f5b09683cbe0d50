//! Tool node: execute the pending tool calls of the last assistant message.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::graph::{Command, Goto, Node, RunContext};
use crate::message::Message;
use crate::state::ConversationState;
use crate::tool_source::{ToolOutput, ToolResultDirection, ToolSource, ToolSourceError};

/// Runs the calls it owns against a `ToolSource` one after another, one `Tool`
/// message per call in call order.
///
/// Handoffs returned by tools become the node's goto (`Fan` when several). With
/// no handoff the node returns `Goto::End`, and the static edge registered by
/// `register_agent` takes the conversation back to the agent.
pub struct ToolNode {
    name: String,
    tools: HashSet<String>,
    source: Arc<dyn ToolSource>,
    handle_errors: bool,
}

impl ToolNode {
    pub fn new<I, T>(name: impl Into<String>, tools: I, source: Arc<dyn ToolSource>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            tools: tools.into_iter().map(Into::into).collect(),
            source,
            handle_errors: true,
        }
    }

    /// When off, the first failing call aborts the run with `AgentError::Tool`.
    pub fn with_handle_errors(mut self, handle_errors: bool) -> Self {
        self.handle_errors = handle_errors;
        self
    }
}

#[async_trait]
impl Node for ToolNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        state: &ConversationState,
        _ctx: &RunContext,
    ) -> Result<Command, AgentError> {
        let calls: Vec<_> = state
            .pending_tool_calls()
            .into_iter()
            .filter(|c| self.tools.contains(&c.name))
            .collect();
        let mut messages = Vec::with_capacity(calls.len());
        let mut handoffs: Vec<String> = Vec::new();
        for call in calls {
            let result = match call.parse_arguments() {
                Ok(args) => {
                    debug!(node = %self.name, tool = %call.name, args = %args, "tool call");
                    self.source.call_tool(&call.name, args).await
                }
                Err(e) => Err(ToolSourceError::InvalidInput(format!(
                    "arguments are not valid JSON: {}",
                    e
                ))),
            };
            match result {
                Ok(ToolOutput::Handoff { goto, text }) => {
                    debug!(tool = %call.name, %goto, "handoff");
                    handoffs.push(goto);
                    messages.push(Message::tool(call, text));
                }
                Ok(ToolOutput::Result { text, direction }) => {
                    if direction == ToolResultDirection::ToClient {
                        info!(tool = %call.name, content = %text, "tool result for client");
                    }
                    messages.push(Message::tool(call, text));
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool call failed");
                    if !self.handle_errors {
                        return Err(AgentError::Tool(e));
                    }
                    messages.push(Message::tool(call, format!("Error: {}", e)));
                }
            }
        }

        Ok(Command::new(messages, Goto::from_names(handoffs)))
    }
}
