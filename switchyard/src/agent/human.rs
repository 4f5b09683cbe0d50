//! Human-input node: suspend for user input, then return to the agent that asked.

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::{Command, Goto, GraphInterrupt, Interrupt, Node, RunContext};
use crate::message::Message;
use crate::state::ConversationState;

/// Prompt carried by the interrupt this node raises.
pub const HUMAN_INPUT_PROMPT: &str = "Ready for user input.";

/// First run raises an interrupt; the resumed run appends the user's text and
/// routes back to the node that triggered it.
///
/// With a termination keyword, input containing it (case-insensitive) ends the
/// run instead.
pub struct HumanInputNode {
    name: String,
    termination: Option<String>,
}

impl HumanInputNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            termination: None,
        }
    }

    pub fn with_termination(mut self, keyword: impl Into<String>) -> Self {
        self.termination = Some(keyword.into().to_lowercase());
        self
    }

    fn terminates(&self, input: &str) -> bool {
        self.termination
            .as_deref()
            .map_or(false, |k| !k.is_empty() && input.to_lowercase().contains(k))
    }
}

#[async_trait]
impl Node for HumanInputNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        _state: &ConversationState,
        ctx: &RunContext,
    ) -> Result<Command, AgentError> {
        let Some(input) = ctx.resume.as_deref() else {
            return Err(GraphInterrupt(Interrupt::new(json!(HUMAN_INPUT_PROMPT))).into());
        };
        let [trigger] = ctx.triggers.as_slice() else {
            return Err(AgentError::TriggerPrecondition {
                count: ctx.triggers.len(),
            });
        };
        let update = vec![Message::user(input)];
        if self.terminates(input) {
            tracing::info!(node = %self.name, "termination keyword received");
            return Ok(Command::new(update, Goto::End));
        }
        Ok(Command::new(update, Goto::node(trigger.from.clone())))
    }
}
