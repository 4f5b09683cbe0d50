//! Graph node trait: one agent invocation, tool execution or human-input step.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::ConversationState;

use super::{Command, RunContext};

/// One step in a graph: read the conversation, return what to append and where to go.
///
/// Nodes never mutate the state; the executor applies `Command::update` and then
/// schedules `Command::goto`. Returning `Err(AgentError::Interrupted(_))` suspends
/// the run at this node; it is re-run with `RunContext::resume` set when the run
/// is resumed.
///
/// **Interaction**: registered on `AgentRegistry::register`; driven by `CompiledGraph`.
#[async_trait]
pub trait Node: Send + Sync {
    /// Node name. Must be unique within a registry.
    fn name(&self) -> &str;

    async fn run(
        &self,
        state: &ConversationState,
        ctx: &RunContext,
    ) -> Result<Command, AgentError>;
}
