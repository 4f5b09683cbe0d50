//! Agent and graph execution error types.
//!
//! Returned by `Node::run` and by `CompiledGraph::invoke` / `resume`.

use thiserror::Error;

use crate::graph::{CompilationError, GraphInterrupt};
use crate::memory::CheckpointError;
use crate::router::RouteError;
use crate::tool_source::ToolSourceError;

/// Agent execution error.
///
/// `Interrupted` is not a failure: the executor catches it and suspends the run
/// (see `RunOutcome::Suspended`). Every other variant aborts the run and is
/// returned to the caller unchanged.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A node asked the executor to suspend and wait for external input.
    #[error("graph interrupted: {0}")]
    Interrupted(GraphInterrupt),

    /// A route named a node that is not registered.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A node routed to a registered node it did not declare as a successor.
    #[error("node {from} routed to undeclared successor {to}")]
    UndeclaredRoute { from: String, to: String },

    /// The router could not interpret a model reply.
    #[error("routing failed in {node}: {source}")]
    Routing {
        node: String,
        #[source]
        source: RouteError,
    },

    /// The human-input node must be resumed by exactly one originating node.
    #[error("human input node expected exactly 1 trigger, got {count}")]
    TriggerPrecondition { count: usize },

    /// Step or message limit reached before the run finished.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("tool: {0}")]
    Tool(#[from] ToolSourceError),

    #[error("checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("compile: {0}")]
    Compilation(#[from] CompilationError),
}

impl From<GraphInterrupt> for AgentError {
    fn from(interrupt: GraphInterrupt) -> Self {
        AgentError::Interrupted(interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of ExecutionFailed contains "execution failed" and the message.
    #[test]
    fn agent_error_display_execution_failed() {
        let err = AgentError::ExecutionFailed("msg".to_string());
        let s = err.to_string();
        assert!(s.contains("execution failed"), "{}", s);
        assert!(s.contains("msg"), "{}", s);
    }

    /// **Scenario**: TriggerPrecondition reports the observed trigger count.
    #[test]
    fn trigger_precondition_display_contains_count() {
        let s = AgentError::TriggerPrecondition { count: 2 }.to_string();
        assert!(s.contains("exactly 1 trigger"), "{}", s);
        assert!(s.contains('2'), "{}", s);
    }

    /// **Scenario**: Routing errors keep the router error as their source.
    #[test]
    fn routing_error_exposes_source() {
        use std::error::Error as _;
        let err = AgentError::Routing {
            node: "order_agent".into(),
            source: RouteError::Malformed("???".into()),
        };
        assert!(err.to_string().contains("order_agent"));
        assert!(err.source().is_some());
    }
}
