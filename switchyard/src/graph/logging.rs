//! Structured logging for graph execution.

use super::{Goto, Trigger};

pub fn log_graph_start(entry: &str) {
    tracing::info!(entry = entry, "Starting graph execution");
}

pub fn log_graph_resume(node_id: &str) {
    tracing::info!(node_id = node_id, "Resuming graph execution");
}

pub fn log_graph_complete(steps: u32) {
    tracing::info!(steps = steps, "Graph execution complete");
}

pub fn log_graph_suspended(node_id: &str) {
    tracing::info!(node_id = node_id, "Graph execution suspended");
}

pub fn log_graph_error(error: &crate::error::AgentError) {
    tracing::error!(?error, "Graph execution error");
}

pub fn log_node_start(node_id: &str, triggers: &[Trigger]) {
    let triggers: Vec<String> = triggers.iter().map(Trigger::to_string).collect();
    tracing::debug!(node_id = node_id, ?triggers, "Starting node execution");
}

pub fn log_node_complete(node_id: &str, goto: &Goto, appended: usize) {
    tracing::debug!(node_id = node_id, ?goto, appended = appended, "Node execution complete");
}
