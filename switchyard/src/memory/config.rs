//! Per-run configuration.

use serde::{Deserialize, Serialize};

/// Identifies the conversation a run belongs to.
///
/// `thread_id` is required for checkpointing; without it suspensions are only
/// returned to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnableConfig {
    pub thread_id: Option<String>,
    /// Namespace that separates checkpoints of different graphs on the same thread.
    #[serde(default)]
    pub checkpoint_ns: String,
    pub user_id: Option<String>,
}

impl RunnableConfig {
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_checkpoint_ns(mut self, ns: impl Into<String>) -> Self {
        self.checkpoint_ns = ns.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}
