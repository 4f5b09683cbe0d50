//! Execution metadata passed into every node run.

use serde::{Deserialize, Serialize};

use crate::memory::RunnableConfig;

/// Records that `from` scheduled `to`. `from` is `__start__` for the entry node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    pub from: String,
    pub to: String,
}

impl Trigger {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

/// Context for one node run.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    /// Config for the current run (thread_id, checkpoint namespace, user_id).
    pub config: RunnableConfig,
    /// Every node whose route caused this run; several when fan-out branches converged.
    pub triggers: Vec<Trigger>,
    /// External input when this run resumes a suspension at this node.
    pub resume: Option<String>,
}

impl RunContext {
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_triggers(mut self, triggers: Vec<Trigger>) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_resume(mut self, input: impl Into<String>) -> Self {
        self.resume = Some(input.into());
        self
    }
}
