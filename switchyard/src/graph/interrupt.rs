//! Interrupts: how a node suspends a run to wait for external input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value shown to the external driver while a run is suspended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    /// The interrupt payload (e.g. a prompt for the user).
    pub value: serde_json::Value,
    /// Optional interrupt id for identifying specific interrupts.
    pub id: Option<String>,
}

impl Interrupt {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value, id: None }
    }

    pub fn with_id(value: serde_json::Value, id: impl Into<String>) -> Self {
        Self {
            value,
            id: Some(id.into()),
        }
    }

    /// The payload as display text: strings unquoted, everything else as JSON.
    pub fn prompt(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Error raised by a node to suspend the run; caught by the executor.
#[derive(Debug, Clone, Error)]
#[error("{}", .0.prompt())]
pub struct GraphInterrupt(pub Interrupt);

impl From<Interrupt> for GraphInterrupt {
    fn from(interrupt: Interrupt) -> Self {
        GraphInterrupt(interrupt)
    }
}
