//! Tool source abstraction: list tools and call a tool.
//!
//! Agent nodes read `list_tools()` to bind tool specs to the model; tool nodes
//! execute calls through `call_tool(name, args)`. [`crate::tools::ToolRegistry`] is
//! the in-process implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool specification: name, description for the model, JSON Schema for arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Who a tool result is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolResultDirection {
    /// Fed back to the model.
    #[default]
    ToServer,
    /// Meant for display to the end user (product cards and the like).
    ToClient,
}

/// Result of a single tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Result {
        text: String,
        direction: ToolResultDirection,
    },
    /// Hand the conversation to another node (a transfer tool).
    Handoff { goto: String, text: String },
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Result {
            text: text.into(),
            direction: ToolResultDirection::ToServer,
        }
    }

    pub fn to_client(text: impl Into<String>) -> Self {
        ToolOutput::Result {
            text: text.into(),
            direction: ToolResultDirection::ToClient,
        }
    }

    /// JSON-serializes `value` as the result text.
    pub fn json(value: &Value, direction: ToolResultDirection) -> Self {
        ToolOutput::Result {
            text: value.to_string(),
            direction,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ToolOutput::Result { text, .. } | ToolOutput::Handoff { text, .. } => text,
        }
    }
}

/// Errors from listing or calling tools.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("tool already registered: {0}")]
    Duplicate(String),
    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// List tools and call a tool by name.
///
/// **Interaction**: `AgentNode` binds `list_tools()` output to its model;
/// `ToolNode` calls `call_tool` for each pending tool call.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    async fn call_tool(&self, name: &str, arguments: Value)
        -> Result<ToolOutput, ToolSourceError>;
}
