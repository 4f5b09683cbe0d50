//! Conversation message types.
//!
//! Roles: System (usually first in the request), User, Assistant (may carry tool calls)
//! and Tool (the result of one tool call, linked by `call_id`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role, as used by chat-completion APIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tool invocation requested by the model.
///
/// `arguments` is the raw JSON string returned by the chat-completions API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id from the API; `None` for providers (and mocks) that do not send one.
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Key that links this call to its `Message::Tool` result: the call id, else the tool name.
    pub fn call_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// Parses `arguments` into a JSON value.
    ///
    /// An empty string becomes `{}`; a JSON string that itself contains JSON
    /// (double-encoded arguments) is decoded once more.
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        let raw = self.arguments.trim();
        if raw.is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        match serde_json::from_str::<Value>(raw)? {
            Value::String(inner) => {
                let inner = inner.trim();
                if inner.is_empty() {
                    Ok(Value::Object(Default::default()))
                } else {
                    serde_json::from_str(inner)
                }
            }
            other => Ok(other),
        }
    }
}

/// A single message in the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Result message for `call`.
    pub fn tool(call: &ToolCall, content: impl Into<String>) -> Self {
        Self::Tool {
            call_id: call.call_key().to_string(),
            name: call.name.clone(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System(_) => Role::System,
            Message::User(_) => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System(c) | Message::User(c) => c,
            Message::Assistant { content, .. } | Message::Tool { content, .. } => content,
        }
    }

    /// Tool calls of an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}
