//! LLM client abstraction for agent nodes.
//!
//! An agent node sends the conversation plus the specs of the tools bound to it and
//! gets back assistant text and optional tool calls; this module defines the trait,
//! the response types, a scripted mock and an OpenAI-compatible client.

mod mock;
mod openai;

pub use mock::{MockLlm, MockRequest};
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// Tool choice mode for chat completions: when tools are present, controls whether
/// the model may choose (auto), must not use (none), or must use (required).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model can pick between message or tool calls. Default when tools are present.
    #[default]
    Auto,
    /// Model will not call any tool.
    None,
    /// Model must call one or more tools.
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion: assistant message text and optional tool calls.
///
/// **Interaction**: Returned by `LlmClient::invoke()`; the agent's `Router` turns it
/// into a `Command` whose update is the assistant message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool calls from this turn; empty means the router decides from the text.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage for this call, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant message this response appends to the conversation.
    pub fn to_message(&self) -> Message {
        Message::assistant_with_tools(self.content.clone(), self.tool_calls.clone())
    }
}

/// LLM client: given messages and the tools on offer, returns assistant text and
/// optional tool calls.
///
/// Implementations: `MockLlm` (scripted responses), `ChatOpenAI` (OpenAI-compatible API).
///
/// **Interaction**: Used by `AgentNode`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn. `tools` is empty when the agent has no tools bound.
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError>;
}
