//! Mock LLM for tests and offline runs.
//!
//! Either repeats one fixed response or plays a script of responses in order;
//! every request is recorded so tests can assert on the prompt and bound tools.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// One recorded `invoke` call.
#[derive(Clone, Debug)]
pub struct MockRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<LlmResponse>,
    repeat: Option<LlmResponse>,
    requests: Vec<MockRequest>,
}

/// Mock LLM: scripted or fixed responses.
///
/// With a script, each `invoke` pops the next response; once the script is empty
/// the repeat response (if any) is returned, else the call fails.
///
/// **Interaction**: Implements `LlmClient`; used by `AgentNode` in tests and by the
/// CLI's `--mock` mode.
pub struct MockLlm {
    state: Mutex<MockState>,
}

impl MockLlm {
    /// Always returns `content` with `tool_calls`.
    pub fn new(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::from_state(MockState {
            repeat: Some(LlmResponse::with_tool_calls(content, tool_calls)),
            ..Default::default()
        })
    }

    /// Always returns `content` and no tool calls.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::new(content, Vec::new())
    }

    /// Returns `responses` in order, then fails.
    pub fn scripted(responses: Vec<LlmResponse>) -> Self {
        Self::from_state(MockState {
            script: responses.into(),
            ..Default::default()
        })
    }

    /// Response to return once the script runs out.
    pub fn then_repeat(self, response: LlmResponse) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.repeat = Some(response);
        }
        self
    }

    fn from_state(state: MockState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.requests.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("mock llm lock poisoned".to_string()))?;
        state.requests.push(MockRequest {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });
        if let Some(next) = state.script.pop_front() {
            return Ok(next);
        }
        state.repeat.clone().ok_or_else(|| {
            AgentError::ExecutionFailed("mock llm script exhausted".to_string())
        })
    }
}
