//! Shared conversation state and the update half of a route decision.
//!
//! `ConversationState` is append-only: nodes never edit it directly; they return a
//! `StateDelta` and the executor appends it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::message::{Message, ToolCall};

/// Messages to append before transitioning to the next node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub messages: Vec<Message>,
}

impl StateDelta {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn message(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<Message>> for StateDelta {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}

/// Ordered, append-only conversation shared by every node of a graph.
///
/// `step` counts node executions over the lifetime of the conversation, across resumes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    step: u32,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, step: 0 }
    }

    /// State holding a single user message.
    pub fn from_user(text: impl Into<String>) -> Self {
        Self::new(vec![Message::user(text)])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn apply(&mut self, delta: StateDelta) {
        self.append(delta.messages);
    }

    pub(crate) fn record_step(&mut self) {
        self.step += 1;
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the most recent assistant message.
    pub fn last_assistant_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Assistant { content, .. } => Some(content.as_str()),
                _ => None,
            })
    }

    /// Tool calls of the most recent assistant message that have no `Tool` result yet.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        let Some(pos) = self
            .messages
            .iter()
            .rposition(|m| matches!(m, Message::Assistant { .. }))
        else {
            return Vec::new();
        };
        let answered: HashSet<&str> = self.messages[pos + 1..]
            .iter()
            .filter_map(|m| match m {
                Message::Tool { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();
        self.messages[pos]
            .tool_calls()
            .iter()
            .filter(|c| !answered.contains(c.call_key()))
            .collect()
    }
}
