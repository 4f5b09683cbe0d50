//! Routing strategies: turn a model reply into the next node(s).
//!
//! Agents end their replies with a directive such as `call: order_agent`, emit
//! tool calls that name a node, or answer with structured JSON. A [`Router`]
//! picks one of these readings; tool calls always win over text.

use serde::Deserialize;
use thiserror::Error;

use crate::graph::{Command, Goto, END};
use crate::llm::LlmResponse;
use crate::message::ToolCall;

/// Marker that introduces a routing directive in free text.
pub const DIRECTIVE_MARKER: &str = "call:";

/// Result of scanning a reply for a `call: <name>` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    Call(String),
    End,
    /// No marker in the text.
    Missing,
    /// Marker present but not followed by a usable name; carries the raw token.
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("malformed routing directive: {0:?}")]
    Malformed(String),
}

const QUOTES: &[char] = &['"', '\'', '`', '*', '<', '>', '(', ')', '[', ']'];
const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?'];

fn is_end_name(name: &str) -> bool {
    name == END || name.eq_ignore_ascii_case("end")
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Finds the last `call:` marker (any case) and reads the name after it.
///
/// Surrounding quotes, backticks, emphasis and angle brackets are stripped, as is
/// trailing sentence punctuation.
pub fn parse_directive(text: &str) -> Directive {
    // ASCII lowering keeps byte offsets valid for `text`.
    let lower = text.to_ascii_lowercase();
    let Some(pos) = lower.rfind(DIRECTIVE_MARKER) else {
        return Directive::Missing;
    };
    let rest = &text[pos + DIRECTIVE_MARKER.len()..];
    let raw = rest.split_whitespace().next().unwrap_or("");
    let name = raw
        .trim_start_matches(QUOTES)
        .trim_end_matches(|c: char| QUOTES.contains(&c) || TRAILING.contains(&c));
    if is_end_name(name) {
        Directive::End
    } else if is_valid_name(name) {
        Directive::Call(name.to_string())
    } else {
        Directive::Malformed(raw.to_string())
    }
}

/// Sends calls of `tool_name` to node `via` (a tool node bundling several tools).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMapping {
    pub tool_name: String,
    pub via: String,
}

impl RouteMapping {
    pub fn new(tool_name: impl Into<String>, via: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            via: via.into(),
        }
    }
}

/// Targets for `calls`: the mapped node, or the tool name itself when unmapped.
pub fn route_tool_calls(calls: &[ToolCall], mappings: &[RouteMapping]) -> Goto {
    Goto::from_names(calls.iter().map(|call| {
        mappings
            .iter()
            .find(|m| m.tool_name == call.name)
            .map_or_else(|| call.name.clone(), |m| m.via.clone())
    }))
}

#[derive(Deserialize)]
struct StructuredReply {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    goto: Option<String>,
}

/// Strips a surrounding ```json fence if present.
fn strip_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(body) = t.strip_prefix("```") else {
        return t;
    };
    let body = body.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn parse_structured(text: &str) -> Option<StructuredReply> {
    serde_json::from_str(strip_fence(text)).ok()
}

fn goto_from_directive(directive: Directive, default: &Goto) -> Result<Goto, RouteError> {
    match directive {
        Directive::Call(name) => Ok(Goto::Node(name)),
        Directive::End => Ok(Goto::End),
        Directive::Missing => Ok(default.clone()),
        Directive::Malformed(raw) => Err(RouteError::Malformed(raw)),
    }
}

/// How an agent picks its next node from a model reply.
#[derive(Clone, Debug, PartialEq)]
pub enum Router {
    /// `call: <name>` in the text; `default` when there is none.
    Directive { default: Goto },
    /// Tool calls mapped through `mappings`; `default` when there are none.
    ToolCalls {
        mappings: Vec<RouteMapping>,
        default: Goto,
    },
    /// JSON `{ "result": ..., "goto": ... }`; unparsable replies fall back to the directive.
    Structured { default: Goto },
    Fixed(Goto),
}

impl Default for Router {
    fn default() -> Self {
        Router::Directive { default: Goto::End }
    }
}

impl Router {
    pub fn directive() -> Self {
        Self::default()
    }

    pub fn tool_calls(mappings: Vec<RouteMapping>) -> Self {
        Router::ToolCalls {
            mappings,
            default: Goto::End,
        }
    }

    pub fn structured() -> Self {
        Router::Structured { default: Goto::End }
    }

    pub fn route(&self, response: &LlmResponse) -> Result<Goto, RouteError> {
        if response.has_tool_calls() {
            let mappings: &[RouteMapping] = match self {
                Router::ToolCalls { mappings, .. } => mappings.as_slice(),
                _ => &[],
            };
            return Ok(route_tool_calls(&response.tool_calls, mappings));
        }
        match self {
            Router::Directive { default } => {
                goto_from_directive(parse_directive(&response.content), default)
            }
            Router::ToolCalls { default, .. } => Ok(default.clone()),
            Router::Structured { default } => match parse_structured(&response.content) {
                Some(StructuredReply { goto: Some(g), .. }) => {
                    let g = g.trim();
                    if g.is_empty() || is_end_name(g) {
                        Ok(Goto::End)
                    } else if is_valid_name(g) {
                        Ok(Goto::node(g))
                    } else {
                        Err(RouteError::Malformed(g.to_string()))
                    }
                }
                Some(StructuredReply { goto: None, .. }) => Ok(default.clone()),
                None => goto_from_directive(parse_directive(&response.content), default),
            },
            Router::Fixed(goto) => Ok(goto.clone()),
        }
    }

    /// Text shown to the conversation: the `result` field for structured replies.
    fn reply_text(&self, response: &LlmResponse) -> String {
        if let Router::Structured { .. } = self {
            if let Some(StructuredReply {
                result: Some(result),
                ..
            }) = parse_structured(&response.content)
            {
                return match result {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
            }
        }
        response.content.clone()
    }

    /// The command to return from an agent node: append the assistant message, then route.
    pub fn decide(&self, response: &LlmResponse) -> Result<Command, RouteError> {
        let goto = self.route(response)?;
        let message = crate::message::Message::assistant_with_tools(
            self.reply_text(response),
            response.tool_calls.clone(),
        );
        Ok(Command::new(vec![message], goto))
    }
}
