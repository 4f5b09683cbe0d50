use async_trait::async_trait;

use crate::tool_source::{ToolOutput, ToolSourceError, ToolSpec};

/// A single tool the model can call.
///
/// Each tool has a unique name, a specification (description and JSON schema)
/// and the call logic. Arguments reaching `call` have already been checked
/// against the `required` list of `spec().input_schema` by `ToolRegistry`.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use switchyard::tools::Tool;
/// use switchyard::tool_source::{ToolOutput, ToolSourceError, ToolSpec};
///
/// struct Ping;
///
/// #[async_trait]
/// impl Tool for Ping {
///     fn name(&self) -> &str {
///         "ping"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "ping".to_string(),
///             description: Some("Replies pong".to_string()),
///             input_schema: serde_json::json!({ "type": "object", "properties": {} }),
///         }
///     }
///
///     async fn call(&self, _args: Value) -> Result<ToolOutput, ToolSourceError> {
///         Ok(ToolOutput::text("pong"))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; the key the model uses in its tool calls.
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    async fn call(&self, args: serde_json::Value) -> Result<ToolOutput, ToolSourceError>;
}
