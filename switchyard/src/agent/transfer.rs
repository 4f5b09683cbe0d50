//! Transfer tools: calling one hands the conversation to another node.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool_source::{ToolOutput, ToolSourceError, ToolSpec};
use crate::tools::Tool;

/// A tool whose only effect is a handoff to `goto`.
#[derive(Clone, Debug)]
pub struct TransferTool {
    goto: String,
    description: String,
    tool_name: String,
}

impl TransferTool {
    /// Named `"{goto}-transfer-tool"`.
    pub fn new(goto: impl Into<String>, description: impl Into<String>) -> Self {
        let goto = goto.into();
        let tool_name = format!("{}-transfer-tool", goto);
        Self {
            goto,
            description: description.into(),
            tool_name,
        }
    }

    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }

    pub fn goto(&self) -> &str {
        &self.goto
    }
}

#[async_trait]
impl Tool for TransferTool {
    fn name(&self) -> &str {
        &self.tool_name
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.tool_name.clone(),
            description: Some(self.description.clone()),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(&self, _args: Value) -> Result<ToolOutput, ToolSourceError> {
        Ok(ToolOutput::Handoff {
            goto: self.goto.clone(),
            text: format!("Transferred to {}", self.goto),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: A transfer tool is named after its target and returns a handoff.
    #[tokio::test]
    async fn transfer_tool_hands_off() {
        let t = TransferTool::new("compose_agent", "Hand over to the compose agent.");
        assert_eq!(t.name(), "compose_agent-transfer-tool");
        let out = t.call(json!({})).await.unwrap();
        assert_eq!(
            out,
            ToolOutput::Handoff {
                goto: "compose_agent".into(),
                text: "Transferred to compose_agent".into()
            }
        );
    }

    #[test]
    fn custom_tool_name() {
        let t = TransferTool::new("order_agent", "x").with_tool_name("goto_order_agent");
        assert_eq!(t.spec().name, "goto_order_agent");
        assert_eq!(t.goto(), "order_agent");
    }
}
