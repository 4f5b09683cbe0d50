use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::tool_source::{ToolOutput, ToolSource, ToolSourceError, ToolSpec};
use crate::tools::r#trait::Tool;

/// Central registry for a collection of tools; implements [`ToolSource`].
///
/// Tools are listed in registration order. Arguments are checked against the
/// `required` properties of each tool's input schema before the tool runs.
///
/// # Interaction
///
/// - **AgentNode**: binds the specs of its own tools via `list_tools()`
/// - **ToolNode**: executes pending calls via `call_tool()`
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool`; a second tool with the same name is rejected.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self, ToolSourceError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolSourceError::Duplicate(name));
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| t.spec())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Checks `args` against the `required` list of `schema`.
///
/// Arguments must be a JSON object when the schema declares `"type": "object"`;
/// every required property must be present and not null.
pub fn validate_arguments(spec: &ToolSpec, args: &Value) -> Result<(), ToolSourceError> {
    let expects_object = spec
        .input_schema
        .get("type")
        .and_then(Value::as_str)
        .map_or(false, |t| t == "object");
    let obj = match args.as_object() {
        Some(o) => o,
        None if expects_object => {
            return Err(ToolSourceError::InvalidInput(format!(
                "{}: arguments must be an object",
                spec.name
            )))
        }
        None => return Ok(()),
    };
    let required = spec
        .input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let missing: Vec<&str> = required
        .iter()
        .filter_map(Value::as_str)
        .filter(|k| obj.get(*k).map_or(true, Value::is_null))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToolSourceError::InvalidInput(format!(
            "{}: missing required argument(s): {}",
            spec.name,
            missing.join(", ")
        )))
    }
}

#[async_trait]
impl ToolSource for ToolRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.specs())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolSourceError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))?;
        validate_arguments(&tool.spec(), &arguments)?;
        tracing::debug!(tool = name, "calling tool");
        tool.call(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.0.to_string(),
                description: None,
                input_schema: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                }),
            }
        }
        async fn call(&self, args: Value) -> Result<ToolOutput, ToolSourceError> {
            Ok(ToolOutput::text(args["query"].as_str().unwrap_or_default()))
        }
    }

    /// **Scenario**: A second tool with the same name is rejected.
    #[test]
    fn register_rejects_duplicates() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(Echo("search"))).unwrap();
        let err = reg.register(Arc::new(Echo("search"))).err().unwrap();
        assert!(matches!(err, ToolSourceError::Duplicate(n) if n == "search"));
        assert_eq!(reg.len(), 1);
    }

    /// **Scenario**: list_tools keeps registration order.
    #[tokio::test]
    async fn list_tools_in_registration_order() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(Echo("b"))).unwrap();
        reg.register(Arc::new(Echo("a"))).unwrap();
        let names: Vec<String> = reg.list_tools().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn call_tool_runs_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(Echo("search"))).unwrap();
        let out = reg.call_tool("search", json!({"query": "sofa"})).await.unwrap();
        assert_eq!(out.content(), "sofa");
    }

    #[tokio::test]
    async fn call_unknown_tool_is_not_found() {
        let reg = ToolRegistry::new();
        assert!(matches!(
            reg.call_tool("nope", json!({})).await,
            Err(ToolSourceError::NotFound(_))
        ));
    }

    /// **Scenario**: Missing or null required arguments are rejected before the tool runs.
    #[tokio::test]
    async fn call_tool_validates_required_arguments() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(Echo("search"))).unwrap();
        let err = reg.call_tool("search", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("query"));
        let err = reg.call_tool("search", json!({"query": null})).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::InvalidInput(_)));
        let err = reg.call_tool("search", json!("sofa")).await.unwrap_err();
        assert!(err.to_string().contains("object"));
    }
}
