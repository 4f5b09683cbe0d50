//! Declarative description of one agent, consumed by `register_agent`.

use crate::router::Router;

/// Suffix of the tool node generated for an agent with tools.
pub const TOOL_NODE_SUFFIX: &str = "_tools";

/// What an agent is: its prompt, the tools it may call, where it may hand off
/// and how it reads the model's reply.
#[derive(Clone, Debug)]
pub struct AgentDefinition {
    pub name: String,
    pub prompt: String,
    /// Names of tools (from the shared tool source) bound to this agent.
    pub tools: Vec<String>,
    /// Nodes this agent may route to; `__end__` allowed.
    pub successors: Vec<String>,
    pub router: Router,
    /// Route back to this agent instead of ending when no tool was called.
    pub reiterate_after_run: bool,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            tools: Vec::new(),
            successors: Vec::new(),
            router: Router::default(),
            reiterate_after_run: false,
        }
    }

    pub fn with_tools<I, T>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_successors<I, T>(mut self, successors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.successors = successors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn reiterate_after_run(mut self, reiterate: bool) -> Self {
        self.reiterate_after_run = reiterate;
        self
    }

    /// `"{name}_tools"`.
    pub fn tool_node_name(&self) -> String {
        format!("{}{}", self.name, TOOL_NODE_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_tool_node_name() {
        let def = AgentDefinition::new("order_agent", "Place orders.")
            .with_tools(["place_order"])
            .with_successors(["human_input_agent", "__end__"])
            .reiterate_after_run(true);
        assert_eq!(def.tool_node_name(), "order_agent_tools");
        assert_eq!(def.tools, vec!["place_order"]);
        assert_eq!(def.successors.len(), 2);
        assert!(def.reiterate_after_run);
        assert_eq!(def.router, Router::default());
    }
}
