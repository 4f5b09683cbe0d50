//! Agent registry: named nodes, their declared successors and static edges.
//!
//! A node's successors are the names it may route to dynamically. A static edge
//! (`add_edge`) is followed when the node returns `Goto::End`, which is how a tool
//! node hands control back to its agent. `compile` checks that every name resolves.

use std::collections::HashMap;
use std::sync::Arc;

use crate::memory::Checkpointer;

use super::compile_error::CompilationError;
use super::compiled::{CompiledGraph, GraphLimits};
use super::node::Node;

/// Entry marker: `add_edge(START, name)` is the same as `set_entry(name)`.
pub const START: &str = "__start__";

/// Terminal marker: routing here ends the branch.
pub const END: &str = "__end__";

/// Registry of named nodes and their outgoing routes.
///
/// **Interaction**: Accepts `Arc<dyn Node>`; produces `CompiledGraph`.
pub struct AgentRegistry {
    nodes: HashMap<String, Arc<dyn Node>>,
    /// Registration order, used for deterministic validation errors.
    order: Vec<String>,
    successors: HashMap<String, Vec<String>>,
    edges: Vec<(String, String)>,
    entry: Option<String>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    limits: GraphLimits,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            successors: HashMap::new(),
            edges: Vec::new(),
            entry: None,
            checkpointer: None,
            limits: GraphLimits::default(),
        }
    }

    /// Suspended runs are saved here when the run config carries a `thread_id`.
    pub fn with_checkpointer(self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            checkpointer: Some(checkpointer),
            ..self
        }
    }

    pub fn with_limits(self, limits: GraphLimits) -> Self {
        Self { limits, ..self }
    }

    /// Replaces only the step limit; other limits stay as configured.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.limits.max_steps = max_steps;
        self
    }

    pub fn limits(&self) -> &GraphLimits {
        &self.limits
    }

    /// Registers `node` under its own name with the names it may route to.
    ///
    /// Fails with `DuplicateNode` if the name is taken and `ReservedName` for
    /// `__start__` / `__end__`.
    pub fn register<I, T>(
        &mut self,
        node: Arc<dyn Node>,
        successors: I,
    ) -> Result<&mut Self, CompilationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let name = node.name().to_string();
        if name == START || name == END {
            return Err(CompilationError::ReservedName(name));
        }
        if self.nodes.contains_key(&name) {
            return Err(CompilationError::DuplicateNode(name));
        }
        let mut declared: Vec<String> = Vec::new();
        for s in successors {
            let s = s.into();
            if !declared.contains(&s) {
                declared.push(s);
            }
        }
        self.successors.insert(name.clone(), declared);
        self.order.push(name.clone());
        self.nodes.insert(name, node);
        Ok(self)
    }

    /// Adds a static edge. `add_edge(START, x)` sets the entry node.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        let from = from.into();
        let to = to.into();
        if from == START {
            self.entry = Some(to);
        } else {
            self.edges.push((from, to));
        }
        self
    }

    pub fn set_entry(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    /// Declared successors of `name`, or `None` if it is not registered.
    pub fn destinations(&self, name: &str) -> Option<&[String]> {
        self.successors.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_names(&self) -> &[String] {
        &self.order
    }

    /// Validates the registry and builds the executor.
    pub fn compile(self) -> Result<CompiledGraph, CompilationError> {
        let entry = match self.entry {
            Some(ref e) if self.nodes.contains_key(e) => e.clone(),
            _ => return Err(CompilationError::MissingEntry),
        };

        for name in &self.order {
            for s in &self.successors[name] {
                if s != END && !self.nodes.contains_key(s) {
                    return Err(CompilationError::UnknownSuccessor {
                        node: name.clone(),
                        successor: s.clone(),
                    });
                }
            }
        }

        let mut static_edges: HashMap<String, String> = HashMap::new();
        for (from, to) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::UnknownSuccessor {
                    node: from.clone(),
                    successor: to.clone(),
                });
            }
            if static_edges.insert(from.clone(), to.clone()).is_some() {
                return Err(CompilationError::DuplicateEdge(from.clone()));
            }
            let declared = &self.successors[from];
            if !declared.is_empty() && !declared.contains(to) {
                return Err(CompilationError::EdgeConflict {
                    node: from.clone(),
                    target: to.clone(),
                });
            }
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            successors: self.successors,
            static_edges,
            entry,
            checkpointer: self.checkpointer,
            limits: self.limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::error::AgentError;
    use crate::graph::{Command, RunContext};
    use crate::state::ConversationState;

    struct Named(&'static str);

    #[async_trait]
    impl Node for Named {
        fn name(&self) -> &str {
            self.0
        }
        async fn run(
            &self,
            _state: &ConversationState,
            _ctx: &RunContext,
        ) -> Result<Command, AgentError> {
            Ok(Command::end())
        }
    }

    fn node(name: &'static str) -> Arc<dyn Node> {
        Arc::new(Named(name))
    }

    /// **Scenario**: Registering the same name twice fails with DuplicateNode.
    #[test]
    fn register_rejects_duplicate_name() {
        let mut reg = AgentRegistry::new();
        reg.register(node("search_agent"), [END]).unwrap();
        let err = reg.register(node("search_agent"), [END]).err().unwrap();
        assert_eq!(err, CompilationError::DuplicateNode("search_agent".into()));
    }

    /// **Scenario**: START and END cannot be registered as nodes.
    #[test]
    fn register_rejects_reserved_names() {
        let mut reg = AgentRegistry::new();
        assert!(matches!(
            reg.register(node(END), Vec::<String>::new()),
            Err(CompilationError::ReservedName(_))
        ));
        assert!(matches!(
            reg.register(node(START), Vec::<String>::new()),
            Err(CompilationError::ReservedName(_))
        ));
    }

    /// **Scenario**: destinations returns successors deduplicated in declaration order.
    #[test]
    fn destinations_are_deduplicated() {
        let mut reg = AgentRegistry::new();
        reg.register(node("a"), ["b", END, "b"]).unwrap();
        assert_eq!(
            reg.destinations("a").unwrap(),
            &["b".to_string(), END.to_string()]
        );
        assert!(reg.destinations("zzz").is_none());
    }

    #[test]
    fn compile_fails_without_entry() {
        let mut reg = AgentRegistry::new();
        reg.register(node("a"), [END]).unwrap();
        assert!(matches!(reg.compile(), Err(CompilationError::MissingEntry)));
    }

    #[test]
    fn compile_fails_when_entry_unregistered() {
        let mut reg = AgentRegistry::new();
        reg.register(node("a"), [END]).unwrap();
        reg.add_edge(START, "ghost");
        assert!(matches!(reg.compile(), Err(CompilationError::MissingEntry)));
    }

    /// **Scenario**: A declared successor that is neither registered nor END fails compile.
    #[test]
    fn compile_fails_on_unknown_successor() {
        let mut reg = AgentRegistry::new();
        reg.register(node("a"), ["ghost"]).unwrap();
        reg.set_entry("a");
        match reg.compile() {
            Err(CompilationError::UnknownSuccessor { node, successor }) => {
                assert_eq!(node, "a");
                assert_eq!(successor, "ghost");
            }
            other => panic!("expected UnknownSuccessor, got {:?}", other.err()),
        }
    }

    /// **Scenario**: A static edge outside the declared successors is a conflict.
    #[test]
    fn compile_fails_on_edge_conflict() {
        let mut reg = AgentRegistry::new();
        reg.register(node("a"), ["b"]).unwrap();
        reg.register(node("b"), Vec::<String>::new()).unwrap();
        reg.register(node("c"), Vec::<String>::new()).unwrap();
        reg.set_entry("a");
        reg.add_edge("a", "c");
        assert!(matches!(
            reg.compile(),
            Err(CompilationError::EdgeConflict { .. })
        ));
    }

    #[test]
    fn compile_fails_on_second_static_edge() {
        let mut reg = AgentRegistry::new();
        reg.register(node("a"), Vec::<String>::new()).unwrap();
        reg.register(node("b"), Vec::<String>::new()).unwrap();
        reg.set_entry("a");
        reg.add_edge("a", "b");
        reg.add_edge("a", END);
        assert!(matches!(
            reg.compile(),
            Err(CompilationError::DuplicateEdge(_))
        ));
    }

    #[test]
    fn compile_fails_on_edge_from_unknown_node() {
        let mut reg = AgentRegistry::new();
        reg.register(node("a"), [END]).unwrap();
        reg.set_entry("a");
        reg.add_edge("ghost", "a");
        assert!(matches!(
            reg.compile(),
            Err(CompilationError::NodeNotFound(_))
        ));
    }

    #[test]
    fn with_max_steps_keeps_message_limit() {
        let registry = AgentRegistry::new()
            .with_limits(GraphLimits {
                max_steps: 5,
                max_messages: Some(50),
            })
            .with_max_steps(9);
        assert_eq!(registry.limits().max_steps, 9);
        assert_eq!(registry.limits().max_messages, Some(50));
    }

    #[test]
    fn compile_accepts_static_edge_among_successors() {
        let mut reg = AgentRegistry::new();
        reg.register(node("agent"), ["agent_tools", END]).unwrap();
        reg.register(node("agent_tools"), ["agent"]).unwrap();
        reg.add_edge(START, "agent");
        reg.add_edge("agent_tools", "agent");
        assert!(reg.compile().is_ok());
    }
}
