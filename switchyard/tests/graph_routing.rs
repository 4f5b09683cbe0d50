//! Integration tests for runtime routing: fan-out, declared successors and directives.


use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use switchyard::llm::{LlmResponse, MockLlm};
use switchyard::{
    AgentError, AgentNode, AgentRegistry, Command, CompilationError, ConversationState, Goto,
    Message, Node, RouteError, RunContext, RunOutcome, END,
};

/// Appends one assistant message and routes to fixed targets.
struct Step {
    name: String,
    goto: Goto,
    seen: Arc<Mutex<Vec<(String, usize)>>>,
}

impl Step {
    fn new(name: &str, goto: Goto, seen: &Arc<Mutex<Vec<(String, usize)>>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            goto,
            seen: seen.clone(),
        })
    }
}

#[async_trait]
impl Node for Step {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        _state: &ConversationState,
        ctx: &RunContext,
    ) -> Result<Command, AgentError> {
        self.seen
            .lock()
            .unwrap()
            .push((self.name.clone(), ctx.triggers.len()));
        Ok(Command::new(
            vec![Message::assistant(format!("from {}", self.name))],
            self.goto.clone(),
        ))
    }
}

/// **Scenario**: A fan-out runs both targets in order, and a join node reached twice runs once with two triggers.
#[tokio::test]
async fn fan_out_then_join() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = AgentRegistry::new();
    registry
        .register(
            Step::new("split", Goto::from_names(["left", "right"]), &seen),
            ["left", "right"],
        )
        .unwrap();
    registry
        .register(Step::new("left", Goto::node("join"), &seen), ["join"])
        .unwrap();
    registry
        .register(Step::new("right", Goto::node("join"), &seen), ["join"])
        .unwrap();
    registry
        .register(Step::new("join", Goto::End, &seen), [END])
        .unwrap();
    registry.set_entry("split");
    let graph = registry.compile().unwrap();

    let outcome = graph
        .invoke(ConversationState::from_user("go"), None)
        .await
        .unwrap();
    let RunOutcome::Completed(state) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(state.len(), 5);
    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ("split".to_string(), 1),
            ("left".to_string(), 1),
            ("right".to_string(), 1),
            ("join".to_string(), 2),
        ]
    );
}

/// **Scenario**: Routing to a registered node that was not declared fails the run.
#[tokio::test]
async fn undeclared_successor_is_rejected() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = AgentRegistry::new();
    registry
        .register(Step::new("a", Goto::node("c"), &seen), ["b"])
        .unwrap();
    registry
        .register(Step::new("b", Goto::End, &seen), [END])
        .unwrap();
    registry
        .register(Step::new("c", Goto::End, &seen), [END])
        .unwrap();
    registry.set_entry("a");
    let err = registry
        .compile()
        .unwrap()
        .invoke(ConversationState::from_user("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::UndeclaredRoute { ref from, ref to } if from == "a" && to == "c"));
}

/// **Scenario**: Declaring a successor that is never registered fails compilation.
#[test]
fn unknown_successor_fails_compile() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = AgentRegistry::new();
    registry
        .register(Step::new("a", Goto::End, &seen), ["ghost"])
        .unwrap();
    registry.set_entry("a");
    assert!(matches!(
        registry.compile(),
        Err(CompilationError::UnknownSuccessor { .. })
    ));
}

/// **Scenario**: An agent reply naming a node that does not exist fails with UnknownNode.
#[tokio::test]
async fn directive_to_unregistered_agent() {
    let llm = Arc::new(MockLlm::with_no_tool_calls("Done. call: billing_agent"));
    let mut registry = AgentRegistry::new();
    registry
        .register(
            Arc::new(AgentNode::new("triage", "Route the user.", llm).with_successors(vec![END.to_string()])),
            [END],
        )
        .unwrap();
    registry.set_entry("triage");
    let err = registry
        .compile()
        .unwrap()
        .invoke(ConversationState::from_user("bill me"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::UnknownNode(ref n) if n == "billing_agent"));
}

/// **Scenario**: A malformed directive surfaces as a routing error, not a route.
#[tokio::test]
async fn malformed_directive_is_a_routing_error() {
    let llm = Arc::new(MockLlm::with_no_tool_calls("Next: call: <agent name>"));
    let mut registry = AgentRegistry::new();
    registry
        .register(Arc::new(AgentNode::new("triage", "Route the user.", llm)), [END])
        .unwrap();
    registry.set_entry("triage");
    let err = registry
        .compile()
        .unwrap()
        .invoke(ConversationState::from_user("hello"), None)
        .await
        .unwrap_err();
    match err {
        AgentError::Routing { node, source } => {
            assert_eq!(node, "triage");
            assert!(matches!(source, RouteError::Malformed(_)));
        }
        other => panic!("expected routing error, got {other:?}"),
    }
}

/// **Scenario**: A reply without any directive ends the run with the reply as last message.
#[tokio::test]
async fn missing_directive_ends() {
    let llm = Arc::new(MockLlm::scripted(vec![LlmResponse::text("All set.")]));
    let mut registry = AgentRegistry::new();
    registry
        .register(Arc::new(AgentNode::new("solo", "Answer.", llm)), [END])
        .unwrap();
    registry.set_entry("solo");
    let outcome = registry
        .compile()
        .unwrap()
        .invoke(ConversationState::from_user("hi"), None)
        .await
        .unwrap();
    assert_eq!(outcome.state().last_assistant_reply(), Some("All set."));
    assert!(!outcome.is_suspended());
}
