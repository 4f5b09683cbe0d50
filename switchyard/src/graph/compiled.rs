//! Compiled graph: a finite-state-machine driver over registered nodes.
//!
//! The driver moves between four phases: `Ready` (tasks waiting in the frontier),
//! `Running` (one node executing), `Suspended` (a node raised an interrupt) and
//! `Done` (frontier empty). Tasks run one at a time, in the order they were scheduled.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointError, Checkpointer, RunnableConfig};
use crate::state::ConversationState;

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_resume, log_graph_start, log_graph_suspended,
    log_node_complete, log_node_start,
};
use super::registry::{END, START};
use super::{Goto, Interrupt, Node, RunContext, Trigger};

/// Default per-run step limit (same as LangGraph's recursion limit).
pub const DEFAULT_MAX_STEPS: u32 = 25;

/// Limits checked while driving a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphLimits {
    /// Node executions allowed per `invoke` / `resume` call.
    pub max_steps: u32,
    /// Maximum conversation length; `None` for unlimited.
    pub max_messages: Option<usize>,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_messages: None,
        }
    }
}

/// A scheduled node run and every route that requested it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub node: String,
    pub triggers: Vec<Trigger>,
}

/// Everything needed to continue a run that a node suspended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suspension {
    pub state: ConversationState,
    /// Node that raised the interrupt; it runs first on resume.
    pub node: String,
    pub triggers: Vec<Trigger>,
    /// Tasks that were still queued behind the suspended node.
    pub frontier: Vec<Task>,
    pub interrupt: Interrupt,
}

/// Result of driving a graph until it finishes or suspends.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Completed(ConversationState),
    Suspended(Suspension),
}

impl RunOutcome {
    pub fn state(&self) -> &ConversationState {
        match self {
            RunOutcome::Completed(s) => s,
            RunOutcome::Suspended(s) => &s.state,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, RunOutcome::Suspended(_))
    }
}

enum Phase {
    Ready(VecDeque<Task>),
    Running(Task, VecDeque<Task>),
    Suspended(Suspension),
    Done,
}

/// Executable graph produced by `AgentRegistry::compile`.
///
/// **Interaction**: `invoke` starts at the entry node; `resume` / `resume_thread`
/// continue a suspended run with external input.
pub struct CompiledGraph {
    pub(super) nodes: HashMap<String, Arc<dyn Node>>,
    pub(super) successors: HashMap<String, Vec<String>>,
    pub(super) static_edges: HashMap<String, String>,
    pub(super) entry: String,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer>>,
    pub(super) limits: GraphLimits,
}

impl CompiledGraph {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn limits(&self) -> &GraphLimits {
        &self.limits
    }

    /// Registered node names, sorted.
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn destinations(&self, name: &str) -> Option<&[String]> {
        self.successors.get(name).map(Vec::as_slice)
    }

    /// Runs from the entry node until the frontier is empty or a node suspends.
    pub async fn invoke(
        &self,
        state: ConversationState,
        config: Option<RunnableConfig>,
    ) -> Result<RunOutcome, AgentError> {
        let config = config.unwrap_or_default();
        log_graph_start(&self.entry);
        let frontier = VecDeque::from(vec![Task {
            node: self.entry.clone(),
            triggers: vec![Trigger::new(START, self.entry.clone())],
        }]);
        self.drive(state, frontier, None, &config).await
    }

    /// Continues `suspension`: the suspended node runs again with `input` as
    /// `RunContext::resume`, then the queued frontier.
    pub async fn resume(
        &self,
        suspension: Suspension,
        input: impl Into<String>,
        config: Option<RunnableConfig>,
    ) -> Result<RunOutcome, AgentError> {
        let config = config.unwrap_or_default();
        let Suspension {
            state,
            node,
            triggers,
            frontier,
            ..
        } = suspension;
        log_graph_resume(&node);
        let mut queue = VecDeque::with_capacity(frontier.len() + 1);
        queue.push_back(Task { node, triggers });
        queue.extend(frontier);
        self.drive(state, queue, Some(input.into()), &config).await
    }

    /// Loads the suspension saved for `config.thread_id` and resumes it.
    pub async fn resume_thread(
        &self,
        input: impl Into<String>,
        config: RunnableConfig,
    ) -> Result<RunOutcome, AgentError> {
        let suspension = self.pending(&config).await?.ok_or_else(|| {
            CheckpointError::NotFound(config.thread_id.clone().unwrap_or_default())
        })?;
        self.resume(suspension, input, Some(config)).await
    }

    /// The suspension saved for `config.thread_id`, if any.
    pub async fn pending(&self, config: &RunnableConfig) -> Result<Option<Suspension>, AgentError> {
        let Some(cp) = self.checkpointer.as_ref() else {
            return Ok(None);
        };
        if config.thread_id.is_none() {
            return Err(CheckpointError::ThreadIdRequired.into());
        }
        Ok(cp.get(config).await?.map(|c| c.suspension))
    }

    async fn drive(
        &self,
        mut state: ConversationState,
        frontier: VecDeque<Task>,
        mut resume: Option<String>,
        config: &RunnableConfig,
    ) -> Result<RunOutcome, AgentError> {
        let mut steps: u32 = 0;
        let mut phase = Phase::Ready(frontier);
        loop {
            phase = match phase {
                Phase::Ready(mut frontier) => match frontier.pop_front() {
                    Some(task) => Phase::Running(task, frontier),
                    None => Phase::Done,
                },
                Phase::Running(task, mut frontier) => {
                    if steps >= self.limits.max_steps {
                        let err = AgentError::LimitExceeded(format!(
                            "max_steps {} reached before running {}",
                            self.limits.max_steps, task.node
                        ));
                        log_graph_error(&err);
                        return Err(err);
                    }
                    let node = self
                        .nodes
                        .get(&task.node)
                        .ok_or_else(|| AgentError::UnknownNode(task.node.clone()))?;
                    let mut ctx = RunContext::new(config.clone()).with_triggers(task.triggers.clone());
                    ctx.resume = resume.take();

                    log_node_start(&task.node, &task.triggers);
                    match node.run(&state, &ctx).await {
                        Ok(command) => {
                            steps += 1;
                            let appended = command.update.messages.len();
                            state.apply(command.update);
                            state.record_step();
                            log_node_complete(&task.node, &command.goto, appended);
                            if let Some(max) = self.limits.max_messages {
                                if state.len() > max {
                                    let err = AgentError::LimitExceeded(format!(
                                        "max_messages {} exceeded ({})",
                                        max,
                                        state.len()
                                    ));
                                    log_graph_error(&err);
                                    return Err(err);
                                }
                            }
                            let targets = match self.resolve(&task.node, &command.goto) {
                                Ok(t) => t,
                                Err(err) => {
                                    log_graph_error(&err);
                                    return Err(err);
                                }
                            };
                            schedule(&mut frontier, &task.node, targets);
                            Phase::Ready(frontier)
                        }
                        Err(AgentError::Interrupted(interrupt)) => Phase::Suspended(Suspension {
                            state: std::mem::take(&mut state),
                            node: task.node,
                            triggers: task.triggers,
                            frontier: frontier.into_iter().collect(),
                            interrupt: interrupt.0,
                        }),
                        Err(err) => {
                            log_graph_error(&err);
                            return Err(err);
                        }
                    }
                }
                Phase::Suspended(suspension) => {
                    log_graph_suspended(&suspension.node);
                    if let (Some(cp), Some(_)) = (&self.checkpointer, &config.thread_id) {
                        cp.put(config, &Checkpoint::new(suspension.clone())).await?;
                    }
                    return Ok(RunOutcome::Suspended(suspension));
                }
                Phase::Done => {
                    log_graph_complete(state.step());
                    if let (Some(cp), Some(_)) = (&self.checkpointer, &config.thread_id) {
                        cp.delete(config).await?;
                    }
                    return Ok(RunOutcome::Completed(state));
                }
            };
        }
    }

    /// Node names to schedule after `from` returned `goto`.
    ///
    /// `End` follows the static edge of `from` when it has one. Explicit targets must be
    /// registered (`UnknownNode`) and declared by `from` (`UndeclaredRoute`).
    fn resolve(&self, from: &str, goto: &Goto) -> Result<Vec<String>, AgentError> {
        let static_edge = self.static_edges.get(from);
        if goto.is_end() {
            return Ok(static_edge
                .filter(|to| to.as_str() != END)
                .map(|to| vec![to.clone()])
                .unwrap_or_default());
        }
        let declared = self.successors.get(from);
        let mut out = Vec::new();
        for target in goto.targets() {
            if target == END {
                continue;
            }
            if !self.nodes.contains_key(target) {
                return Err(AgentError::UnknownNode(target.to_string()));
            }
            let allowed = declared.map_or(false, |d| d.iter().any(|s| s == target))
                || static_edge.map_or(false, |e| e == target);
            if !allowed {
                return Err(AgentError::UndeclaredRoute {
                    from: from.to_string(),
                    to: target.to_string(),
                });
            }
            out.push(target.to_string());
        }
        Ok(out)
    }
}

/// Queues `targets`; a target already waiting in the frontier gains a trigger instead.
fn schedule(frontier: &mut VecDeque<Task>, from: &str, targets: Vec<String>) {
    for target in targets {
        let trigger = Trigger::new(from, target.clone());
        match frontier.iter_mut().find(|t| t.node == target) {
            Some(task) => {
                if !task.triggers.contains(&trigger) {
                    task.triggers.push(trigger);
                }
            }
            None => frontier.push_back(Task {
                node: target,
                triggers: vec![trigger],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::graph::{AgentRegistry, Command, GraphInterrupt};
    use crate::memory::MemorySaver;
    use crate::message::Message;

    /// Appends its name and routes to a fixed goto; records the triggers it saw.
    struct Scripted {
        name: &'static str,
        goto: Goto,
        seen: Arc<Mutex<Vec<Vec<Trigger>>>>,
    }

    impl Scripted {
        fn new(name: &'static str, goto: Goto) -> Self {
            Self {
                name,
                goto,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Node for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        async fn run(
            &self,
            _state: &ConversationState,
            ctx: &RunContext,
        ) -> Result<Command, AgentError> {
            self.seen.lock().unwrap().push(ctx.triggers.clone());
            Ok(Command::new(
                vec![Message::assistant(self.name)],
                self.goto.clone(),
            ))
        }
    }

    /// Suspends until resumed, then appends the input and ends.
    struct Gate;

    #[async_trait]
    impl Node for Gate {
        fn name(&self) -> &str {
            "gate"
        }
        async fn run(
            &self,
            _state: &ConversationState,
            ctx: &RunContext,
        ) -> Result<Command, AgentError> {
            match &ctx.resume {
                None => Err(GraphInterrupt(Interrupt::new(serde_json::json!("waiting"))).into()),
                Some(input) => Ok(Command::new(vec![Message::user(input.clone())], Goto::End)),
            }
        }
    }

    fn contents(state: &ConversationState) -> Vec<&str> {
        state.messages().iter().map(Message::content).collect()
    }

    /// **Scenario**: Node routes are followed until END; step counts executed nodes.
    #[tokio::test]
    async fn invoke_follows_node_routes() {
        let mut reg = AgentRegistry::new();
        reg.register(Arc::new(Scripted::new("a", Goto::node("b"))), ["b"])
            .unwrap();
        reg.register(Arc::new(Scripted::new("b", Goto::End)), [END])
            .unwrap();
        reg.set_entry("a");
        let graph = reg.compile().unwrap();

        let out = graph
            .invoke(ConversationState::from_user("go"), None)
            .await
            .unwrap();
        assert!(!out.is_suspended());
        assert_eq!(contents(out.state()), vec!["go", "a", "b"]);
        assert_eq!(out.state().step(), 2);
    }

    /// **Scenario**: A fan-out runs every target sequentially in order.
    #[tokio::test]
    async fn fan_runs_targets_in_order() {
        let mut reg = AgentRegistry::new();
        reg.register(
            Arc::new(Scripted::new("a", Goto::Fan(vec!["b".into(), "c".into()]))),
            ["b", "c"],
        )
        .unwrap();
        reg.register(Arc::new(Scripted::new("b", Goto::End)), [END])
            .unwrap();
        reg.register(Arc::new(Scripted::new("c", Goto::End)), [END])
            .unwrap();
        reg.set_entry("a");
        let out = reg
            .compile()
            .unwrap()
            .invoke(ConversationState::default(), None)
            .await
            .unwrap();
        assert_eq!(contents(out.state()), vec!["a", "b", "c"]);
    }

    /// **Scenario**: Two branches routing to the same pending node merge into one run
    /// with both triggers.
    #[tokio::test]
    async fn converging_branches_merge_triggers() {
        let join = Arc::new(Scripted::new("join", Goto::End));
        let seen = join.seen.clone();
        let mut reg = AgentRegistry::new();
        reg.register(
            Arc::new(Scripted::new("a", Goto::Fan(vec!["b".into(), "c".into()]))),
            ["b", "c"],
        )
        .unwrap();
        reg.register(Arc::new(Scripted::new("b", Goto::node("join"))), ["join"])
            .unwrap();
        reg.register(Arc::new(Scripted::new("c", Goto::node("join"))), ["join"])
            .unwrap();
        reg.register(join, [END]).unwrap();
        reg.set_entry("a");
        let out = reg
            .compile()
            .unwrap()
            .invoke(ConversationState::default(), None)
            .await
            .unwrap();
        assert_eq!(contents(out.state()), vec!["a", "b", "c", "join"]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            vec![Trigger::new("b", "join"), Trigger::new("c", "join")]
        );
    }

    /// **Scenario**: The entry node is triggered by START.
    #[tokio::test]
    async fn entry_is_triggered_by_start() {
        let a = Arc::new(Scripted::new("a", Goto::End));
        let seen = a.seen.clone();
        let mut reg = AgentRegistry::new();
        reg.register(a, [END]).unwrap();
        reg.set_entry("a");
        reg.compile()
            .unwrap()
            .invoke(ConversationState::default(), None)
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap()[0], vec![Trigger::new(START, "a")]);
    }

    /// **Scenario**: Routing to a registered node that was not declared fails.
    #[tokio::test]
    async fn undeclared_route_fails() {
        let mut reg = AgentRegistry::new();
        reg.register(Arc::new(Scripted::new("a", Goto::node("b"))), [END])
            .unwrap();
        reg.register(Arc::new(Scripted::new("b", Goto::End)), [END])
            .unwrap();
        reg.set_entry("a");
        let err = reg
            .compile()
            .unwrap()
            .invoke(ConversationState::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UndeclaredRoute { ref from, ref to } if from == "a" && to == "b"));
    }

    /// **Scenario**: Routing to an unregistered name fails with UnknownNode.
    #[tokio::test]
    async fn unknown_route_fails() {
        let mut reg = AgentRegistry::new();
        reg.register(Arc::new(Scripted::new("a", Goto::node("ghost"))), [END])
            .unwrap();
        reg.set_entry("a");
        let err = reg
            .compile()
            .unwrap()
            .invoke(ConversationState::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownNode(ref n) if n == "ghost"));
    }

    /// **Scenario**: END from a node with a static edge follows the edge.
    #[tokio::test]
    async fn end_follows_static_edge() {
        let mut reg = AgentRegistry::new();
        reg.register(Arc::new(Scripted::new("tools", Goto::End)), Vec::<String>::new())
            .unwrap();
        reg.register(Arc::new(Scripted::new("agent", Goto::End)), [END])
            .unwrap();
        reg.set_entry("tools");
        reg.add_edge("tools", "agent");
        let out = reg
            .compile()
            .unwrap()
            .invoke(ConversationState::default(), None)
            .await
            .unwrap();
        assert_eq!(contents(out.state()), vec!["tools", "agent"]);
    }

    /// **Scenario**: A self-loop stops with LimitExceeded after max_steps.
    #[tokio::test]
    async fn max_steps_limits_loops() {
        let mut reg = AgentRegistry::new().with_limits(GraphLimits {
            max_steps: 3,
            max_messages: None,
        });
        reg.register(Arc::new(Scripted::new("a", Goto::node("a"))), ["a"])
            .unwrap();
        reg.set_entry("a");
        let err = reg
            .compile()
            .unwrap()
            .invoke(ConversationState::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::LimitExceeded(_)));
    }

    #[tokio::test]
    async fn max_messages_limits_conversation_length() {
        let mut reg = AgentRegistry::new().with_limits(GraphLimits {
            max_steps: 100,
            max_messages: Some(2),
        });
        reg.register(Arc::new(Scripted::new("a", Goto::node("a"))), ["a"])
            .unwrap();
        reg.set_entry("a");
        let err = reg
            .compile()
            .unwrap()
            .invoke(ConversationState::from_user("x"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("max_messages"));
    }

    /// **Scenario**: An interrupt suspends the run; resume re-runs the node with the input
    /// and then drains the remaining frontier.
    #[tokio::test]
    async fn interrupt_suspends_and_resume_continues() {
        let mut reg = AgentRegistry::new();
        reg.register(
            Arc::new(Scripted::new("a", Goto::Fan(vec!["gate".into(), "b".into()]))),
            ["gate", "b"],
        )
        .unwrap();
        reg.register(Arc::new(Gate), [END]).unwrap();
        reg.register(Arc::new(Scripted::new("b", Goto::End)), [END])
            .unwrap();
        reg.set_entry("a");
        let graph = reg.compile().unwrap();

        let out = graph
            .invoke(ConversationState::default(), None)
            .await
            .unwrap();
        let suspension = match out {
            RunOutcome::Suspended(s) => s,
            other => panic!("expected suspension, got {:?}", other),
        };
        assert_eq!(suspension.node, "gate");
        assert_eq!(suspension.interrupt.prompt(), "waiting");
        assert_eq!(suspension.frontier.len(), 1);
        assert_eq!(contents(&suspension.state), vec!["a"]);

        let out = graph.resume(suspension, "hello", None).await.unwrap();
        assert_eq!(contents(out.state()), vec!["a", "hello", "b"]);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// **Scenario**: A resumed run logs its resume before it logs completion.
    #[tokio::test]
    async fn resume_is_logged_before_completion() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut reg = AgentRegistry::new();
        reg.register(Arc::new(Gate), [END]).unwrap();
        reg.set_entry("gate");
        let graph = reg.compile().unwrap();
        let RunOutcome::Suspended(suspension) = graph
            .invoke(ConversationState::default(), None)
            .await
            .unwrap()
        else {
            panic!("expected suspension");
        };
        graph.resume(suspension, "hi", None).await.unwrap();

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let resumed = logs.find("Resuming graph execution").expect("resume logged");
        let completed = logs.find("Graph execution complete").expect("completion logged");
        assert!(resumed < completed);
    }

    /// **Scenario**: With a checkpointer and thread_id the suspension is saved, resumed by
    /// thread, and removed once the run completes.
    #[tokio::test]
    async fn checkpointer_saves_and_resumes_by_thread() {
        let saver = Arc::new(MemorySaver::new());
        let mut reg = AgentRegistry::new().with_checkpointer(saver.clone());
        reg.register(Arc::new(Gate), [END]).unwrap();
        reg.set_entry("gate");
        let graph = reg.compile().unwrap();
        let config = RunnableConfig::default().with_thread_id("t-1");

        let out = graph
            .invoke(ConversationState::default(), Some(config.clone()))
            .await
            .unwrap();
        assert!(out.is_suspended());
        assert!(graph.pending(&config).await.unwrap().is_some());

        let out = graph.resume_thread("hi", config.clone()).await.unwrap();
        assert_eq!(contents(out.state()), vec!["hi"]);
        assert!(graph.pending(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resume_thread_without_saved_suspension_fails() {
        let mut reg = AgentRegistry::new().with_checkpointer(Arc::new(MemorySaver::new()));
        reg.register(Arc::new(Gate), [END]).unwrap();
        reg.set_entry("gate");
        let graph = reg.compile().unwrap();
        let err = graph
            .resume_thread("hi", RunnableConfig::default().with_thread_id("none"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Checkpoint(CheckpointError::NotFound(_))));
    }
}
