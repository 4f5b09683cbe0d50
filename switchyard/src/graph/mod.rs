//! Agent-routing graph: registry, route types and the executor.
//!
//! Register nodes with their declared successors on an `AgentRegistry`, compile it,
//! then `invoke` the `CompiledGraph` with a conversation. Nodes pick their next
//! node(s) at runtime by returning a `Command` whose `Goto` names them.

mod compile_error;
mod compiled;
mod goto;
mod interrupt;
mod logging;
mod node;
mod registry;
mod run_context;

pub use compile_error::CompilationError;
pub use compiled::{CompiledGraph, GraphLimits, RunOutcome, Suspension, Task};
pub use goto::{Command, Goto};
pub use interrupt::{GraphInterrupt, Interrupt};
pub use logging::{
    log_graph_complete, log_graph_error, log_graph_resume, log_graph_start, log_graph_suspended,
    log_node_complete, log_node_start,
};
pub use node::Node;
pub use registry::{AgentRegistry, END, START};
pub use run_context::{RunContext, Trigger};
