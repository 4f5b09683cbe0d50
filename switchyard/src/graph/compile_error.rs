//! Registry compilation error.
//!
//! Returned by `AgentRegistry::register` for duplicate or reserved names and by
//! `AgentRegistry::compile` when routes reference unknown nodes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompilationError {
    /// A node with this name is already registered.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// `__start__` and `__end__` cannot be used as node names.
    #[error("reserved node name: {0}")]
    ReservedName(String),

    /// No entry node was set, or the entry is not registered.
    #[error("graph has no registered entry node")]
    MissingEntry,

    /// A static edge starts at a node that is not registered.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A declared successor or edge target is neither registered nor `__end__`.
    #[error("node {node} declares unknown successor {successor}")]
    UnknownSuccessor { node: String, successor: String },

    /// The node's static edge target is not among its declared successors.
    #[error("node {node} has a static edge to {target} outside its declared successors")]
    EdgeConflict { node: String, target: String },

    /// More than one static edge leaves the same node.
    #[error("node has more than one static edge: {0}")]
    DuplicateEdge(String),
}
