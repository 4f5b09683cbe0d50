//! Library side of the `switchyard` binary: building the sample graphs from
//! settings, the terminal chat loop and the `ingest` / `tool` subcommands.
//!
//! Kept separate from `main.rs` so the pieces can be driven from tests with
//! in-memory input and output.

mod chat;
mod ingest_cmd;
mod tool_cmd;

pub use chat::{build_graph, make_llm, run_chat, Flow, MOCK_REPLY};
pub use ingest_cmd::{format_report, run_ingest, IngestRequest};
pub use tool_cmd::{all_tools, format_tool_show, format_tools_list, ToolShowFormat};

use thiserror::Error;

/// Errors surfaced by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("config: {0}")]
    Config(#[from] config::LoadError),
    #[error("assets: {0}")]
    Asset(#[from] switchyard::tools::AssetError),
    #[error("{0}")]
    Agent(#[from] switchyard::AgentError),
    #[error("graph: {0}")]
    Compile(#[from] switchyard::CompilationError),
    #[error("ingest: {0}")]
    Ingest(#[from] switchyard::IngestError),
    #[error("tool: {0}")]
    Tool(#[from] switchyard::ToolSourceError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
