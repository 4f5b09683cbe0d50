//! # Switchyard
//!
//! Agents that decide at runtime where the conversation goes next, the tools they
//! call and a pipeline that turns incoming documents into a searchable index.
//!
//! ## Design principles
//!
//! - **One conversation state**: every node reads the [`ConversationState`] and returns
//!   a [`Command`]: messages to append plus the next node(s) as a [`Goto`].
//! - **Declared routes**: nodes are registered on an [`AgentRegistry`] with the names
//!   they may route to; a route outside that set fails the run instead of guessing.
//! - **Human in the loop**: [`HumanInputNode`] suspends the run; [`CompiledGraph::resume`]
//!   continues it with the user's reply and returns to whichever agent asked.
//!
//! ## Main modules
//!
//! - [`graph`]: [`AgentRegistry`], [`CompiledGraph`], [`Node`], [`Goto`], [`RunContext`].
//! - [`router`]: [`Router`] and [`parse_directive`] for `call: <agent>` replies.
//! - [`agent`]: [`AgentNode`], [`ToolNode`], [`HumanInputNode`], [`TransferTool`],
//!   [`register_agent`].
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], OpenAI-compatible [`ChatOpenAI`].
//! - [`tools`]: product catalog, order placement and email tools; [`ToolRegistry`].
//! - [`tool_source`]: [`ToolSource`], [`ToolSpec`], [`ToolOutput`].
//! - [`memory`]: checkpointing of suspended runs ([`Checkpointer`], [`MemorySaver`], [`FileSaver`]).
//! - [`ingest`]: blob leasing, document conversion, chunking and the [`IngestionPipeline`].
//! - [`samples`]: the product-order and email graphs.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchyard::samples::product_order_graph;
//! use switchyard::{ConversationState, MockLlm, OrderBook, ProductCatalog, RunOutcome};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = product_order_graph(
//!     Arc::new(MockLlm::with_no_tool_calls("We have sofas. call: human_input_agent")),
//!     Arc::new(ProductCatalog::load("assets/categories.json")?),
//!     Arc::new(OrderBook::new()),
//! )
//! .await?;
//! let outcome = graph
//!     .invoke(ConversationState::from_user("I need a sofa"), None)
//!     .await?;
//! if let RunOutcome::Suspended(suspension) = outcome {
//!     graph.resume(suspension, "the grey one", None).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod llm;
pub mod memory;
pub mod message;
pub mod router;
pub mod samples;
pub mod state;
pub mod tool_source;
pub mod tools;

pub use agent::{
    register_agent, register_human_input, AgentDefinition, AgentNode, HumanInputNode, ToolNode,
    TransferTool, HUMAN_INPUT_PROMPT,
};
pub use error::AgentError;
pub use graph::{
    AgentRegistry, Command, CompilationError, CompiledGraph, GraphLimits, Goto, Interrupt, Node,
    RunContext, RunOutcome, Suspension, Trigger, END, START,
};
pub use ingest::{
    BlobStore, IngestError, IngestOptions, IngestReport, IngestionPipeline, LocalBlobStore,
};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, MockLlm};
pub use memory::{Checkpointer, FileSaver, MemorySaver, RunnableConfig};
pub use message::{Message, ToolCall};
pub use router::{parse_directive, Directive, RouteError, Router};
pub use state::{ConversationState, StateDelta};
pub use tool_source::{ToolOutput, ToolResultDirection, ToolSource, ToolSourceError, ToolSpec};
pub use tools::{
    OrderBook, Outbox, ProductCatalog, TemplateLibrary, Tool, ToolRegistry, UserDirectory,
};
