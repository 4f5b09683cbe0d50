//! Persistence for suspended conversations.
//!
//! A run suspended at the human-input node is saved as a [`Checkpoint`] keyed by
//! `(thread_id, checkpoint_ns)` from [`RunnableConfig`]. [`MemorySaver`] keeps it
//! in process; [`FileSaver`] writes one JSON file per thread so a CLI session can
//! be resumed after restart.

mod checkpoint;
mod checkpointer;
mod config;
mod file_saver;
mod memory_saver;

pub use checkpoint::Checkpoint;
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use file_saver::FileSaver;
pub use memory_saver::MemorySaver;
