//! Checkpointer trait and CheckpointError.

use async_trait::async_trait;

use super::{Checkpoint, RunnableConfig};

/// Error type for checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Saves and loads the latest checkpoint per `(thread_id, checkpoint_ns)`.
///
/// A thread holds at most one checkpoint: `put` replaces the previous one.
///
/// **Interaction**: attached with `AgentRegistry::with_checkpointer`; the compiled
/// graph calls `put` on suspension and `delete` on completion.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persists `checkpoint` for the thread. Returns the checkpoint id.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint,
    ) -> Result<String, CheckpointError>;

    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Removes the thread's checkpoint; a missing checkpoint is not an error.
    async fn delete(&self, config: &RunnableConfig) -> Result<(), CheckpointError>;
}

pub(super) fn thread_key(config: &RunnableConfig) -> Result<(String, String), CheckpointError> {
    let thread_id = config
        .thread_id
        .clone()
        .ok_or(CheckpointError::ThreadIdRequired)?;
    Ok((thread_id, config.checkpoint_ns.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of each CheckpointError variant contains expected keywords.
    #[test]
    fn checkpoint_error_display_all_variants() {
        assert!(CheckpointError::ThreadIdRequired.to_string().contains("thread"));
        assert!(CheckpointError::Serialization("e".into())
            .to_string()
            .contains("serialization"));
        assert!(CheckpointError::Storage("io".into())
            .to_string()
            .contains("storage"));
        assert!(CheckpointError::NotFound("t".into())
            .to_string()
            .contains("not found"));
    }

    #[test]
    fn thread_key_requires_thread_id() {
        assert!(matches!(
            thread_key(&RunnableConfig::default()),
            Err(CheckpointError::ThreadIdRequired)
        ));
        let key = thread_key(&RunnableConfig::default().with_thread_id("t").with_checkpoint_ns("ns"))
            .unwrap();
        assert_eq!(key, ("t".to_string(), "ns".to_string()));
    }
}
