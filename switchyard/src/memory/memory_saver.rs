//! In-memory checkpointer. Lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::checkpointer::thread_key;
use super::{Checkpoint, CheckpointError, Checkpointer, RunnableConfig};

#[derive(Default)]
pub struct MemorySaver {
    inner: RwLock<HashMap<(String, String), Checkpoint>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint,
    ) -> Result<String, CheckpointError> {
        let key = thread_key(config)?;
        self.inner.write().await.insert(key, checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint>, CheckpointError> {
        let key = thread_key(config)?;
        Ok(self.inner.read().await.get(&key).cloned())
    }

    async fn delete(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let key = thread_key(config)?;
        self.inner.write().await.remove(&key);
        Ok(())
    }
}
