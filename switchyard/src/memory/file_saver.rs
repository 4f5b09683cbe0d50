//! File-backed checkpointer: `<dir>/<namespace>/<thread_id>.json`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::checkpointer::thread_key;
use super::{Checkpoint, CheckpointError, Checkpointer, RunnableConfig};

/// Stores one JSON checkpoint file per thread. The empty namespace maps to `default`.
pub struct FileSaver {
    dir: PathBuf,
}

impl FileSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, config: &RunnableConfig) -> Result<PathBuf, CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        let ns = if ns.is_empty() { "default".to_string() } else { sanitize(&ns) };
        Ok(self.dir.join(ns).join(format!("{}.json", sanitize(&thread_id))))
    }
}

/// Keeps file names inside the checkpoint directory.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl Checkpointer for FileSaver {
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint,
    ) -> Result<String, CheckpointError> {
        let path = self.path_for(config)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        }
        let body = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        tracing::debug!(path = %path.display(), checkpoint_id = %checkpoint.id, "checkpoint saved");
        Ok(checkpoint.id.clone())
    }

    async fn get(&self, config: &RunnableConfig) -> Result<Option<Checkpoint>, CheckpointError> {
        let path = self.path_for(config)?;
        let body = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CheckpointError::Storage(e.to_string())),
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    async fn delete(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let path = self.path_for(config)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::Storage(e.to_string())),
        }
    }
}
