//! Blob storage: containers of named blobs with exclusive leases.
//!
//! [`LocalBlobStore`] maps containers to directories under a root. Leases live in
//! `<root>/.leases.json` so a blob leased by one run still reads as locked in the
//! next one.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::IngestError;

pub type LeaseId = String;

const LEASES_FILE: &str = ".leases.json";
const METADATA_FILE: &str = ".metadata.json";

/// A blob addressed by container and name. Names may contain `/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobRef {
    pub container: String,
    pub name: String,
}

impl BlobRef {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }

    fn key(&self) -> String {
        format!("{}/{}", self.container, self.name)
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// Storage the ingestion pipeline reads documents from and moves them into.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates the container if it does not exist.
    async fn create_container(&self, container: &str) -> Result<(), IngestError>;

    /// Blobs in `container`, sorted by name.
    async fn list(&self, container: &str) -> Result<Vec<BlobRef>, IngestError>;

    async fn download(&self, blob: &BlobRef, dest: &Path) -> Result<(), IngestError>;

    /// Takes an exclusive lease; fails with `LeaseConflict` if already leased.
    async fn acquire_lease(&self, blob: &BlobRef) -> Result<LeaseId, IngestError>;

    async fn release_lease(&self, blob: &BlobRef, lease: &str) -> Result<(), IngestError>;

    async fn is_locked(&self, blob: &BlobRef) -> Result<bool, IngestError>;

    /// Moves a leased blob to `target` (same name) and returns its new URL.
    async fn move_blob(
        &self,
        blob: &BlobRef,
        lease: &str,
        target: &str,
    ) -> Result<String, IngestError>;

    /// Writes `bytes` to `container/name`, replacing any existing blob; returns its URL.
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: Vec<u8>,
        metadata: &HashMap<String, String>,
    ) -> Result<String, IngestError>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LeaseRecord {
    lease_id: LeaseId,
    acquired_at: DateTime<Utc>,
}

/// Directory-backed [`BlobStore`].
pub struct LocalBlobStore {
    root: PathBuf,
    // serializes read-modify-write of the sidecar files
    sidecar: Mutex<()>,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sidecar: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, IngestError> {
        check_relative(container)?;
        Ok(self.root.join(container))
    }

    fn blob_path(&self, blob: &BlobRef) -> Result<PathBuf, IngestError> {
        check_relative(&blob.name)?;
        Ok(self.container_dir(&blob.container)?.join(&blob.name))
    }

    fn url(path: &Path) -> String {
        let abs = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        format!("file://{}", abs.display())
    }

    async fn read_json<T: Default + for<'de> Deserialize<'de>>(
        path: &Path,
    ) -> Result<T, IngestError> {
        match tokio::fs::read(path).await {
            Ok(body) => Ok(serde_json::from_slice(&body)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(IngestError::io(path, e)),
        }
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IngestError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IngestError::io(parent, e))?;
        }
        let body = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(path, body)
            .await
            .map_err(|e| IngestError::io(path, e))
    }

    async fn leases(&self) -> Result<BTreeMap<String, LeaseRecord>, IngestError> {
        Self::read_json(&self.root.join(LEASES_FILE)).await
    }

    async fn save_leases(&self, leases: &BTreeMap<String, LeaseRecord>) -> Result<(), IngestError> {
        Self::write_json(&self.root.join(LEASES_FILE), leases).await
    }

    async fn ensure_exists(&self, blob: &BlobRef) -> Result<PathBuf, IngestError> {
        let path = self.blob_path(blob)?;
        if tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
            Ok(path)
        } else {
            Err(IngestError::NotFound(blob.to_string()))
        }
    }

    /// Metadata stored with uploaded blobs of `container`.
    pub async fn metadata(
        &self,
        container: &str,
        name: &str,
    ) -> Result<Option<HashMap<String, String>>, IngestError> {
        let all: BTreeMap<String, HashMap<String, String>> =
            Self::read_json(&self.container_dir(container)?.join(METADATA_FILE)).await?;
        Ok(all.get(name).cloned())
    }
}

/// Rejects absolute paths and `..` so blobs stay under the root.
fn check_relative(name: &str) -> Result<(), IngestError> {
    let ok = !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(IngestError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn create_container(&self, container: &str) -> Result<(), IngestError> {
        let dir = self.container_dir(container)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| IngestError::io(&dir, e))
    }

    async fn list(&self, container: &str) -> Result<Vec<BlobRef>, IngestError> {
        let base = self.container_dir(container)?;
        let mut out = Vec::new();
        let mut pending = vec![base.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(IngestError::io(&dir, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| IngestError::io(&dir, e))?
            {
                let path = entry.path();
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                let kind = entry
                    .file_type()
                    .await
                    .map_err(|e| IngestError::io(&path, e))?;
                if kind.is_dir() {
                    pending.push(path);
                } else if let Ok(rel) = path.strip_prefix(&base) {
                    let name = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    out.push(BlobRef::new(container, name));
                }
            }
        }
        out.sort();
        Ok(out)
    }

    async fn download(&self, blob: &BlobRef, dest: &Path) -> Result<(), IngestError> {
        let src = self.ensure_exists(blob).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IngestError::io(parent, e))?;
        }
        tokio::fs::copy(&src, dest)
            .await
            .map_err(|e| IngestError::io(dest, e))?;
        Ok(())
    }

    async fn acquire_lease(&self, blob: &BlobRef) -> Result<LeaseId, IngestError> {
        self.ensure_exists(blob).await?;
        let _guard = self.sidecar.lock().await;
        let mut leases = self.leases().await?;
        if leases.contains_key(&blob.key()) {
            return Err(IngestError::LeaseConflict {
                blob: blob.to_string(),
            });
        }
        let lease_id = uuid::Uuid::new_v4().to_string();
        leases.insert(
            blob.key(),
            LeaseRecord {
                lease_id: lease_id.clone(),
                acquired_at: Utc::now(),
            },
        );
        self.save_leases(&leases).await?;
        tracing::debug!(blob = %blob, lease = %lease_id, "lease acquired");
        Ok(lease_id)
    }

    async fn release_lease(&self, blob: &BlobRef, lease: &str) -> Result<(), IngestError> {
        let _guard = self.sidecar.lock().await;
        let mut leases = self.leases().await?;
        match leases.get(&blob.key()) {
            Some(r) if r.lease_id == lease => {
                leases.remove(&blob.key());
                self.save_leases(&leases).await
            }
            Some(_) => Err(IngestError::LeaseMismatch {
                blob: blob.to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn is_locked(&self, blob: &BlobRef) -> Result<bool, IngestError> {
        let _guard = self.sidecar.lock().await;
        Ok(self.leases().await?.contains_key(&blob.key()))
    }

    async fn move_blob(
        &self,
        blob: &BlobRef,
        lease: &str,
        target: &str,
    ) -> Result<String, IngestError> {
        let src = self.ensure_exists(blob).await?;
        let _guard = self.sidecar.lock().await;
        let mut leases = self.leases().await?;
        if leases.get(&blob.key()).map(|r| r.lease_id.as_str()) != Some(lease) {
            return Err(IngestError::LeaseMismatch {
                blob: blob.to_string(),
            });
        }
        let dest = self.blob_path(&BlobRef::new(target, blob.name.clone()))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IngestError::io(parent, e))?;
        }
        if tokio::fs::rename(&src, &dest).await.is_err() {
            tokio::fs::copy(&src, &dest)
                .await
                .map_err(|e| IngestError::io(&dest, e))?;
            tokio::fs::remove_file(&src)
                .await
                .map_err(|e| IngestError::io(&src, e))?;
        }
        leases.remove(&blob.key());
        self.save_leases(&leases).await?;
        Ok(Self::url(&dest))
    }

    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: Vec<u8>,
        metadata: &HashMap<String, String>,
    ) -> Result<String, IngestError> {
        let dest = self.blob_path(&BlobRef::new(container, name))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IngestError::io(parent, e))?;
        }
        tokio::fs::write(&dest, bytes)
            .await
            .map_err(|e| IngestError::io(&dest, e))?;
        if !metadata.is_empty() {
            let _guard = self.sidecar.lock().await;
            let meta_path = self.container_dir(container)?.join(METADATA_FILE);
            let mut all: BTreeMap<String, HashMap<String, String>> =
                Self::read_json(&meta_path).await?;
            all.insert(name.to_string(), metadata.clone());
            Self::write_json(&meta_path, &all).await?;
        }
        Ok(Self::url(&dest))
    }
}
