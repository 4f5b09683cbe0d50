//! Ingestion pipeline: incoming blobs → markdown → vector index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::{
    BlobRef, BlobStore, Chunker, ConvertedDocument, DocumentConverter, IndexedDocument,
    IngestError, VectorIndex,
};

pub const DEFAULT_DOCUMENT_CONTAINER: &str = "documents";
pub const DEFAULT_PROCESSED_CONTAINER: &str = "processed-documents";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
/// Name of the markdown file written per converted document.
pub const RESULT_FILE: &str = "result.md";

#[derive(Clone, Debug)]
pub struct IngestOptions {
    pub document_container: String,
    pub processed_container: String,
    pub output_dir: PathBuf,
    /// Index chunks instead of whole documents.
    pub chunker: Option<Chunker>,
    /// Upload `output/<stem>/` to the processed container after indexing.
    pub upload_results: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            document_container: DEFAULT_DOCUMENT_CONTAINER.to_string(),
            processed_container: DEFAULT_PROCESSED_CONTAINER.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            chunker: None,
            upload_results: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestFailure {
    pub blob: String,
    pub reason: String,
}

/// What one `run` did, by blob name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub converted: Vec<String>,
    pub failed: Vec<IngestFailure>,
    /// Blobs that were locked by another run.
    pub skipped: Vec<String>,
}

enum Stage {
    /// The blob is still in the incoming container under our lease.
    Leased,
    /// The blob has been moved; the lease is gone with it.
    Moved,
}

pub struct IngestionPipeline {
    store: Arc<dyn BlobStore>,
    converter: Arc<dyn DocumentConverter>,
    index: Arc<dyn VectorIndex>,
    options: IngestOptions,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn BlobStore>,
        converter: Arc<dyn DocumentConverter>,
        index: Arc<dyn VectorIndex>,
        options: IngestOptions,
    ) -> Self {
        Self {
            store,
            converter,
            index,
            options,
        }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Processes every blob of the document container once.
    ///
    /// A blob that fails is reported and left behind unlocked (when it had not
    /// been moved yet); the run continues with the next blob.
    pub async fn run(&self) -> Result<IngestReport, IngestError> {
        tokio::fs::create_dir_all(&self.options.output_dir)
            .await
            .map_err(|e| IngestError::io(&self.options.output_dir, e))?;
        self.store
            .create_container(&self.options.document_container)
            .await?;
        let blobs = self.store.list(&self.options.document_container).await?;
        info!(count = blobs.len(), container = %self.options.document_container, "ingestion started");

        let mut report = IngestReport::default();
        for blob in blobs {
            if self.store.is_locked(&blob).await? {
                info!(blob = %blob, "blob locked, skipping");
                report.skipped.push(blob.name.clone());
                continue;
            }
            let lease = match self.store.acquire_lease(&blob).await {
                Ok(l) => l,
                Err(IngestError::LeaseConflict { .. }) => {
                    report.skipped.push(blob.name.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut stage = Stage::Leased;
            match self.process(&blob, &lease, &mut stage).await {
                Ok(()) => {
                    info!(blob = %blob, "document ingested");
                    report.converted.push(blob.name.clone());
                }
                Err(err) => {
                    warn!(blob = %blob, error = %err, "failed to ingest document");
                    if let Stage::Leased = stage {
                        if let Err(e) = self.store.release_lease(&blob, &lease).await {
                            warn!(blob = %blob, error = %e, "failed to release lease");
                        }
                    }
                    report.failed.push(IngestFailure {
                        blob: blob.name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        info!(
            converted = report.converted.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "ingestion finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        blob: &BlobRef,
        lease: &str,
        stage: &mut Stage,
    ) -> Result<(), IngestError> {
        let local = self.options.output_dir.join(&blob.name);
        self.store.download(blob, &local).await?;

        let converted = match self.convert(&local).await {
            Ok(doc) => doc,
            Err(e) => {
                remove_quietly(&local).await;
                return Err(e);
            }
        };

        let stored = self.store_result(&converted).await;
        remove_quietly(&local).await;
        let result_dir = stored?;

        let url = self
            .store
            .move_blob(blob, lease, &self.options.processed_container)
            .await?;
        *stage = Stage::Moved;

        let chunk_metadata = HashMap::from([
            ("converted".to_string(), "true".to_string()),
            ("original_file".to_string(), url.clone()),
        ]);
        let documents = match &self.options.chunker {
            Some(chunker) => chunker
                .chunk(&converted.markdown)
                .into_iter()
                .map(|content| IndexedDocument {
                    id: new_id(),
                    content,
                    metadata: chunk_metadata.clone(),
                })
                .collect(),
            None => vec![IndexedDocument {
                id: new_id(),
                content: converted.markdown.clone(),
                metadata: HashMap::from([("file_url".to_string(), url.clone())]),
            }],
        };
        self.index.add_documents(documents).await?;

        if self.options.upload_results {
            self.upload_dir(&result_dir, &converted.stem(), &chunk_metadata)
                .await?;
        }
        Ok(())
    }

    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, IngestError> {
        let converter = self.converter.clone();
        let path = path.to_path_buf();
        let doc = tokio::task::spawn_blocking(move || converter.convert(&path))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;
        Ok(doc)
    }

    /// Writes `output/<stem>/result.md` and returns the directory.
    async fn store_result(&self, doc: &ConvertedDocument) -> Result<PathBuf, IngestError> {
        let dir = self.options.output_dir.join(doc.stem());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| IngestError::io(&dir, e))?;
        let file = dir.join(RESULT_FILE);
        tokio::fs::write(&file, doc.markdown.as_bytes())
            .await
            .map_err(|e| IngestError::io(&file, e))?;
        Ok(dir)
    }

    async fn upload_dir(
        &self,
        dir: &Path,
        remote: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), IngestError> {
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current)
                .await
                .map_err(|e| IngestError::io(&current, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| IngestError::io(&current, e))?
            {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(dir) else {
                    continue;
                };
                let rel = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| IngestError::io(&path, e))?;
                self.store
                    .upload(
                        &self.options.processed_container,
                        &format!("{}/{}", remote, rel),
                        bytes,
                        metadata,
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove local copy");
        }
    }
}
