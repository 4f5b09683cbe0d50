//! `switchyard ingest`: one pass of the ingestion pipeline over the local blob store.

use std::sync::Arc;

use config::Settings;
use switchyard::ingest::{
    Chunker, CompositeConverter, Embedder, HashingEmbedder, InMemoryVectorIndex, IngestOptions,
    IngestReport, IngestionPipeline, LocalBlobStore, SearchHit, VectorIndex,
};

use crate::CliError;

/// Flags of the `ingest` subcommand; `false` falls back to the settings.
#[derive(Clone, Debug, Default)]
pub struct IngestRequest {
    pub chunking: bool,
    pub upload_results: bool,
    /// Use the hashing embedder even when an OpenAI endpoint is configured.
    pub local_embeddings: bool,
    /// Search the freshly built index after the run.
    pub query: Option<String>,
    pub top_k: usize,
}

fn embedder(settings: &Settings, local: bool) -> Arc<dyn Embedder> {
    let remote = settings.llm.api_key.is_some() || settings.llm.base_url.is_some();
    if local || !remote {
        tracing::info!("using local hashing embedder");
        return Arc::new(HashingEmbedder::default());
    }
    Arc::new(switchyard::ingest::OpenAIEmbedder::compatible(
        settings.llm.base_url.as_deref(),
        settings.llm.api_key.as_deref(),
        settings.llm.embedding_model.clone(),
    ))
}

/// Runs the pipeline and, when `request.query` is set, searches the result.
pub async fn run_ingest(
    settings: &Settings,
    request: &IngestRequest,
) -> Result<(IngestReport, Vec<SearchHit>), CliError> {
    let ingest = &settings.ingest;
    let chunking = request.chunking || ingest.chunking_enabled;
    let options = IngestOptions {
        document_container: ingest.document_container.clone(),
        processed_container: ingest.processed_container.clone(),
        output_dir: ingest.output_dir.clone(),
        chunker: chunking.then(|| Chunker::new(ingest.max_tokens)),
        upload_results: request.upload_results || ingest.upload_results,
    };
    let index = Arc::new(InMemoryVectorIndex::new(embedder(
        settings,
        request.local_embeddings,
    )));
    let pipeline = IngestionPipeline::new(
        Arc::new(LocalBlobStore::new(ingest.storage_root.clone())),
        Arc::new(CompositeConverter::default()),
        index.clone(),
        options,
    );
    let report = pipeline.run().await?;

    let hits = match request.query.as_deref() {
        Some(q) if !index.is_empty() => index.search(q, request.top_k.max(1)).await?,
        _ => Vec::new(),
    };
    Ok((report, hits))
}

/// Human-readable summary of a run.
pub fn format_report(report: &IngestReport, hits: &[SearchHit]) -> String {
    let mut out = format!(
        "converted: {}, failed: {}, skipped: {}\n",
        report.converted.len(),
        report.failed.len(),
        report.skipped.len()
    );
    for name in &report.converted {
        out.push_str(&format!("  ok      {}\n", name));
    }
    for failure in &report.failed {
        out.push_str(&format!("  failed  {}: {}\n", failure.blob, failure.reason));
    }
    for name in &report.skipped {
        out.push_str(&format!("  locked  {}\n", name));
    }
    if !hits.is_empty() {
        out.push_str("top matches:\n");
        for hit in hits {
            let preview: String = hit.document.content.chars().take(80).collect();
            out.push_str(&format!(
                "  {:.3}  {}\n",
                hit.score,
                preview.replace('\n', " ")
            ));
        }
    }
    out
}
