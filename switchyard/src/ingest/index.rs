//! Vector index over ingested documents.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{Embedder, IngestError};

/// A document (or chunk) as stored in the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub document: IndexedDocument,
    pub score: f32,
}

/// Stores documents and answers similarity queries.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Adds or replaces documents by id.
    async fn add_documents(&self, documents: Vec<IndexedDocument>) -> Result<(), IngestError>;

    /// Top `k` documents by similarity to `query`, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, IngestError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    document: IndexedDocument,
    vector: Vec<f32>,
}

/// In-memory index; cosine similarity over embedder vectors. Not persistent.
pub struct InMemoryVectorIndex {
    entries: DashMap<String, Entry>,
    embedder: Arc<dyn Embedder>,
}

impl InMemoryVectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            entries: DashMap::new(),
            embedder,
        }
    }

    pub fn get(&self, id: &str) -> Option<IndexedDocument> {
        self.entries.get(id).map(|e| e.document.clone())
    }

    /// Returns 0.0 if either vector has zero magnitude.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn add_documents(&self, documents: Vec<IndexedDocument>) -> Result<(), IngestError> {
        if documents.is_empty() {
            return Ok(());
        }
        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(IngestError::Embedding(format!(
                "expected {} vectors, got {}",
                documents.len(),
                vectors.len()
            )));
        }
        for (document, vector) in documents.into_iter().zip(vectors) {
            self.entries
                .insert(document.id.clone(), Entry { document, vector });
        }
        tracing::debug!(total = self.entries.len(), "documents indexed");
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, IngestError> {
        let query_vec = self
            .embedder
            .embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::Embedding("no vector returned".into()))?;
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|e| SearchHit {
                document: e.document.clone(),
                score: Self::cosine_similarity(&query_vec, &e.vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
