//! Document ingestion: lease incoming blobs, convert them to markdown, move them
//! to the processed container and index the text for search.

mod blob;
mod chunk;
mod convert;
mod embed;
mod error;
mod index;
mod pipeline;

pub use blob::{BlobRef, BlobStore, LeaseId, LocalBlobStore};
pub use chunk::{Chunker, DEFAULT_MAX_TOKENS};
pub use convert::{
    CompositeConverter, ConvertedDocument, DocumentConverter, PdfConverter, TextConverter,
};
pub use embed::{Embedder, HashingEmbedder, OpenAIEmbedder};
pub use error::{ConvertError, IngestError};
pub use index::{InMemoryVectorIndex, IndexedDocument, SearchHit, VectorIndex};
pub use pipeline::{
    IngestFailure, IngestOptions, IngestReport, IngestionPipeline, DEFAULT_DOCUMENT_CONTAINER,
    DEFAULT_OUTPUT_DIR, DEFAULT_PROCESSED_CONTAINER, RESULT_FILE,
};
