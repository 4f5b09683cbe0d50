//! Document conversion: files to markdown text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ConvertError;

/// Markdown produced from one source file.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedDocument {
    pub source: PathBuf,
    pub markdown: String,
}

impl ConvertedDocument {
    /// File stem of the source; names the output directory.
    pub fn stem(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

/// Converts files of the extensions it lists. Conversion is blocking; the
/// pipeline runs it on the blocking pool.
pub trait DocumentConverter: Send + Sync {
    /// Lower-case extensions without the dot.
    fn extensions(&self) -> &[&'static str];

    fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError>;
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn non_empty(path: &Path, markdown: String) -> Result<ConvertedDocument, ConvertError> {
    if markdown.trim().is_empty() {
        return Err(ConvertError::Empty(path.to_path_buf()));
    }
    Ok(ConvertedDocument {
        source: path.to_path_buf(),
        markdown,
    })
}

/// Markdown and plain text pass through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextConverter;

impl DocumentConverter for TextConverter {
    fn extensions(&self) -> &[&'static str] {
        &["md", "markdown", "txt"]
    }

    fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        non_empty(path, text)
    }
}

/// Text layer of a PDF via `pdf-extract`; pages become paragraphs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfConverter;

impl DocumentConverter for PdfConverter {
    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError> {
        let text =
            pdf_extract::extract_text(path).map_err(|e| ConvertError::Pdf(e.to_string()))?;
        let markdown = text
            .split('\u{c}')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        non_empty(path, markdown)
    }
}

/// Dispatches on file extension to the first converter that handles it.
#[derive(Clone)]
pub struct CompositeConverter {
    converters: Vec<Arc<dyn DocumentConverter>>,
}

impl CompositeConverter {
    pub fn new(converters: Vec<Arc<dyn DocumentConverter>>) -> Self {
        Self { converters }
    }
}

impl Default for CompositeConverter {
    fn default() -> Self {
        Self::new(vec![Arc::new(TextConverter), Arc::new(PdfConverter)])
    }
}

impl DocumentConverter for CompositeConverter {
    fn extensions(&self) -> &[&'static str] {
        &[]
    }

    fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError> {
        let ext = extension_of(path);
        let converter = self
            .converters
            .iter()
            .find(|c| c.extensions().contains(&ext.as_str()))
            .ok_or_else(|| {
                ConvertError::Unsupported(if ext.is_empty() {
                    path.display().to_string()
                } else {
                    ext.clone()
                })
            })?;
        converter.convert(path)
    }
}
