//! Typed settings read from the process environment after `load_and_apply`.
//!
//! Every value has a default so a bare checkout runs against a local
//! OpenAI-compatible endpoint and a `./storage` directory.

use std::path::PathBuf;

use crate::LoadError;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_MAX_STEPS: u32 = 25;
pub const DEFAULT_MAX_TOKENS: usize = 64;

/// Chat model endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// `OPENAI_API_KEY`; when unset the client falls back to its own default lookup.
    pub api_key: Option<String>,
    /// `OPENAI_BASE_URL` (e.g. an Azure OpenAI `/openai/v1` URL or `https://models.inference.ai.azure.com`).
    pub base_url: Option<String>,
    /// `SWITCHYARD_MODEL` (deployment name for Azure).
    pub model: String,
    /// `SWITCHYARD_TEMPERATURE`.
    pub temperature: f32,
    /// `SWITCHYARD_EMBEDDING_MODEL`.
    pub embedding_model: String,
}

/// Document ingestion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSettings {
    /// `STORAGE_ROOT`: directory whose subdirectories are blob containers.
    pub storage_root: PathBuf,
    /// `DOCUMENT_CONTAINER`.
    pub document_container: String,
    /// `PROCESSED_DOCUMENT_CONTAINER`.
    pub processed_container: String,
    /// `OUTPUT_DIR`: local working directory for downloads and converted markdown.
    pub output_dir: PathBuf,
    /// `CHUNKING_ENABLED`.
    pub chunking_enabled: bool,
    /// `UPLOAD_RESULTS`.
    pub upload_results: bool,
    /// `MAX_TOKENS`: chunk size when chunking is enabled.
    pub max_tokens: usize,
}

/// All switchyard settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub llm: LlmSettings,
    pub ingest: IngestSettings,
    /// `SWITCHYARD_ASSETS_DIR`: directory with `categories.json`, `templates.json` and
    /// `users.json`. Unset means the copies bundled with the library.
    pub assets_dir: Option<PathBuf>,
    /// `SWITCHYARD_MAX_STEPS`: executor step limit per run.
    pub max_steps: u32,
    /// `SWITCHYARD_CHECKPOINT_DIR`: when set, suspended conversations are saved here.
    pub checkpoint_dir: Option<PathBuf>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, LoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm = LlmSettings {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL"),
            model: get("SWITCHYARD_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or(&get, "SWITCHYARD_TEMPERATURE", 0.0)?,
            embedding_model: get("SWITCHYARD_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        };

        let ingest = IngestSettings {
            storage_root: get("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("storage")),
            document_container: get("DOCUMENT_CONTAINER")
                .unwrap_or_else(|| "documents".to_string()),
            processed_container: get("PROCESSED_DOCUMENT_CONTAINER")
                .unwrap_or_else(|| "processed-documents".to_string()),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
            chunking_enabled: parse_flag(&get, "CHUNKING_ENABLED")?,
            upload_results: parse_flag(&get, "UPLOAD_RESULTS")?,
            max_tokens: parse_or(&get, "MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
        };

        Ok(Self {
            llm,
            ingest,
            assets_dir: get("SWITCHYARD_ASSETS_DIR").map(PathBuf::from),
            max_steps: parse_or(&get, "SWITCHYARD_MAX_STEPS", DEFAULT_MAX_STEPS)?,
            checkpoint_dir: get("SWITCHYARD_CHECKPOINT_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, LoadError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| LoadError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn parse_flag<G>(get: &G, key: &str) -> Result<bool, LoadError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(false),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(LoadError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
        },
    }
}
