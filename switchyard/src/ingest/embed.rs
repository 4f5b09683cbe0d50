//! Text embedders for the vector index.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_openai::{
    config::OpenAIConfig,
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;

use super::IngestError;

/// Produces fixed-size float vectors from text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector of [`Embedder::dimension`] floats per input, in input order.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IngestError>;

    fn dimension(&self) -> usize;
}

/// OpenAI Embeddings API client (any OpenAI-compatible endpoint via the config).
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// API key from `OPENAI_API_KEY`.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new(), model)
    }

    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimensions = Self::model_dimensions(&model);
        Self {
            client: Client::with_config(config),
            model,
            dimensions,
        }
    }

    /// Same endpoint handling as `ChatOpenAI::compatible`.
    pub fn compatible(base_url: Option<&str>, api_key: Option<&str>, model: impl Into<String>) -> Self {
        let mut config = OpenAIConfig::new();
        if let Some(base) = base_url {
            config = config.with_api_base(base.trim_end_matches('/'));
        }
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        Self::with_config(config, model)
    }

    /// - `text-embedding-3-large`: 3072
    /// - `text-embedding-3-small`, `text-embedding-ada-002` and anything else: 1536
    fn model_dimensions(model: &str) -> usize {
        match model {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IngestError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let input = match texts {
            [one] => EmbeddingInput::String(one.to_string()),
            many => EmbeddingInput::StringArray(many.iter().map(|s| s.to_string()).collect()),
        };
        let request = CreateEmbeddingRequest {
            input,
            model: self.model.clone(),
            ..Default::default()
        };
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| IngestError::Embedding(format!("OpenAI API error: {}", e)))?;
        if response.data.len() != texts.len() {
            return Err(IngestError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }
        Ok(response.data.into_iter().map(|e| e.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }
}

/// Offline embedder: hashed bag of lower-cased words. Texts sharing words get
/// similar vectors, which is enough for tests and `--mock` runs.
#[derive(Clone, Copy, Debug)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut h = DefaultHasher::new();
            word.to_lowercase().hash(&mut h);
            v[(h.finish() % self.dimension as u64) as usize] += 1.0;
        }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IngestError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn read_http_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = stream.read(&mut tmp).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let header_end = pos + 4;
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
                let content_length = headers
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                let mut body_len = buf.len() - header_end;
                while body_len < content_length {
                    let m = stream.read(&mut tmp).await.unwrap();
                    if m == 0 {
                        break;
                    }
                    body_len += m;
                }
                return;
            }
        }
    }

    async fn write_http_response(stream: &mut TcpStream, status: &str, body: &str) {
        let resp = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(resp.as_bytes()).await.unwrap();
    }

    #[test]
    fn model_dimensions() {
        assert_eq!(OpenAIEmbedder::model_dimensions("text-embedding-3-small"), 1536);
        assert_eq!(OpenAIEmbedder::model_dimensions("text-embedding-3-large"), 3072);
        assert_eq!(OpenAIEmbedder::model_dimensions("unknown-model"), 1536);
        assert_eq!(OpenAIEmbedder::new("text-embedding-3-large").dimension(), 3072);
    }

    /// **Scenario**: Batch embedding against a local OpenAI-compatible server.
    #[tokio::test]
    async fn embed_batch_with_local_mock_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_http_request(&mut stream).await;
            let body = serde_json::json!({
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 0, "embedding": [1.0, 1.1]},
                    {"object": "embedding", "index": 1, "embedding": [2.0, 2.1]}
                ],
                "model": "text-embedding-3-small",
                "usage": {"prompt_tokens": 2, "total_tokens": 2}
            })
            .to_string();
            write_http_response(&mut stream, "200 OK", &body).await;
        });

        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base(format!("http://{}", addr));
        let embedder = OpenAIEmbedder::with_config(config, "text-embedding-3-small");
        let many = embedder.embed(&["a", "b"]).await.unwrap();
        assert_eq!(many, vec![vec![1.0, 1.1], vec![2.0, 2.1]]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn embed_reports_http_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_http_request(&mut stream).await;
            write_http_response(
                &mut stream,
                "500 Internal Server Error",
                r#"{"error":{"message":"boom"}}"#,
            )
            .await;
        });

        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base(format!("http://{}", addr));
        let embedder = OpenAIEmbedder::with_config(config, "text-embedding-3-small");
        let err = embedder.embed(&["hello"]).await.unwrap_err();
        assert!(err.to_string().contains("OpenAI API error"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn hashing_embedder_is_deterministic() {
        let e = HashingEmbedder::new(32);
        let v = e.embed(&["Red sofa", "red SOFA"]).await.unwrap();
        assert_eq!(v[0], v[1]);
        assert_eq!(v[0].len(), 32);
        assert_eq!(v[0].iter().sum::<f32>(), 2.0);
    }
}
