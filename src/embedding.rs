//! Embedding provider abstraction and implementations.
//!
//! Defines the [`TextEmbedder`] trait and concrete backends:
//! - **[`DisabledEmbedder`]** — fails every call with
//!   [`EmbedError::Uninitialized`]; used when no provider is configured.
//! - **[`OpenAiEmbedder`]** — calls the OpenAI embeddings API with retry
//!   and backoff.
//! - **[`OllamaEmbedder`]** — calls a local Ollama server's embed endpoint.
//!
//! Every backend returns unit-norm vectors of a fixed dimensionality, so a
//! single-field embedding can be fed straight into cosine similarity.
//!
//! Also provides [`cosine_similarity`], which deliberately degrades to `0.0`
//! on mismatched or zero-norm vectors instead of failing — a malformed
//! cached vector must not abort a whole ranking pass.
//!
//! # Retry Strategy
//!
//! HTTP backends use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::EmbeddingConfig;

/// Errors raised by embedding backends.
///
/// `Uninitialized` is fatal to the calling operation and must surface to the
/// caller; it is never retried or absorbed.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding provider is not initialized; configure [embedding] before searching")]
    Uninitialized,
    #[error("embedding provider request failed: {0}")]
    Provider(String),
}

/// Trait for embedding backends.
///
/// Implementations must be deterministic for a fixed input: the composer's
/// output, and therefore the whole vector index, depends on it.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a single non-empty text into a unit-norm vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Create the appropriate [`TextEmbedder`] based on configuration.
///
/// | Config Value | Backend |
/// |-------------|---------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAiEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn TextEmbedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

// ============ Disabled backend ============

/// A backend that always fails with [`EmbedError::Uninitialized`].
pub struct DisabledEmbedder;

#[async_trait]
impl TextEmbedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(EmbedError::Uninitialized.into())
    }
}

// ============ OpenAI backend ============

/// Embedding backend using the OpenAI embeddings API.
///
/// Requires the `OPENAI_API_KEY` environment variable. The API already
/// returns unit-norm vectors; they are renormalized anyway so the trait
/// contract does not depend on the remote service.
pub struct OpenAiEmbedder {
    model: String,
    dims: usize,
    endpoint: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            dims,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1/embeddings".to_string()),
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl TextEmbedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EmbedError::Provider("OPENAI_API_KEY not set".to_string()))?;

        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });

        let json = request_with_backoff(self.max_retries, || {
            self.client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
        })
        .await?;

        let embedding = json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .and_then(|item| item.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                EmbedError::Provider("invalid response: missing data[0].embedding".to_string())
            })?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        Ok(unit_normalize(vec))
    }
}

// ============ Ollama backend ============

/// Embedding backend using a local Ollama server.
///
/// Calls `POST /api/embed` with mean pooling as configured on the model
/// side. Output is renormalized because Ollama models do not all return
/// unit-norm vectors.
pub struct OllamaEmbedder {
    model: String,
    dims: usize,
    endpoint: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for Ollama provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for Ollama provider"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            dims,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| "http://localhost:11434/api/embed".to_string()),
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl TextEmbedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let json = request_with_backoff(self.max_retries, || {
            self.client
                .post(&self.endpoint)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
        })
        .await?;

        let embedding = json
            .get("embeddings")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                EmbedError::Provider("invalid response: missing embeddings[0]".to_string())
            })?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        Ok(unit_normalize(vec))
    }
}

// ============ HTTP retry helper ============

/// Issue a request with exponential backoff and classify HTTP failures.
async fn request_with_backoff<F, Fut>(max_retries: u32, send: F) -> Result<serde_json::Value>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = reqwest::Result<reqwest::Response>>,
{
    let mut last_err: Option<EmbedError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::debug!(attempt, ?delay, "retrying embedding request");
            tokio::time::sleep(delay).await;
        }

        match send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                let body_text = response.text().await.unwrap_or_default();

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    tracing::warn!(%status, "embedding provider returned retryable error");
                    last_err = Some(EmbedError::Provider(format!("{}: {}", status, body_text)));
                    continue;
                }

                // Client error (not 429) — don't retry
                return Err(EmbedError::Provider(format!("{}: {}", status, body_text)).into());
            }
            Err(e) => {
                last_err = Some(EmbedError::Provider(e.to_string()));
                continue;
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| EmbedError::Provider("embedding failed after retries".to_string()))
        .into())
}

/// Scale a vector to unit L2 norm; a zero vector is returned unchanged.
pub fn unit_normalize(mut vec: Vec<f32>) -> Vec<f32> {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vec {
            *v /= norm;
        }
    }
    vec
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or a
/// zero-norm operand. This is a documented degrade, not an error: ranking
/// proceeds and such entries simply score lowest.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degrades_to_zero_on_empty() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_degrades_to_zero_on_length_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_degrades_to_zero_on_zero_norm() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_symmetric() {
        let a = vec![0.3, -0.2, 0.9];
        let b = vec![-0.5, 0.1, 0.4];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        // Symmetry holds for degrade cases too
        let short = vec![1.0];
        assert_eq!(cosine_similarity(&a, &short), cosine_similarity(&short, &a));
    }

    #[test]
    fn test_unit_normalize() {
        let v = unit_normalize(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let zero = unit_normalize(vec![0.0, 0.0]);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_disabled_embedder_is_uninitialized() {
        let e = DisabledEmbedder;
        let err = e.embed("柑橘").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EmbedError>(),
            Some(EmbedError::Uninitialized)
        ));
    }
}
