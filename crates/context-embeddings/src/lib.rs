//! Remote embedding API client (spec §4.3 "Embeddings").
//!
//! Chunk content never gets turned into vectors locally — an HTTP call to a
//! configured embedding endpoint does that. This module owns batching
//! (≤100 items per request, a small pause between requests so a burst of
//! files doesn't trip the provider's rate limiter), retrying transient
//! failures with exponential backoff, and a content-addressed on-disk cache
//! so re-indexing an unchanged file never re-embeds it.

mod cache;
mod error;

pub use cache::EmbeddingCache;
pub use error::{EmbeddingError, Result};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum chunks sent in a single provider request.
pub const MAX_BATCH_SIZE: usize = 100;
/// Minimum pause between consecutive batch requests.
pub const BATCH_PAUSE: Duration = Duration::from_millis(100);
/// Retry delays for transient (429/5xx) failures, tried in order.
pub const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

#[derive(Debug, Clone)]
pub struct EmbedItem {
    pub chunk_id: String,
    pub content_hash: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub chunk_id: String,
    pub embedding: Vec<f32>,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EmbedBatchOptions {
    /// Persist the cache to disk once the batch completes.
    pub auto_save: bool,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

pub struct EmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl EmbeddingClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        }
    }

    /// Build a client from `EMBEDDING_API_URL` / `EMBEDDING_MODEL` /
    /// `EMBEDDING_API_KEY`, failing loudly if the URL or model is unset —
    /// there is no sensible default endpoint to fall back to.
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint = std::env::var("EMBEDDING_API_URL")
            .map_err(|_| "EMBEDDING_API_URL is not set".to_string())?;
        let model = std::env::var("EMBEDDING_MODEL")
            .map_err(|_| "EMBEDDING_MODEL is not set".to_string())?;
        let api_key = std::env::var("EMBEDDING_API_KEY").ok();
        Ok(Self::new(endpoint, model, api_key))
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed a single query string. Never consults or populates a cache —
    /// callers embedding a one-off search query have nothing to key a cache
    /// entry on.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let inputs = vec![text.to_string()];
        let mut vectors = self.request_with_retry(&inputs).await?;
        vectors.pop().ok_or(EmbeddingError::EmptyResponse)
    }

    /// Embed a batch of chunks, skipping anything already present in
    /// `cache` and writing fresh results back into it. Results are returned
    /// in the same order as `items`.
    pub async fn embed_batch(
        &self,
        items: &[EmbedItem],
        cache: &mut EmbeddingCache,
        opts: EmbedBatchOptions,
    ) -> Result<Vec<EmbeddingResult>> {
        let mut results: Vec<Option<EmbeddingResult>> = vec![None; items.len()];
        let mut pending_indices = Vec::new();
        let mut pending_texts = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let key = EmbeddingCache::key(&item.chunk_id, &item.content_hash, &self.model);
            if let Some(embedding) = cache.get(&key) {
                results[i] = Some(EmbeddingResult {
                    chunk_id: item.chunk_id.clone(),
                    embedding: embedding.clone(),
                    from_cache: true,
                });
            } else {
                pending_indices.push(i);
                pending_texts.push(item.text.clone());
            }
        }

        let mut batch_start = 0;
        let total_batches = pending_indices.len().div_ceil(MAX_BATCH_SIZE).max(1);
        let mut batch_num = 0;
        while batch_start < pending_indices.len() {
            let batch_end = (batch_start + MAX_BATCH_SIZE).min(pending_indices.len());
            let batch_texts = &pending_texts[batch_start..batch_end];
            let embeddings = self.request_with_retry(batch_texts).await?;
            if embeddings.len() != batch_texts.len() {
                return Err(EmbeddingError::BatchSizeMismatch {
                    expected: batch_texts.len(),
                    got: embeddings.len(),
                });
            }

            for (offset, embedding) in embeddings.into_iter().enumerate() {
                let item_index = pending_indices[batch_start + offset];
                let item = &items[item_index];
                let key = EmbeddingCache::key(&item.chunk_id, &item.content_hash, &self.model);
                cache.insert(key, embedding.clone());
                results[item_index] = Some(EmbeddingResult {
                    chunk_id: item.chunk_id.clone(),
                    embedding,
                    from_cache: false,
                });
            }

            batch_num += 1;
            batch_start = batch_end;
            if batch_num < total_batches {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        if opts.auto_save {
            cache.save()?;
        }

        Ok(results.into_iter().map(|r| r.expect("every index filled")).collect())
    }

    async fn request_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.request_once(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(RetryableError::RateLimited) if (attempts as usize) <= RETRY_DELAYS.len() => {
                    log::warn!("embedding provider rate-limited request (attempt {attempts})");
                    tokio::time::sleep(RETRY_DELAYS[attempts as usize - 1]).await;
                }
                Err(RetryableError::ServerError(status)) if (attempts as usize) <= RETRY_DELAYS.len() => {
                    log::warn!("embedding provider returned {status} (attempt {attempts})");
                    tokio::time::sleep(RETRY_DELAYS[attempts as usize - 1]).await;
                }
                Err(RetryableError::RateLimited) => {
                    return Err(EmbeddingError::RateLimited { attempts });
                }
                Err(RetryableError::ServerError(status)) => {
                    return Err(EmbeddingError::ServerError { status, attempts });
                }
                Err(RetryableError::Fatal(e)) => return Err(e),
            }
        }
    }

    async fn request_once(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, RetryableError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut req = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| RetryableError::Fatal(e.into()))?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RetryableError::RateLimited);
        }
        if status.is_server_error() {
            return Err(RetryableError::ServerError(status.as_u16()));
        }
        if !status.is_success() {
            let err = response
                .error_for_status()
                .expect_err("non-success status already checked");
            return Err(RetryableError::Fatal(err.into()));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RetryableError::Fatal(e.into()))?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

enum RetryableError {
    RateLimited,
    ServerError(u16),
    Fatal(EmbeddingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cache_key_is_reused_across_calls() {
        let cache = EmbeddingCache::load(std::env::temp_dir().join("nonexistent-embedding-cache.json"));
        assert!(cache.get(&EmbeddingCache::key("a", "b", "c")).is_none());
    }

    #[tokio::test]
    async fn embed_batch_skips_cached_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = EmbeddingCache::load(dir.path().join("embedding-cache.json"));
        let key = EmbeddingCache::key("chunk-1", "hash-1", "test-model");
        cache.insert(key, vec![1.0, 2.0]);

        let items = vec![EmbedItem {
            chunk_id: "chunk-1".to_string(),
            content_hash: "hash-1".to_string(),
            text: "fn main() {}".to_string(),
        }];

        // No network call should happen since the only item is cached; a
        // client pointed at an unroutable endpoint proves this by not
        // erroring.
        let client = EmbeddingClient::new("http://127.0.0.1:0/embeddings", "test-model", None);
        let results = client
            .embed_batch(&items, &mut cache, EmbedBatchOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].from_cache);
        assert_eq!(results[0].embedding, vec![1.0, 2.0]);
    }
}
