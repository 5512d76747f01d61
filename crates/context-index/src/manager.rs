//! Index manager (spec §4.6): orchestrates Scanner → Chunker → Embedding
//! client → Vector store for one project, tracks per-file metadata, and
//! drives incremental reindexing.

use crate::config::EngineConfig;
use crate::error::{IndexError, Result};
use crate::health::IndexHealth;
use crate::metadata::{metadata_path, FileIndexMetadata, FileMeta};
use context_chunker::{Chunker, ChunkerConfig};
use context_embeddings::{EmbedBatchOptions, EmbedItem, EmbeddingCache, EmbeddingClient};
use context_scanner::{now_ms, FileScanner, ScanOptions};
use context_tokenizer::Tokenizer;
use context_vector_store::{ChunkRecord, SearchFilter, SearchHit, StoreStats, VectorStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Vector store file name under a project's storage directory.
const VECTOR_STORE_FILE: &str = "vectors.json";
const EMBEDDING_CACHE_FILE: &str = "embedding-cache.json";

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub force_reindex: bool,
    pub include_hidden: bool,
    pub max_file_size: u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            force_reindex: false,
            include_hidden: false,
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Outcome of one `IndexManager::index_files` cycle (spec §4.6 step 5).
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub files_processed: usize,
    pub changed_files: Vec<String>,
    pub chunks_created: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub top_k: usize,
    pub min_score: f32,
    pub filter_by_file: Option<String>,
    pub filter_by_language: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_score: 0.0,
            filter_by_file: None,
            filter_by_language: None,
        }
    }
}

/// Coordinates one project's indexing cycle and query path. Owns the
/// project's vector store, embedding cache, and file metadata; each is
/// loaded on `open` and persisted at the end of `index_files`.
pub struct IndexManager {
    root: PathBuf,
    project_id: String,
    storage_dir: PathBuf,
    max_tokens: usize,
    overlap_tokens: usize,
    embedding: EmbeddingClient,
    store: VectorStore,
    cache: EmbeddingCache,
    metadata: FileIndexMetadata,
}

impl IndexManager {
    /// Open (or create) the index for `root_path`. `project_id` is used
    /// verbatim if given, else derived from the root's basename (spec §4.6
    /// "Derivation of projectId").
    pub fn open(root_path: impl AsRef<Path>, config: &EngineConfig, project_id: Option<String>) -> Result<Self> {
        let root = root_path.as_ref().to_path_buf();
        let project_id = project_id.unwrap_or_else(|| derive_project_id(&root));
        let storage_dir = config.storage_dir(&root);

        let embedding = EmbeddingClient::new(
            config.embedding.api_url.clone(),
            config.embedding.model.clone(),
            Some(config.embedding.api_key.clone()),
        );

        let store = VectorStore::load(storage_dir.join(VECTOR_STORE_FILE))?;
        let cache = EmbeddingCache::load(storage_dir.join(EMBEDDING_CACHE_FILE));
        let metadata = FileIndexMetadata::load(metadata_path(&storage_dir));

        Ok(Self {
            root,
            project_id,
            storage_dir,
            max_tokens: config.max_tokens,
            overlap_tokens: config.chunk_overlap_tokens,
            embedding,
            store,
            cache,
            metadata,
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    #[must_use]
    pub fn vector_store_path(&self) -> PathBuf {
        self.storage_dir.join(VECTOR_STORE_FILE)
    }

    #[must_use]
    pub fn embedding_cache_path(&self) -> PathBuf {
        self.storage_dir.join(EMBEDDING_CACHE_FILE)
    }

    /// Run one indexing cycle (spec §4.6 `indexFiles`): scan, filter to
    /// changed files, chunk + embed + store each sequentially, persist
    /// metadata, report what happened.
    pub async fn index_files(&mut self, options: IndexOptions) -> Result<IndexReport> {
        let start = Instant::now();
        let mut report = IndexReport::default();

        let scan_options = ScanOptions::new(&self.root)
            .with_project_root(&self.root)
            .with_include_hidden(options.include_hidden)
            .with_max_file_size(options.max_file_size);
        let scanner = FileScanner::new(scan_options);
        let files = scanner.scan().await?;

        let live_paths: HashSet<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();

        let tokenizer = Tokenizer::from_env();
        let chunker_config = ChunkerConfig {
            max_tokens: self.max_tokens,
            overlap_tokens: self.overlap_tokens,
            absolute_max_tokens: tokenizer.recommended_absolute_max(),
        };
        let chunker = Chunker::new(chunker_config, tokenizer);

        let files_to_index: Vec<_> = files
            .iter()
            .filter(|f| options.force_reindex || self.metadata.needs_reindex(&f.relative_path, &f.content_hash))
            .collect();

        // Tracks whether this cycle actually changed the vector store or the
        // file metadata, so a clean re-run over an unchanged tree (testable
        // property 4: "zero vector-store writes") skips re-serializing
        // `vectors.json`/`index-metadata.json`, mirroring the `cache.is_dirty()`
        // guard already used for the embedding cache below.
        let mut store_dirty = false;

        for file in &files_to_index {
            let content = match tokio::fs::read_to_string(&file.absolute_path).await {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("failed to read {}: {e}", file.relative_path);
                    report.errors.push(format!("{}: {e}", file.relative_path));
                    continue;
                }
            };

            let chunks = chunker.chunk(&file.relative_path, &content, file.language);
            if chunks.is_empty() {
                log::debug!("{} produced no chunks", file.relative_path);
                continue;
            }

            let items: Vec<EmbedItem> = chunks
                .iter()
                .map(|c| EmbedItem {
                    chunk_id: c.chunk_id.clone(),
                    content_hash: blake3::hash(c.content.as_bytes()).to_hex().to_string(),
                    text: c.content.clone(),
                })
                .collect();

            let embedded = match self
                .embedding
                .embed_batch(&items, &mut self.cache, EmbedBatchOptions::default())
                .await
            {
                Ok(results) => results,
                Err(e) => {
                    log::warn!("embedding failed for {}: {e}", file.relative_path);
                    report.errors.push(format!("{}: {e}", file.relative_path));
                    // Per spec §4.6 step 4d: do not touch the vector store
                    // for this file; its previous chunks (if any) remain.
                    continue;
                }
            };

            let timestamp = now_ms() as i64;
            let records: Vec<ChunkRecord> = chunks
                .into_iter()
                .zip(embedded)
                .map(|(chunk, result)| ChunkRecord {
                    chunk_id: chunk.chunk_id,
                    project_id: self.project_id.clone(),
                    file_path: chunk.file_path,
                    content: chunk.content,
                    start_line: chunk.start_line,
                    end_line: chunk.end_line,
                    chunk_type: chunk.chunk_type,
                    name: chunk.name,
                    parent_name: chunk.parent_name,
                    language: chunk.language,
                    context: chunk.context,
                    token_count: chunk.token_count,
                    file_hash: file.content_hash.clone(),
                    embedding: result.embedding,
                    timestamp,
                })
                .collect();

            report.chunks_created += records.len();
            self.store.replace_file(&self.project_id, &file.relative_path, records);
            store_dirty = true;
            self.metadata.set(
                file.relative_path.clone(),
                FileMeta {
                    last_indexed: timestamp,
                    file_hash: file.content_hash.clone(),
                    chunk_count: self.store.get_chunks_by_file(&self.project_id, &file.relative_path).len(),
                },
            );
            report.files_processed += 1;
            report.changed_files.push(file.relative_path.clone());
        }

        // Purge files that used to be tracked but are no longer present on
        // disk (deleted or renamed away), mirroring the teacher indexer's
        // `purge_missing_files`.
        let stale: Vec<String> = self
            .metadata
            .paths()
            .into_iter()
            .filter(|p| !live_paths.contains(p.as_str()))
            .collect();
        if !stale.is_empty() {
            store_dirty = true;
        }
        for path in stale {
            self.store.delete_by_file(&self.project_id, &path);
            self.metadata.remove(&path);
        }

        if store_dirty {
            self.store.save()?;
            self.metadata.save()?;
        }
        if self.cache.is_dirty() {
            self.cache.save()?;
        }

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let health = IndexHealth {
            project_id: self.project_id.clone(),
            files_indexed: self.metadata.len(),
            pending_files: report.errors.iter().filter_map(|e| e.split_once(':').map(|(p, _)| p.to_string())).collect(),
            last_error: report.errors.last().cloned(),
            last_run_ms: now_ms() as i64,
        };
        health.save(&self.storage_dir)?;

        Ok(report)
    }

    /// Query path (spec §4.6 "Search path"): embed `query` (no cache, spec
    /// §4.3), search this project's chunks, return ranked hits.
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        if options.top_k == 0 {
            return Err(IndexError::Validation("topK must be greater than zero".to_string()));
        }

        let vector = self.embedding.embed(query).await?;
        let filter = SearchFilter {
            file_path: options.filter_by_file,
            language: options.filter_by_language,
            chunk_type: None,
            project_id: Some(self.project_id.clone()),
        };
        Ok(self.store.search(&vector, options.top_k, options.min_score, &filter))
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.store.get_stats(Some(&self.project_id))
    }

    #[must_use]
    pub fn health(&self) -> IndexHealth {
        IndexHealth::load(&self.storage_dir)
    }
}

/// Derive a `projectId` from a path: lowercase basename, non-`[a-z0-9_-]`
/// replaced with `-`, runs of `-` collapsed, leading/trailing `-` stripped;
/// an empty result becomes `"default"` (spec §4.6).
#[must_use]
pub fn derive_project_id(path: &Path) -> String {
    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let mut out = String::with_capacity(basename.len());
    let mut last_was_dash = false;
    for c in basename.chars() {
        let normalized = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if normalized == '-' {
            if !last_was_dash {
                out.push('-');
            }
            last_was_dash = true;
        } else {
            out.push(normalized);
            last_was_dash = false;
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "default".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derive_project_id_sanitizes_basename() {
        assert_eq!(derive_project_id(Path::new("/home/me/My Cool App!")), "my-cool-app");
        assert_eq!(derive_project_id(Path::new("/srv/---")), "default");
        assert_eq!(derive_project_id(Path::new("/srv/foo_bar-baz")), "foo_bar-baz");
    }
}
