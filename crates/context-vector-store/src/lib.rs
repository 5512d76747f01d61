//! Multi-tenant vector store (spec §4.4): one table of [`ChunkRecord`]s
//! shared by every project on the host, keyed by `chunkId` and scoped by
//! `projectId`.
//!
//! The store is a plain in-memory index with an explicit [`VectorStore::save`]
//! — unlike the filesystem scanner or coordination database, nothing here
//! needs to be durable after every single write, only after a caller's
//! indexing pass finishes (spec §4.6 "atomic replace"). A query that omits
//! `filterByProject` sees the union of every project's chunks (spec §4.4
//! "used for diagnostics only"); every user-facing query supplies one.

mod error;
mod record;
mod search;

pub use error::{Result, VectorStoreError};
pub use record::{ChunkRecord, SearchFilter, SearchHit, StoreStats};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct VectorStore {
    path: Option<PathBuf>,
    chunks: HashMap<String, ChunkRecord>,
    /// `(projectId, filePath) -> [chunkId]`, so file-scoped operations never
    /// cross project boundaries even when two projects share a path (spec
    /// §4.4 `deleteByFile(projectId, filePath)`).
    by_file: HashMap<(String, String), Vec<String>>,
}

impl VectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from `path`, starting empty if the file doesn't exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let chunks: Vec<ChunkRecord> = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Vec::new()
        };

        let mut store = Self {
            path: Some(path),
            chunks: HashMap::new(),
            by_file: HashMap::new(),
        };
        for chunk in chunks {
            store.index(chunk);
        }
        Ok(store)
    }

    /// Persist every chunk to disk atomically (write to a sibling `.tmp`
    /// file, then rename over the target).
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let all: Vec<&ChunkRecord> = self.chunks.values().collect();
        let raw = serde_json::to_string(&all)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn file_key(chunk: &ChunkRecord) -> (String, String) {
        (chunk.project_id.clone(), chunk.file_path.clone())
    }

    fn index(&mut self, chunk: ChunkRecord) {
        self.by_file.entry(Self::file_key(&chunk)).or_default().push(chunk.chunk_id.clone());
        self.chunks.insert(chunk.chunk_id.clone(), chunk);
    }

    fn deindex(&mut self, chunk_id: &str) -> Option<ChunkRecord> {
        let chunk = self.chunks.remove(chunk_id)?;
        let key = Self::file_key(&chunk);
        if let Some(ids) = self.by_file.get_mut(&key) {
            ids.retain(|id| id != chunk_id);
            if ids.is_empty() {
                self.by_file.remove(&key);
            }
        }
        Some(chunk)
    }

    /// Insert or replace chunks, keyed by `chunk_id`. Creates the in-memory
    /// schema on first call, mirroring spec §4.4's "Creates schema on first
    /// call" for a real backend.
    pub fn insert(&mut self, records: Vec<ChunkRecord>) {
        for record in records {
            self.deindex(&record.chunk_id);
            self.index(record);
        }
    }

    /// Atomically replace every chunk belonging to `(project_id, file_path)`
    /// with `records` (spec §4.6: a file's chunks are always deleted-then-
    /// reinserted as one unit, never left half-updated).
    pub fn replace_file(&mut self, project_id: &str, file_path: &str, records: Vec<ChunkRecord>) {
        self.delete_by_file(project_id, file_path);
        self.insert(records);
    }

    #[must_use]
    pub fn delete_by_file(&mut self, project_id: &str, file_path: &str) -> usize {
        let key = (project_id.to_string(), file_path.to_string());
        let ids = self.by_file.remove(&key).unwrap_or_default();
        for id in &ids {
            self.chunks.remove(id);
        }
        ids.len()
    }

    #[must_use]
    pub fn delete_by_ids(&mut self, ids: &[String]) -> usize {
        let mut removed = 0;
        for id in ids {
            if self.deindex(id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Every chunk in the store, or only those in `project_id` when given
    /// (spec §4.4 `getAllChunks(projectId?)`).
    #[must_use]
    pub fn get_all_chunks(&self, project_id: Option<&str>) -> Vec<&ChunkRecord> {
        self.chunks
            .values()
            .filter(|c| match project_id {
                Some(p) => c.project_id == p,
                None => true,
            })
            .collect()
    }

    #[must_use]
    pub fn get_chunks_by_file(&self, project_id: &str, file_path: &str) -> Vec<&ChunkRecord> {
        let key = (project_id.to_string(), file_path.to_string());
        self.by_file
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.chunks.get(id))
            .collect()
    }

    /// One file hash per indexed file in `project_id`, used by incremental
    /// reindexing to decide which files changed since the last pass (spec
    /// §4.6).
    #[must_use]
    pub fn get_file_hashes(&self, project_id: &str) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for ((proj, file_path), ids) in &self.by_file {
            if proj != project_id {
                continue;
            }
            if let Some(first) = ids.first().and_then(|id| self.chunks.get(id)) {
                out.insert(file_path.clone(), first.file_hash.clone());
            }
        }
        out
    }

    /// Aggregate stats, scoped to `project_id` when given, else the
    /// diagnostic union of every project (spec §4.4 `getStats(projectId?)`).
    #[must_use]
    pub fn get_stats(&self, project_id: Option<&str>) -> StoreStats {
        let mut stats = StoreStats::default();
        let mut files = std::collections::HashSet::new();
        for chunk in self.chunks.values() {
            if project_id.is_some_and(|p| chunk.project_id != p) {
                continue;
            }
            stats.total_chunks += 1;
            files.insert((chunk.project_id.clone(), chunk.file_path.clone()));
            *stats.language_counts.entry(chunk.language.clone()).or_insert(0) += 1;
            *stats.type_counts.entry(chunk.chunk_type).or_insert(0) += 1;
            stats.last_updated = stats.last_updated.max(chunk.timestamp);
        }
        stats.file_count = files.len();
        stats
    }

    /// Cosine-similarity search over every chunk matching `filter`, sorted
    /// by descending score and capped at `top_k`. `min_score` drops hits
    /// below the threshold before the cap is applied.
    #[must_use]
    pub fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_score: f32,
        filter: &SearchFilter,
    ) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .chunks
            .values()
            .filter(|c| matches_filter(c, filter))
            .map(|record| SearchHit {
                score: search::score(query_embedding, &record.embedding),
                record: record.clone(),
            })
            .filter(|hit| hit.score >= min_score)
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits
    }
}

fn matches_filter(chunk: &ChunkRecord, filter: &SearchFilter) -> bool {
    if let Some(file_path) = &filter.file_path {
        if &chunk.file_path != file_path {
            return false;
        }
    }
    if let Some(language) = &filter.language {
        if &chunk.language != language {
            return false;
        }
    }
    if let Some(chunk_type) = filter.chunk_type {
        if chunk.chunk_type != chunk_type {
            return false;
        }
    }
    if let Some(project_id) = &filter.project_id {
        if &chunk.project_id != project_id {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(chunk_id: &str, file_path: &str, embedding: Vec<f32>) -> ChunkRecord {
        sample_in("proj", chunk_id, file_path, embedding)
    }

    fn sample_in(project_id: &str, chunk_id: &str, file_path: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            chunk_id: chunk_id.to_string(),
            project_id: project_id.to_string(),
            file_path: file_path.to_string(),
            content: "fn x() {}".to_string(),
            start_line: 1,
            end_line: 1,
            chunk_type: context_chunker::ChunkType::Function,
            name: Some("x".to_string()),
            parent_name: None,
            language: "rust".to_string(),
            context: String::new(),
            token_count: 3,
            file_hash: "hash1".to_string(),
            embedding,
            timestamp: 1000,
        }
    }

    #[test]
    fn search_ranks_by_similarity() {
        let mut store = VectorStore::new();
        store.insert(vec![
            sample("a", "a.rs", vec![1.0, 0.0]),
            sample("b", "b.rs", vec![0.0, 1.0]),
        ]);

        let hits = store.search(&[1.0, 0.0], 10, 0.0, &SearchFilter::default());
        assert_eq!(hits[0].record.chunk_id, "a");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn replace_file_is_atomic_delete_then_insert() {
        let mut store = VectorStore::new();
        store.insert(vec![sample("a", "f.rs", vec![1.0, 0.0])]);
        store.replace_file("proj", "f.rs", vec![sample("b", "f.rs", vec![0.0, 1.0])]);

        let remaining = store.get_chunks_by_file("proj", "f.rs");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].chunk_id, "b");
    }

    #[test]
    fn delete_by_file_removes_all_its_chunks() {
        let mut store = VectorStore::new();
        store.insert(vec![
            sample("a", "f.rs", vec![1.0, 0.0]),
            sample("b", "f.rs", vec![0.0, 1.0]),
            sample("c", "g.rs", vec![1.0, 1.0]),
        ]);
        let removed = store.delete_by_file("proj", "f.rs");
        assert_eq!(removed, 2);
        assert_eq!(store.get_all_chunks(None).len(), 1);
    }

    #[test]
    fn delete_by_file_does_not_cross_project_boundaries() {
        let mut store = VectorStore::new();
        store.insert(vec![
            sample_in("proj-a", "a", "same/path.rs", vec![1.0, 0.0]),
            sample_in("proj-b", "b", "same/path.rs", vec![0.0, 1.0]),
        ]);
        store.delete_by_file("proj-a", "same/path.rs");

        assert!(store.get_chunks_by_file("proj-a", "same/path.rs").is_empty());
        assert_eq!(store.get_chunks_by_file("proj-b", "same/path.rs").len(), 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = VectorStore::load(&path).unwrap();
        store.insert(vec![sample("a", "f.rs", vec![1.0, 0.0])]);
        store.save().unwrap();

        let reloaded = VectorStore::load(&path).unwrap();
        assert_eq!(reloaded.get_all_chunks(None).len(), 1);
    }

    #[test]
    fn min_score_filters_out_weak_matches() {
        let mut store = VectorStore::new();
        store.insert(vec![sample("a", "a.rs", vec![-1.0, 0.0])]);
        let hits = store.search(&[1.0, 0.0], 10, 0.9, &SearchFilter::default());
        assert!(hits.is_empty());
    }

    #[test]
    fn stats_are_scoped_by_project_unless_omitted() {
        let mut store = VectorStore::new();
        store.insert(vec![
            sample_in("proj-a", "a", "a.rs", vec![1.0, 0.0]),
            sample_in("proj-b", "b", "b.rs", vec![0.0, 1.0]),
        ]);

        let scoped = store.get_stats(Some("proj-a"));
        assert_eq!(scoped.total_chunks, 1);
        assert_eq!(scoped.file_count, 1);

        let union = store.get_stats(None);
        assert_eq!(union.total_chunks, 2);
        assert_eq!(union.file_count, 2);
    }
}
