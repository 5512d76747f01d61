//! Content-addressed embedding cache, persisted as a single JSON file.
//!
//! Keyed by `chunkId:contentHash:model` so a cache entry is only ever reused
//! for the exact chunk content and model it was produced for; a model
//! upgrade or a re-chunked file simply misses and re-embeds.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    entries: HashMap<String, Vec<f32>>,
}

pub struct EmbeddingCache {
    path: PathBuf,
    entries: HashMap<String, Vec<f32>>,
    dirty: bool,
}

impl EmbeddingCache {
    /// Load a cache from `path`, starting empty if the file doesn't exist
    /// yet or fails to parse (a corrupt cache should never block indexing).
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<CacheFile>(&raw).ok())
            .map(|f| f.entries)
            .unwrap_or_default();
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    #[must_use]
    pub fn key(chunk_id: &str, content_hash: &str, model: &str) -> String {
        format!("{chunk_id}:{content_hash}:{model}")
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Vec<f32>> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, embedding: Vec<f32>) {
        self.entries.insert(key, embedding);
        self.dirty = true;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = CacheFile {
            entries: self.entries.clone(),
        };
        let raw = serde_json::to_string(&file)?;
        std::fs::write(&self.path, raw)?;
        self.dirty = false;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::load(dir.path().join("embedding-cache.json"));
        assert!(cache.get("anything").is_none());
        assert!(!cache.is_dirty());
    }

    #[test]
    fn insert_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embedding-cache.json");

        let mut cache = EmbeddingCache::load(&path);
        let key = EmbeddingCache::key("abc123", "deadbeef", "text-embedding-3-small");
        cache.insert(key.clone(), vec![0.1, 0.2, 0.3]);
        cache.save().unwrap();

        let reloaded = EmbeddingCache::load(&path);
        assert_eq!(reloaded.get(&key), Some(&vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn key_changes_with_any_component() {
        let a = EmbeddingCache::key("c1", "h1", "m1");
        let b = EmbeddingCache::key("c1", "h1", "m2");
        let c = EmbeddingCache::key("c1", "h2", "m1");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
