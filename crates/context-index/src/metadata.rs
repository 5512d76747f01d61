//! Per-file index metadata (spec §3 `FileIndexMetadata`), persisted
//! alongside the vector store as `index-metadata.json`. Drives incremental
//! reindexing: a file is reprocessed only when its current content hash
//! differs from (or is absent from) this table.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMeta {
    pub last_indexed: i64,
    pub file_hash: String,
    pub chunk_count: usize,
}

#[derive(Default)]
pub struct FileIndexMetadata {
    path: Option<PathBuf>,
    files: HashMap<String, FileMeta>,
}

impl FileIndexMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`, starting empty if the file is absent or corrupt —
    /// a damaged metadata file should force a full reindex, not a crash.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let files = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            path: Some(path),
            files,
        }
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.files)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, relative_path: &str) -> Option<&FileMeta> {
        self.files.get(relative_path)
    }

    pub fn set(&mut self, relative_path: impl Into<String>, meta: FileMeta) {
        self.files.insert(relative_path.into(), meta);
    }

    pub fn remove(&mut self, relative_path: &str) -> Option<FileMeta> {
        self.files.remove(relative_path)
    }

    /// `true` iff `relative_path` is absent, or its recorded hash differs
    /// from `current_hash` (spec §4.6 step 3).
    #[must_use]
    pub fn needs_reindex(&self, relative_path: &str, current_hash: &str) -> bool {
        match self.files.get(relative_path) {
            Some(meta) => meta.file_hash != current_hash,
            None => true,
        }
    }

    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[must_use]
pub fn metadata_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join("index-metadata.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_starts_empty() {
        let meta = FileIndexMetadata::load(std::env::temp_dir().join("nonexistent-index-metadata.json"));
        assert!(meta.is_empty());
        assert!(meta.needs_reindex("a.rs", "hash"));
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index-metadata.json");

        let mut meta = FileIndexMetadata::load(&path);
        meta.set(
            "a.rs",
            FileMeta {
                last_indexed: 1,
                file_hash: "h1".to_string(),
                chunk_count: 2,
            },
        );
        meta.save().unwrap();

        let reloaded = FileIndexMetadata::load(&path);
        assert_eq!(reloaded.get("a.rs").unwrap().file_hash, "h1");
        assert!(!reloaded.needs_reindex("a.rs", "h1"));
        assert!(reloaded.needs_reindex("a.rs", "h2"));
    }
}
