//! Lightweight index health snapshot (SPEC_FULL §12), grounded in the
//! teacher's `health.rs`/`watermark_io.rs` pattern: a small JSON file next
//! to `index-metadata.json` that lets a caller decide whether to trigger a
//! reindex without re-scanning the tree. Pure observability over data
//! already produced by §3/§4.6 — not a new data source.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexHealth {
    pub project_id: String,
    pub files_indexed: usize,
    /// Files whose last indexing attempt failed; they keep their previous
    /// (possibly stale) chunks until a future cycle succeeds (spec §4.6
    /// "Incremental correctness invariant").
    pub pending_files: Vec<String>,
    pub last_error: Option<String>,
    pub last_run_ms: i64,
}

impl IndexHealth {
    #[must_use]
    pub fn path(storage_dir: &Path) -> PathBuf {
        storage_dir.join("health.json")
    }

    pub fn load(storage_dir: &Path) -> Self {
        std::fs::read_to_string(Self::path(storage_dir))
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, storage_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(storage_dir)?;
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(storage_dir), raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_health_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let health = IndexHealth::load(dir.path());
        assert_eq!(health.files_indexed, 0);
        assert!(health.pending_files.is_empty());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let health = IndexHealth {
            project_id: "proj".to_string(),
            files_indexed: 3,
            pending_files: vec!["broken.rs".to_string()],
            last_error: Some("embedding failed".to_string()),
            last_run_ms: 1000,
        };
        health.save(dir.path()).unwrap();

        let reloaded = IndexHealth::load(dir.path());
        assert_eq!(reloaded, health);
    }
}
