//! Filesystem scanner (spec §4.1): walks a tree applying layered ignore
//! semantics, filters to code files, and hashes survivors with bounded
//! concurrency.

mod error;
mod record;
mod walk;

pub use error::{Result, ScannerError};
pub use record::{FileRecord, ScanOptions};

use context_ignore::IgnoreEngine;
use context_lang::Language;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;

/// Bounded in-flight file reads during hashing, per spec §5.
const MAX_CONCURRENT_HASHES: usize = 20;

pub struct FileScanner {
    options: ScanOptions,
}

impl FileScanner {
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Run one scan pass. Fails only if the root does not exist or is not a
    /// directory; any per-entry failure (permission, transient IO) is
    /// logged and the entry is skipped.
    pub async fn scan(&self) -> Result<Vec<FileRecord>> {
        let root = &self.options.root_path;
        if !root.is_dir() {
            return Err(ScannerError::InvalidRoot(root.display().to_string()));
        }

        let mut engine = IgnoreEngine::for_root(root)?;
        let mut candidates = Vec::new();
        walk::collect_candidates(
            &mut engine,
            root,
            "",
            self.options.recursive,
            self.options.include_hidden,
            &mut candidates,
        )?;

        // Keep only code files within the size budget; this is cheap
        // (no read) so do it before spawning the hashing tasks.
        let max_size = self.options.max_file_size;
        let project_root = self.options.project_root.clone();
        let filtered: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|p| context_lang::is_code_path(p))
            .collect();

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_HASHES));
        let mut tasks = Vec::with_capacity(filtered.len());
        for path in filtered {
            let semaphore = Arc::clone(&semaphore);
            let project_root = project_root.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                hash_file(&path, &project_root, max_size).await
            }));
        }

        let mut records = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(Ok(Some(record))) => records.push(record),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => log::warn!("skipping file during scan: {e}"),
                Err(e) => log::warn!("scan task panicked: {e}"),
            }
        }

        records.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(records)
    }
}

async fn hash_file(
    path: &Path,
    project_root: &Path,
    max_size: u64,
) -> std::result::Result<Option<FileRecord>, std::io::Error> {
    let metadata = tokio::fs::metadata(path).await?;
    let size = metadata.len();
    if size > max_size {
        log::debug!(
            "skipping {} ({size} bytes exceeds max_file_size {max_size})",
            path.display()
        );
        return Ok(None);
    }

    let bytes = tokio::fs::read(path).await?;
    let content_hash = blake3::hash(&bytes).to_hex().to_string();

    let mtime_ms = metadata
        .modified()
        .ok()
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));

    let relative_path = normalize_relative(path, project_root);
    let language = Language::from_path(path);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(Some(FileRecord {
        relative_path,
        absolute_path: path.to_path_buf(),
        language,
        extension,
        content_hash,
        size,
        mtime_ms,
    }))
}

/// Compute `relativePath` against `project_root`, not the scan root (spec
/// §4.1 "non-obvious design point"), so a sub-directory scan still yields
/// identifiers stable across the whole project.
fn normalize_relative(path: &Path, project_root: &Path) -> String {
    let relative = path.strip_prefix(project_root).unwrap_or(path);
    let mut normalized = relative.to_string_lossy().replace('\\', "/");
    if normalized.starts_with("./") {
        normalized = normalized[2..].to_string();
    }
    normalized
}

#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn s1_first_time_indexing_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "src/auth.ts",
            "export class AuthService {\n  login() {}\n}\n",
        )
        .await;
        write(&dir, "src/utils.ts", "export function helper() {}\n").await;
        write(&dir, ".gitignore", "node_modules/\n").await;
        write(&dir, "node_modules/x.js", "console.log('nope')").await;

        let scanner = FileScanner::new(ScanOptions::new(dir.path()));
        let files = scanner.scan().await.unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["src/auth.ts", "src/utils.ts"]);
    }

    #[tokio::test]
    async fn hidden_files_skipped_unless_included() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".hidden.rs", "fn f() {}").await;
        write(&dir, "visible.rs", "fn g() {}").await;

        let scanner = FileScanner::new(ScanOptions::new(dir.path()));
        let files = scanner.scan().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "visible.rs");

        let scanner = FileScanner::new(ScanOptions::new(dir.path()).with_include_hidden(true));
        let files = scanner.scan().await.unwrap();
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn oversized_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "big.rs", &"x".repeat(100)).await;

        let scanner =
            FileScanner::new(ScanOptions::new(dir.path()).with_max_file_size(10));
        let files = scanner.scan().await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn project_root_differs_from_scan_root() {
        let dir = TempDir::new().unwrap();
        write(&dir, "pkg/src/main.rs", "fn main() {}").await;

        let options = ScanOptions::new(dir.path().join("pkg"))
            .with_project_root(dir.path());
        let scanner = FileScanner::new(options);
        let files = scanner.scan().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "pkg/src/main.rs");
    }

    #[tokio::test]
    async fn scan_fails_on_missing_root() {
        let err = FileScanner::new(ScanOptions::new("/does/not/exist/xyz"))
            .scan()
            .await
            .unwrap_err();
        assert!(matches!(err, ScannerError::InvalidRoot(_)));
    }

    #[tokio::test]
    async fn ignore_determinism_same_tree_same_set() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", "fn a() {}").await;
        write(&dir, "b.rs", "fn b() {}").await;
        write(&dir, ".gitignore", "c.rs\n").await;
        write(&dir, "c.rs", "fn c() {}").await;

        let scanner = FileScanner::new(ScanOptions::new(dir.path()));
        let first: Vec<String> = scanner
            .scan()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.relative_path)
            .collect();
        let second: Vec<String> = scanner
            .scan()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.relative_path)
            .collect();
        assert_eq!(first, second);
    }
}
