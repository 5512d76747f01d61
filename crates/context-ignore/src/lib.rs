//! Gitignore-compatible ignore pattern engine.
//!
//! Compiles a layered set of ignore patterns — a hardcoded baseline plus
//! `.gitignore`/`.memoryignore` files discovered while walking a tree — and
//! decides whether a given relative path should be pruned from a scan.
//!
//! Layers are evaluated root-to-leaf; within a layer, patterns are evaluated
//! in file order and the last match wins (standard gitignore semantics,
//! including `!` negation). Directory matches are expected to prune
//! traversal entirely, so nested ignore files below an ignored directory are
//! never consulted by a well-behaved caller.

mod pattern;

use globset::Error as GlobError;
use pattern::IgnorePattern;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IgnoreError>;

#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("invalid ignore pattern {0:?}: {1}")]
    InvalidPattern(String, GlobError),

    #[error("io error reading ignore file {0}: {1}")]
    Io(PathBuf, std::io::Error),
}

/// Directories and files ignored regardless of any `.gitignore`/`.memoryignore`.
pub const BASELINE_PATTERNS: &[&str] = &[
    ".git/",
    ".memorybank/",
    ".context-finder/",
    "node_modules/",
    "target/",
    "dist/",
    "build/",
    "out/",
    ".next/",
    ".venv/",
    "venv/",
    "__pycache__/",
    ".pytest_cache/",
    ".mypy_cache/",
    "vendor/",
    ".idea/",
    ".vscode/",
    "*.pyc",
    "*.pyo",
];

/// One ignore-file layer, scoped to a directory relative to the scan root.
struct Layer {
    /// Forward-slash relative path of the directory this layer applies to,
    /// `""` for the baseline/root layer.
    base: String,
    patterns: Vec<IgnorePattern>,
}

/// A layered, incrementally-extendable ignore engine.
pub struct IgnoreEngine {
    layers: Vec<Layer>,
}

impl IgnoreEngine {
    /// Build the baseline layer only (no `.gitignore`/`.memoryignore` yet).
    pub fn baseline() -> Result<Self> {
        let patterns = compile_all(BASELINE_PATTERNS.iter().copied())?;
        Ok(Self {
            layers: vec![Layer {
                base: String::new(),
                patterns,
            }],
        })
    }

    /// Build the engine for a scan root: baseline plus the root's
    /// `.gitignore` and `.memoryignore`, if present.
    pub fn for_root(root: &Path) -> Result<Self> {
        let mut engine = Self::baseline()?;
        engine.add_layer_from_dir(root, "")?;
        Ok(engine)
    }

    /// Load `.gitignore`/`.memoryignore` from `dir` (a real filesystem path)
    /// and push a layer scoped to `rel` (forward-slash path of `dir`
    /// relative to the scan root, `""` for the root itself).
    pub fn add_layer_from_dir(&mut self, dir: &Path, rel: &str) -> Result<()> {
        let mut patterns = Vec::new();
        for name in [".gitignore", ".memoryignore"] {
            let file = dir.join(name);
            if !file.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&file).map_err(|e| IgnoreError::Io(file.clone(), e))?;
            patterns.extend(compile_all(content.lines())?);
        }
        if !patterns.is_empty() {
            self.layers.push(Layer {
                base: rel.trim_end_matches('/').to_string(),
                patterns,
            });
        }
        Ok(())
    }

    /// Number of layers currently loaded (baseline counts as one). Callers
    /// walking a tree depth-first use this together with `truncate_layers`
    /// to scope a nested ignore file to its subtree only.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Drop layers beyond `len`, used to pop a directory's nested ignore
    /// file once traversal backs out of that subtree.
    pub fn truncate_layers(&mut self, len: usize) {
        self.layers.truncate(len);
    }

    /// Decide whether `rel_path` (forward-slash, relative to the scan root,
    /// no leading slash) should be ignored. `is_dir` affects directory-only
    /// patterns (trailing `/` in the source file).
    #[must_use]
    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        let rel_path = rel_path.trim_end_matches('/');
        let mut ignored = false;

        for layer in &self.layers {
            let Some(local) = strip_base(rel_path, &layer.base) else {
                continue;
            };
            for pattern in &layer.patterns {
                if pattern.matches(local, is_dir) {
                    ignored = !pattern.negated;
                }
            }
        }

        ignored
    }
}

/// Strip `base` (a layer's scope, possibly empty) from `path`, returning the
/// path relative to that layer, or `None` if `path` is not under `base`.
fn strip_base<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(path);
    }
    path.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/').or(Some(rest)))
        .filter(|rest| !rest.is_empty() || path == base)
}

fn compile_all<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Vec<IgnorePattern>> {
    let mut out = Vec::new();
    for raw in lines {
        let line = raw.trim_end();
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        out.push(IgnorePattern::compile(line)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn baseline_ignores_git_and_node_modules() {
        let engine = IgnoreEngine::baseline().unwrap();
        assert!(engine.is_ignored(".git", true));
        assert!(engine.is_ignored("node_modules", true));
        assert!(!engine.is_ignored("src", true));
    }

    #[test]
    fn root_gitignore_is_applied() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "node_modules/\n*.log\n").unwrap();
        let engine = IgnoreEngine::for_root(dir.path()).unwrap();
        assert!(engine.is_ignored("node_modules", true));
        assert!(engine.is_ignored("debug.log", false));
        assert!(!engine.is_ignored("src/main.rs", false));
    }

    #[test]
    fn negation_unignores_specific_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*.log\n!keep.log\n").unwrap();
        let engine = IgnoreEngine::for_root(dir.path()).unwrap();
        assert!(engine.is_ignored("debug.log", false));
        assert!(!engine.is_ignored("keep.log", false));
    }

    #[test]
    fn nested_layer_scopes_to_its_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/.gitignore"), "local.tmp\n").unwrap();
        let mut engine = IgnoreEngine::for_root(dir.path()).unwrap();
        engine
            .add_layer_from_dir(&dir.path().join("sub"), "sub")
            .unwrap();

        assert!(engine.is_ignored("sub/local.tmp", false));
        assert!(!engine.is_ignored("local.tmp", false));
    }

    #[test]
    fn memoryignore_is_merged_with_gitignore() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        std::fs::write(dir.path().join(".memoryignore"), "secrets/\n").unwrap();
        let engine = IgnoreEngine::for_root(dir.path()).unwrap();
        assert!(engine.is_ignored("debug.log", false));
        assert!(engine.is_ignored("secrets", true));
    }

    #[test]
    fn double_star_recursive_match() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "**/fixtures/**\n").unwrap();
        let engine = IgnoreEngine::for_root(dir.path()).unwrap();
        assert!(engine.is_ignored("a/b/fixtures/data.json", false));
    }

    #[test]
    fn strip_base_rejects_sibling_paths() {
        assert_eq!(strip_base("sub/file", "sub"), Some("file"));
        assert_eq!(strip_base("subling/file", "sub"), None);
        assert_eq!(strip_base("file", ""), Some("file"));
    }
}
