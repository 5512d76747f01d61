use context_lang::Language;
use std::path::PathBuf;

/// Options controlling one scan pass. Mirrors spec §4.1 inputs.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory the walk actually starts from.
    pub root_path: PathBuf,
    /// Directory relative paths are computed against. Defaults to
    /// `root_path`; lets a sub-directory be scanned while keeping
    /// `relativePath`s stable across the whole project.
    pub project_root: PathBuf,
    pub recursive: bool,
    pub include_hidden: bool,
    pub max_file_size: u64,
}

impl ScanOptions {
    #[must_use]
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let root_path = root_path.into();
        Self {
            project_root: root_path.clone(),
            root_path,
            recursive: true,
            include_hidden: false,
            max_file_size: 10 * 1024 * 1024,
        }
    }

    #[must_use]
    pub fn with_project_root(mut self, project_root: impl Into<PathBuf>) -> Self {
        self.project_root = project_root.into();
        self
    }

    #[must_use]
    pub const fn with_include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    #[must_use]
    pub const fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }
}

/// One scanned source file. Produced fresh every scan; never persisted
/// directly (spec §3 "discarded after the indexing cycle").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub language: Language,
    pub extension: String,
    pub content_hash: String,
    pub size: u64,
    pub mtime_ms: u64,
}
