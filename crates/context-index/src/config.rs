//! Environment-driven configuration (spec §6 "Environment inputs", §11
//! ambient stack). Read once at startup by whatever binary embeds this
//! crate; library code never reaches into `std::env` outside this module.

use crate::error::{IndexError, Result};
use std::path::PathBuf;

/// Default on-disk layout root relative to a project's `root_path` (spec §6
/// "On-disk layout"), overridden by `STORAGE_PATH` when set.
pub const DEFAULT_STORAGE_DIR_NAME: &str = ".memorybank";

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub embedding: EmbeddingConfig,
    pub storage_path: Option<PathBuf>,
    pub max_tokens: usize,
    pub chunk_overlap_tokens: usize,
    pub workspace_root: Option<PathBuf>,
}

impl EngineConfig {
    /// Build configuration from environment variables, failing loudly if
    /// `EMBEDDING_API_KEY` is absent (spec §6: "Absent API key causes a hard
    /// startup failure").
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("EMBEDDING_API_KEY")
            .map_err(|_| IndexError::Config("EMBEDDING_API_KEY is not set".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(IndexError::Config("EMBEDDING_API_KEY is empty".to_string()));
        }

        let api_url = std::env::var("EMBEDDING_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string());
        let model = std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());
        let dimensions = env_usize("EMBEDDING_DIMENSIONS", 1536)?;
        let max_tokens = env_usize("MAX_TOKENS", context_chunker::DEFAULT_MAX_TOKENS)?;
        let chunk_overlap_tokens = env_usize("CHUNK_OVERLAP_TOKENS", context_chunker::DEFAULT_OVERLAP_TOKENS)?;
        let storage_path = std::env::var("STORAGE_PATH").ok().map(PathBuf::from);
        let workspace_root = std::env::var("WORKSPACE_ROOT").ok().map(PathBuf::from);

        Ok(Self {
            embedding: EmbeddingConfig {
                api_url,
                api_key,
                model,
                dimensions,
            },
            storage_path,
            max_tokens,
            chunk_overlap_tokens,
            workspace_root,
        })
    }

    /// Where on-disk index state lives for a given project root: the
    /// `STORAGE_PATH` override if set, otherwise `<root>/.memorybank`.
    #[must_use]
    pub fn storage_dir(&self, project_root: &std::path::Path) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| project_root.join(DEFAULT_STORAGE_DIR_NAME))
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| IndexError::Config(format!("{key} must be a positive integer, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    // Environment variable mutation races across tests in the same process;
    // serialize the handful of tests that touch it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "EMBEDDING_API_KEY",
            "EMBEDDING_API_URL",
            "EMBEDDING_MODEL",
            "EMBEDDING_DIMENSIONS",
            "MAX_TOKENS",
            "CHUNK_OVERLAP_TOKENS",
            "STORAGE_PATH",
            "WORKSPACE_ROOT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_api_key_is_a_hard_failure() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = EngineConfig::from_env().unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn defaults_fill_in_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("EMBEDDING_API_KEY", "sk-test");
        let cfg = EngineConfig::from_env().unwrap();
        assert_eq!(cfg.embedding.dimensions, 1536);
        assert_eq!(cfg.max_tokens, context_chunker::DEFAULT_MAX_TOKENS);
        clear_env();
    }

    #[test]
    fn storage_dir_defaults_under_project_root() {
        let cfg = EngineConfig {
            embedding: EmbeddingConfig {
                api_url: String::new(),
                api_key: "k".to_string(),
                model: "m".to_string(),
                dimensions: 1536,
            },
            storage_path: None,
            max_tokens: 512,
            chunk_overlap_tokens: 50,
            workspace_root: None,
        };
        let dir = cfg.storage_dir(std::path::Path::new("/tmp/proj"));
        assert_eq!(dir, std::path::PathBuf::from("/tmp/proj/.memorybank"));
    }
}
