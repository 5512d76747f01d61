//! Token counting for chunk size enforcement.
//!
//! The tokenizer used here must be the same family as the embedding model's
//! tokenizer (BPE-compatible) so that `tokenCount` bounds actually protect
//! the remote model's context window (§9 "Tokenization parity"). When a real
//! tokenizer vocabulary is unavailable, a conservative heuristic is used
//! instead, and the recommended token budget is narrowed to compensate for
//! its tendency to undercount dense code.

use std::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenizerError>;

/// Hard ceiling from spec §3: the embedding model's context window (8192)
/// minus a safety margin, enforced on every produced chunk.
pub const ABSOLUTE_MAX_TOKENS: usize = 7500;

/// Reduced budget used when falling back to the character-based heuristic,
/// since it can undercount BPE tokens for dense/punctuation-heavy code.
pub const HEURISTIC_MAX_TOKENS: usize = 6000;

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load tokenizer from {0}: {1}")]
    Load(String, String),
}

enum Backend {
    Bpe(tokenizers::Tokenizer),
    Heuristic,
}

/// Counts tokens in source text.
pub struct Tokenizer {
    backend: Backend,
}

impl Tokenizer {
    /// Load a real BPE tokenizer from a `tokenizer.json` file (HuggingFace
    /// `tokenizers` format), matching the configured embedding model.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path_ref)
            .map_err(|e| TokenizerError::Load(path_ref.display().to_string(), e.to_string()))?;
        Ok(Self {
            backend: Backend::Bpe(inner),
        })
    }

    /// Character-count heuristic, used when no tokenizer vocabulary is
    /// configured. Callers should prefer `recommended_absolute_max` over the
    /// plain `ABSOLUTE_MAX_TOKENS` constant while this backend is active.
    #[must_use]
    pub const fn heuristic() -> Self {
        Self {
            backend: Backend::Heuristic,
        }
    }

    /// Load from the `TOKENIZER_PATH` environment variable if set and
    /// loadable, otherwise fall back to the heuristic (logged once).
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("TOKENIZER_PATH") {
            Ok(path) if !path.trim().is_empty() => match Self::from_file(&path) {
                Ok(tok) => return tok,
                Err(e) => {
                    log::warn!("TOKENIZER_PATH set but failed to load ({e}); using heuristic");
                }
            },
            _ => {}
        }
        Self::heuristic()
    }

    #[must_use]
    pub const fn is_heuristic(&self) -> bool {
        matches!(self.backend, Backend::Heuristic)
    }

    /// The token budget this backend's counts should be validated against.
    /// Narrower than `ABSOLUTE_MAX_TOKENS` while running on the heuristic.
    #[must_use]
    pub const fn recommended_absolute_max(&self) -> usize {
        match self.backend {
            Backend::Bpe(_) => ABSOLUTE_MAX_TOKENS,
            Backend::Heuristic => HEURISTIC_MAX_TOKENS,
        }
    }

    /// Count tokens in `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match &self.backend {
            Backend::Bpe(tokenizer) => tokenizer
                .encode(text, false)
                .map(|enc| enc.len())
                .unwrap_or_else(|e| {
                    log::warn!("tokenizer encode failed ({e}); falling back to heuristic count");
                    heuristic_count(text)
                }),
            Backend::Heuristic => heuristic_count(text),
        }
    }
}

/// Roughly 1 token per 4 characters, the standard order-of-magnitude
/// estimate for BPE tokenizers over English/code text.
fn heuristic_count(text: &str) -> usize {
    let chars = text.chars().count();
    chars.div_ceil(4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn heuristic_counts_nonzero_for_nonempty_text() {
        let tok = Tokenizer::heuristic();
        assert_eq!(tok.count(""), 0);
        assert!(tok.count("fn main() {}") > 0);
    }

    #[test]
    fn heuristic_narrows_budget() {
        let tok = Tokenizer::heuristic();
        assert!(tok.is_heuristic());
        assert_eq!(tok.recommended_absolute_max(), HEURISTIC_MAX_TOKENS);
        assert!(HEURISTIC_MAX_TOKENS < ABSOLUTE_MAX_TOKENS);
    }

    #[test]
    fn heuristic_is_monotonic_in_length() {
        let tok = Tokenizer::heuristic();
        let short = tok.count("abc");
        let long = tok.count(&"abc".repeat(100));
        assert!(long > short);
    }
}
