//! Turns file content into semantically-scoped, token-bounded chunks
//! (spec §4.2 "Chunker").
//!
//! Chunking tries the AST route first: parse with `tree-sitter`, walk the
//! tree for declarations the per-language rule table cares about, and emit
//! one chunk per declaration (splitting further if a single declaration
//! still blows the token budget). Anything that can't be parsed — an
//! unsupported language, a grammar failure, or a file with zero matched
//! declarations — falls back to the size-bounded line splitter and is
//! chunked as undifferentiated `Block`/`File` content instead.

mod ast;
mod context_extract;
mod error;
mod rules;
mod splitter;

pub use error::{ChunkerError, Result};

use context_lang::Language;
use context_tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};

/// Default per-chunk token target used when chunking for embeddings.
pub const DEFAULT_MAX_TOKENS: usize = 512;
/// Default sliding-window overlap, in tokens, between adjacent fallback chunks.
pub const DEFAULT_OVERLAP_TOKENS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Function,
    Class,
    Method,
    Interface,
    Module,
    Block,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub file_path: String,
    pub content: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    pub chunk_type: ChunkType,
    pub name: Option<String>,
    pub parent_name: Option<String>,
    pub language: String,
    /// Up to 15 leading header lines (imports/package/comments) from the
    /// file this chunk came from; shared verbatim by every chunk in a file.
    pub context: String,
    pub token_count: usize,
}

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
    pub overlap_tokens: usize,
    pub absolute_max_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            absolute_max_tokens: context_tokenizer::ABSOLUTE_MAX_TOKENS,
        }
    }
}

impl ChunkerConfig {
    /// The tuning embeddings callers should use: the teacher's own
    /// indexing path reaches for this rather than hand-assembling a config.
    #[must_use]
    pub fn for_embeddings() -> Self {
        Self::default()
    }
}

pub struct Chunker {
    config: ChunkerConfig,
    tokenizer: Tokenizer,
}

impl Chunker {
    #[must_use]
    pub fn new(config: ChunkerConfig, tokenizer: Tokenizer) -> Self {
        Self { config, tokenizer }
    }

    /// Chunk `content` from `file_path`, written in `language`.
    #[must_use]
    pub fn chunk(&self, file_path: &str, content: &str, language: Language) -> Vec<Chunk> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return Vec::new();
        }
        let context = context_extract::extract_context(language, &lines);

        let units = if language.supports_ast() {
            ast::extract_units(language, content).unwrap_or_default()
        } else {
            Vec::new()
        };

        if units.is_empty() {
            return self.chunk_fallback(file_path, &lines, language, &context);
        }

        let mut chunks = Vec::new();
        for unit in units {
            self.emit_unit(file_path, &lines, language, &context, &unit, &mut chunks);
        }
        chunks
    }

    /// Same as [`Chunker::chunk`] but takes already-split lines; used by
    /// tests and callers that already hold the file as a `Vec<&str>`.
    #[must_use]
    pub fn chunk_str(&self, file_path: &str, lines: &[&str], language: Language) -> Vec<Chunk> {
        self.chunk(file_path, &lines.join("\n"), language)
    }

    fn emit_unit(
        &self,
        file_path: &str,
        lines: &[&str],
        language: Language,
        context: &str,
        unit: &ast::RawUnit,
        out: &mut Vec<Chunk>,
    ) {
        let start = unit.start_line.saturating_sub(1).min(lines.len().saturating_sub(1));
        let end = unit.end_line.saturating_sub(1).min(lines.len().saturating_sub(1));
        if start > end {
            return;
        }
        let slice = &lines[start..=end];
        let body = slice.join("\n");
        let tokens = self.tokenizer.count(&body);

        if tokens <= self.config.max_tokens {
            out.push(self.make_chunk(
                file_path,
                &body,
                unit.start_line,
                unit.end_line,
                unit.chunk_type,
                unit.name.clone(),
                unit.parent_name.clone(),
                language,
                context,
                tokens,
            ));
            return;
        }

        let windows = splitter::split_by_size(
            slice,
            self.config.max_tokens,
            self.config.overlap_tokens,
            &self.tokenizer,
        );
        let windows = splitter::enforce_absolute_max(
            slice,
            windows,
            self.config.absolute_max_tokens,
            self.config.overlap_tokens,
            &self.tokenizer,
        );

        for (k, window) in windows.iter().enumerate() {
            let part_slice = &slice[window.start..=window.end];
            let part_body = part_slice.join("\n");
            let part_tokens = self.tokenizer.count(&part_body);
            let name = unit.name.as_ref().map(|n| format!("{n}_part{}", k + 1));
            out.push(self.make_chunk(
                file_path,
                &part_body,
                unit.start_line + window.start,
                unit.start_line + window.end,
                unit.chunk_type,
                name,
                unit.parent_name.clone(),
                language,
                context,
                part_tokens,
            ));
        }
    }

    fn chunk_fallback(
        &self,
        file_path: &str,
        lines: &[&str],
        language: Language,
        context: &str,
    ) -> Vec<Chunk> {
        let whole = lines.join("\n");
        let total_tokens = self.tokenizer.count(&whole);
        if total_tokens <= self.config.max_tokens {
            return vec![self.make_chunk(
                file_path,
                &whole,
                1,
                lines.len(),
                ChunkType::File,
                None,
                None,
                language,
                context,
                total_tokens,
            )];
        }

        let windows = splitter::split_by_size(
            lines,
            self.config.max_tokens,
            self.config.overlap_tokens,
            &self.tokenizer,
        );
        let windows = splitter::enforce_absolute_max(
            lines,
            windows,
            self.config.absolute_max_tokens,
            self.config.overlap_tokens,
            &self.tokenizer,
        );

        windows
            .iter()
            .map(|w| {
                let slice = &lines[w.start..=w.end];
                let body = slice.join("\n");
                let tokens = self.tokenizer.count(&body);
                self.make_chunk(
                    file_path,
                    &body,
                    w.start + 1,
                    w.end + 1,
                    ChunkType::Block,
                    None,
                    None,
                    language,
                    context,
                    tokens,
                )
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn make_chunk(
        &self,
        file_path: &str,
        content: &str,
        start_line: usize,
        end_line: usize,
        chunk_type: ChunkType,
        name: Option<String>,
        parent_name: Option<String>,
        language: Language,
        context: &str,
        token_count: usize,
    ) -> Chunk {
        let chunk_id = chunk_id(file_path, start_line, content);
        Chunk {
            chunk_id,
            file_path: file_path.to_string(),
            content: content.to_string(),
            start_line,
            end_line,
            chunk_type,
            name,
            parent_name,
            language: language.as_str().to_string(),
            context: context.to_string(),
            token_count,
        }
    }
}

/// Deterministic chunk identifier: same file/position/content always
/// produces the same id, so re-chunking an unchanged file is a no-op
/// against the vector store (spec §4.2, §6).
fn chunk_id(file_path: &str, start_line: usize, content: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(file_path.as_bytes());
    hasher.update(b":");
    hasher.update(start_line.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(content.as_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunker() -> Chunker {
        Chunker::new(ChunkerConfig::default(), Tokenizer::heuristic())
    }

    #[test]
    fn rust_class_and_methods_each_get_a_chunk() {
        let src = r#"use std::fmt;

struct AuthService {
    name: String,
}

impl AuthService {
    fn login(&self) -> bool {
        true
    }

    fn logout(&self) -> bool {
        false
    }
}

fn util_helper() -> i32 {
    42
}
"#;
        let chunks = chunker().chunk("auth.rs", src, Language::Rust);
        // struct (Class) + impl block (Class) + login (Method) + logout (Method) + util_helper (Function)
        assert!(chunks.len() >= 4, "expected at least 4 chunks, got {}", chunks.len());
        let methods: Vec<_> = chunks.iter().filter(|c| c.chunk_type == ChunkType::Method).collect();
        assert_eq!(methods.len(), 2);
        assert!(methods.iter().all(|m| m.parent_name.as_deref() == Some("AuthService")));
        assert!(chunks.iter().all(|c| c.context.contains("use std::fmt;")));
    }

    #[test]
    fn unsupported_language_falls_back_to_size_split() {
        let src = "some\nplain\ntext\nfile\n";
        let chunks = chunker().chunk("notes.txt", src, Language::Unknown);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::File);
    }

    #[test]
    fn oversized_function_is_split_with_part_suffix() {
        let body: String = (0..500).map(|i| format!("    let x{i} = {i};\n")).collect();
        let src = format!("fn huge() {{\n{body}}}\n");
        let cfg = ChunkerConfig {
            max_tokens: 50,
            overlap_tokens: 5,
            absolute_max_tokens: context_tokenizer::ABSOLUTE_MAX_TOKENS,
        };
        let chunker = Chunker::new(cfg, Tokenizer::heuristic());
        let chunks = chunker.chunk("huge.rs", &src, Language::Rust);
        assert!(chunks.len() > 1);
        assert!(chunks[0].name.as_deref().unwrap().starts_with("huge_part"));
    }

    #[test]
    fn chunk_id_is_deterministic() {
        let a = chunk_id("f.rs", 1, "fn a() {}");
        let b = chunk_id("f.rs", 1, "fn a() {}");
        let c = chunk_id("f.rs", 2, "fn a() {}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }
}
