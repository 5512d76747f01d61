//! AST walking: turns a parsed tree into candidate semantic units.
//!
//! Grammars are loaded lazily on first use and cached per worker thread
//! (spec §9 "load language grammars lazily on first use; cache language
//! handles"), since `tree_sitter::Parser` is not `Sync`.

use crate::error::{ChunkerError, Result};
use crate::rules;
use crate::ChunkType;
use context_lang::Language;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<&'static str, tree_sitter::Parser>> = RefCell::new(HashMap::new());
}

#[derive(Debug, Clone)]
pub(crate) struct RawUnit {
    pub start_line: usize,
    pub end_line: usize,
    pub chunk_type: ChunkType,
    pub name: Option<String>,
    pub parent_name: Option<String>,
}

/// Parse `source` as `language` and extract candidate semantic units. An
/// `Err` here (unsupported language, parser failure, or grammar missing)
/// means "use the fallback splitter" to the caller — both are treated
/// identically per spec §4.2.
pub(crate) fn extract_units(language: Language, source: &str) -> Result<Vec<RawUnit>> {
    let tree = parse(language, source)?;
    let root = tree.root_node();

    let mut units = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    walk(root, language, source.as_bytes(), &mut stack, &mut units);
    Ok(units)
}

fn parse(language: Language, source: &str) -> Result<tree_sitter::Tree> {
    let grammar = rules::tree_sitter_language(language)?;
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = parsers.entry(language.as_str()).or_insert_with(|| {
            let mut p = tree_sitter::Parser::new();
            p.set_language(&grammar)
                .expect("grammar was just validated as loadable");
            p
        });
        // `set_language` is idempotent and cheap; re-assert in case this
        // thread's cached parser was first built for a different language
        // under the same cache key (cannot happen with `as_str()` keys, but
        // keeps the cache correct if the rule table ever changes).
        parser
            .set_language(&grammar)
            .map_err(|_| ChunkerError::ParseFailed(language.as_str().to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ChunkerError::ParseFailed(language.as_str().to_string()))
    })
}

fn walk(
    node: tree_sitter::Node,
    language: Language,
    source: &[u8],
    containers: &mut Vec<String>,
    out: &mut Vec<RawUnit>,
) {
    let kind = node.kind();
    let is_container = rules::container_kinds(language).contains(&kind);
    let mapped = rules::top_level_kinds(language)
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, t)| *t);

    let mut pushed = false;
    if let Some(mapped_type) = mapped {
        let name = extract_name(node, source);

        let (chunk_type, parent_name) = if mapped_type == ChunkType::Method {
            (ChunkType::Method, containers.last().cloned())
        } else if !is_container && !containers.is_empty() {
            (ChunkType::Method, containers.last().cloned())
        } else {
            (mapped_type, None)
        };

        out.push(RawUnit {
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            chunk_type,
            name: name.clone(),
            parent_name,
        });

        if is_container {
            containers.push(name.unwrap_or_else(|| kind.to_string()));
            pushed = true;
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, language, source, containers, out);
    }

    if pushed {
        containers.pop();
    }
}

fn extract_name(node: tree_sitter::Node, source: &[u8]) -> Option<String> {
    for field in rules::NAME_FIELDS {
        if let Some(child) = node.child_by_field_name(field) {
            if let Ok(text) = child.utf8_text(source) {
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
    }
    None
}
