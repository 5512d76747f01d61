//! Header context extraction (spec §4.2): up to 15 leading lines matching
//! language-specific import/package/comment patterns, computed once per
//! file and attached to every chunk produced from it.

use context_lang::Language;

const MAX_CONTEXT_LINES: usize = 15;

#[must_use]
pub(crate) fn extract_context(language: Language, lines: &[&str]) -> String {
    let import_patterns = language.import_patterns();
    let comment_patterns = language.comment_prefixes();

    let mut collected = Vec::with_capacity(MAX_CONTEXT_LINES);
    for line in lines {
        if collected.len() >= MAX_CONTEXT_LINES {
            break;
        }
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        let is_header_line = import_patterns.iter().any(|p| trimmed.starts_with(p))
            || comment_patterns.iter().any(|p| trimmed.starts_with(p));
        if is_header_line {
            collected.push(*line);
        } else if collected.is_empty() {
            // Keep scanning past a leading blank/shebang/docstring opener
            // before giving up, but stop once we hit real code with no
            // header lines collected yet.
            if trimmed.starts_with("#!") {
                continue;
            }
            break;
        } else {
            break;
        }
    }

    collected.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_rust_use_lines() {
        let lines = vec!["use std::fmt;", "use crate::error::Result;", "", "fn main() {}"];
        let ctx = extract_context(Language::Rust, &lines);
        assert_eq!(ctx, "use std::fmt;\nuse crate::error::Result;");
    }

    #[test]
    fn stops_at_first_non_header_line() {
        let lines = vec!["import os", "x = 1", "import sys"];
        let ctx = extract_context(Language::Python, &lines);
        assert_eq!(ctx, "import os");
    }

    #[test]
    fn caps_at_fifteen_lines() {
        let lines: Vec<&str> = std::iter::repeat("use std::io;").take(30).collect();
        let ctx = extract_context(Language::Rust, &lines);
        assert_eq!(ctx.lines().count(), MAX_CONTEXT_LINES);
    }
}
