//! Language classification: map a filename or extension to a language tag.
//!
//! This crate is deliberately dependency-free. It knows nothing about AST
//! grammars (that lives in `context-chunker`, which owns grammar loading);
//! it only answers "what language tag does this path have" and "is this
//! path a code file at all".

use std::path::Path;

/// Supported language tags. `Unknown` is a closed-set member, not an error:
/// a file can be `Unknown` and still be indexed if its name is on the
/// extensionless code-file allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Jsx,
    Go,
    Java,
    Kotlin,
    CSharp,
    C,
    Cpp,
    Ruby,
    Php,
    Scala,
    Swift,
    Markdown,
    Yaml,
    Json,
    Config,
    Sql,
    Shell,
    Terraform,
    Html,
    Css,
    Unknown,
}

impl Language {
    /// Detect language from a bare extension (no leading dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Self::Rust,
            "py" | "pyw" | "pyi" => Self::Python,
            "js" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "jsx" => Self::Jsx,
            "go" => Self::Go,
            "java" => Self::Java,
            "kt" | "kts" => Self::Kotlin,
            "cs" => Self::CSharp,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" | "c++" => Self::Cpp,
            "rb" => Self::Ruby,
            "php" | "phtml" => Self::Php,
            "scala" | "sc" => Self::Scala,
            "swift" => Self::Swift,
            "md" | "mdx" | "rst" | "adoc" => Self::Markdown,
            "yaml" | "yml" => Self::Yaml,
            "json" | "jsonc" => Self::Json,
            "toml" | "ini" | "cfg" | "conf" | "properties" | "env" | "gradle" => Self::Config,
            "sql" | "dbml" => Self::Sql,
            "sh" | "bash" | "zsh" | "fish" | "ps1" | "bat" | "cmd" => Self::Shell,
            "tf" | "tfvars" | "hcl" => Self::Terraform,
            "html" | "htm" => Self::Html,
            "css" | "scss" | "less" => Self::Css,
            _ => Self::Unknown,
        }
    }

    /// Detect language from a path, falling back to well-known extensionless
    /// filenames (`Dockerfile`, `Makefile`, ...).
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let lang = Self::from_extension(ext);
            if lang != Self::Unknown {
                return lang;
            }
        }
        match path.file_name().and_then(|n| n.to_str()) {
            Some("Dockerfile") | Some("Containerfile") => Self::Shell,
            Some("Makefile") | Some("makefile") | Some("GNUmakefile") => Self::Shell,
            Some("Rakefile") | Some("Gemfile") => Self::Ruby,
            Some("Vagrantfile") => Self::Ruby,
            Some("BUILD") | Some("WORKSPACE") => Self::Shell,
            Some("CMakeLists.txt") => Self::Shell,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Jsx => "jsx",
            Self::Go => "go",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::CSharp => "csharp",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Scala => "scala",
            Self::Swift => "swift",
            Self::Markdown => "markdown",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Config => "config",
            Self::Sql => "sql",
            Self::Shell => "shell",
            Self::Terraform => "terraform",
            Self::Html => "html",
            Self::Css => "css",
            Self::Unknown => "unknown",
        }
    }

    /// Languages for which `context-chunker` has an AST grammar and a
    /// semantic-node-types table. Kept in sync with that crate's grammar
    /// registry by the `supports_ast` property test below.
    #[must_use]
    pub const fn supports_ast(self) -> bool {
        matches!(
            self,
            Self::Rust
                | Self::Python
                | Self::JavaScript
                | Self::TypeScript
                | Self::Tsx
                | Self::Jsx
                | Self::Go
                | Self::Java
                | Self::Kotlin
                | Self::CSharp
                | Self::C
                | Self::Cpp
                | Self::Ruby
                | Self::Php
                | Self::Scala
                | Self::Swift
        )
    }

    /// Leading "header" comment/import prefixes used by the chunker's
    /// context extraction.
    #[must_use]
    pub fn import_patterns(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["use ", "extern crate ", "mod "],
            Self::Python => &["import ", "from "],
            Self::JavaScript | Self::TypeScript | Self::Tsx | Self::Jsx => {
                &["import ", "export ", "require("]
            }
            Self::Go => &["import ", "package "],
            Self::Java | Self::Kotlin | Self::Scala => &["import ", "package "],
            Self::CSharp => &["using ", "namespace "],
            Self::Ruby => &["require ", "require_relative ", "include "],
            Self::C | Self::Cpp => &["#include ", "using namespace "],
            Self::Php => &["use ", "require ", "require_once ", "namespace "],
            Self::Swift => &["import "],
            _ => &[],
        }
    }

    /// Leading comment markers, used to recognise header comment blocks.
    #[must_use]
    pub fn comment_prefixes(self) -> &'static [&'static str] {
        match self {
            Self::Rust
            | Self::JavaScript
            | Self::TypeScript
            | Self::Tsx
            | Self::Jsx
            | Self::Go
            | Self::Java
            | Self::Kotlin
            | Self::CSharp
            | Self::C
            | Self::Cpp
            | Self::Swift
            | Self::Scala => &["//", "/*", "///", "/**"],
            Self::Python | Self::Ruby => &["#", "\"\"\"", "'''"],
            Self::Php => &["//", "#", "/*"],
            Self::Markdown => &[">", "#"],
            Self::Yaml | Self::Config | Self::Shell => &["#"],
            Self::Json => &["//"],
            Self::Sql => &["--", "/*"],
            Self::Terraform => &["#", "//"],
            Self::Html | Self::Css => &["<!--", "/*"],
            Self::Unknown => &[],
        }
    }
}

/// Extensionless filenames that are still code files and should be scanned
/// even though `Language::from_path` may tag them `Unknown` (e.g. `rakefile`
/// variants we don't special-case above, or bespoke build scripts).
pub const EXTENSIONLESS_CODE_FILES: &[&str] = &[
    "Dockerfile",
    "Containerfile",
    "Makefile",
    "makefile",
    "GNUmakefile",
    "Rakefile",
    "Gemfile",
    "Vagrantfile",
    "BUILD",
    "BUILD.bazel",
    "WORKSPACE",
    "CMakeLists.txt",
];

/// Extensions that are never code, even if nothing else excludes them
/// (binary/media/archive formats). Checked before the size limit.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg", "pdf", "zip", "tar", "gz", "bz2",
    "xz", "7z", "rar", "exe", "dll", "so", "dylib", "a", "lib", "o", "obj", "class", "jar", "war",
    "wasm", "bin", "dat", "db", "sqlite", "sqlite3", "woff", "woff2", "ttf", "otf", "eot", "mp3",
    "mp4", "wav", "avi", "mov", "mkv", "lock",
];

/// Whether `path` should be retained by the scanner's code-file filter,
/// independent of size: either its extension maps to a known language, or
/// its leaf name is on the extensionless allowlist, and its extension is not
/// on the binary blocklist.
#[must_use]
pub fn is_code_path(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str());

    if let Some(ext) = ext {
        let ext_lower = ext.to_lowercase();
        if BINARY_EXTENSIONS.contains(&ext_lower.as_str()) {
            return false;
        }
    }

    if Language::from_path(path) != Language::Unknown {
        return true;
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| EXTENSIONLESS_CODE_FILES.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extension_mapping() {
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("RS"), Language::Rust);
        assert_eq!(Language::from_extension("tsx"), Language::Tsx);
        assert_eq!(Language::from_extension("kt"), Language::Kotlin);
        assert_eq!(Language::from_extension("unknownext"), Language::Unknown);
    }

    #[test]
    fn extensionless_names() {
        assert_eq!(Language::from_path("Dockerfile"), Language::Shell);
        assert_eq!(Language::from_path("Gemfile"), Language::Ruby);
        assert_eq!(Language::from_path("no_extension_here"), Language::Unknown);
    }

    #[test]
    fn ast_support_matches_named_set() {
        for lang in [
            Language::Rust,
            Language::Python,
            Language::TypeScript,
            Language::Java,
            Language::Kotlin,
            Language::Go,
            Language::CSharp,
            Language::C,
            Language::Cpp,
            Language::Ruby,
            Language::Php,
            Language::Scala,
            Language::Swift,
        ] {
            assert!(lang.supports_ast(), "{lang:?} should support AST parsing");
        }
        assert!(!Language::Markdown.supports_ast());
        assert!(!Language::Unknown.supports_ast());
    }

    #[test]
    fn is_code_path_allows_extensionless_and_blocks_binary() {
        assert!(is_code_path("src/main.rs"));
        assert!(is_code_path("Dockerfile"));
        assert!(!is_code_path("photo.png"));
        assert!(!is_code_path("random_data_file"));
    }
}
