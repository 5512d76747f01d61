//! Per-language AST rules: which grammar to load, and which node kinds are
//! "semantic units" worth turning into their own chunk.

use crate::error::{ChunkerError, Result};
use crate::ChunkType;
use context_lang::Language;

/// Load the `tree-sitter` grammar for `language`, or `Err` if none is
/// registered (treated identically to a parse failure — both trigger the
/// size-bounded fallback per spec §4.2).
pub(crate) fn tree_sitter_language(language: Language) -> Result<tree_sitter::Language> {
    match language {
        Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
        Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript | Language::Jsx => Ok(tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        Language::Go => Ok(tree_sitter_go::LANGUAGE.into()),
        Language::Java => Ok(tree_sitter_java::LANGUAGE.into()),
        Language::Kotlin => Ok(tree_sitter_kotlin::LANGUAGE.into()),
        Language::C => Ok(tree_sitter_c::LANGUAGE.into()),
        Language::Cpp => Ok(tree_sitter_cpp::LANGUAGE.into()),
        Language::CSharp => Ok(tree_sitter_c_sharp::LANGUAGE.into()),
        Language::Ruby => Ok(tree_sitter_ruby::LANGUAGE.into()),
        Language::Php => Ok(tree_sitter_php::LANGUAGE_PHP.into()),
        Language::Scala => Ok(tree_sitter_scala::LANGUAGE.into()),
        Language::Swift => Ok(tree_sitter_swift::LANGUAGE.into()),
        other => Err(ChunkerError::unsupported_language(other.as_str())),
    }
}

/// Node kinds that become their own chunk when encountered, mapped to the
/// chunk type they produce. Kinds not listed here are only ever traversed
/// into, never chunked on their own.
pub(crate) fn top_level_kinds(language: Language) -> &'static [(&'static str, ChunkType)] {
    match language {
        Language::Rust => &[
            ("function_item", ChunkType::Function),
            ("struct_item", ChunkType::Class),
            ("trait_item", ChunkType::Interface),
            ("enum_item", ChunkType::Class),
            ("mod_item", ChunkType::Module),
            ("impl_item", ChunkType::Class),
        ],
        Language::Python => &[
            ("function_definition", ChunkType::Function),
            ("class_definition", ChunkType::Class),
        ],
        Language::JavaScript | Language::Jsx => &[
            ("function_declaration", ChunkType::Function),
            ("class_declaration", ChunkType::Class),
            ("method_definition", ChunkType::Method),
        ],
        Language::TypeScript | Language::Tsx => &[
            ("function_declaration", ChunkType::Function),
            ("class_declaration", ChunkType::Class),
            ("method_definition", ChunkType::Method),
            ("interface_declaration", ChunkType::Interface),
            ("enum_declaration", ChunkType::Class),
        ],
        Language::Go => &[
            ("function_declaration", ChunkType::Function),
            ("method_declaration", ChunkType::Method),
            ("type_declaration", ChunkType::Class),
        ],
        Language::Java => &[
            ("class_declaration", ChunkType::Class),
            ("interface_declaration", ChunkType::Interface),
            ("enum_declaration", ChunkType::Class),
            ("method_declaration", ChunkType::Method),
            ("constructor_declaration", ChunkType::Method),
        ],
        Language::Kotlin => &[
            ("class_declaration", ChunkType::Class),
            ("object_declaration", ChunkType::Class),
            ("function_declaration", ChunkType::Function),
        ],
        Language::CSharp => &[
            ("class_declaration", ChunkType::Class),
            ("interface_declaration", ChunkType::Interface),
            ("struct_declaration", ChunkType::Class),
            ("enum_declaration", ChunkType::Class),
            ("method_declaration", ChunkType::Method),
            ("constructor_declaration", ChunkType::Method),
        ],
        Language::C => &[("function_definition", ChunkType::Function)],
        Language::Cpp => &[
            ("function_definition", ChunkType::Function),
            ("class_specifier", ChunkType::Class),
            ("struct_specifier", ChunkType::Class),
            ("namespace_definition", ChunkType::Module),
        ],
        Language::Ruby => &[
            ("method", ChunkType::Function),
            ("singleton_method", ChunkType::Method),
            ("class", ChunkType::Class),
            ("module", ChunkType::Module),
        ],
        Language::Php => &[
            ("function_definition", ChunkType::Function),
            ("method_declaration", ChunkType::Method),
            ("class_declaration", ChunkType::Class),
            ("interface_declaration", ChunkType::Interface),
            ("trait_declaration", ChunkType::Class),
        ],
        Language::Scala => &[
            ("class_definition", ChunkType::Class),
            ("object_definition", ChunkType::Class),
            ("trait_definition", ChunkType::Interface),
            ("function_definition", ChunkType::Function),
        ],
        Language::Swift => &[
            ("function_declaration", ChunkType::Function),
            ("class_declaration", ChunkType::Class),
            ("struct_declaration", ChunkType::Class),
            ("protocol_declaration", ChunkType::Interface),
            ("enum_declaration", ChunkType::Class),
        ],
        _ => &[],
    }
}

/// Node kinds that act as a "container": a matched node kind found nested
/// inside one of these is reclassified as `ChunkType::Method` with
/// `parent_name` set to the container's name, instead of its default type.
pub(crate) fn container_kinds(language: Language) -> &'static [&'static str] {
    match language {
        Language::Rust => &["impl_item", "trait_item"],
        Language::Python => &["class_definition"],
        Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => {
            &["class_declaration"]
        }
        Language::Java => &["class_declaration", "interface_declaration", "enum_declaration"],
        Language::Kotlin => &["class_declaration", "object_declaration"],
        Language::CSharp => &["class_declaration", "interface_declaration", "struct_declaration"],
        Language::Cpp => &["class_specifier", "struct_specifier"],
        Language::Ruby => &["class", "module"],
        Language::Php => &["class_declaration", "interface_declaration", "trait_declaration"],
        Language::Scala => &["class_definition", "object_definition", "trait_definition"],
        Language::Swift => &["class_declaration", "struct_declaration"],
        _ => &[],
    }
}

/// Field name(s) tree-sitter grammars typically expose for a declaration's
/// identifier, tried in order.
pub(crate) const NAME_FIELDS: &[&str] = &["name", "type"];
