//! Java language support.

use super::Language;
use tree_sitter::Language as TsLanguage;

/// Query capturing every class, interface, enum and record declaration,
/// nested ones included.
pub const TYPE_DECLARATION_QUERY: &str = r#"
[
  (class_declaration name: (identifier) @name) @decl
  (interface_declaration name: (identifier) @name) @decl
  (enum_declaration name: (identifier) @name) @decl
  (record_declaration name: (identifier) @name) @decl
]
"#;

/// Node kinds that introduce a nested type inside a class body.
pub const NESTED_TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Java programming language.
pub struct Java;

impl Java {
    /// Whether a node kind denotes a type in the tree-sitter-java grammar.
    pub fn is_type_node(kind: &str) -> bool {
        matches!(
            kind,
            "void_type"
                | "integral_type"
                | "floating_point_type"
                | "boolean_type"
                | "type_identifier"
                | "scoped_type_identifier"
                | "generic_type"
                | "array_type"
                | "annotated_type"
                | "wildcard"
        )
    }
}

impl Language for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_java::LANGUAGE.into()
    }
}
