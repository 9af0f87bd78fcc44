//! Language plugins and the registry that dispatches to them.
//!
//! Each supported language is one [`LanguagePlugin`] entry binding a
//! tree-sitter grammar, an extension list, per-construct query sources, and
//! comment markers. The registry is built once at startup and is read-only
//! afterwards; all per-language decisions happen here, at resolution time.

pub mod catalog;

use crate::error::AnalysisError;
use catalog::QueryCatalog;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tree_sitter::{Language, Parser, QueryCursor, StreamingIterator, Tree};

// ── Identifiers ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    Java,
    Python,
    JavaScript,
    TypeScript,
    Html,
    Css,
    Markdown,
    Rust,
    Go,
}

impl LanguageId {
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageId::Java => "java",
            LanguageId::Python => "python",
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::Html => "html",
            LanguageId::Css => "css",
            LanguageId::Markdown => "markdown",
            LanguageId::Rust => "rust",
            LanguageId::Go => "go",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(LanguageId::Java),
            "python" | "py" => Ok(LanguageId::Python),
            "javascript" | "js" => Ok(LanguageId::JavaScript),
            "typescript" | "ts" => Ok(LanguageId::TypeScript),
            "html" => Ok(LanguageId::Html),
            "css" => Ok(LanguageId::Css),
            "markdown" | "md" => Ok(LanguageId::Markdown),
            "rust" | "rs" => Ok(LanguageId::Rust),
            "go" => Ok(LanguageId::Go),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// A named kind of structural unit a query can locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructKind {
    Class,
    Interface,
    Enum,
    Struct,
    Trait,
    Module,
    Function,
    Method,
    Field,
    Import,
    Section,
    Rule,
    Element,
}

impl ConstructKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstructKind::Class => "class",
            ConstructKind::Interface => "interface",
            ConstructKind::Enum => "enum",
            ConstructKind::Struct => "struct",
            ConstructKind::Trait => "trait",
            ConstructKind::Module => "module",
            ConstructKind::Function => "function",
            ConstructKind::Method => "method",
            ConstructKind::Field => "field",
            ConstructKind::Import => "import",
            ConstructKind::Section => "section",
            ConstructKind::Rule => "rule",
            ConstructKind::Element => "element",
        }
    }

    /// Containers win the parent role when two matches share an exact span.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ConstructKind::Class
                | ConstructKind::Interface
                | ConstructKind::Enum
                | ConstructKind::Struct
                | ConstructKind::Trait
                | ConstructKind::Module
                | ConstructKind::Section
                | ConstructKind::Rule
                | ConstructKind::Element
        )
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstructKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "class" => Ok(ConstructKind::Class),
            "interface" => Ok(ConstructKind::Interface),
            "enum" => Ok(ConstructKind::Enum),
            "struct" => Ok(ConstructKind::Struct),
            "trait" => Ok(ConstructKind::Trait),
            "module" => Ok(ConstructKind::Module),
            "function" => Ok(ConstructKind::Function),
            "method" => Ok(ConstructKind::Method),
            "field" => Ok(ConstructKind::Field),
            "import" => Ok(ConstructKind::Import),
            "section" => Ok(ConstructKind::Section),
            "rule" => Ok(ConstructKind::Rule),
            "element" => Ok(ConstructKind::Element),
            other => Err(format!("unknown construct kind: {other}")),
        }
    }
}

// ── Capture matches ──────────────────────────────────────────────────

/// One query match against a tree. Lines and columns are 1-based; byte
/// offsets address the owning document's content.
#[derive(Debug, Clone)]
pub struct CaptureMatch {
    pub construct: ConstructKind,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
    pub name: Option<String>,
    /// Named sub-captures other than the main node and `name`.
    pub captures: HashMap<String, String>,
}

// ── Plugins ──────────────────────────────────────────────────────────

/// One language entry: grammar, extensions, query sources, comment markers.
pub struct LanguagePlugin {
    pub id: LanguageId,
    pub grammar: Language,
    pub extensions: &'static [&'static str],
    queries: &'static [(ConstructKind, &'static str)],
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
}

impl LanguagePlugin {
    /// Construct kinds this plugin can extract, in registration order.
    pub fn supported_constructs(&self) -> Vec<ConstructKind> {
        self.queries.iter().map(|(kind, _)| *kind).collect()
    }

    pub fn supports(&self, construct: ConstructKind) -> bool {
        self.queries.iter().any(|(kind, _)| *kind == construct)
    }

    /// Raw query source for a construct, if one is registered.
    pub fn query_source(&self, construct: ConstructKind) -> Option<&'static str> {
        self.queries
            .iter()
            .find(|(kind, _)| *kind == construct)
            .map(|(_, source)| *source)
    }

    /// Parse raw bytes into a concrete syntax tree.
    pub fn parse(&self, source: &[u8], path: &Path) -> Result<Tree, AnalysisError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|e| AnalysisError::Parse {
                path: path.to_path_buf(),
                reason: format!("grammar unavailable: {e}"),
            })?;
        parser.parse(source, None).ok_or_else(|| AnalysisError::Parse {
            path: path.to_path_buf(),
            reason: "parser produced no tree".to_string(),
        })
    }

    /// Run the catalog query for `construct` against a parsed tree and
    /// return the matches in source order.
    ///
    /// Fails with `UnsupportedConstruct` when this plugin declares no such
    /// construct; the caller treats that as a per-construct condition, not a
    /// whole-file failure.
    pub fn extract(
        &self,
        tree: &Tree,
        source: &[u8],
        construct: ConstructKind,
        catalog: &QueryCatalog,
    ) -> Result<Vec<CaptureMatch>, AnalysisError> {
        if !self.supports(construct) {
            return Err(AnalysisError::UnsupportedConstruct {
                language: self.id,
                construct,
            });
        }

        let query = catalog.get(self, construct)?;
        let label = construct.as_str();

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), source);

        let mut out = Vec::new();
        let mut seen = HashSet::new();

        while let Some(m) = matches.next() {
            let mut main_node = None;
            let mut name = None;
            let mut extras = HashMap::new();

            for cap in m.captures {
                let capture_name = query.capture_names()[cap.index as usize];
                if capture_name == label {
                    main_node = Some(cap.node);
                } else if capture_name == "name" {
                    if let Ok(text) = cap.node.utf8_text(source) {
                        name = Some(text.trim().to_string());
                    }
                } else if let Ok(text) = cap.node.utf8_text(source) {
                    extras.insert(capture_name.to_string(), text.to_string());
                }
            }

            let Some(node) = main_node else { continue };
            if !seen.insert((node.start_byte(), node.end_byte())) {
                continue;
            }

            let start = node.start_position();
            let end = node.end_position();
            let start_line = start.row + 1;
            // A node ending at column 0 stops at the previous line boundary.
            let mut end_line = end.row + 1;
            if end.column == 0 && end_line > start_line {
                end_line -= 1;
            }

            out.push(CaptureMatch {
                construct,
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                start_line,
                end_line,
                start_column: start.column + 1,
                end_column: end.column + 1,
                name,
                captures: extras,
            });
        }

        Ok(out)
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Maps a language identifier to its plugin. Built once, read-only after.
pub struct PluginRegistry {
    plugins: Vec<LanguagePlugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: vec![
                java_plugin(),
                python_plugin(),
                javascript_plugin(),
                typescript_plugin(),
                html_plugin(),
                css_plugin(),
                markdown_plugin(),
                rust_plugin(),
                go_plugin(),
            ],
        }
    }

    pub fn get(&self, id: LanguageId) -> Option<&LanguagePlugin> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn plugins(&self) -> &[LanguagePlugin] {
        &self.plugins
    }

    /// Resolve a plugin for a file. Detection precedence, first success
    /// wins: explicit hint, file extension, content sniffing. No match is a
    /// hard `UnsupportedLanguage`; misclassification produces structurally
    /// wrong results that look valid, so the registry never guesses.
    pub fn resolve(
        &self,
        hint: Option<LanguageId>,
        path: &Path,
        content: &[u8],
    ) -> Result<&LanguagePlugin, AnalysisError> {
        if let Some(id) = hint {
            return self.get(id).ok_or_else(|| AnalysisError::UnsupportedLanguage {
                path: path.to_path_buf(),
            });
        }

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_ascii_lowercase();
            if let Some(plugin) = self
                .plugins
                .iter()
                .find(|p| p.extensions.contains(&ext.as_str()))
            {
                return Ok(plugin);
            }
        }

        if let Some(id) = sniff_language(content) {
            if let Some(plugin) = self.get(id) {
                return Ok(plugin);
            }
        }

        Err(AnalysisError::UnsupportedLanguage {
            path: path.to_path_buf(),
        })
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Content-sniffing fallback: an ordered list of cheap checks over the first
/// bytes. Returns `None` rather than guessing.
fn sniff_language(content: &[u8]) -> Option<LanguageId> {
    let head = &content[..content.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let trimmed = head.trim_start();

    if let Some(rest) = trimmed.strip_prefix("#!") {
        let interpreter = rest.lines().next().unwrap_or("");
        if interpreter.contains("python") {
            return Some(LanguageId::Python);
        }
        if interpreter.contains("node") {
            return Some(LanguageId::JavaScript);
        }
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        return Some(LanguageId::Html);
    }

    None
}

// ── Plugin tables ────────────────────────────────────────────────────
// Container kinds are registered before member kinds; extraction and
// same-span tie-breaking follow this order.

fn java_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::Java,
        grammar: tree_sitter_java::LANGUAGE.into(),
        extensions: &["java"],
        queries: &[
            (
                ConstructKind::Class,
                r#"
(class_declaration
  name: (identifier) @name) @class
"#,
            ),
            (
                ConstructKind::Interface,
                r#"
(interface_declaration
  name: (identifier) @name) @interface
"#,
            ),
            (
                ConstructKind::Enum,
                r#"
(enum_declaration
  name: (identifier) @name) @enum
"#,
            ),
            (
                ConstructKind::Method,
                r#"
(method_declaration
  name: (identifier) @name) @method

(constructor_declaration
  name: (identifier) @name) @method
"#,
            ),
            (
                ConstructKind::Field,
                r#"
(field_declaration
  declarator: (variable_declarator
    name: (identifier) @name)) @field
"#,
            ),
            (
                ConstructKind::Import,
                r#"
(import_declaration
  (scoped_identifier) @name) @import

(import_declaration
  (identifier) @name) @import
"#,
            ),
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
    }
}

fn python_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::Python,
        grammar: tree_sitter_python::LANGUAGE.into(),
        extensions: &["py", "pyi"],
        queries: &[
            (
                ConstructKind::Class,
                r#"
(class_definition
  name: (identifier) @name) @class
"#,
            ),
            (
                ConstructKind::Function,
                r#"
(function_definition
  name: (identifier) @name) @function
"#,
            ),
            (
                ConstructKind::Import,
                r#"
(import_statement
  name: (dotted_name) @name) @import

(import_statement
  name: (aliased_import
    name: (dotted_name) @name)) @import

(import_from_statement
  module_name: (dotted_name) @name) @import

(import_from_statement
  module_name: (relative_import) @name) @import
"#,
            ),
        ],
        line_comments: &["#"],
        block_comment: None,
    }
}

fn javascript_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::JavaScript,
        grammar: tree_sitter_javascript::LANGUAGE.into(),
        extensions: &["js", "jsx", "mjs", "cjs"],
        queries: &[
            (
                ConstructKind::Class,
                r#"
(class_declaration
  name: (identifier) @name) @class
"#,
            ),
            (
                ConstructKind::Function,
                r#"
(function_declaration
  name: (identifier) @name) @function

(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function))) @function
"#,
            ),
            (
                ConstructKind::Method,
                r#"
(method_definition
  name: (property_identifier) @name) @method
"#,
            ),
            (
                ConstructKind::Field,
                r#"
(field_definition
  property: (property_identifier) @name) @field
"#,
            ),
            (
                ConstructKind::Import,
                r#"
(import_statement
  source: (string) @name) @import
"#,
            ),
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
    }
}

fn typescript_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::TypeScript,
        grammar: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        extensions: &["ts", "tsx"],
        queries: &[
            (
                ConstructKind::Class,
                r#"
(class_declaration
  name: (type_identifier) @name) @class
"#,
            ),
            (
                ConstructKind::Interface,
                r#"
(interface_declaration
  name: (type_identifier) @name) @interface
"#,
            ),
            (
                ConstructKind::Enum,
                r#"
(enum_declaration
  name: (identifier) @name) @enum
"#,
            ),
            (
                ConstructKind::Function,
                r#"
(function_declaration
  name: (identifier) @name) @function

(lexical_declaration
  (variable_declarator
    name: (identifier) @name
    value: (arrow_function))) @function
"#,
            ),
            (
                ConstructKind::Method,
                r#"
(method_definition
  name: (property_identifier) @name) @method
"#,
            ),
            (
                ConstructKind::Field,
                r#"
(public_field_definition
  name: (property_identifier) @name) @field
"#,
            ),
            (
                ConstructKind::Import,
                r#"
(import_statement
  source: (string) @name) @import
"#,
            ),
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
    }
}

fn html_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::Html,
        grammar: tree_sitter_html::LANGUAGE.into(),
        extensions: &["html", "htm"],
        queries: &[(
            ConstructKind::Element,
            r#"
(element
  (start_tag
    (tag_name) @name
    (#any-of? @name
      "html" "head" "body" "header" "nav" "main" "section" "article"
      "aside" "footer" "div" "form" "table" "template" "dialog"))) @element

(script_element
  (start_tag
    (tag_name) @name)) @element

(style_element
  (start_tag
    (tag_name) @name)) @element
"#,
        )],
        line_comments: &[],
        block_comment: Some(("<!--", "-->")),
    }
}

fn css_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::Css,
        grammar: tree_sitter_css::LANGUAGE.into(),
        extensions: &["css"],
        queries: &[
            (
                ConstructKind::Rule,
                r#"
(rule_set
  (selectors) @name) @rule

(media_statement) @rule

(keyframes_statement
  (keyframes_name) @name) @rule
"#,
            ),
            (
                ConstructKind::Import,
                r#"
(import_statement) @import
"#,
            ),
        ],
        line_comments: &[],
        block_comment: Some(("/*", "*/")),
    }
}

fn markdown_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::Markdown,
        grammar: tree_sitter_md::LANGUAGE.into(),
        extensions: &["md", "markdown"],
        queries: &[(
            ConstructKind::Section,
            r#"
(section
  (atx_heading
    (inline) @name)) @section

(section
  (setext_heading
    (paragraph) @name)) @section
"#,
        )],
        line_comments: &[],
        block_comment: Some(("<!--", "-->")),
    }
}

fn rust_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::Rust,
        grammar: tree_sitter_rust::LANGUAGE.into(),
        extensions: &["rs"],
        queries: &[
            (
                ConstructKind::Struct,
                r#"
(struct_item
  name: (type_identifier) @name) @struct

(impl_item
  type: (type_identifier) @name) @struct
"#,
            ),
            (
                ConstructKind::Enum,
                r#"
(enum_item
  name: (type_identifier) @name) @enum
"#,
            ),
            (
                ConstructKind::Trait,
                r#"
(trait_item
  name: (type_identifier) @name) @trait
"#,
            ),
            (
                ConstructKind::Module,
                r#"
(mod_item
  name: (identifier) @name) @module
"#,
            ),
            (
                ConstructKind::Function,
                r#"
(function_item
  name: (identifier) @name) @function
"#,
            ),
            (
                ConstructKind::Field,
                r#"
(field_declaration
  name: (field_identifier) @name) @field
"#,
            ),
            (
                ConstructKind::Import,
                r#"
(use_declaration
  argument: (_) @name) @import
"#,
            ),
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
    }
}

fn go_plugin() -> LanguagePlugin {
    LanguagePlugin {
        id: LanguageId::Go,
        grammar: tree_sitter_go::LANGUAGE.into(),
        extensions: &["go"],
        queries: &[
            (
                ConstructKind::Struct,
                r#"
(type_declaration
  (type_spec
    name: (type_identifier) @name
    type: (struct_type))) @struct
"#,
            ),
            (
                ConstructKind::Interface,
                r#"
(type_declaration
  (type_spec
    name: (type_identifier) @name
    type: (interface_type))) @interface
"#,
            ),
            (
                ConstructKind::Function,
                r#"
(function_declaration
  name: (identifier) @name) @function
"#,
            ),
            (
                ConstructKind::Method,
                r#"
(method_declaration
  name: (field_identifier) @name) @method
"#,
            ),
            (
                ConstructKind::Import,
                r#"
(import_spec
  path: (interpreted_string_literal) @name) @import
"#,
            ),
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_extension() {
        let registry = PluginRegistry::new();
        let plugin = registry
            .resolve(None, Path::new("Main.java"), b"")
            .expect("java should resolve");
        assert_eq!(plugin.id, LanguageId::Java);
    }

    #[test]
    fn test_hint_beats_extension() {
        let registry = PluginRegistry::new();
        let plugin = registry
            .resolve(Some(LanguageId::Python), Path::new("weird.java"), b"")
            .unwrap();
        assert_eq!(plugin.id, LanguageId::Python);
    }

    #[test]
    fn test_sniff_shebang() {
        let registry = PluginRegistry::new();
        let plugin = registry
            .resolve(None, Path::new("script"), b"#!/usr/bin/env python3\nprint('x')\n")
            .unwrap();
        assert_eq!(plugin.id, LanguageId::Python);

        let plugin = registry
            .resolve(None, Path::new("tool"), b"#!/usr/bin/env node\nconsole.log(1)\n")
            .unwrap();
        assert_eq!(plugin.id, LanguageId::JavaScript);
    }

    #[test]
    fn test_sniff_html_doctype() {
        let registry = PluginRegistry::new();
        let plugin = registry
            .resolve(None, Path::new("page"), b"<!DOCTYPE html>\n<html></html>\n")
            .unwrap();
        assert_eq!(plugin.id, LanguageId::Html);
    }

    #[test]
    fn test_no_match_is_an_error_not_a_guess() {
        let registry = PluginRegistry::new();
        let result = registry.resolve(None, Path::new("data.bin"), b"\x00\x01\x02");
        assert!(matches!(
            result,
            Err(AnalysisError::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn test_supported_constructs_order() {
        let registry = PluginRegistry::new();
        let java = registry.get(LanguageId::Java).unwrap();
        let constructs = java.supported_constructs();
        assert_eq!(constructs[0], ConstructKind::Class);
        assert!(constructs.contains(&ConstructKind::Method));
        assert!(constructs.contains(&ConstructKind::Import));
        assert!(!java.supports(ConstructKind::Section));
    }

    #[test]
    fn test_extract_java_class_and_methods() {
        let registry = PluginRegistry::new();
        let catalog = QueryCatalog::new();
        let java = registry.get(LanguageId::Java).unwrap();

        let source = br#"
class Greeter {
    private String name;

    String greet() {
        return "hello " + name;
    }
}
"#;
        let tree = java.parse(source, Path::new("Greeter.java")).unwrap();

        let classes = java
            .extract(&tree, source, ConstructKind::Class, &catalog)
            .unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name.as_deref(), Some("Greeter"));

        let methods = java
            .extract(&tree, source, ConstructKind::Method, &catalog)
            .unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name.as_deref(), Some("greet"));
        assert!(methods[0].start_line >= classes[0].start_line);
        assert!(methods[0].end_line <= classes[0].end_line);
    }

    #[test]
    fn test_extract_unsupported_construct() {
        let registry = PluginRegistry::new();
        let catalog = QueryCatalog::new();
        let python = registry.get(LanguageId::Python).unwrap();

        let tree = python.parse(b"x = 1\n", Path::new("m.py")).unwrap();
        let result = python.extract(&tree, b"x = 1\n", ConstructKind::Rule, &catalog);
        assert!(matches!(
            result,
            Err(AnalysisError::UnsupportedConstruct { .. })
        ));
    }
}
