//! Structural model builder: turns raw query matches into a unified,
//! position-exact outline.
//!
//! Elements live in one ordered arena per document; the parent link is an
//! index into the same sequence, never an owning edge, so results serialize
//! directly and carry no cycles.

use super::document::SourceDocument;
use crate::error::AnalysisError;
use crate::language::catalog::QueryCatalog;
use crate::language::{CaptureMatch, ConstructKind, LanguageId, LanguagePlugin};
use serde::Serialize;
use std::cmp::Reverse;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralElement {
    pub kind: ConstructKind,
    pub name: Option<String>,
    pub signature: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    /// Index of the tightest enclosing element in the same sequence.
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub construct: ConstructKind,
    pub message: String,
}

/// Outline of one document. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub path: PathBuf,
    pub language: LanguageId,
    pub elements: Vec<StructuralElement>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the structural outline for `doc`. A construct kind that cannot be
/// extracted (unsupported, or its query is missing or malformed) is omitted
/// with a diagnostic; the build continues for all other kinds.
pub fn build(
    doc: &SourceDocument,
    plugin: &LanguagePlugin,
    catalog: &QueryCatalog,
    constructs: Option<&[ConstructKind]>,
) -> Result<AnalysisResult, AnalysisError> {
    let tree = plugin.parse(doc.as_bytes(), doc.path())?;

    let kinds: Vec<ConstructKind> = match constructs {
        Some(requested) => requested.to_vec(),
        None => plugin.supported_constructs(),
    };

    let mut matches: Vec<CaptureMatch> = Vec::new();
    let mut diagnostics = Vec::new();

    for kind in kinds {
        match plugin.extract(&tree, doc.as_bytes(), kind, catalog) {
            Ok(found) => matches.extend(found),
            Err(
                e @ (AnalysisError::UnsupportedConstruct { .. }
                | AnalysisError::QueryNotFound { .. }
                | AnalysisError::QueryLoad { .. }),
            ) => diagnostics.push(Diagnostic {
                construct: kind,
                message: e.to_string(),
            }),
            Err(other) => return Err(other),
        }
    }

    let total_lines = doc.total_lines();
    let mut elements: Vec<StructuralElement> = matches
        .into_iter()
        .map(|m| {
            let slice = &doc.text()[m.start_byte..m.end_byte];
            StructuralElement {
                kind: m.construct,
                name: m.name,
                signature: signature_of(slice, plugin.id),
                start_line: m.start_line,
                end_line: m.end_line.min(total_lines.max(m.start_line)),
                start_byte: m.start_byte,
                end_byte: m.end_byte,
                parent: None,
            }
        })
        .collect();

    // Start line ascending; for equal starts the outer element comes first,
    // containers before members on identical spans. The sort is stable, so
    // extraction order breaks any remaining ties.
    elements.sort_by_key(|e| {
        (
            e.start_byte,
            Reverse(e.end_byte),
            !e.kind.is_container(),
        )
    });

    assign_parents(&mut elements);

    Ok(AnalysisResult {
        path: doc.path().to_path_buf(),
        language: plugin.id,
        elements,
        diagnostics,
    })
}

/// Parent is the tightest enclosing element. With elements sorted outer
/// first, a stack of open spans yields exactly that.
fn assign_parents(elements: &mut [StructuralElement]) {
    let mut stack: Vec<usize> = Vec::new();
    for i in 0..elements.len() {
        while let Some(&top) = stack.last() {
            if encloses(&elements[top], &elements[i]) {
                break;
            }
            stack.pop();
        }
        elements[i].parent = stack.last().copied();
        stack.push(i);
    }
}

fn encloses(outer: &StructuralElement, inner: &StructuralElement) -> bool {
    if outer.start_byte == inner.start_byte && outer.end_byte == inner.end_byte {
        // Identical spans: a container encloses a member; two elements of
        // the same rank stay siblings.
        return outer.kind.is_container() && !inner.kind.is_container();
    }
    outer.start_byte <= inner.start_byte && inner.end_byte <= outer.end_byte
}

/// Condensed one-line signature, cut at the body opener. Follows each
/// language family's declaration shape.
fn signature_of(content: &str, language: LanguageId) -> String {
    let content = content.trim();
    match language {
        LanguageId::Python => {
            let first_line = content.lines().next().unwrap_or("").trim();
            if let Some(stripped) = first_line.strip_suffix(':') {
                return stripped.to_string();
            }
            if let Some(idx) = content.find("):") {
                condense(&content[..idx + 1])
            } else {
                first_line.to_string()
            }
        }
        LanguageId::JavaScript | LanguageId::TypeScript => {
            if let Some(idx) = content.find("=>") {
                condense(&content[..idx + 2])
            } else if let Some(idx) = content.find('{') {
                condense(&content[..idx])
            } else {
                content.lines().next().unwrap_or("").to_string()
            }
        }
        LanguageId::Markdown | LanguageId::Html => {
            content.lines().next().unwrap_or("").trim().to_string()
        }
        _ => {
            if let Some(idx) = content.find('{') {
                condense(&content[..idx])
            } else {
                content.lines().next().unwrap_or("").to_string()
            }
        }
    }
}

fn condense(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
