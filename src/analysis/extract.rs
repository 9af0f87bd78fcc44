//! Byte-exact extraction of line ranges.
//!
//! Operates purely on the document's line index, so it stays available when
//! no grammar exists for the language or the parse failed outright.

use super::document::SourceDocument;
use crate::error::AnalysisError;
use serde::Serialize;

/// Absolute position of a returned slice, for citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionMetadata {
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineSlice {
    pub content: String,
    pub position: PositionMetadata,
}

/// Return the exact content of `start_line..=end_line` (1-based, inclusive)
/// plus its absolute position. No reformatting, no trimming.
pub fn extract_lines(
    doc: &SourceDocument,
    start_line: usize,
    end_line: usize,
) -> Result<LineSlice, AnalysisError> {
    let (start_byte, end_byte) = doc.line_span(start_line, end_line)?;
    Ok(LineSlice {
        content: doc.text()[start_byte..end_byte].to_string(),
        position: PositionMetadata {
            start_line,
            end_line,
            start_byte,
            end_byte,
        },
    })
}
