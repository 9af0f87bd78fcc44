//! In-memory source document with a precomputed line index.

use crate::error::AnalysisError;
use crate::language::LanguageId;
use std::fs;
use std::path::{Path, PathBuf};

/// One loaded source file. Owned by a single request; the line→byte-offset
/// index is built once at load so line-addressed slicing costs nothing
/// relative to file size.
pub struct SourceDocument {
    path: PathBuf,
    language: Option<LanguageId>,
    text: String,
    /// Byte offset of the start of each line, 1-based lines at index - 1.
    line_offsets: Vec<usize>,
}

impl SourceDocument {
    /// Read a file from disk. The path must already have passed boundary
    /// resolution; nothing in this type validates it.
    pub fn read(path: &Path) -> Result<Self, AnalysisError> {
        let bytes = fs::read(path).map_err(|e| AnalysisError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self::from_text(path.to_path_buf(), text))
    }

    pub fn from_text(path: PathBuf, text: String) -> Self {
        let line_offsets = index_lines(&text);
        Self {
            path,
            language: None,
            text,
            line_offsets,
        }
    }

    pub fn with_language(mut self, language: Option<LanguageId>) -> Self {
        self.language = language;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Option<LanguageId> {
        self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// Number of lines. A trailing final newline does not open a new line;
    /// an empty document has zero lines.
    pub fn total_lines(&self) -> usize {
        self.line_offsets.len()
    }

    /// Byte range covering `start_line..=end_line` (1-based, inclusive),
    /// including the trailing newline of `end_line` when one exists.
    pub fn line_span(
        &self,
        start_line: usize,
        end_line: usize,
    ) -> Result<(usize, usize), AnalysisError> {
        let total = self.total_lines();
        if start_line == 0 || start_line > end_line || end_line > total {
            return Err(AnalysisError::RangeOutOfBounds {
                start_line,
                end_line,
                total_lines: total,
            });
        }

        let start = self.line_offsets[start_line - 1];
        let end = if end_line < total {
            self.line_offsets[end_line]
        } else {
            self.text.len()
        };
        Ok((start, end))
    }
}

fn index_lines(text: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    if text.is_empty() {
        return offsets;
    }
    offsets.push(0);
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' && i + 1 < text.len() {
            offsets.push(i + 1);
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> SourceDocument {
        SourceDocument::from_text(PathBuf::from("test.txt"), text.to_string())
    }

    #[test]
    fn test_line_count_with_trailing_newline() {
        assert_eq!(doc("a\nb\nc\n").total_lines(), 3);
        assert_eq!(doc("a\nb\nc").total_lines(), 3);
        assert_eq!(doc("").total_lines(), 0);
        assert_eq!(doc("\n").total_lines(), 1);
    }

    #[test]
    fn test_line_span_covers_exact_bytes() {
        let d = doc("one\ntwo\nthree\n");
        let (start, end) = d.line_span(2, 2).unwrap();
        assert_eq!(&d.text()[start..end], "two\n");

        let (start, end) = d.line_span(1, 3).unwrap();
        assert_eq!(&d.text()[start..end], "one\ntwo\nthree\n");
    }

    #[test]
    fn test_line_span_without_trailing_newline() {
        let d = doc("one\ntwo");
        let (start, end) = d.line_span(2, 2).unwrap();
        assert_eq!(&d.text()[start..end], "two");
    }

    #[test]
    fn test_line_span_rejects_bad_ranges() {
        let d = doc("one\ntwo\n");
        assert!(matches!(
            d.line_span(0, 1),
            Err(AnalysisError::RangeOutOfBounds { .. })
        ));
        assert!(matches!(
            d.line_span(2, 1),
            Err(AnalysisError::RangeOutOfBounds { .. })
        ));
        assert!(matches!(
            d.line_span(1, 3),
            Err(AnalysisError::RangeOutOfBounds { .. })
        ));
    }
}
