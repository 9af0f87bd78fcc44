//! Cheap file-level metrics, the first step of the measure → outline →
//! extract workflow. Never requires a parse, so it works for languages with
//! no registered grammar.

use super::document::SourceDocument;
use crate::language::{LanguageId, LanguagePlugin};
use serde::Serialize;

const GENERIC_LINE_COMMENTS: &[&str] = &["//", "#", ";", "--"];
const GENERIC_BLOCK_COMMENT: (&str, &str) = ("/*", "*/");

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub total_lines: usize,
    pub non_empty_lines: usize,
    /// Comment-prefix heuristic, not a parse; block comments are tracked
    /// with a one-deep open/close scan.
    pub comment_line_estimate: usize,
    pub byte_size: usize,
    pub language: Option<LanguageId>,
}

pub fn measure(doc: &SourceDocument, plugin: Option<&LanguagePlugin>) -> Metrics {
    let (line_comments, block_comment) = match plugin {
        Some(p) => (p.line_comments, p.block_comment),
        None => (GENERIC_LINE_COMMENTS, Some(GENERIC_BLOCK_COMMENT)),
    };

    let mut non_empty_lines = 0;
    let mut comment_line_estimate = 0;
    let mut in_block = false;

    for line in doc.text().lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            non_empty_lines += 1;
        }

        if in_block {
            comment_line_estimate += 1;
            if let Some((_, close)) = block_comment {
                if trimmed.contains(close) {
                    in_block = false;
                }
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        if line_comments.iter().any(|p| trimmed.starts_with(p)) {
            comment_line_estimate += 1;
            continue;
        }

        if let Some((open, close)) = block_comment {
            if let Some(rest) = trimmed.strip_prefix(open) {
                comment_line_estimate += 1;
                if !rest.contains(close) {
                    in_block = true;
                }
            }
        }
    }

    Metrics {
        total_lines: doc.total_lines(),
        non_empty_lines,
        comment_line_estimate,
        byte_size: doc.byte_len(),
        language: plugin.map(|p| p.id).or(doc.language()),
    }
}
