//! Error taxonomy for the analysis engine.
//!
//! Construct-level failures (`UnsupportedConstruct`, `QueryNotFound`,
//! `QueryLoad`) degrade to diagnostics inside the outline builder; file-level
//! and security failures abort the current request and are surfaced to the
//! caller unchanged. The engine never retries on its own.

use crate::language::{ConstructKind, LanguageId};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("no language registered for {path}")]
    UnsupportedLanguage { path: PathBuf },

    #[error("construct '{construct}' is not supported by the {language} grammar")]
    UnsupportedConstruct {
        language: LanguageId,
        construct: ConstructKind,
    },

    #[error("no query registered for ({language}, {construct})")]
    QueryNotFound {
        language: LanguageId,
        construct: ConstructKind,
    },

    #[error("malformed query for ({language}, {construct}): {message}")]
    QueryLoad {
        language: LanguageId,
        construct: ConstructKind,
        message: String,
    },

    #[error("path {path} escapes the project boundary {boundary}")]
    BoundaryViolation { path: PathBuf, boundary: PathBuf },

    #[error("no project root marker found above {start_dir}")]
    NoBoundaryFound { start_dir: PathBuf },

    #[error(
        "line range {start_line}..={end_line} is out of bounds (file has {total_lines} lines)"
    )]
    RangeOutOfBounds {
        start_line: usize,
        end_line: usize,
        total_lines: usize,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
