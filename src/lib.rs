//! # codescope — structural source-file analysis
//!
//! Lets a caller (human or AI assistant) understand a source file too large
//! to read in full: cheap size metrics, a structural outline with exact line
//! positions, and byte-exact extraction of arbitrary line ranges — without
//! building a semantic model of the program.
//!
//! ## Architecture
//!
//! - **[`boundary`]** — Project root detection and path validation (the sole
//!   gate against traversal outside the analyzed project)
//! - **[`language`]** — Grammar-driven plugins, the resolution registry, and
//!   the compiled query catalog
//! - **[`analysis`]** — Document loading/line indexing, scale metrics,
//!   outline building, and line-range extraction
//! - **[`engine`]** — The immutable context object exposing the three typed
//!   operations: `measure`, `analyze`, `extract`
//! - **[`config`]** — Configuration loading, validation, and defaults
//! - **[`mcp`]** — MCP server with 4 tool handlers (stdio transport via rmcp)

pub mod analysis;
pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod language;
pub mod mcp;
