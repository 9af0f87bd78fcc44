//! Request-scoped analysis of a single source document: loading and line
//! indexing, cheap scale metrics, structural outlines, and byte-exact
//! line-range extraction.

pub mod document;
pub mod extract;
pub mod metrics;
pub mod outline;
