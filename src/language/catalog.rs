//! Process-wide store of compiled tree-sitter queries.
//!
//! Definitions are compiled lazily on first use, keyed by
//! `(language, construct)`, and never mutated after load, so compiled
//! queries are shared as `Arc<Query>` across concurrent analyses. There is
//! no invalidation path: query sources are static and versioned with the
//! binary.

use super::{ConstructKind, LanguageId, LanguagePlugin};
use crate::error::AnalysisError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tree_sitter::{Language, Query};

pub struct QueryCatalog {
    compiled: RwLock<HashMap<(LanguageId, ConstructKind), Arc<Query>>>,
}

impl QueryCatalog {
    pub fn new() -> Self {
        Self {
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the compiled query for `(plugin.id, construct)`, compiling and
    /// caching it on first use.
    pub fn get(
        &self,
        plugin: &LanguagePlugin,
        construct: ConstructKind,
    ) -> Result<Arc<Query>, AnalysisError> {
        let key = (plugin.id, construct);

        {
            let compiled = self.compiled.read().unwrap_or_else(|e| e.into_inner());
            if let Some(query) = compiled.get(&key) {
                return Ok(Arc::clone(query));
            }
        }

        let source =
            plugin
                .query_source(construct)
                .ok_or(AnalysisError::QueryNotFound {
                    language: plugin.id,
                    construct,
                })?;

        let query = compile(&plugin.grammar, plugin.id, construct, source)?;
        let query = Arc::new(query);

        let mut compiled = self.compiled.write().unwrap_or_else(|e| e.into_inner());
        // A concurrent request may have compiled the same pair; both results
        // are identical, so keeping the existing entry is fine.
        let entry = compiled.entry(key).or_insert(query);
        Ok(Arc::clone(entry))
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(
    grammar: &Language,
    language: LanguageId,
    construct: ConstructKind,
    source: &str,
) -> Result<Query, AnalysisError> {
    Query::new(grammar, source).map_err(|e| AnalysisError::QueryLoad {
        language,
        construct,
        message: e.to_string(),
    })
}
