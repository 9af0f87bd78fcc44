//! The engine facade: one immutable context object exposing the three
//! typed operations (`measure`, `analyze`, `extract`).
//!
//! Each call resolves its path through the project boundary before any
//! bytes are read. Requests are stateless relative to each other; the
//! registry and query catalog are the only shared state and both are
//! read-only after construction, so an `Engine` can be shared by reference
//! across concurrent requests.

use crate::analysis::document::SourceDocument;
use crate::analysis::extract::{self, LineSlice};
use crate::analysis::metrics::{self, Metrics};
use crate::analysis::outline::{self, AnalysisResult};
use crate::boundary::ProjectBoundary;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::language::catalog::QueryCatalog;
use crate::language::{ConstructKind, LanguageId, PluginRegistry};
use std::path::Path;

pub struct Engine {
    config: Config,
    boundary: ProjectBoundary,
    registry: PluginRegistry,
    catalog: QueryCatalog,
}

impl Engine {
    pub fn new(config: Config, boundary: ProjectBoundary) -> Self {
        Self {
            config,
            boundary,
            registry: PluginRegistry::new(),
            catalog: QueryCatalog::new(),
        }
    }

    pub fn boundary(&self) -> &ProjectBoundary {
        &self.boundary
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// File-level metrics. Works without a resolvable language; the comment
    /// estimate then falls back to generic markers.
    pub fn measure(
        &self,
        path: &Path,
        hint: Option<LanguageId>,
    ) -> Result<Metrics, AnalysisError> {
        let resolved = self.boundary.resolve(path)?;
        let doc = SourceDocument::read(&resolved)?;
        let hint = hint.or_else(|| self.extension_override(&resolved));
        let plugin = self.registry.resolve(hint, &resolved, doc.as_bytes()).ok();
        Ok(metrics::measure(&doc, plugin))
    }

    /// Structural outline. Requires a resolvable language; individual
    /// construct kinds degrade to diagnostics inside the builder.
    pub fn analyze(
        &self,
        path: &Path,
        hint: Option<LanguageId>,
        constructs: Option<&[ConstructKind]>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let resolved = self.boundary.resolve(path)?;
        let doc = SourceDocument::read(&resolved)?;
        let hint = hint.or_else(|| self.extension_override(&resolved));
        let plugin = self.registry.resolve(hint, &resolved, doc.as_bytes())?;
        let doc = doc.with_language(Some(plugin.id));
        outline::build(&doc, plugin, &self.catalog, constructs)
    }

    /// Byte-exact slice of `start_line..=end_line`. Independent of parsing,
    /// so it stays available for unsupported or malformed sources.
    pub fn extract(
        &self,
        path: &Path,
        start_line: usize,
        end_line: usize,
    ) -> Result<LineSlice, AnalysisError> {
        let resolved = self.boundary.resolve(path)?;
        let doc = SourceDocument::read(&resolved)?;
        extract::extract_lines(&doc, start_line, end_line)
    }

    fn extension_override(&self, path: &Path) -> Option<LanguageId> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.config
            .extension_overrides
            .get(&ext)
            .and_then(|lang| lang.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn engine_for(project: &Path) -> Engine {
        let boundary = ProjectBoundary::new(project).unwrap();
        Engine::new(Config::default(), boundary)
    }

    #[test]
    fn test_measure_outline_extract_workflow() {
        let temp = tempdir().unwrap();
        let project = temp.path();
        fs::write(
            project.join("lib.py"),
            "class A:\n    def run(self):\n        pass\n",
        )
        .unwrap();

        let engine = engine_for(project);

        let metrics = engine.measure(Path::new("lib.py"), None).unwrap();
        assert_eq!(metrics.total_lines, 3);
        assert_eq!(metrics.language, Some(LanguageId::Python));

        let result = engine.analyze(Path::new("lib.py"), None, None).unwrap();
        assert_eq!(result.elements.len(), 2);

        let slice = engine.extract(Path::new("lib.py"), 2, 3).unwrap();
        assert_eq!(slice.content, "    def run(self):\n        pass\n");
    }

    #[test]
    fn test_boundary_violation_surfaces_from_every_operation() {
        let temp = tempdir().unwrap();
        let engine = engine_for(temp.path());
        let escape = Path::new("../outside.txt");

        assert!(matches!(
            engine.measure(escape, None),
            Err(AnalysisError::BoundaryViolation { .. })
        ));
        assert!(matches!(
            engine.analyze(escape, None, None),
            Err(AnalysisError::BoundaryViolation { .. })
        ));
        assert!(matches!(
            engine.extract(escape, 1, 1),
            Err(AnalysisError::BoundaryViolation { .. })
        ));
    }

    #[test]
    fn test_extension_override_beats_builtin_map() {
        let temp = tempdir().unwrap();
        let project = temp.path();
        fs::write(project.join("page.tpl"), "<!DOCTYPE html>\n<html></html>\n").unwrap();

        let mut config = Config::default();
        config
            .extension_overrides
            .insert("tpl".to_string(), "html".to_string());
        let boundary = ProjectBoundary::new(project).unwrap();
        let engine = Engine::new(config, boundary);

        let metrics = engine.measure(Path::new("page.tpl"), None).unwrap();
        assert_eq!(metrics.language, Some(LanguageId::Html));
    }

    #[test]
    fn test_unsupported_language_blocks_outline_only() {
        let temp = tempdir().unwrap();
        let project = temp.path();
        fs::write(project.join("data.xyz"), "alpha\nbeta\n").unwrap();

        let engine = engine_for(project);

        assert!(matches!(
            engine.analyze(Path::new("data.xyz"), None, None),
            Err(AnalysisError::UnsupportedLanguage { .. })
        ));

        // Metrics and extraction never require a language.
        let metrics = engine.measure(Path::new("data.xyz"), None).unwrap();
        assert_eq!(metrics.total_lines, 2);
        assert_eq!(metrics.language, None);

        let slice = engine.extract(Path::new("data.xyz"), 1, 1).unwrap();
        assert_eq!(slice.content, "alpha\n");
    }
}
