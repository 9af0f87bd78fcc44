//! Project boundary detection and path validation.
//!
//! Every entry point resolves its path here before any read happens. This
//! is the sole gate against traversal outside the analyzed project, so the
//! check runs per request and is never cached across boundaries.

use crate::error::AnalysisError;
use std::path::{Component, Path, PathBuf};

/// The resolved project root. Established once per session and immutable
/// thereafter.
#[derive(Debug, Clone)]
pub struct ProjectBoundary {
    root: PathBuf,
}

impl ProjectBoundary {
    /// Use an explicit root, bypassing marker detection.
    pub fn new(root: &Path) -> Result<Self, AnalysisError> {
        let root = root
            .canonicalize()
            .map_err(|e| AnalysisError::io(root, e))?;
        Ok(Self { root })
    }

    /// Walk ancestor directories of `start_dir` for the first one holding a
    /// recognized root marker.
    pub fn detect(start_dir: &Path, markers: &[String]) -> Result<Self, AnalysisError> {
        let start = start_dir
            .canonicalize()
            .map_err(|e| AnalysisError::io(start_dir, e))?;

        for ancestor in start.ancestors() {
            if markers.iter().any(|m| ancestor.join(m).exists()) {
                return Ok(Self {
                    root: ancestor.to_path_buf(),
                });
            }
        }

        Err(AnalysisError::NoBoundaryFound {
            start_dir: start_dir.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize `requested` and verify it stays under the root.
    ///
    /// Relative requests are addressed from the root. `..` segments are
    /// collapsed lexically before the filesystem is touched, so a traversal
    /// to a nonexistent target still reports `BoundaryViolation` rather
    /// than an I/O error; symlinks are then resolved and the result checked
    /// a second time.
    pub fn resolve(&self, requested: &Path) -> Result<PathBuf, AnalysisError> {
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        let normalized = lexical_normalize(&joined);
        if !normalized.starts_with(&self.root) {
            return Err(AnalysisError::BoundaryViolation {
                path: requested.to_path_buf(),
                boundary: self.root.clone(),
            });
        }

        let canonical = normalized
            .canonicalize()
            .map_err(|e| AnalysisError::io(&normalized, e))?;
        if !canonical.starts_with(&self.root) {
            return Err(AnalysisError::BoundaryViolation {
                path: requested.to_path_buf(),
                boundary: self.root.clone(),
            });
        }

        Ok(canonical)
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn markers() -> Vec<String> {
        vec![".git".to_string(), "Cargo.toml".to_string()]
    }

    #[test]
    fn test_detect_walks_up_to_marker() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        let nested = project.join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(project.join(".git")).unwrap();

        let boundary = ProjectBoundary::detect(&nested, &markers()).unwrap();
        assert_eq!(boundary.root(), project.canonicalize().unwrap());
    }

    #[test]
    fn test_detect_without_marker_fails() {
        let temp = tempdir().unwrap();
        let result =
            ProjectBoundary::detect(temp.path(), &["no-such-marker.xyz".to_string()]);
        assert!(matches!(result, Err(AnalysisError::NoBoundaryFound { .. })));
    }

    #[test]
    fn test_resolve_relative_path_inside_root() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::create_dir(project.join(".git")).unwrap();
        fs::write(project.join("src").join("main.py"), "x = 1\n").unwrap();

        let boundary = ProjectBoundary::detect(&project, &markers()).unwrap();
        let resolved = boundary.resolve(Path::new("src/main.py")).unwrap();
        assert!(resolved.starts_with(boundary.root()));
        assert!(resolved.ends_with("src/main.py"));
    }

    #[test]
    fn test_traversal_always_fails() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir(project.join(".git")).unwrap();
        fs::write(temp.path().join("secret.txt"), "outside\n").unwrap();

        let boundary = ProjectBoundary::detect(&project, &markers()).unwrap();

        for escape in [
            "../secret.txt",
            "../../etc/passwd",
            "src/../../secret.txt",
        ] {
            let result = boundary.resolve(Path::new(escape));
            assert!(
                matches!(result, Err(AnalysisError::BoundaryViolation { .. })),
                "{escape} should be rejected"
            );
        }
    }

    #[test]
    fn test_absolute_path_outside_root_fails() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir(project.join(".git")).unwrap();
        let outside = temp.path().join("other.txt");
        fs::write(&outside, "outside\n").unwrap();

        let boundary = ProjectBoundary::detect(&project, &markers()).unwrap();
        let result = boundary.resolve(&outside);
        assert!(matches!(
            result,
            Err(AnalysisError::BoundaryViolation { .. })
        ));
    }

    #[test]
    fn test_dot_segments_inside_root_are_fine() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::create_dir(project.join(".git")).unwrap();
        fs::write(project.join("src").join("a.rs"), "fn a() {}\n").unwrap();

        let boundary = ProjectBoundary::detect(&project, &markers()).unwrap();
        let resolved = boundary
            .resolve(Path::new("./src/../src/a.rs"))
            .unwrap();
        assert!(resolved.ends_with("src/a.rs"));
    }
}
