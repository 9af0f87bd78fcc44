//! Configuration loading, validation, and defaults.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_root_markers() -> Vec<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "Cargo.toml",
        "package.json",
        "pyproject.toml",
        "go.mod",
        "pom.xml",
        "build.gradle",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Explicit project root. When set, marker detection is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,

    /// Ordered markers used to detect the project root; the first ancestor
    /// directory containing one wins.
    #[serde(default = "default_root_markers")]
    pub root_markers: Vec<String>,

    /// Extension → language id, consulted between an explicit hint and the
    /// built-in extension map (e.g. `{"cshtml": "html"}`).
    #[serde(default)]
    pub extension_overrides: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: None,
            root_markers: default_root_markers(),
            extension_overrides: HashMap::new(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"codescope.json"`. A missing
    /// or invalid file falls back to defaults with a log line rather than
    /// failing startup.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "codescope.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let mut cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");

        if cfg.root_markers.is_empty() {
            cfg.root_markers = default_root_markers();
        }

        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.root_markers.is_empty(),
            "at least one root marker must be specified"
        );
        for (ext, lang) in &self.extension_overrides {
            anyhow::ensure!(!ext.is_empty(), "extension override keys must be non-empty");
            anyhow::ensure!(
                lang.parse::<crate::language::LanguageId>().is_ok(),
                "unknown language '{lang}' in extension_overrides"
            );
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.project_root.is_none());
        assert!(config.root_markers.contains(&".git".to_string()));
        assert!(config.extension_overrides.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"project_root": "/srv/app", "extension_overrides": {"cshtml": "html"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.project_root.as_deref(), Some("/srv/app"));
        assert_eq!(
            config.extension_overrides.get("cshtml").map(String::as_str),
            Some("html")
        );
        // Other fields should have defaults
        assert!(config.root_markers.contains(&"package.json".to_string()));
    }

    #[test]
    fn test_validate_empty_markers() {
        let mut config = Config::default();
        config.root_markers = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_override_language() {
        let mut config = Config::default();
        config
            .extension_overrides
            .insert("tpl".to_string(), "klingon".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.root_markers, config.root_markers);
    }
}
