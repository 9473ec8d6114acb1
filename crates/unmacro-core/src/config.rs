//! Configuration types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// unmacro configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Only sources below this directory are rewritten
    pub base_dir: PathBuf,

    /// Macro expansion options
    pub expand: ReconciliationOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            expand: ReconciliationOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            other => Err(Error::Config(format!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

/// Macro expansion options
///
/// When `enabled` is false the other fields are ignored and nothing is
/// touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationOptions {
    /// Run macro expansion at all
    pub enabled: bool,

    /// `#include` targets emitted verbatim before the undefs, e.g. `<stdio.h>`
    pub forced_includes: Vec<String>,

    /// Macro names to `#undef` before the real input is included
    pub forced_undefs: Vec<String>,
}

impl ReconciliationOptions {
    /// Enabled options with no forced includes or undefs
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_dir, PathBuf::from("."));
        assert!(!config.expand.enabled);
        assert!(ReconciliationOptions::enabled().enabled);
    }

    #[test]
    fn test_load_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("unmacro.yaml");
        fs::write(
            &path,
            r#"
base_dir: /src/project
expand:
  enabled: true
  forced_includes:
    - "<stdlib.h>"
  forced_undefs:
    - assert
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/src/project"));
        assert!(config.expand.enabled);
        assert_eq!(config.expand.forced_includes, vec!["<stdlib.h>"]);
        assert_eq!(config.expand.forced_undefs, vec!["assert"]);
    }

    #[test]
    fn test_load_json_partial() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("unmacro.json");
        fs::write(&path, r#"{ "expand": { "enabled": true } }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("."));
        assert_eq!(config.expand, ReconciliationOptions::enabled());
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("unmacro.toml");
        fs::write(&path, "").unwrap();

        assert!(matches!(Config::from_file(&path), Err(Error::Config(_))));
        assert!(matches!(
            Config::from_file(&temp.path().join("missing.yaml")),
            Err(Error::FileNotFound(_))
        ));
    }
}
