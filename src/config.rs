//! Import configuration
//!
//! Settings that stay the same across runs live in an optional YAML file; the
//! per-run switches come from the command line as [`ImportOptions`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ontology::{DEFAULT_NAMESPACE, Vocabulary};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// What to do when an entity with the same uuid already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Load the existing entity and update it in place
    #[default]
    Update,
    /// Abort the import unless overwrite is on
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Namespace of the built-in classes and predicates
    pub namespace: String,
    /// Scheme prepended to file paths, e.g. `public` -> `public://img/a.png`
    pub file_scheme: String,
    /// Text format of the synthesized body field
    pub body_format: String,
    pub max_field_name_length: usize,
    pub duplicate_policy: DuplicatePolicy,
    pub rollback_on_failure: bool,
    pub log_filter: String,
    pub log_file_name: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            file_scheme: "public".to_string(),
            body_format: "full_html".to_string(),
            max_field_name_length: 32,
            duplicate_policy: DuplicatePolicy::Update,
            rollback_on_failure: false,
            log_filter: "info".to_string(),
            log_file_name: "import.log".to_string(),
        }
    }
}

impl ImportConfig {
    /// Load from a YAML file, or use defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }
        if !self.namespace.ends_with('#') && !self.namespace.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "namespace '{}' must end with '#' or '/'",
                self.namespace
            )));
        }
        if self.max_field_name_length == 0 {
            return Err(ConfigError::Invalid(
                "max_field_name_length must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::new(&self.namespace)
    }

    /// Store URI for a file path relative to the file scheme root
    pub fn file_uri(&self, path: &str) -> String {
        format!("{}://{}", self.file_scheme, path.trim_start_matches('/'))
    }
}

/// Switches for a single import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Owner recorded on created nodes and files
    pub user_id: u64,
    pub import_vocabularies: bool,
    pub import_nodes: bool,
    /// Import classes under `Node` as nodes too
    pub classes_as_nodes: bool,
    /// With `classes_as_nodes`, only import leaf classes
    pub only_leaf_classes: bool,
    /// Clear existing vocabularies before re-importing them
    pub overwrite: bool,
}

impl ImportOptions {
    /// Import vocabularies and nodes with everything else off
    pub fn everything(user_id: u64) -> Self {
        Self {
            user_id,
            import_vocabularies: true,
            import_nodes: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_namespace() {
        let config = ImportConfig::default();
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.max_field_name_length, 32);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Update);
        assert!(!config.rollback_on_failure);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ImportConfig::from_yaml(
            "namespace: \"http://example.org/cms#\"\nduplicate_policy: reject\n",
        )
        .unwrap();
        assert_eq!(config.namespace, "http://example.org/cms#");
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.file_scheme, "public");
    }

    #[test]
    fn rejects_namespace_without_separator() {
        let result = ImportConfig::from_yaml("namespace: \"http://example.org/cms\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = ImportConfig::from_yaml("namespace: [unclosed");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = ImportConfig::load(Some(Path::new("does/not/exist.yaml")));
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn file_uri_uses_scheme() {
        let config = ImportConfig::default();
        assert_eq!(config.file_uri("/img/logo.png"), "public://img/logo.png");
    }
}
