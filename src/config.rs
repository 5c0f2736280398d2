//! Session configuration, loadable from TOML.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Label};

/// Keyboard shortcuts mapping key codes to the label they apply.
///
/// Only feedback labels can be bound; `concept` is rejected when loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Label>", into = "BTreeMap<String, Label>")]
pub struct KeyBindings(BTreeMap<String, Label>);

impl TryFrom<BTreeMap<String, Label>> for KeyBindings {
    type Error = String;

    fn try_from(bindings: BTreeMap<String, Label>) -> Result<Self, Self::Error> {
        match bindings.iter().find(|(_, label)| **label == Label::Concept) {
            Some((key, label)) => Err(format!("key {} cannot be bound to '{}'", key, label)),
            None => Ok(Self(bindings)),
        }
    }
}

impl From<KeyBindings> for BTreeMap<String, Label> {
    fn from(bindings: KeyBindings) -> Self {
        bindings.0
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert("KeyA".to_string(), Label::Accept);
        bindings.insert("KeyR".to_string(), Label::Reject);
        bindings.insert("KeyC".to_string(), Label::Recommendation);
        Self(bindings)
    }
}

impl KeyBindings {
    /// No shortcuts at all.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn bind(mut self, key: impl Into<String>, label: Label) -> Self {
        self.0.insert(key.into(), label);
        self
    }

    pub fn label_for(&self, key: &str) -> Option<Label> {
        self.0.get(key).copied()
    }
}

/// Configuration for an [`AnnotationSession`](crate::AnnotationSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Join touching same-label spans after every edit.
    pub compress_after_merge: bool,
    pub key_bindings: KeyBindings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            compress_after_merge: true,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl SessionConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_bindings() {
        let config = SessionConfig::default();
        assert!(config.compress_after_merge);
        assert_eq!(config.key_bindings.label_for("KeyA"), Some(Label::Accept));
        assert_eq!(config.key_bindings.label_for("KeyR"), Some(Label::Reject));
        assert_eq!(config.key_bindings.label_for("KeyC"), Some(Label::Recommendation));
        assert_eq!(config.key_bindings.label_for("KeyZ"), None);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
compress_after_merge = false

[key_bindings]
KeyY = "accept"
KeyN = "reject"
KeyE = "remove"
"#
        )
        .unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert!(!config.compress_after_merge);
        assert_eq!(config.key_bindings.label_for("KeyY"), Some(Label::Accept));
        assert_eq!(config.key_bindings.label_for("KeyE"), Some(Label::Recommendation));
        // An explicit table replaces the defaults.
        assert_eq!(config.key_bindings.label_for("KeyA"), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SessionConfig::from_toml_str("compress_after_merge = false").unwrap();
        assert!(!config.compress_after_merge);
        assert_eq!(config.key_bindings, KeyBindings::default());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config = SessionConfig::load(Path::new("/nonexistent/session.toml")).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_load_rejects_unknown_label() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[key_bindings]\nKeyQ = \"maybe\"").unwrap();
        let err = SessionConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_rejects_concept_binding() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[key_bindings]\nKeyK = \"concept\"").unwrap();
        let err = SessionConfig::load(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { message, .. } => {
                assert!(message.contains("KeyK cannot be bound to 'concept'"), "{}", message)
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
