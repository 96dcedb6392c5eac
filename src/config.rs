//! Configuration for generifying refactorings.
//!
//! A configuration file may be YAML or JSON; every field is optional.
//!
//! ```yaml
//! type_parameter_prefix: T
//! return_suffix: RET
//! filler: x
//! add_override_annotations: true
//! restrict_to_directory: true
//! exclude_patterns:
//!   - "build/**"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GenerifyError, Result};
use crate::generify::Slot;

/// Settings shared by the engine, the operations and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerifyConfig {
    /// Leading part of every fresh type parameter name.
    pub type_parameter_prefix: String,

    /// Suffix used instead of a position for the return slot.
    pub return_suffix: String,

    /// Character appended to a fresh name until it no longer collides.
    pub filler: char,

    /// Annotate sister implementations with `@Override` on commit.
    pub add_override_annotations: bool,

    /// Only consider subclasses in the source class's directory.
    pub restrict_to_directory: bool,

    /// Glob patterns excluded when loading sources.
    pub exclude_patterns: Vec<String>,
}

impl Default for GenerifyConfig {
    fn default() -> Self {
        Self {
            type_parameter_prefix: "T".to_string(),
            return_suffix: "RET".to_string(),
            filler: 'x',
            add_override_annotations: true,
            restrict_to_directory: true,
            exclude_patterns: Vec::new(),
        }
    }
}

impl GenerifyConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type parameter prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_parameter_prefix = prefix.into();
        self
    }

    /// Set exclude patterns.
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Disable `@Override` annotations on commit.
    pub fn without_override_annotations(mut self) -> Self {
        self.add_override_annotations = false;
        self
    }

    /// The undeduplicated type parameter name for a member slot.
    ///
    /// `feed` at parameter 0 gives `TFeed0`, its return slot `TFeedRET`.
    pub fn base_type_parameter_name(&self, member: &str, slot: Slot) -> String {
        let mut chars = member.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        match slot {
            Slot::Return => format!(
                "{}{}{}",
                self.type_parameter_prefix, capitalized, self.return_suffix
            ),
            Slot::Parameter(i) => format!("{}{}{}", self.type_parameter_prefix, capitalized, i),
        }
    }

    /// Check that generated names would be valid Java identifiers.
    pub fn validate(&self) -> Result<()> {
        let starts_ok = self
            .type_parameter_prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
        if !starts_ok {
            return Err(GenerifyError::InvalidConfig(format!(
                "type_parameter_prefix '{}' must start a Java identifier",
                self.type_parameter_prefix
            )));
        }
        let ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
        if !self.type_parameter_prefix.chars().all(ident)
            || !self.return_suffix.chars().all(ident)
        {
            return Err(GenerifyError::InvalidConfig(
                "type parameter prefix and return suffix must be identifier characters".to_string(),
            ));
        }
        if !ident(self.filler) {
            return Err(GenerifyError::InvalidConfig(format!(
                "filler '{}' is not an identifier character",
                self.filler
            )));
        }
        Ok(())
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            GenerifyError::InvalidConfig(format!("Failed to parse YAML config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            GenerifyError::InvalidConfig(format!("Failed to parse JSON config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            _ => Self::from_yaml(path),
        }
    }

    /// Save config to a YAML file.
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|e| {
            GenerifyError::InvalidConfig(format!("Failed to serialize config: {}", e))
        })?;
        write_config(path.as_ref(), &content)
    }

    /// Save config to a JSON file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            GenerifyError::InvalidConfig(format!("Failed to serialize config: {}", e))
        })?;
        write_config(path.as_ref(), &content)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        GenerifyError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file: {}", e),
        ))
    })
}

fn write_config(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| {
        GenerifyError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write config file: {}", e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_base_names() {
        let config = GenerifyConfig::default();
        assert_eq!(config.base_type_parameter_name("feed", Slot::Parameter(0)), "TFeed0");
        assert_eq!(config.base_type_parameter_name("feed", Slot::Return), "TFeedRET");
        assert_eq!(
            config
                .clone()
                .with_prefix("G")
                .base_type_parameter_name("x", Slot::Parameter(2)),
            "GX2"
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pullup.yaml");
        std::fs::write(&path, "filler: z\nadd_override_annotations: false\n").unwrap();

        let config = GenerifyConfig::from_yaml(&path).unwrap();
        assert_eq!(config.filler, 'z');
        assert!(!config.add_override_annotations);
        assert_eq!(config.type_parameter_prefix, "T");
        assert!(config.restrict_to_directory);
    }

    #[test]
    fn test_json_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pullup.json");
        let config = GenerifyConfig::new().with_exclude_patterns(vec!["gen/**".to_string()]);
        config.to_json(&path).unwrap();

        assert_eq!(GenerifyConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "type_parameter_prefix: \"1T\"\n").unwrap();

        let err = GenerifyConfig::from_yaml(&path).unwrap_err();
        assert!(matches!(err, GenerifyError::InvalidConfig(_)));
    }
}
