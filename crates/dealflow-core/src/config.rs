#![forbid(unsafe_code)]

//! Board configuration.
//!
//! Every section uses `serde(default)`, so a partial file only overrides the
//! keys it names:
//!
//! ```toml
//! [visibility]
//! default_cap = 50
//!
//! [notifications]
//! success_template = "Deal moved to {stage}"
//! ```
//!
//! [`BoardConfig::load`] parses and validates in one step; the individual
//! `from_*` loaders only parse.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Placeholder substituted with the destination stage name.
pub const STAGE_PLACEHOLDER: &str = "{stage}";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub visibility: VisibilityConfig,
    pub notifications: NotificationConfig,
}

/// Lazy-rendering caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Deals shown per stage before "load more".
    pub default_cap: usize,
    /// Cap growth per "load more".
    pub increment: usize,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            default_cap: 20,
            increment: 20,
        }
    }
}

/// User-facing notification text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub success_template: String,
    pub failure_message: String,
    /// Error shown when the reload after a failed move also fails.
    pub reload_failure_message: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            success_template: "Moved to {stage}".into(),
            failure_message: "Failed to move deal. Reloading pipeline.".into(),
            reload_failure_message: "Failed to reload pipeline.".into(),
        }
    }
}

impl NotificationConfig {
    /// Render the success message for a destination stage.
    #[must_use]
    pub fn success_message(&self, stage: &str) -> String {
        self.success_template.replace(STAGE_PLACEHOLDER, stage)
    }
}

impl BoardConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
        Self::from_json_str(&content)
    }

    /// Load a file, picking the format by extension (`.json`, else TOML),
    /// and reject it if [`validate`](Self::validate) reports problems.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }
        Ok(config)
    }

    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.visibility.default_cap == 0 {
            errors.push("visibility.default_cap must be > 0".into());
        }
        if self.visibility.increment == 0 {
            errors.push("visibility.increment must be > 0".into());
        }
        if !self
            .notifications
            .success_template
            .contains(STAGE_PLACEHOLDER)
        {
            errors.push(format!(
                "notifications.success_template must contain {STAGE_PLACEHOLDER}, got {:?}",
                self.notifications.success_template
            ));
        }
        if self.notifications.failure_message.trim().is_empty() {
            errors.push("notifications.failure_message must not be empty".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates_clean() {
        let errors = BoardConfig::default().validate();
        assert!(errors.is_empty(), "default should validate: {errors:?}");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BoardConfig::from_toml_str("[visibility]\ndefault_cap = 5\n").unwrap();
        assert_eq!(config.visibility.default_cap, 5);
        assert_eq!(config.visibility.increment, 20);
        assert_eq!(config.notifications, NotificationConfig::default());
    }

    #[test]
    fn json_round_trips_through_serde() {
        let config = BoardConfig::from_json_str(
            r#"{"notifications":{"success_template":"Now in {stage}"}}"#,
        )
        .unwrap();
        assert_eq!(config.notifications.success_message("Won"), "Now in Won");
        assert_eq!(config.visibility, VisibilityConfig::default());
    }

    #[test]
    fn validate_catches_zero_caps() {
        let mut config = BoardConfig::default();
        config.visibility.default_cap = 0;
        config.visibility.increment = 0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("default_cap")));
        assert!(errors.iter().any(|e| e.contains("increment")));
    }

    #[test]
    fn validate_catches_missing_placeholder() {
        let mut config = BoardConfig::default();
        config.notifications.success_template = "Moved".into();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("success_template")));
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            BoardConfig::from_toml_str("[visibility\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.toml");
        std::fs::write(&path, "[visibility]\nincrement = 0\n").unwrap();
        let err = BoardConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref problems) if problems.len() == 1));
    }

    #[test]
    fn load_picks_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, r#"{"visibility":{"increment":7}}"#).unwrap();
        let config = BoardConfig::load(&path).unwrap();
        assert_eq!(config.visibility.increment, 7);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BoardConfig::from_toml_file("/nonexistent/board.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/board.toml"));
    }
}
