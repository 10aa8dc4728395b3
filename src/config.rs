//! Interpreter Configuration Module
//!
//! Declares which interpreters exist and how they are built.
//! Config is stored in `~/.config/nbinterp/interpreters.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`NBINTERP_USER`, `NBINTERP_DEFAULT_INTERPRETER`)
//! 2. Config file
//! 3. Defaults (a single lazy `sh` shell interpreter)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{InterpreterError, Result};
use crate::interpreter::Properties;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NbConfig {
    /// Interpreter used when none is named
    #[serde(default)]
    pub default_interpreter: Option<String>,

    /// Configured interpreters, in declaration order
    #[serde(default, rename = "interpreter")]
    pub interpreters: Vec<InterpreterSetting>,
}

/// How to build one interpreter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterpreterSetting {
    /// Name paragraphs refer to it by (e.g. `sh` for `%sh`)
    pub name: String,

    /// Implementation: `shell` or `mock`
    pub class: String,

    /// Defer `open` until first use
    #[serde(default = "default_lazy")]
    pub lazy: bool,

    /// User the interpreter runs as
    #[serde(default)]
    pub user: Option<String>,

    /// Extra resource locations (`file://` entries extend the shell search path)
    #[serde(default)]
    pub classloader_urls: Vec<Url>,

    #[serde(default)]
    pub properties: Properties,
}

fn default_lazy() -> bool {
    true
}

impl InterpreterSetting {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            lazy: default_lazy(),
            user: None,
            classloader_urls: Vec::new(),
            properties: Properties::new(),
        }
    }
}

impl Default for NbConfig {
    fn default() -> Self {
        Self {
            default_interpreter: Some("sh".to_string()),
            interpreters: vec![InterpreterSetting::new("sh", "shell")],
        }
    }
}

impl NbConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/nbinterp/` on Unix, `%APPDATA%/nbinterp/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nbinterp")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("interpreters.toml")
    }

    /// Load configuration from the default path
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path
    ///
    /// Unlike [`NbConfig::load`], a missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| InterpreterError::ConfigError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    /// Parse and validate TOML
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| InterpreterError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for setting in &self.interpreters {
            if setting.name.trim().is_empty() {
                return Err(InterpreterError::ConfigError {
                    reason: "interpreter name cannot be empty".to_string(),
                });
            }
            if !seen.insert(setting.name.as_str()) {
                return Err(InterpreterError::ConfigError {
                    reason: format!("duplicate interpreter name '{}'", setting.name),
                });
            }
        }
        Ok(())
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| InterpreterError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| InterpreterError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(Self::config_path(), content).map_err(|e| InterpreterError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// `NBINTERP_USER` fills in settings without a user;
    /// `NBINTERP_DEFAULT_INTERPRETER` overrides the default interpreter.
    pub fn with_env(mut self) -> Self {
        if let Ok(user) = std::env::var("NBINTERP_USER") {
            if !user.is_empty() {
                for setting in &mut self.interpreters {
                    if setting.user.is_none() {
                        setting.user = Some(user.clone());
                    }
                }
            }
        }

        if let Ok(name) = std::env::var("NBINTERP_DEFAULT_INTERPRETER") {
            if !name.is_empty() {
                self.default_interpreter = Some(name);
            }
        }

        self
    }

    /// Find a setting by name, or the default one when `name` is None
    pub fn setting(&self, name: Option<&str>) -> Result<&InterpreterSetting> {
        let name = name
            .or(self.default_interpreter.as_deref())
            .or_else(|| self.interpreters.first().map(|s| s.name.as_str()))
            .ok_or_else(|| InterpreterError::ConfigError {
                reason: "no interpreters configured".to_string(),
            })?;

        self.interpreters
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| InterpreterError::InterpreterNotConfigured {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
default_interpreter = "bash"

[[interpreter]]
name = "bash"
class = "shell"
user = "alice"
classloader_urls = ["file:///opt/tools/bin"]

[interpreter.properties]
"shell.command" = "bash"
"shell.timeout_ms" = "5000"

[[interpreter]]
name = "fake"
class = "mock"
lazy = false
"#;

    #[test]
    fn test_config_path_contains_nbinterp() {
        let path = NbConfig::config_path();
        assert!(path.to_string_lossy().contains("nbinterp"));
        assert!(path.to_string_lossy().ends_with("interpreters.toml"));
    }

    #[test]
    fn test_default_config_has_lazy_shell() {
        let config = NbConfig::default();
        let setting = config.setting(None).unwrap();

        assert_eq!(setting.name, "sh");
        assert_eq!(setting.class, "shell");
        assert!(setting.lazy);
    }

    #[test]
    fn test_parse_sample() {
        let config = NbConfig::parse(SAMPLE).unwrap();

        assert_eq!(config.default_interpreter.as_deref(), Some("bash"));
        assert_eq!(config.interpreters.len(), 2);

        let bash = &config.interpreters[0];
        assert_eq!(bash.user.as_deref(), Some("alice"));
        assert!(bash.lazy);
        assert_eq!(bash.classloader_urls[0].as_str(), "file:///opt/tools/bin");
        assert_eq!(
            bash.properties.get("shell.timeout_ms").map(String::as_str),
            Some("5000")
        );

        let fake = &config.interpreters[1];
        assert!(!fake.lazy);
        assert!(fake.properties.is_empty());
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let toml = r#"
[[interpreter]]
name = "sh"
class = "shell"

[[interpreter]]
name = "sh"
class = "mock"
"#;
        let err = NbConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_parse_rejects_bad_url() {
        let toml = r#"
[[interpreter]]
name = "sh"
class = "shell"
classloader_urls = ["not a url"]
"#;
        assert!(matches!(
            NbConfig::parse(toml),
            Err(InterpreterError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_setting_lookup() {
        let config = NbConfig::parse(SAMPLE).unwrap();

        assert_eq!(config.setting(None).unwrap().name, "bash");
        assert_eq!(config.setting(Some("fake")).unwrap().class, "mock");
        assert!(matches!(
            config.setting(Some("nope")),
            Err(InterpreterError::InterpreterNotConfigured { .. })
        ));

        let empty = NbConfig {
            default_interpreter: None,
            interpreters: vec![],
        };
        assert!(empty.setting(None).is_err());
    }

    #[test]
    fn test_load_from_file_and_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("interpreters.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = NbConfig::load_from(&path).unwrap();
        let reparsed = NbConfig::parse(&toml::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = NbConfig::load_from(&temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, InterpreterError::ConfigError { .. }));
    }

    #[test]
    #[serial]
    fn test_env_fills_missing_users() {
        env::set_var("NBINTERP_USER", "svc");

        let config = NbConfig::parse(SAMPLE).unwrap().with_env();

        // Explicit user wins
        assert_eq!(config.interpreters[0].user.as_deref(), Some("alice"));
        assert_eq!(config.interpreters[1].user.as_deref(), Some("svc"));

        env::remove_var("NBINTERP_USER");
    }

    #[test]
    #[serial]
    fn test_env_overrides_default_interpreter() {
        env::set_var("NBINTERP_DEFAULT_INTERPRETER", "fake");
        let config = NbConfig::parse(SAMPLE).unwrap().with_env();
        assert_eq!(config.setting(None).unwrap().name, "fake");

        env::set_var("NBINTERP_DEFAULT_INTERPRETER", "");
        let config = NbConfig::parse(SAMPLE).unwrap().with_env();
        assert_eq!(config.setting(None).unwrap().name, "bash");

        env::remove_var("NBINTERP_DEFAULT_INTERPRETER");
    }
}
