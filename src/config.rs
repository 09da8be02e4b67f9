/*============================================================
  Synavera Project: Explain
  Module: explain_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load the optional TOML configuration consulted by the
    explain CLI: base option text, output line width and the
    directory for session logs.

  Security / Safety Notes:
    Reads a single user-owned file. Never writes configuration.

  Dependencies:
    serde and toml for decoding, dirs for the XDG locations.

  Operational Scope:
    Used by the CLI entry point only; the library reads its
    options from the environment.

  Revision History:
    2026-10-18 COD  Authored configuration loading.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Missing default file is an empty configuration
    - Missing explicit file is an error naming the path
============================================================*/

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExplainError, Result};

const APP_DIR: &str = "explain";
const CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplainConfig {
    /// Option text, same syntax as `EXPLAIN_OPTIONS`.
    #[serde(default)]
    pub options: Option<String>,
    /// Column at which stderr output is wrapped.
    #[serde(default)]
    pub line_width: Option<usize>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl ExplainConfig {
    /// Load from `path`, or from the default location when `None`.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            ExplainError::Config(format!("unable to read {}: {err}", path.display()))
        })?;
        Self::from_toml(&text)
            .map_err(|err| ExplainError::Config(format!("{}: {err}", path.display())))
    }

    fn from_toml(text: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|err| err.message().to_string())?;
        if config.line_width == Some(0) {
            return Err("line_width must be positive".into());
        }
        Ok(config)
    }

    /// Directory receiving session logs.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("logs")
        })
    }
}

/// `$XDG_CONFIG_HOME/explain/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn reads_every_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "options = \"no-numeric-errno,hanging-indent=4\"\nline_width = 100\nlog_dir = \"/var/tmp/explain\"\n",
        )
        .unwrap();
        let config = ExplainConfig::load_from_optional_path(Some(&path)).unwrap();
        assert_eq!(config.options.as_deref(), Some("no-numeric-errno,hanging-indent=4"));
        assert_eq!(config.line_width, Some(100));
        assert_eq!(config.log_dir(), PathBuf::from("/var/tmp/explain"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = ExplainConfig::load_from_optional_path(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ExplainError::Config(_)));
    }

    #[test]
    fn unknown_keys_and_zero_width_are_rejected() {
        assert!(ExplainConfig::from_toml("colour = true").is_err());
        assert!(ExplainConfig::from_toml("line_width = 0").is_err());
        assert_eq!(ExplainConfig::from_toml("").unwrap(), ExplainConfig::default());
    }

    #[test]
    #[serial]
    fn missing_default_file_is_empty() {
        let dir = tempdir().unwrap();
        let saved = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", dir.path());
        let loaded = ExplainConfig::load_from_optional_path(None);
        fs::create_dir_all(dir.path().join(APP_DIR)).unwrap();
        fs::write(dir.path().join(APP_DIR).join(CONFIG_FILE), "line_width = 60\n").unwrap();
        let found = ExplainConfig::load_from_optional_path(None);
        match saved {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        assert_eq!(loaded.unwrap(), ExplainConfig::default());
        assert_eq!(found.unwrap().line_width, Some(60));
    }
}
