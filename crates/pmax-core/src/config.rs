//! `pmax.toml`: which TypeScript sources to scan, which rules run and
//! what makes a run fail.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::Severity;

/// Contents of a `pmax.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Rule set used when `--rules` is absent ("recommended" or "all").
    #[serde(default)]
    pub preset: Option<String>,

    /// Lowest diagnostic severity that fails the run (default: error).
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// The `[analyzer]` table.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// `[rules.<name>]` tables keyed by rule name.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Reads a `pmax.toml` from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses the text of a `pmax.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or mistyped fields.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Rules without a table, or without `enabled`, run.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Severity the rule's diagnostics are rewritten to, if set.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }

    /// Severity at which a run fails.
    #[must_use]
    pub fn fail_threshold(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Error)
    }
}

/// Where sources are discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Project root, relative to the checked path unless absolute.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Globs never scanned. Imported dependencies under them are still
    /// loaded for symbol lookup.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Skip files matched by `.gitignore`.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            respect_gitignore: true,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/dist/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// One `[rules.<name>]` table, such as `[rules.no-deprecated]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// `false` turns the rule off.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Overrides the severity of every diagnostic the rule emits.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Remaining keys, e.g. `dedupe` or `log_suppressions`.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Boolean option, or `default` when absent or not a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// String option, or `default` when absent or not a string.
    #[must_use]
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }
}

/// Failure to load a `pmax.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// The unreadable file.
        path: PathBuf,
        /// Read failure.
        source: std::io::Error,
    },

    /// The file is not a valid `pmax.toml`.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Message from the TOML deserializer.
        message: String,
    },
}
