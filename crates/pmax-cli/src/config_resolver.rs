//! Configuration file resolution with global fallback.
//!
//! Resolves the configuration file path using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `{project}/pmax.toml` or `.pmax.toml`
//! 3. `$PMAX_CONFIG_DIR/config.toml` or `~/.pmax/config.toml` (global fallback)
//! 4. No config found → defaults

use anyhow::{Context, Result};
use pmax_core::Config;
use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Loaded from the global config directory (`~/.pmax/`).
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config was loaded from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }

    /// Loads the configuration this source points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            tracing::debug!("No configuration file found, using defaults");
            return Ok(Config::default());
        };
        if self.is_global() {
            tracing::info!("Using global config: {}", path.display());
        }
        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_NAMES: &[&str] = &["pmax.toml", ".pmax.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration file path.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(project_dir, explicit, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    // 1. Explicit path from --config flag
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    // 2. Project-level config
    for name in PROJECT_CONFIG_NAMES {
        let candidate = project_dir.join(name);
        if candidate.exists() {
            tracing::debug!("Found project config: {}", candidate.display());
            return ConfigSource::Project(candidate);
        }
    }

    // 3. Global fallback
    if let Some(dir) = global_dir {
        let candidate = dir.join(GLOBAL_CONFIG_NAME);
        if candidate.exists() {
            tracing::debug!("Found global config: {}", candidate.display());
            return ConfigSource::Global(candidate);
        }
    }

    ConfigSource::Default
}

/// Returns the global config directory path.
///
/// Resolution: `$PMAX_CONFIG_DIR` > `~/.pmax/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("PMAX_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".pmax"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmax_core::Severity;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn explicit_wins_and_is_not_checked() {
        let project = TempDir::new().unwrap();
        touch(project.path(), "pmax.toml");

        let missing = Path::new("/nonexistent/pmax.toml");
        assert_eq!(
            resolve_inner(project.path(), Some(missing), None),
            ConfigSource::Explicit(missing.to_path_buf())
        );
    }

    #[test]
    fn project_names_in_priority_order() {
        let project = TempDir::new().unwrap();
        let dotted = touch(project.path(), ".pmax.toml");
        assert_eq!(
            resolve_inner(project.path(), None, None),
            ConfigSource::Project(dotted)
        );

        let plain = touch(project.path(), "pmax.toml");
        assert_eq!(
            resolve_inner(project.path(), None, None),
            ConfigSource::Project(plain)
        );
    }

    #[test]
    fn global_is_the_last_resort() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let global_dir = Some(global.path().to_path_buf());

        assert_eq!(
            resolve_inner(project.path(), None, global_dir.clone()),
            ConfigSource::Default
        );

        let global_file = touch(global.path(), "config.toml");
        let source = resolve_inner(project.path(), None, global_dir.clone());
        assert_eq!(source, ConfigSource::Global(global_file));
        assert!(source.is_global());

        touch(project.path(), "pmax.toml");
        assert!(matches!(
            resolve_inner(project.path(), None, global_dir),
            ConfigSource::Project(_)
        ));
    }

    #[test]
    fn load_reads_rule_tables() {
        let project = TempDir::new().unwrap();
        let path = project.path().join("pmax.toml");
        fs::write(
            &path,
            "[rules.no-deprecated]\nseverity = \"warning\"\ndedupe = \"symbol-name\"\n",
        )
        .unwrap();

        let config = ConfigSource::Project(path).load().unwrap();
        assert_eq!(config.rule_severity("no-deprecated"), Some(Severity::Warning));
        assert_eq!(
            config.rules["no-deprecated"].get_str("dedupe", "column"),
            "symbol-name"
        );
    }

    #[test]
    fn load_defaults_and_errors() {
        assert!(ConfigSource::Default.load().unwrap().rules.is_empty());

        let project = TempDir::new().unwrap();
        let broken = project.path().join("pmax.toml");
        fs::write(&broken, "[rules\n").unwrap();
        let err = ConfigSource::Explicit(broken).load().unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config"));
    }
}
