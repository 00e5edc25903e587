//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"# pmax configuration

# preset = "recommended"
# fail_on = "error"

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./src"

# Path patterns to exclude from analysis
exclude = [
    "**/node_modules/**",
    "**/dist/**",
]

# Respect .gitignore files
respect_gitignore = true

[rules.no-deprecated]
enabled = true
# severity = "warning"  # Override severity of PMAX001/PMAX002
# One report per "column" or per "symbol-name" on a line
dedupe = "column"
# Log usages silenced by // @prettier-max-ignore-deprecated
log_suppressions = true
# Report directives that silence nothing (PMAX002)
report_unused_directives = true
"#;

/// File name written by `pmax init`.
const CONFIG_NAME: &str = "pmax.toml";

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let path = write_config(Path::new("."), force)?;

    println!("Created {}", path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure rules");
    println!("  2. Run: pmax check");

    Ok(())
}

/// Writes the default configuration into `dir`.
fn write_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmax_core::Config;
    use tempfile::TempDir;

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert!(config.is_rule_enabled("no-deprecated"));
        assert!(config.analyzer.respect_gitignore);
        let rule = &config.rules["no-deprecated"];
        assert_eq!(rule.get_str("dedupe", ""), "column");
        assert!(rule.get_bool("report_unused_directives", false));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), false).unwrap();
        std::fs::write(&path, "# edited\n").unwrap();

        assert!(write_config(tmp.path(), false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");

        write_config(tmp.path(), true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
