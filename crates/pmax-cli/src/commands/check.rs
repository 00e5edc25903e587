//! Check command implementation.

use anyhow::{Context, Result};
use pmax_core::{Analyzer, Config, LintResult, ProgramRuleBox};
use pmax_rules::{all_rules, recommended_rules, Preset};
use pmax_ts::{Dialect, TsProgram};
use std::path::{Path, PathBuf};

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command.
pub fn run(
    path: &Path,
    format: OutputFormat,
    rules_filter: Option<String>,
    exclude: Vec<String>,
    source: &ConfigSource,
) -> Result<()> {
    let config = source.load()?;
    let fail_threshold = config.fail_threshold();

    let result = analyze(path, rules_filter, exclude, config)?;

    super::output::print(&result, format)?;

    if result.has_diagnostics_at(fail_threshold) {
        std::process::exit(1);
    }

    Ok(())
}

/// Loads the project under `path` and runs the selected rules over it.
fn analyze(
    path: &Path,
    rules_filter: Option<String>,
    exclude: Vec<String>,
    config: Config,
) -> Result<LintResult> {
    let root = project_root(path, &config);

    let mut patterns = config.analyzer.exclude.clone();
    patterns.extend(exclude);
    let files = discover_files(&root, &patterns, config.analyzer.respect_gitignore)?;
    tracing::info!("Loading {} files from {}", files.len(), root.display());

    let program = TsProgram::load(&files).context("Failed to load TypeScript program")?;

    let rules = match rules_filter {
        Some(filter) => {
            let names: Vec<&str> = filter.split(',').map(str::trim).collect();
            filter_rules(&names)
        }
        None => preset_rules(&config),
    };

    let analyzer = Analyzer::builder()
        .rules(rules)
        .config(config)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!("Analyzing {:?} with {} rules", root, analyzer.rule_count());

    Ok(analyzer.analyze(&program))
}

/// Directory to analyze: the configured root, relative to `path`.
fn project_root(path: &Path, config: &Config) -> PathBuf {
    let root = &config.analyzer.root;
    if root.is_absolute() {
        root.clone()
    } else if root.as_path() == Path::new(".") {
        path.to_path_buf()
    } else {
        path.join(root)
    }
}

fn preset_rules(config: &Config) -> Vec<ProgramRuleBox> {
    match config.preset.as_deref() {
        None => recommended_rules(),
        Some(name) => Preset::from_name(name).map_or_else(
            || {
                tracing::warn!("Unknown preset: {}, using recommended", name);
                recommended_rules()
            },
            Preset::rules,
        ),
    }
}

fn filter_rules(names: &[&str]) -> Vec<ProgramRuleBox> {
    let selects = |rule: &ProgramRuleBox, name: &str| {
        rule.name() == name || rule.code() == name || rule.codes().iter().any(|c| *c == name)
    };

    let rules: Vec<ProgramRuleBox> = all_rules()
        .into_iter()
        .filter(|rule| names.iter().any(|n| selects(rule, n)))
        .collect();
    for name in names {
        if !rules.iter().any(|rule| selects(rule, name)) {
            tracing::warn!("Unknown rule: {}", name);
        }
    }
    rules
}

/// Collects program files under `root`, sorted.
fn discover_files(root: &Path, exclude: &[String], respect_gitignore: bool) -> Result<Vec<PathBuf>> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(respect_gitignore)
        .git_exclude(respect_gitignore)
        .require_git(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if Dialect::for_path(path).is_none() {
            continue;
        }

        let rel_str = path.strip_prefix(root).unwrap_or(path).to_string_lossy();
        let excluded = exclude.iter().any(|pattern| {
            let clean = pattern.replace("**/", "").replace("/**", "");
            !clean.is_empty() && rel_str.contains(&clean)
        });

        if !excluded {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export {};\n").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn discovers_typescript_sources_only() {
        let tmp = TempDir::new().unwrap();
        for rel in ["src/a.ts", "src/b.tsx", "src/c.d.ts", "src/d.mts", "src/e.js", "README.md"] {
            write(tmp.path(), rel);
        }

        let files = discover_files(tmp.path(), &[], true).unwrap();
        assert_eq!(
            relative(tmp.path(), &files),
            vec!["src/a.ts", "src/b.tsx", "src/c.d.ts", "src/d.mts"]
        );
    }

    #[test]
    fn exclude_patterns_drop_directories() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/a.ts");
        write(tmp.path(), "node_modules/lib/index.d.ts");
        write(tmp.path(), "dist/a.ts");

        let files = discover_files(tmp.path(), &Config::default().analyzer.exclude, true).unwrap();
        assert_eq!(relative(tmp.path(), &files), vec!["src/a.ts"]);
    }

    #[test]
    fn gitignore_is_optional() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/a.ts");
        write(tmp.path(), "gen/b.ts");
        fs::write(tmp.path().join(".gitignore"), "gen/\n").unwrap();

        let respected = discover_files(tmp.path(), &[], true).unwrap();
        assert_eq!(relative(tmp.path(), &respected), vec!["src/a.ts"]);

        let ignored = discover_files(tmp.path(), &[], false).unwrap();
        assert_eq!(relative(tmp.path(), &ignored), vec!["gen/b.ts", "src/a.ts"]);
    }

    #[test]
    fn default_root_is_the_given_path() {
        let config = Config::default();
        assert_eq!(project_root(Path::new("/tmp/proj"), &config), PathBuf::from("/tmp/proj"));

        let nested = Config::parse("[analyzer]\nroot = \"packages/app\"\n").unwrap();
        assert_eq!(
            project_root(Path::new("/tmp/proj"), &nested),
            PathBuf::from("/tmp/proj/packages/app")
        );

        let absolute = Config::parse("[analyzer]\nroot = \"/srv/app\"\n").unwrap();
        assert_eq!(project_root(Path::new("/tmp/proj"), &absolute), PathBuf::from("/srv/app"));
    }

    #[test]
    fn deprecated_package_apis_are_reported() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("node_modules/pkg");
        fs::create_dir_all(pkg.join("dist")).unwrap();
        fs::write(pkg.join("package.json"), r#"{"types": "dist/index.d.ts"}"#).unwrap();
        fs::write(
            pkg.join("dist/index.d.ts"),
            "/** @deprecated use newer */\nexport declare function old(): void;\nexport declare function newer(): void;\n",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(
            tmp.path().join("src/a.ts"),
            "import { old, newer } from 'pkg';\nold();\nnewer();\n",
        )
        .unwrap();

        let result = analyze(tmp.path(), None, Vec::new(), Config::default()).unwrap();
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.diagnostics.len(), 1);

        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.code, "PMAX001");
        assert_eq!(diagnostic.location.file, tmp.path().join("src/a.ts"));
        assert_eq!((diagnostic.location.line, diagnostic.location.column), (1, 10));
        assert!(diagnostic.message.ends_with("'old' is deprecated: use newer"));
    }

    #[test]
    fn filter_accepts_names_and_codes() {
        assert_eq!(filter_rules(&["no-deprecated"]).len(), 1);
        assert_eq!(filter_rules(&["PMAX002"]).len(), 1);
        assert!(filter_rules(&["no-unwrap"]).is_empty());
    }

    #[test]
    fn preset_falls_back_to_recommended() {
        let config = Config::parse("preset = \"bogus\"\n").unwrap();
        assert_eq!(preset_rules(&config).len(), recommended_rules().len());
    }
}
