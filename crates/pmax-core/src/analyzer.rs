//! Core analyzer for orchestrating lint execution.

use crate::config::{Config, RuleConfig};
use crate::context::ProgramContext;
use crate::program::ProgramModel;
use crate::rule::{ProgramRule, ProgramRuleBox};
use crate::types::{Diagnostic, LintResult};

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while setting up an analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Two rules share the same name.
    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    /// Configuration refers to a rule that is not registered.
    #[error("Unknown rule in configuration: {0}")]
    UnknownRule(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    rules: Vec<ProgramRuleBox>,
    config: Option<Config>,
    strict_config: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: ProgramRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: ProgramRuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = ProgramRuleBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Rejects configuration tables for unregistered rules (default: false).
    #[must_use]
    pub fn strict_config(mut self, strict: bool) -> Self {
        self.strict_config = strict;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if two rules share a name, or if strict configuration
    /// is on and the configuration names an unknown rule.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name()) {
                return Err(AnalyzerError::DuplicateRule(rule.name().to_string()));
            }
        }

        let config = self.config.unwrap_or_default();
        if self.strict_config {
            let mut names: Vec<&String> = config.rules.keys().collect();
            names.sort();
            if let Some(unknown) = names.into_iter().find(|n| !seen.contains(n.as_str())) {
                return Err(AnalyzerError::UnknownRule(unknown.clone()));
            }
        }

        Ok(Analyzer {
            rules: self.rules,
            config,
        })
    }
}

/// The main analyzer that runs rules over a program model.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    rules: Vec<ProgramRuleBox>,
    config: Config,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every enabled rule over the program.
    #[must_use]
    pub fn analyze(&self, model: &dyn ProgramModel) -> LintResult {
        let files_checked = model
            .source_units()
            .iter()
            .filter(|u| u.is_scannable())
            .count();
        info!("Starting analysis of {} files", files_checked);

        let mut result = LintResult::new();
        result.files_checked = files_checked;

        for rule in &self.rules {
            if !self.config.is_rule_enabled(rule.name()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            let ctx = ProgramContext::new(model).with_rule_config(self.rule_config(rule.name()));
            let diagnostics = rule.check_program(&ctx);
            debug!("{} produced {} diagnostics", rule.name(), diagnostics.len());
            let diagnostics = self.apply_severity_override(rule.name(), diagnostics);
            result.diagnostics.extend(diagnostics);
        }

        result.sort();

        info!(
            "Analysis complete: {} diagnostics in {} files",
            result.diagnostics.len(),
            result.files_checked
        );

        result
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        rule_name: &str,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Vec<Diagnostic> {
        if let Some(severity) = self.config.rule_severity(rule_name) {
            for d in &mut diagnostics {
                d.severity = severity;
            }
        }
        diagnostics
    }

    /// Gets the rule configuration for a specific rule.
    #[must_use]
    pub fn rule_config(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.config.rules.get(rule_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsdoc::DocTag;
    use crate::program::{DeclarationRef, ModelError, Symbol, SymbolId};
    use crate::source::{FileId, SourceUnit};
    use crate::syntax::{NodeId, TreeBuilder};
    use crate::types::{Location, Severity};
    use std::path::PathBuf;

    struct Files(Vec<SourceUnit>);

    impl Files {
        fn new(paths: &[&str]) -> Self {
            Self(
                paths
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        SourceUnit::new(
                            FileId::new(i),
                            PathBuf::from(p),
                            String::new(),
                            TreeBuilder::new().finish(),
                        )
                    })
                    .collect(),
            )
        }
    }

    impl ProgramModel for Files {
        fn source_units(&self) -> &[SourceUnit] {
            &self.0
        }
        fn resolve_symbol(&self, _file: FileId, _node: NodeId) -> Option<SymbolId> {
            None
        }
        fn immediate_alias_target(&self, _symbol: SymbolId) -> Option<SymbolId> {
            None
        }
        fn symbol(&self, _symbol: SymbolId) -> Option<&Symbol> {
            None
        }
        fn documentation_tags(&self, symbol: SymbolId) -> Result<Vec<DocTag>, ModelError> {
            Err(ModelError::UnknownSymbol(symbol))
        }
        fn has_legacy_deprecated_flag(&self, _declaration: DeclarationRef) -> bool {
            false
        }
    }

    /// Reports one diagnostic per scannable file, at descending lines.
    struct PerFile;

    impl ProgramRule for PerFile {
        fn name(&self) -> &'static str {
            "per-file"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn default_severity(&self) -> Severity {
            Severity::Warning
        }
        fn check_program(&self, ctx: &ProgramContext<'_>) -> Vec<Diagnostic> {
            let prefix = ctx.option_str("prefix", "hit");
            ctx.scannable_units()
                .enumerate()
                .map(|(i, u)| {
                    Diagnostic::new(
                        "TEST001",
                        "per-file",
                        Severity::Warning,
                        Location::new(u.path.clone(), 10 - i, 1),
                        prefix,
                    )
                })
                .collect()
        }
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let err = Analyzer::builder()
            .rule(PerFile)
            .rule(PerFile)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalyzerError::DuplicateRule(name) if name == "per-file"));
    }

    #[test]
    fn strict_config_rejects_unknown_rules() {
        let config = Config::parse("[rules.nope]\nenabled = true\n").unwrap();
        let err = Analyzer::builder()
            .rule(PerFile)
            .config(config.clone())
            .strict_config(true)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalyzerError::UnknownRule(name) if name == "nope"));

        assert!(Analyzer::builder().rule(PerFile).config(config).build().is_ok());
    }

    #[test]
    fn analyze_skips_external_and_declaration_files() {
        let model = Files::new(&["src/b.ts", "src/a.ts", "types/x.d.ts", "node_modules/y/i.ts"]);
        let analyzer = Analyzer::builder().rule(PerFile).build().unwrap();
        let result = analyzer.analyze(&model);

        assert_eq!(result.files_checked, 2);
        let files: Vec<_> = result
            .diagnostics
            .iter()
            .map(|d| d.location.file.to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["src/a.ts", "src/b.ts"]);
    }

    #[test]
    fn severity_override_and_options() {
        let config = Config::parse(
            "[rules.per-file]\nseverity = \"error\"\nprefix = \"configured\"\n",
        )
        .unwrap();
        let analyzer = Analyzer::builder()
            .rule(PerFile)
            .config(config)
            .build()
            .unwrap();
        let result = analyzer.analyze(&Files::new(&["a.ts"]));

        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
        assert_eq!(result.diagnostics[0].message, "TEST001: configured");
    }

    #[test]
    fn disabled_rule_is_skipped() {
        let config = Config::parse("[rules.per-file]\nenabled = false\n").unwrap();
        let analyzer = Analyzer::builder()
            .rule(PerFile)
            .config(config)
            .build()
            .unwrap();
        let result = analyzer.analyze(&Files::new(&["a.ts"]));
        assert!(result.is_clean());
        assert_eq!(result.files_checked, 1);
    }
}
