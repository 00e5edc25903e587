//! Rule to flag usages of deprecated declarations.
//!
//! # Rationale
//!
//! Declarations documented with `@deprecated` are scheduled for removal.
//! Every reference to one outside of other deprecated code is reported, so
//! migrations can be tracked to completion.
//!
//! # Detected Patterns
//!
//! - Calls, `new` expressions and property accesses of deprecated members
//! - Type references to deprecated types
//! - Imports and re-exports of deprecated bindings
//! - JSX tags, attributes and spreads resolving to deprecated props
//!
//! # Suppression
//!
//! ```text
//! // @prettier-max-ignore-deprecated: migrating in Q3
//! legacyFetch();
//! ```
//!
//! A directive that suppresses nothing is itself reported as `PMAX002`.

mod aggregator;
mod classifier;
mod obsolescence;
mod scope_skip;
mod suppression;

use pmax_core::{Diagnostic, ProgramContext, ProgramModel, ProgramRule, Severity, SourceUnit};
use tracing::{debug, warn};

use aggregator::{Aggregator, FileScan, Usage};
use classifier::Classification;
use obsolescence::ObsolescenceResolver;

pub use aggregator::UNUSED_MESSAGE;
pub use obsolescence::ObsolescenceInfo;
pub use suppression::{parse_directive, SuppressionDirective, DIRECTIVE};

/// Rule code for deprecated usages.
pub const CODE: &str = "PMAX001";

/// Rule code for directives that suppress nothing.
pub const UNUSED_CODE: &str = "PMAX002";

/// Rule name for no-deprecated.
pub const NAME: &str = "no-deprecated";

/// How repeated reports on one line are collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupeMode {
    /// One report per `(file, line, column)`.
    #[default]
    Column,
    /// One report per `(file, line, symbol name)`.
    SymbolName,
}

impl DedupeMode {
    /// Parses the configuration spelling (`"column"`, `"symbol-name"`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "column" => Some(Self::Column),
            "symbol-name" => Some(Self::SymbolName),
            _ => None,
        }
    }
}

/// Options of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoDeprecatedOptions {
    /// Collapse mode for repeated reports.
    pub dedupe: DedupeMode,
    /// Log each suppressed usage at `info`.
    pub log_suppressions: bool,
    /// Emit `PMAX002` for unused directives.
    pub report_unused_directives: bool,
    /// Severity of emitted diagnostics.
    pub severity: Severity,
}

impl Default for NoDeprecatedOptions {
    fn default() -> Self {
        Self {
            dedupe: DedupeMode::Column,
            log_suppressions: true,
            report_unused_directives: true,
            severity: Severity::Error,
        }
    }
}

/// Flags usages of `@deprecated` declarations.
#[derive(Debug, Clone, Default)]
pub struct NoDeprecated {
    /// Options applied when no configuration overrides them.
    pub options: NoDeprecatedOptions,
}

impl NoDeprecated {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.options.severity = severity;
        self
    }

    /// Sets the dedupe mode.
    #[must_use]
    pub fn dedupe(mut self, mode: DedupeMode) -> Self {
        self.options.dedupe = mode;
        self
    }

    /// Sets whether suppressed usages are logged.
    #[must_use]
    pub fn log_suppressions(mut self, enabled: bool) -> Self {
        self.options.log_suppressions = enabled;
        self
    }

    /// Sets whether unused directives are reported.
    #[must_use]
    pub fn report_unused_directives(mut self, enabled: bool) -> Self {
        self.options.report_unused_directives = enabled;
        self
    }

    /// Runs the analysis over every scannable unit of `model`.
    ///
    /// An empty result means the program is clean.
    #[must_use]
    pub fn analyze(model: &dyn ProgramModel, options: &NoDeprecatedOptions) -> Vec<Diagnostic> {
        if !model.supports_type_checking() {
            warn!("Program model has no type information; skipping {}", NAME);
            return Vec::new();
        }

        let mut resolver = ObsolescenceResolver::new(model);
        let mut aggregator = Aggregator::new(options);
        for unit in model.source_units().iter().filter(|u| u.is_scannable()) {
            let scan = scan_file(model, unit, &mut resolver);
            debug!(
                "Scanned {}: {} candidate usages, {} directives",
                unit.path.display(),
                scan.usages.len(),
                scan.directives.len()
            );
            aggregator.fold(model, unit, scan, &mut resolver);
        }
        aggregator.finish()
    }

    fn effective_options(&self, ctx: &ProgramContext<'_>) -> NoDeprecatedOptions {
        let defaults = &self.options;
        let dedupe = match ctx.option_str("dedupe", "") {
            "" => defaults.dedupe,
            value => DedupeMode::parse(value).unwrap_or_else(|| {
                warn!("Unknown dedupe mode '{}' for {}; using default", value, NAME);
                defaults.dedupe
            }),
        };
        NoDeprecatedOptions {
            dedupe,
            log_suppressions: ctx.option_bool("log_suppressions", defaults.log_suppressions),
            report_unused_directives: ctx
                .option_bool("report_unused_directives", defaults.report_unused_directives),
            severity: ctx
                .rule_config
                .and_then(|c| c.severity)
                .unwrap_or(defaults.severity),
        }
    }
}

/// Walks one unit, collecting candidate usages and directives.
fn scan_file(
    model: &dyn ProgramModel,
    unit: &SourceUnit,
    resolver: &mut ObsolescenceResolver<'_>,
) -> FileScan {
    let mut scan = FileScan {
        directives: suppression::scan(unit),
        usages: Vec::new(),
    };
    let mut stack = vec![unit.tree.root()];
    while let Some(node) = stack.pop() {
        match classifier::classify(model, unit, node, resolver) {
            Classification::SkipSubtree => continue,
            Classification::Usage { symbol, report } => {
                scan.usages.push(Usage { symbol, report });
            }
            Classification::Continue => {}
        }
        stack.extend(unit.tree.children(node).iter().rev());
    }
    scan
}

impl ProgramRule for NoDeprecated {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn codes(&self) -> &'static [&'static str] {
        &[CODE, UNUSED_CODE]
    }

    fn description(&self) -> &'static str {
        "Flags usages of @deprecated declarations and unused suppression directives"
    }

    fn default_severity(&self) -> Severity {
        self.options.severity
    }

    fn check_program(&self, ctx: &ProgramContext<'_>) -> Vec<Diagnostic> {
        Self::analyze(ctx.model, &self.effective_options(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmax_core::{Config, DeclarationRef, DocTag, FileId, ModelError, NodeId, SymbolId};
    use pmax_ts::TsProgram;

    fn program(files: &[(&str, &str)]) -> TsProgram {
        let mut builder = TsProgram::builder();
        for (path, text) in files {
            builder = builder.file(*path, *text);
        }
        builder.build().unwrap()
    }

    fn run(files: &[(&str, &str)]) -> Vec<Diagnostic> {
        NoDeprecated::analyze(&program(files), &NoDeprecatedOptions::default())
    }

    fn summary(diagnostics: &[Diagnostic]) -> Vec<(String, usize, usize, String)> {
        diagnostics
            .iter()
            .map(|d| {
                (
                    d.location.file.display().to_string(),
                    d.location.line,
                    d.location.column,
                    d.message.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn repeated_runs_are_identical() {
        let files = [(
            "a.ts",
            "/** @deprecated */\nfunction old() {}\nold();\n// @prettier-max-ignore-deprecated\nconst x = 1;\n",
        )];
        let program = program(&files);
        let options = NoDeprecatedOptions::default();
        let first = NoDeprecated::analyze(&program, &options);
        let second = NoDeprecated::analyze(&program, &options);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn directive_suppresses_the_next_line() {
        let found = run(&[(
            "a.ts",
            "/** @deprecated */\nfunction old() {}\n// @prettier-max-ignore-deprecated: legacy API\nold();\n",
        )]);
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn directive_over_a_clean_line_is_reported() {
        let found = run(&[(
            "a.ts",
            "function fine() {}\n// @prettier-max-ignore-deprecated\nfine();\n",
        )]);
        assert_eq!(
            summary(&found),
            vec![(
                "a.ts".to_string(),
                2,
                1,
                format!("{UNUSED_CODE}: {UNUSED_MESSAGE}")
            )]
        );
        assert_eq!(found[0].code, UNUSED_CODE);
    }

    #[test]
    fn deprecated_callers_are_not_reported() {
        let found = run(&[(
            "a.ts",
            "/** @deprecated */\nfunction b() {}\n/** @deprecated */\nfunction a() {\n  b();\n}\nfunction c() {\n  b();\n}\n",
        )]);
        assert_eq!(
            summary(&found),
            vec![(
                "a.ts".to_string(),
                8,
                3,
                "PMAX001: 'b' is deprecated".to_string()
            )]
        );
    }

    #[test]
    fn aliased_import_reports_the_original_name() {
        let found = run(&[
            ("main.ts", "import { x } from './m';\n"),
            (
                "m.ts",
                "/** @deprecated */\nfunction y() {}\n/** @deprecated */\nexport { y as x };\n",
            ),
        ]);
        assert_eq!(
            summary(&found),
            vec![(
                "main.ts".to_string(),
                1,
                10,
                "PMAX001: 'y' is deprecated".to_string()
            )]
        );
    }

    #[test]
    fn local_export_specifier_is_a_usage() {
        let found = run(&[(
            "m.ts",
            "/** @deprecated */\nfunction y() {}\nexport { y as x };\n",
        )]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location.line, 3);
    }

    #[test]
    fn reason_is_appended_to_the_message() {
        let found = run(&[(
            "a.ts",
            "/** @deprecated Use Z instead */\nfunction y() {}\n/** @deprecated */\nfunction w() {}\ny();\nw();\n",
        )]);
        let messages: Vec<&str> = found.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "PMAX001: 'y' is deprecated: Use Z instead",
                "PMAX001: 'w' is deprecated"
            ]
        );
    }

    #[test]
    fn deprecated_arrow_export_is_reported_at_the_call() {
        let found = run(&[(
            "a.ts",
            "/** @deprecated */\nexport const f = () => 1;\nf();\n",
        )]);
        assert_eq!(
            summary(&found),
            vec![(
                "a.ts".to_string(),
                3,
                1,
                "PMAX001: 'f' is deprecated".to_string()
            )]
        );
    }

    #[test]
    fn suppressed_arrow_export_call_is_clean() {
        let found = run(&[(
            "a.ts",
            "/** @deprecated */\nexport const f = () => 1;\n// @prettier-max-ignore-deprecated\nf();\n",
        )]);
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn directive_above_another_call_is_unused() {
        let found = run(&[(
            "a.ts",
            "/** @deprecated */\nexport const f = () => 1;\nconst g = () => 2;\n// @prettier-max-ignore-deprecated\ng();\nf();\n",
        )]);
        let codes: Vec<(&str, usize)> = found
            .iter()
            .map(|d| (d.code.as_str(), d.location.line))
            .collect();
        assert_eq!(codes, vec![(UNUSED_CODE, 4), (CODE, 6)]);
    }

    #[test]
    fn deprecated_jsx_prop_is_reported_at_the_attribute() {
        let found = run(&[(
            "App.tsx",
            "interface Props {\n  /** @deprecated use `modern` */\n  legacy?: string;\n  modern?: string;\n}\nfunction Comp(props: Props) { return null; }\nconst e = <Comp legacy=\"x\" modern=\"y\" />;\n",
        )]);
        assert_eq!(
            summary(&found),
            vec![(
                "App.tsx".to_string(),
                7,
                17,
                "PMAX001: 'legacy' is deprecated: use `modern`".to_string()
            )]
        );
    }

    #[test]
    fn symbol_name_dedupe_collapses_a_line() {
        let files = [(
            "a.ts",
            "/** @deprecated */\nfunction old(n: number) { return n; }\nold(old(1));\n",
        )];
        let program = program(&files);
        let by_column = NoDeprecated::analyze(&program, &NoDeprecatedOptions::default());
        assert_eq!(by_column.len(), 2);

        let options = NoDeprecatedOptions {
            dedupe: DedupeMode::SymbolName,
            ..NoDeprecatedOptions::default()
        };
        let by_name = NoDeprecated::analyze(&program, &options);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].location.column, 1);
    }

    #[test]
    fn unused_directives_can_be_silenced() {
        let program = program(&[("a.ts", "// @prettier-max-ignore-deprecated\nconst x = 1;\n")]);
        let options = NoDeprecatedOptions {
            report_unused_directives: false,
            ..NoDeprecatedOptions::default()
        };
        assert!(NoDeprecated::analyze(&program, &options).is_empty());
    }

    #[test]
    fn declaration_files_are_not_scanned() {
        let found = run(&[
            (
                "types.d.ts",
                "/** @deprecated */\ndeclare function old(): void;\ndeclare function wrap(): ReturnType<typeof old>;\n",
            ),
            ("a.ts", "const n = 1;\n"),
        ]);
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn configuration_overrides_options() {
        let program = program(&[(
            "a.ts",
            "/** @deprecated */\nfunction old() {}\nold();\n// @prettier-max-ignore-deprecated\nconst x = 1;\n",
        )]);
        let config = Config::parse(
            "[rules.no-deprecated]\nseverity = \"warning\"\nreport_unused_directives = false\n",
        )
        .unwrap();
        let rule = NoDeprecated::new();
        let ctx = ProgramContext::new(&program).with_rule_config(config.rules.get(NAME));
        let found = rule.check_program(&ctx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(rule.codes(), &[CODE, UNUSED_CODE]);
    }

    #[test]
    fn parses_dedupe_modes() {
        assert_eq!(DedupeMode::parse("column"), Some(DedupeMode::Column));
        assert_eq!(DedupeMode::parse("symbol-name"), Some(DedupeMode::SymbolName));
        assert_eq!(DedupeMode::parse("line"), None);
    }

    struct Untyped;

    impl ProgramModel for Untyped {
        fn source_units(&self) -> &[SourceUnit] {
            &[]
        }
        fn resolve_symbol(&self, _file: FileId, _node: NodeId) -> Option<SymbolId> {
            None
        }
        fn immediate_alias_target(&self, _symbol: SymbolId) -> Option<SymbolId> {
            None
        }
        fn symbol(&self, _symbol: SymbolId) -> Option<&pmax_core::Symbol> {
            None
        }
        fn documentation_tags(&self, _symbol: SymbolId) -> Result<Vec<DocTag>, ModelError> {
            Ok(Vec::new())
        }
        fn has_legacy_deprecated_flag(&self, _declaration: DeclarationRef) -> bool {
            false
        }
        fn supports_type_checking(&self) -> bool {
            false
        }
    }

    #[test]
    fn untyped_models_yield_nothing() {
        assert!(NoDeprecated::analyze(&Untyped, &NoDeprecatedOptions::default()).is_empty());
    }

    /// A real program whose documentation lookups all fail. Declarations
    /// named `old` carry the legacy flag.
    struct FailingDocs(TsProgram);

    impl ProgramModel for FailingDocs {
        fn source_units(&self) -> &[SourceUnit] {
            self.0.source_units()
        }
        fn resolve_symbol(&self, file: FileId, node: NodeId) -> Option<SymbolId> {
            self.0.resolve_symbol(file, node)
        }
        fn immediate_alias_target(&self, symbol: SymbolId) -> Option<SymbolId> {
            self.0.immediate_alias_target(symbol)
        }
        fn symbol(&self, symbol: SymbolId) -> Option<&pmax_core::Symbol> {
            self.0.symbol(symbol)
        }
        fn documentation_tags(&self, symbol: SymbolId) -> Result<Vec<DocTag>, ModelError> {
            Err(ModelError::UnknownSymbol(symbol))
        }
        fn has_legacy_deprecated_flag(&self, declaration: DeclarationRef) -> bool {
            let Some(unit) = self.0.source_unit(declaration.file) else {
                return false;
            };
            unit.tree
                .kind(declaration.node)
                .and_then(pmax_core::NodeKind::declaration_name)
                .and_then(|name| unit.tree.name_text(name))
                == Some("old")
        }
    }

    #[test]
    fn documentation_errors_fall_back_to_the_legacy_flag() {
        let model = FailingDocs(program(&[(
            "a.ts",
            "/** @deprecated use fine */\nfunction old() {}\n/** @deprecated */\nfunction fine() {}\nold();\nfine();\n",
        )]));
        let diagnostics = NoDeprecated::analyze(&model, &NoDeprecatedOptions::default());
        assert_eq!(
            summary(&diagnostics),
            vec![(
                "a.ts".to_string(),
                5,
                1,
                "PMAX001: 'old' is deprecated".to_string()
            )]
        );
    }

    #[test]
    fn deeply_nested_expressions_are_analyzed() {
        let terms = vec!["n"; 3000].join(" + ");
        let source = format!(
            "const n = 1;\n/** @deprecated */\nfunction old() {{ return n; }}\nexport const x = {terms};\nold();\n"
        );
        let diagnostics = run(&[("a.ts", source.as_str())]);
        assert_eq!(summary(&diagnostics).len(), 1);
        assert_eq!(diagnostics[0].location.line, 5);
    }
}
