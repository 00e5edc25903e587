//! Folds per-file scans into diagnostics and reconciles suppressions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use pmax_core::{Diagnostic, FileId, Location, NodeId, ProgramModel, SourceUnit, SymbolId};
use tracing::info;

use super::obsolescence::ObsolescenceResolver;
use super::suppression::SuppressionDirective;
use super::{DedupeMode, NoDeprecatedOptions, CODE, NAME, UNUSED_CODE};

/// Message of unused-directive diagnostics.
pub const UNUSED_MESSAGE: &str =
    "Unused @prettier-max-ignore-deprecated directive (no deprecated usage on the next line)";

/// A candidate reference found while scanning a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Usage {
    pub symbol: SymbolId,
    pub report: NodeId,
}

/// Result of scanning one file.
#[derive(Debug, Default)]
pub(crate) struct FileScan {
    pub directives: BTreeMap<usize, SuppressionDirective>,
    pub usages: Vec<Usage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupeKey {
    Column(FileId, usize, usize),
    Name(FileId, usize, String),
}

/// Run-wide accumulator.
pub(crate) struct Aggregator<'o> {
    options: &'o NoDeprecatedOptions,
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<DedupeKey>,
    suppressions: BTreeMap<(FileId, usize), SuppressionDirective>,
    consumed: HashSet<(FileId, usize)>,
    paths: HashMap<FileId, PathBuf>,
}

impl<'o> Aggregator<'o> {
    pub(crate) fn new(options: &'o NoDeprecatedOptions) -> Self {
        Self {
            options,
            diagnostics: Vec::new(),
            seen: HashSet::new(),
            suppressions: BTreeMap::new(),
            consumed: HashSet::new(),
            paths: HashMap::new(),
        }
    }

    /// Adds the directives and obsolete usages of one file.
    pub(crate) fn fold(
        &mut self,
        model: &dyn ProgramModel,
        unit: &SourceUnit,
        scan: FileScan,
        resolver: &mut ObsolescenceResolver<'_>,
    ) {
        self.paths.insert(unit.id, unit.path.clone());
        for (line, directive) in scan.directives {
            self.suppressions.entry((unit.id, line)).or_insert(directive);
        }

        for usage in scan.usages {
            let info = resolver.resolve(usage.symbol);
            if !info.is_obsolete {
                continue;
            }
            let Some(symbol) = model.symbol(usage.symbol) else {
                continue;
            };
            let span = unit.tree.span(usage.report);
            let position = unit.position(span.start);

            let key = match self.options.dedupe {
                DedupeMode::Column => DedupeKey::Column(unit.id, position.line, position.column),
                DedupeMode::SymbolName => DedupeKey::Name(unit.id, position.line, symbol.name.clone()),
            };
            if !self.seen.insert(key) {
                continue;
            }

            if let Some(directive) = self.suppressions.get(&(unit.id, position.line)) {
                self.consumed.insert((unit.id, position.line));
                if self.options.log_suppressions {
                    info!(
                        "Suppressed deprecated usage of '{}' at {}:{}:{}{}",
                        symbol.name,
                        unit.path.display(),
                        position.line,
                        position.column,
                        directive
                            .note
                            .as_deref()
                            .map(|n| format!(" ({n})"))
                            .unwrap_or_default()
                    );
                }
                continue;
            }

            let location = Location::new(unit.path.clone(), position.line, position.column)
                .with_span(span.start, span.len());
            self.diagnostics.push(Diagnostic::new(
                CODE,
                NAME,
                self.options.severity,
                location,
                info.message(&symbol.name),
            ));
        }
    }

    /// Emits unused-directive diagnostics and returns everything found.
    pub(crate) fn finish(mut self) -> Vec<Diagnostic> {
        if self.options.report_unused_directives {
            for ((file, line), directive) in &self.suppressions {
                if self.consumed.contains(&(*file, *line)) {
                    continue;
                }
                let Some(path) = self.paths.get(file) else {
                    continue;
                };
                let location = Location::new(path.clone(), line.saturating_sub(1), 1)
                    .with_span(directive.span.start, directive.span.len());
                self.diagnostics.push(Diagnostic::new(
                    UNUSED_CODE,
                    NAME,
                    self.options.severity,
                    location,
                    UNUSED_MESSAGE,
                ));
            }
        }
        self.diagnostics.sort_by(|a, b| {
            (&a.location.file, a.location.line, a.location.column, &a.code).cmp(&(
                &b.location.file,
                b.location.line,
                b.location.column,
                &b.code,
            ))
        });
        self.diagnostics
    }
}
