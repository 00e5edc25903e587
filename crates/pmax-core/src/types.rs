//! Core types for lint diagnostics and results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for lint diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path as known to the program model.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file.
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// A lint diagnostic found during analysis.
///
/// `message` always starts with `"<code>: "` so that downstream tooling can
/// grep for the stable code without parsing the structured fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g., "PMAX001").
    pub code: String,
    /// Rule name (e.g., "no-deprecated").
    pub rule: String,
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Primary location of the diagnostic.
    pub location: Location,
    /// Human-readable message, prefixed with the code.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new diagnostic. The code prefix is added to `text`.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        text: impl AsRef<str>,
    ) -> Self {
        let code = code.into();
        let message = format!("{code}: {}", text.as_ref());
        Self {
            code,
            rule: rule.into(),
            severity,
            location,
            message,
        }
    }

    /// Returns the message without the leading `"<code>: "` prefix.
    #[must_use]
    pub fn text(&self) -> &str {
        self.message
            .strip_prefix(self.code.as_str())
            .and_then(|rest| rest.strip_prefix(": "))
            .unwrap_or(&self.message)
    }

    /// Formats the diagnostic for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        output
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.message
        )
    }
}

/// Result of running lint analysis.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics found.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files scanned.
    pub files_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no diagnostics were produced.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns true if there are any warnings or errors.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Warning)
    }

    /// Returns diagnostics with the given code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }

    /// Counts diagnostics by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let errors = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let warnings = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        let infos = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Info)
            .count();
        (errors, warnings, infos)
    }

    /// Checks if any diagnostics meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_diagnostics_at(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= severity)
    }

    /// Sorts diagnostics by file, line, then column.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
                .then(a.code.cmp(&b.code))
        });
    }

    /// Adds diagnostics from another result.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.files_checked += other.files_checked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diagnostic(severity: Severity) -> Diagnostic {
        Diagnostic::new(
            "PMAX001",
            "no-deprecated",
            severity,
            Location::new(PathBuf::from("src/app.ts"), 42, 10),
            "'legacyFetch' is deprecated",
        )
    }

    #[test]
    fn message_is_prefixed_with_code() {
        let d = make_diagnostic(Severity::Error);
        assert_eq!(d.message, "PMAX001: 'legacyFetch' is deprecated");
        assert_eq!(d.text(), "'legacyFetch' is deprecated");
    }

    #[test]
    fn display_is_compact() {
        let d = make_diagnostic(Severity::Warning);
        insta::assert_snapshot!(
            d.to_string(),
            @"src/app.ts:42:10: warning PMAX001: 'legacyFetch' is deprecated"
        );
    }

    #[test]
    fn format_includes_rule_and_location() {
        let formatted = make_diagnostic(Severity::Error).format();
        assert!(formatted.starts_with("PMAX001 no-deprecated at src/app.ts:42:10"));
        assert!(formatted.contains("  error: PMAX001: 'legacyFetch' is deprecated"));
    }

    #[test]
    fn has_diagnostics_at_error_only() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Warning));
        assert!(!result.has_diagnostics_at(Severity::Error));
        assert!(result.has_diagnostics_at(Severity::Warning));
        assert!(!result.has_errors());
        assert!(result.has_warnings());
    }

    #[test]
    fn sort_orders_by_position() {
        let mut result = LintResult::new();
        let mut late = make_diagnostic(Severity::Error);
        late.location.line = 90;
        result.diagnostics.push(late);
        result.diagnostics.push(make_diagnostic(Severity::Error));
        result.sort();
        assert_eq!(result.diagnostics[0].location.line, 42);
        assert_eq!(result.diagnostics[1].location.line, 90);
    }

    #[test]
    fn count_by_severity_counts_each_bucket() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Error));
        result.diagnostics.push(make_diagnostic(Severity::Error));
        result.diagnostics.push(make_diagnostic(Severity::Info));
        assert_eq!(result.count_by_severity(), (2, 0, 1));
        assert_eq!(result.by_code("PMAX001").len(), 3);
    }
}
