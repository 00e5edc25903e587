//! Shared output formatting for lint results.

use anyhow::Result;
use pmax_core::{Diagnostic, LintResult};
use serde::Serialize;
use std::fmt::Write;

use crate::OutputFormat;

/// JSON document printed by `--format json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    files_checked: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    diagnostics: &'a [Diagnostic],
}

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    print!("{}", render(result, format)?);
    Ok(())
}

/// Renders lint results in the specified format.
pub fn render(result: &LintResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => render_json(result)?,
        OutputFormat::Compact => render_compact(result),
    })
}

fn render_text(result: &LintResult) -> String {
    let (errors, warnings, infos) = result.count_by_severity();

    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        out.push_str(&diagnostic.format());
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "Found {} error(s), {} warning(s), {} info(s) in {} file(s)",
        errors, warnings, infos, result.files_checked
    );
    out
}

fn render_json(result: &LintResult) -> Result<String> {
    let (errors, warnings, infos) = result.count_by_severity();
    let report = JsonReport {
        files_checked: result.files_checked,
        errors,
        warnings,
        infos,
        diagnostics: &result.diagnostics,
    };
    Ok(serde_json::to_string_pretty(&report)? + "\n")
}

fn render_compact(result: &LintResult) -> String {
    result
        .diagnostics
        .iter()
        .map(|d| format!("{d}\n"))
        .collect()
}
