//! Rule trait for defining program-wide lint rules.

use crate::context::ProgramContext;
use crate::types::{Diagnostic, Severity};

/// A lint rule that analyzes a whole compiled program.
///
/// Rules receive a [`ProgramContext`] giving access to the program model
/// and to the rule's own configuration table.
///
/// # Example
///
/// ```ignore
/// use pmax_core::{Diagnostic, ProgramContext, ProgramRule};
///
/// pub struct NoEmptyFiles;
///
/// impl ProgramRule for NoEmptyFiles {
///     fn name(&self) -> &'static str { "no-empty-files" }
///     fn code(&self) -> &'static str { "PMAX100" }
///
///     fn check_program(&self, ctx: &ProgramContext<'_>) -> Vec<Diagnostic> {
///         ctx.scannable_units()
///             .filter(|u| u.text.trim().is_empty())
///             .map(|u| /* ... */)
///             .collect()
///     }
/// }
/// ```
pub trait ProgramRule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "no-deprecated").
    fn name(&self) -> &'static str;

    /// Returns the primary rule code (e.g., "PMAX001").
    fn code(&self) -> &'static str;

    /// Returns every code this rule may emit.
    fn codes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for diagnostics from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks the program and returns any diagnostics found.
    fn check_program(&self, ctx: &ProgramContext<'_>) -> Vec<Diagnostic>;
}

/// Type alias for boxed `ProgramRule` trait objects.
pub type ProgramRuleBox = Box<dyn ProgramRule>;

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRule;

    impl ProgramRule for TestRule {
        fn name(&self) -> &'static str {
            "test-rule"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn description(&self) -> &'static str {
            "A test rule"
        }

        fn check_program(&self, _ctx: &ProgramContext<'_>) -> Vec<Diagnostic> {
            Vec::new()
        }
    }

    #[test]
    fn test_rule_trait() {
        let rule = TestRule;
        assert_eq!(rule.name(), "test-rule");
        assert_eq!(rule.code(), "TEST001");
        assert!(rule.codes().is_empty());
        assert_eq!(rule.default_severity(), Severity::Error);
    }
}
