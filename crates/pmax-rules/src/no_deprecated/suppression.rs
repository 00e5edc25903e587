//! Inline suppression directives.
//!
//! `// @prettier-max-ignore-deprecated` or
//! `// @prettier-max-ignore-deprecated: note` silences deprecated usages on
//! the line right after the comment. Only line comments whose text starts
//! with the directive token count.

use std::collections::{BTreeMap, HashSet};

use pmax_core::comments::{comment_text, leading_comments, leading_comments_at};
use pmax_core::syntax::{Comment, CommentKind};
use pmax_core::{SourceUnit, Span};
use tracing::debug;

/// Directive token.
pub const DIRECTIVE: &str = "@prettier-max-ignore-deprecated";

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionDirective {
    /// 1-based line the directive protects.
    pub protected_line: usize,
    /// Free text after the colon.
    pub note: Option<String>,
    /// Span of the directive comment.
    pub span: Span,
}

/// Parses a comment's text, returning the note of a matching directive.
///
/// The outer `Option` tells whether the comment is a directive at all.
#[must_use]
pub fn parse_directive(comment: &str) -> Option<Option<String>> {
    let body = comment.strip_prefix("//")?.trim_start();
    let rest = body.strip_prefix(DIRECTIVE)?.trim();
    if rest.is_empty() {
        return Some(None);
    }
    let note = rest.strip_prefix(':')?.trim();
    Some((!note.is_empty()).then(|| note.to_string()))
}

/// Collects the directives of a unit, keyed by protected line.
///
/// Several directives protecting the same line collapse into one; the
/// first note wins.
pub(crate) fn scan(unit: &SourceUnit) -> BTreeMap<usize, SuppressionDirective> {
    let tree = &unit.tree;
    let text = unit.text.as_str();
    let mut scanner = Scanner {
        unit,
        processed: HashSet::new(),
        directives: BTreeMap::new(),
    };

    for node in tree.node_ids() {
        for comment in leading_comments(tree, text, node) {
            scanner.check(comment);
        }
    }
    for comment in leading_comments_at(tree, text, text.len()) {
        scanner.check(comment);
    }
    scanner.directives
}

struct Scanner<'u> {
    unit: &'u SourceUnit,
    processed: HashSet<usize>,
    directives: BTreeMap<usize, SuppressionDirective>,
}

impl Scanner<'_> {
    fn check(&mut self, comment: &Comment) {
        if comment.kind != CommentKind::Line || !self.processed.insert(comment.span.start) {
            return;
        }
        let Some(note) = parse_directive(comment_text(comment, &self.unit.text)) else {
            return;
        };
        let protected_line = self.unit.line_col(comment.span.start).line + 2;
        debug!(
            "Found suppression directive in {} protecting line {}",
            self.unit.path.display(),
            protected_line
        );
        self.directives
            .entry(protected_line)
            .or_insert(SuppressionDirective {
                protected_line,
                note,
                span: comment.span,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmax_ts::TsProgram;
    use pmax_core::ProgramModel;

    fn directives(text: &str) -> Vec<(usize, Option<String>)> {
        let program = TsProgram::builder().file("a.ts", text).build().unwrap();
        scan(&program.source_units()[0])
            .into_values()
            .map(|d| (d.protected_line, d.note))
            .collect()
    }

    #[test]
    fn parses_directive_grammar() {
        assert_eq!(parse_directive("// @prettier-max-ignore-deprecated"), Some(None));
        assert_eq!(parse_directive("//@prettier-max-ignore-deprecated   "), Some(None));
        assert_eq!(
            parse_directive("// @prettier-max-ignore-deprecated: migrating in Q3"),
            Some(Some("migrating in Q3".to_string()))
        );
        assert_eq!(parse_directive("// @prettier-max-ignore-deprecated:"), Some(None));
        assert_eq!(parse_directive("// @prettier-max-ignore-deprecated-later"), None);
        assert_eq!(parse_directive("// @prettier-max-ignore-deprecated because"), None);
        assert_eq!(
            parse_directive("// Check for @prettier-max-ignore-deprecated directive"),
            None
        );
        assert_eq!(parse_directive("/* @prettier-max-ignore-deprecated */"), None);
    }

    #[test]
    fn records_the_following_line() {
        let found = directives("const a = 1;\n// @prettier-max-ignore-deprecated: legacy API\nfoo();\n");
        assert_eq!(found, vec![(3, Some("legacy API".to_string()))]);
    }

    #[test]
    fn finds_directives_in_nested_blocks_and_at_file_end() {
        let found = directives(
            "function f() {\n  if (x) {\n    // @prettier-max-ignore-deprecated\n    old();\n  }\n}\n// @prettier-max-ignore-deprecated\n",
        );
        assert_eq!(found, vec![(4, None), (8, None)]);
    }

    #[test]
    fn ignores_block_and_trailing_comments() {
        let found = directives(
            "/* @prettier-max-ignore-deprecated */\nfoo();\nbar(); // @prettier-max-ignore-deprecated\nbaz();\n",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn stacked_directives_protect_their_own_next_line() {
        let found = directives(
            "// @prettier-max-ignore-deprecated: first\n// @prettier-max-ignore-deprecated: second\nfoo();\n",
        );
        assert_eq!(
            found,
            vec![(2, Some("first".to_string())), (3, Some("second".to_string()))]
        );
    }
}
