//! Leading comment lookup.
//!
//! A node's leading comments are the comments in the trivia directly before
//! it. Comments that share a line with the preceding token belong to that
//! token as trailing comments and are not included, except at file start.

use crate::syntax::{Comment, NodeId, SyntaxTree};

/// Returns the leading comments of the node, in source order.
#[must_use]
pub fn leading_comments<'t>(tree: &'t SyntaxTree, text: &str, node: NodeId) -> Vec<&'t Comment> {
    leading_comments_at(tree, text, tree.span(node).start)
}

/// Returns the comments in the trivia ending at byte offset `pos`.
#[must_use]
pub fn leading_comments_at<'t>(tree: &'t SyntaxTree, text: &str, pos: usize) -> Vec<&'t Comment> {
    let comments = tree.comments();
    let upto = comments.partition_point(|c| c.span.end <= pos);

    let mut run = Vec::new();
    let mut cursor = pos;
    for comment in comments[..upto].iter().rev() {
        let gap = text.get(comment.span.end..cursor).unwrap_or("x");
        if !gap.chars().all(char::is_whitespace) {
            break;
        }
        run.push(comment);
        cursor = comment.span.start;
    }
    run.reverse();

    let Some(first) = run.first() else {
        return run;
    };

    let before = text.get(..first.span.start).unwrap_or("").trim_end();
    if before.is_empty() {
        return run;
    }

    // Skip trailing comments of the previous token until the first line break.
    let mut prev_end = before.len();
    let mut seen_newline = false;
    run.into_iter()
        .filter(|c| {
            if !seen_newline {
                seen_newline = text
                    .get(prev_end..c.span.start)
                    .is_some_and(|gap| gap.contains('\n'));
            }
            prev_end = c.span.end;
            seen_newline
        })
        .collect()
}

/// Text of a comment.
#[must_use]
pub fn comment_text<'a>(comment: &Comment, text: &'a str) -> &'a str {
    comment.span.slice(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{CommentKind, NodeKind, Span, TreeBuilder};

    /// Builds a tree whose only statement starts at `stmt_start`, with the
    /// given comment spans.
    fn tree_with(text: &str, stmt_start: usize, comments: &[(usize, usize, CommentKind)]) -> SyntaxTree {
        let mut b = TreeBuilder::new();
        let root = b.push(NodeKind::SourceFile, Span::new(0, text.len()), None);
        b.push(
            NodeKind::Other { kind: "statement" },
            Span::new(stmt_start, text.len()),
            Some(root),
        );
        for &(start, end, kind) in comments {
            b.comment(Span::new(start, end), kind);
        }
        b.finish()
    }

    fn find_span(text: &str, needle: &str) -> (usize, usize) {
        let start = text.find(needle).unwrap_or_default();
        (start, start + needle.len())
    }

    #[test]
    fn collects_comment_on_previous_line() {
        let text = "a();\n// note\nb();";
        let (s, e) = find_span(text, "// note");
        let stmt = text.find("b()").unwrap_or_default();
        let tree = tree_with(text, stmt, &[(s, e, CommentKind::Line)]);
        let found = leading_comments_at(&tree, text, stmt);
        assert_eq!(found.len(), 1);
        assert_eq!(comment_text(found[0], text), "// note");
    }

    #[test]
    fn trailing_comment_of_previous_token_is_excluded() {
        let text = "a(); // trailing\n/* lead */ b();";
        let (s1, e1) = find_span(text, "// trailing");
        let (s2, e2) = find_span(text, "/* lead */");
        let stmt = text.find("b()").unwrap_or_default();
        let tree = tree_with(
            text,
            stmt,
            &[(s1, e1, CommentKind::Line), (s2, e2, CommentKind::Block)],
        );
        let found = leading_comments_at(&tree, text, stmt);
        assert_eq!(found.len(), 1);
        assert_eq!(comment_text(found[0], text), "/* lead */");
    }

    #[test]
    fn file_start_comments_are_leading() {
        let text = "// header\nb();";
        let (s, e) = find_span(text, "// header");
        let tree = tree_with(text, 10, &[(s, e, CommentKind::Line)]);
        assert_eq!(leading_comments_at(&tree, text, 10).len(), 1);
    }

    #[test]
    fn code_between_comment_and_node_breaks_the_run() {
        let text = "// far\nx;\nb();";
        let (s, e) = find_span(text, "// far");
        let stmt = text.find("b()").unwrap_or_default();
        let tree = tree_with(text, stmt, &[(s, e, CommentKind::Line)]);
        assert!(leading_comments_at(&tree, text, stmt).is_empty());
    }
}
