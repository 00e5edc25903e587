//! JSDoc block tag parsing.
//!
//! Only block tags are extracted (`@name text` at the start of a line).
//! Inline tags such as `{@link Foo}` stay part of the surrounding text.

use serde::{Deserialize, Serialize};

/// A documentation block tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTag {
    /// Tag name without `@`, compared case-sensitively.
    pub name: String,
    /// Text runs following the tag, one per source line.
    pub text: Vec<String>,
}

impl DocTag {
    /// Creates a tag from its name and text runs.
    #[must_use]
    pub fn new(name: impl Into<String>, text: Vec<String>) -> Self {
        Self {
            name: name.into(),
            text,
        }
    }

    /// Joins the text runs with single spaces.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.text
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parses the block tags of a `/** ... */` comment.
///
/// Returns an empty list for anything that is not a JSDoc comment.
#[must_use]
pub fn parse_tags(comment: &str) -> Vec<DocTag> {
    let Some(body) = comment
        .strip_prefix("/**")
        .and_then(|rest| rest.strip_suffix("*/"))
    else {
        return Vec::new();
    };

    let mut tags: Vec<DocTag> = Vec::new();
    for raw in body.lines() {
        let line = strip_leading_star(raw);
        if let Some(rest) = line.strip_prefix('@') {
            let name_len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(rest.len());
            if name_len == 0 {
                continue;
            }
            let (name, text) = rest.split_at(name_len);
            let text = text.trim();
            let runs = if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            };
            tags.push(DocTag::new(name, runs));
        } else if let Some(current) = tags.last_mut() {
            let text = line.trim();
            if !text.is_empty() {
                current.text.push(text.to_string());
            }
        }
    }
    tags
}

/// Removes indentation and the conventional leading `*` of a JSDoc line.
fn strip_leading_star(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) if !rest.starts_with('/') => rest.trim_start(),
        _ => trimmed,
    }
}
