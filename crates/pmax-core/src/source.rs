//! Source units and line maps.

use std::path::{Component, Path, PathBuf};

use crate::syntax::{NodeId, SyntaxTree};

/// Index of a [`SourceUnit`] inside its program model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

impl FileId {
    /// Creates a file id from a unit index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Returns the unit index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Zero-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineCol {
    /// Line (0-indexed).
    pub line: usize,
    /// Column in characters (0-indexed).
    pub column: usize,
}

/// Maps byte offsets to line/column pairs.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Builds the line map for `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Translates a byte offset into a zero-based line and character column.
    #[must_use]
    pub fn line_col(&self, text: &str, offset: usize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        let column = text
            .get(start..offset)
            .map_or(offset.saturating_sub(start), |s| s.chars().count());
        LineCol { line, column }
    }
}

/// One-based position surfaced in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line (1-indexed).
    pub line: usize,
    /// Column (1-indexed).
    pub column: usize,
}

/// One parsed file of a program.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Id within the owning program model.
    pub id: FileId,
    /// File path as given to the model.
    pub path: PathBuf,
    /// Full source text.
    pub text: String,
    /// Lowered syntax tree.
    pub tree: SyntaxTree,
    /// Ambient declaration file (`.d.ts`).
    pub is_declaration_only: bool,
    /// File that belongs to a third-party dependency.
    pub is_external_dependency: bool,
    line_index: LineIndex,
}

impl SourceUnit {
    /// Creates a unit, deriving the declaration/external flags from the path.
    #[must_use]
    pub fn new(id: FileId, path: PathBuf, text: String, tree: SyntaxTree) -> Self {
        let is_declaration_only = is_declaration_path(&path);
        let is_external_dependency = is_external_path(&path);
        let line_index = LineIndex::new(&text);
        Self {
            id,
            path,
            text,
            tree,
            is_declaration_only,
            is_external_dependency,
            line_index,
        }
    }

    /// Returns true if rules should scan this unit.
    #[must_use]
    pub fn is_scannable(&self) -> bool {
        !self.is_declaration_only && !self.is_external_dependency
    }

    /// Returns the line map.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Zero-based line/column of a byte offset.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> LineCol {
        self.line_index.line_col(&self.text, offset)
    }

    /// One-based position of a byte offset.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let lc = self.line_col(offset);
        Position {
            line: lc.line + 1,
            column: lc.column + 1,
        }
    }

    /// One-based position of a node's start.
    #[must_use]
    pub fn node_position(&self, node: NodeId) -> Position {
        self.position(self.tree.span(node).start)
    }

    /// Source text covered by a node.
    #[must_use]
    pub fn node_text(&self, node: NodeId) -> &str {
        self.tree.span(node).slice(&self.text)
    }
}

fn is_declaration_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| {
            n.ends_with(".d.ts") || n.ends_with(".d.mts") || n.ends_with(".d.cts")
        })
}

/// True if `path` lies inside a `node_modules` directory.
#[must_use]
pub fn is_external_path(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(s) if s == "node_modules"))
}
