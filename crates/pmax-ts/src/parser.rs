//! TypeScript dialect selection and Tree-sitter parsing.

use std::path::Path;
use tree_sitter::{Language, Parser, Tree};

use crate::program::TsProgramError;

/// Grammar variant used for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`, `.d.ts`).
    TypeScript,
    /// TypeScript with JSX (`.tsx`, `.jsx`).
    Tsx,
}

impl Dialect {
    /// Picks the dialect from a file name, `None` for non-TypeScript files.
    #[must_use]
    pub fn for_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".tsx") || name.ends_with(".jsx") {
            Some(Self::Tsx)
        } else if name.ends_with(".ts") || name.ends_with(".mts") || name.ends_with(".cts") {
            Some(Self::TypeScript)
        } else {
            None
        }
    }

    /// Language identifier used in logs.
    #[must_use]
    pub fn language_id(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
        }
    }

    fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Parses `source` with the grammar of `dialect`.
///
/// Syntax errors do not fail the parse; Tree-sitter recovers and the
/// affected regions lower to opaque nodes.
pub(crate) fn parse(path: &Path, source: &str, dialect: Dialect) -> Result<Tree, TsProgramError> {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.language())
        .map_err(|e| TsProgramError::Language {
            dialect: dialect.language_id(),
            message: e.to_string(),
        })?;

    parser
        .parse(source, None)
        .ok_or_else(|| TsProgramError::Parse {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_from_extension() {
        assert_eq!(Dialect::for_path(Path::new("a.ts")), Some(Dialect::TypeScript));
        assert_eq!(Dialect::for_path(Path::new("a.d.ts")), Some(Dialect::TypeScript));
        assert_eq!(Dialect::for_path(Path::new("a.mts")), Some(Dialect::TypeScript));
        assert_eq!(Dialect::for_path(Path::new("src/App.tsx")), Some(Dialect::Tsx));
        assert_eq!(Dialect::for_path(Path::new("main.rs")), None);
        assert_eq!(Dialect::for_path(Path::new("README")), None);
    }

    #[test]
    fn parses_both_dialects() {
        let tree = parse(Path::new("a.ts"), "const x: number = 1;", Dialect::TypeScript).unwrap();
        assert_eq!(tree.root_node().kind(), "program");
        assert!(!tree.root_node().has_error());

        let tree = parse(Path::new("a.tsx"), "const e = <div id=\"x\" />;", Dialect::Tsx).unwrap();
        assert!(!tree.root_node().has_error());
    }
}
