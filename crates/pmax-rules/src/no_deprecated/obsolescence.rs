//! Deprecation status of symbols.

use std::collections::HashMap;

use pmax_core::{ProgramModel, SymbolId};
use tracing::debug;

/// Tag name marking a declaration obsolete, matched case-sensitively.
const DEPRECATED_TAG: &str = "deprecated";

/// Whether a symbol is deprecated, and why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObsolescenceInfo {
    /// True when the symbol carries a deprecation marker.
    pub is_obsolete: bool,
    /// Text of the `@deprecated` tag, if non-empty.
    pub reason: Option<String>,
}

impl ObsolescenceInfo {
    /// Deprecated with an optional reason.
    #[must_use]
    pub fn obsolete(reason: Option<String>) -> Self {
        Self {
            is_obsolete: true,
            reason,
        }
    }

    /// Diagnostic text for a usage of `name`.
    #[must_use]
    pub fn message(&self, name: &str) -> String {
        match &self.reason {
            Some(reason) => format!("'{name}' is deprecated: {reason}"),
            None => format!("'{name}' is deprecated"),
        }
    }
}

/// Memoizing resolver, one per analysis run.
pub(crate) struct ObsolescenceResolver<'m> {
    model: &'m dyn ProgramModel,
    cache: HashMap<SymbolId, ObsolescenceInfo>,
}

impl<'m> ObsolescenceResolver<'m> {
    pub(crate) fn new(model: &'m dyn ProgramModel) -> Self {
        Self {
            model,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn resolve(&mut self, symbol: SymbolId) -> ObsolescenceInfo {
        if let Some(info) = self.cache.get(&symbol) {
            return info.clone();
        }
        let info = self.compute(symbol);
        self.cache.insert(symbol, info.clone());
        info
    }

    pub(crate) fn is_obsolete(&mut self, symbol: SymbolId) -> bool {
        self.resolve(symbol).is_obsolete
    }

    fn compute(&self, symbol: SymbolId) -> ObsolescenceInfo {
        let tags = self.model.documentation_tags(symbol).unwrap_or_else(|e| {
            debug!("Ignoring documentation of {:?}: {}", symbol, e);
            Vec::new()
        });

        let mut deprecated = tags.iter().filter(|t| t.name == DEPRECATED_TAG).peekable();
        if deprecated.peek().is_some() {
            let reason = deprecated
                .map(pmax_core::DocTag::joined_text)
                .find(|text| !text.is_empty());
            return ObsolescenceInfo::obsolete(reason);
        }

        let legacy = self
            .model
            .symbol(symbol)
            .and_then(pmax_core::Symbol::primary_declaration)
            .is_some_and(|d| self.model.has_legacy_deprecated_flag(d));
        if legacy {
            return ObsolescenceInfo::obsolete(None);
        }
        ObsolescenceInfo::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmax_core::syntax::NodeKind;
    use pmax_core::FileId;
    use pmax_ts::TsProgram;

    fn info_for(source: &str, name: &str) -> ObsolescenceInfo {
        let program = TsProgram::builder().file("a.ts", source).build().unwrap();
        let tree = &program.source_units()[0].tree;
        let node = tree
            .node_ids()
            .find(|&id| matches!(tree.kind(id), Some(NodeKind::Identifier { text }) if text == name))
            .unwrap();
        let symbol = program.resolve_symbol(FileId::new(0), node).unwrap();
        ObsolescenceResolver::new(&program).resolve(symbol)
    }

    #[test]
    fn reason_from_tag_text() {
        let info = info_for("/** @deprecated Use Z instead */\nfunction y() {}\n", "y");
        assert!(info.is_obsolete);
        assert_eq!(info.message("y"), "'y' is deprecated: Use Z instead");
    }

    #[test]
    fn bare_tag_has_no_reason() {
        let info = info_for("/**\n * Old.\n * @deprecated\n */\nfunction y() {}\n", "y");
        assert_eq!(info, ObsolescenceInfo::obsolete(None));
        assert_eq!(info.message("y"), "'y' is deprecated");
    }

    #[test]
    fn multi_line_reason_is_joined() {
        let info = info_for(
            "/**\n * @deprecated Use Z\n *   from the new module.\n */\nconst y = 1;\n",
            "y",
        );
        assert_eq!(info.reason.as_deref(), Some("Use Z from the new module."));
    }

    #[test]
    fn tag_match_is_case_sensitive() {
        let info = info_for("/** @Deprecated */\nfunction y() {}\n", "y");
        assert!(!info.is_obsolete);
    }

    #[test]
    fn legacy_comment_flag() {
        let info = info_for("// @deprecated\nfunction y() {}\n", "y");
        assert_eq!(info, ObsolescenceInfo::obsolete(None));
        assert!(!info_for("function y() {}\n", "y").is_obsolete);
    }
}
