//! Documentation lookup for declarations.

use pmax_core::comments::{comment_text, leading_comments};
use pmax_core::jsdoc::parse_tags;
use pmax_core::syntax::{NodeId, NodeKind};
use pmax_core::{DeclarationRef, DocTag, SourceUnit};

/// Node whose leading comments document `declaration`.
///
/// Declarators share the comments of their variable statement, and
/// destructured elements those of the enclosing declarator.
pub(crate) fn doc_host(unit: &SourceUnit, declaration: NodeId) -> NodeId {
    let tree = &unit.tree;
    let mut host = declaration;
    loop {
        let Some(parent) = tree.parent(host) else {
            return host;
        };
        match (tree.kind(host), tree.kind(parent)) {
            (Some(NodeKind::VariableDeclaration { .. }), Some(NodeKind::VariableStatement { .. }))
            | (Some(NodeKind::BindingElement { .. }), Some(NodeKind::BindingPattern))
            | (
                Some(NodeKind::BindingPattern),
                Some(NodeKind::VariableDeclaration { .. } | NodeKind::BindingElement { .. }),
            ) => host = parent,
            _ => return host,
        }
    }
}

/// JSDoc block tags written before a declaration.
pub(crate) fn declaration_tags(unit: &SourceUnit, declaration: NodeId) -> Vec<DocTag> {
    let host = doc_host(unit, declaration);
    leading_comments(&unit.tree, &unit.text, host)
        .into_iter()
        .filter(|c| c.is_jsdoc(&unit.text))
        .flat_map(|c| parse_tags(comment_text(c, &unit.text)))
        .collect()
}

/// Plain (non-JSDoc) comment marking a declaration `@deprecated`.
pub(crate) fn has_legacy_flag(unit: &SourceUnit, declaration: DeclarationRef) -> bool {
    let host = doc_host(unit, declaration.node);
    leading_comments(&unit.tree, &unit.text, host)
        .into_iter()
        .filter(|c| !c.is_jsdoc(&unit.text))
        .any(|c| comment_text(c, &unit.text).contains("@deprecated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TsProgram;
    use pmax_core::{FileId, ProgramModel};

    fn first_declaration(program: &TsProgram, name: &str) -> NodeId {
        let tree = &program.source_units()[0].tree;
        tree.node_ids()
            .find(|&id| {
                tree.kind(id)
                    .and_then(NodeKind::declaration_name)
                    .and_then(|n| tree.name_text(n))
                    == Some(name)
            })
            .unwrap()
    }

    #[test]
    fn variable_declarators_use_statement_docs() {
        let program = TsProgram::builder()
            .file("a.ts", "/** @deprecated use b */\nexport const a = 1, c = 2;\n")
            .build()
            .unwrap();
        let unit = &program.source_units()[0];
        for name in ["a", "c"] {
            let tags = declaration_tags(unit, first_declaration(&program, name));
            assert_eq!(tags.len(), 1);
            assert_eq!(tags[0].name, "deprecated");
            assert_eq!(tags[0].joined_text(), "use b");
        }
    }

    #[test]
    fn legacy_flag_comes_from_plain_comments() {
        let program = TsProgram::builder()
            .file("a.ts", "// @deprecated\nfunction old() {}\n/** @deprecated */\nfunction doc() {}\n")
            .build()
            .unwrap();
        let unit = &program.source_units()[0];
        let old = DeclarationRef {
            file: FileId::new(0),
            node: first_declaration(&program, "old"),
        };
        let doc = DeclarationRef {
            file: FileId::new(0),
            node: first_declaration(&program, "doc"),
        };
        assert!(has_legacy_flag(unit, old));
        assert!(!has_legacy_flag(unit, doc));
        assert!(declaration_tags(unit, old.node).is_empty());
    }
}
