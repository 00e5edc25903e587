//! Subtrees that are not scanned because they are deprecated themselves.
//!
//! A deprecated function may keep calling other deprecated APIs; only its
//! callers get flagged.

use pmax_core::comments::{comment_text, leading_comments};
use pmax_core::jsdoc::parse_tags;
use pmax_core::syntax::NodeKind;
use pmax_core::{NodeId, ProgramModel, SourceUnit, SymbolId};

use super::obsolescence::ObsolescenceResolver;

/// Returns true if the subtree under `node` must not be scanned.
pub(crate) fn should_skip(
    model: &dyn ProgramModel,
    unit: &SourceUnit,
    node: NodeId,
    resolver: &mut ObsolescenceResolver<'_>,
) -> bool {
    let tree = &unit.tree;
    let Some(kind) = tree.kind(node) else {
        return false;
    };
    match kind {
        k if k.is_function_like() => {
            own_symbol(model, unit, node).is_some_and(|s| resolver.is_obsolete(s))
        }
        NodeKind::ExportDeclaration { .. } => leading_comments(tree, &unit.text, node)
            .into_iter()
            .filter(|c| c.is_jsdoc(&unit.text))
            .flat_map(|c| parse_tags(comment_text(c, &unit.text)))
            .any(|t| t.name == "deprecated"),
        NodeKind::TypeAliasDeclaration { name, .. } => {
            let obsolete = model
                .resolve_symbol(unit.id, *name)
                .is_some_and(|s| resolver.is_obsolete(s));
            obsolete
                || leading_comments(tree, &unit.text, node)
                    .into_iter()
                    .any(|c| comment_text(c, &unit.text).contains("@deprecated"))
        }
        _ => false,
    }
}

/// Symbol of the declaration a function-like belongs to.
fn own_symbol(model: &dyn ProgramModel, unit: &SourceUnit, function: NodeId) -> Option<SymbolId> {
    let tree = &unit.tree;
    let file = unit.id;
    match tree.kind(function)? {
        NodeKind::FunctionDeclaration { name } => model.resolve_symbol(file, name.unwrap_or(function)),
        NodeKind::MethodDeclaration { name } => model.resolve_symbol(file, *name),
        NodeKind::Constructor => {
            let class = tree
                .ancestors(function)
                .find(|&a| matches!(tree.kind(a), Some(NodeKind::ClassDeclaration { .. })))?;
            model.resolve_symbol(file, class)
        }
        NodeKind::ArrowFunction | NodeKind::FunctionExpression { .. } => {
            let bound_name = tree.parent(function).and_then(|p| match tree.kind(p)? {
                NodeKind::VariableDeclaration { name, .. }
                | NodeKind::PropertyDeclaration { name, .. }
                | NodeKind::PropertyAssignment { name, .. } => Some(*name),
                _ => None,
            });
            let own_name = match tree.kind(function)? {
                NodeKind::FunctionExpression { name } => *name,
                _ => None,
            };
            model.resolve_symbol(file, bound_name.or(own_name)?)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmax_ts::TsProgram;

    fn skipped(source: &str) -> Vec<String> {
        let program = TsProgram::builder().file("a.ts", source).build().unwrap();
        let unit = &program.source_units()[0];
        let mut resolver = ObsolescenceResolver::new(&program);
        unit.tree
            .node_ids()
            .filter(|&n| should_skip(&program, unit, n, &mut resolver))
            .map(|n| unit.node_text(n).lines().next().unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn skips_deprecated_function_likes() {
        let found = skipped(
            "/** @deprecated */\nfunction a() { b(); }\nfunction c() { b(); }\n/** @deprecated */\nconst d = () => b();\nclass K {\n  /** @deprecated */\n  m() {}\n  n() {}\n}\n",
        );
        assert_eq!(found, vec!["function a() { b(); }", "() => b()", "m() {}"]);
    }

    #[test]
    fn skips_constructors_of_deprecated_classes() {
        let found = skipped("/** @deprecated */\nclass Old {\n  constructor() {}\n}\n");
        assert_eq!(found, vec!["constructor() {}"]);
    }

    #[test]
    fn skips_export_declarations_and_type_aliases() {
        let found = skipped(
            "const y = 1;\n/** @deprecated */\nexport { y as x };\n/** @deprecated */\ntype Old = string;\n// @deprecated legacy\ntype Older = number;\ntype Fine = boolean;\n",
        );
        assert_eq!(
            found,
            vec!["export { y as x };", "type Old = string;", "type Older = number;"]
        );
    }
}
