//! Decides, node by node, what counts as a reference to check.

use pmax_core::syntax::{NodeKind, SyntaxTree};
use pmax_core::{NodeId, ProgramModel, SourceUnit, SymbolId};

use super::obsolescence::ObsolescenceResolver;
use super::scope_skip;

/// Outcome of classifying one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    /// Not a reference; children are still visited.
    Continue,
    /// A reference to `symbol`, reported at `report`. Children are visited.
    Usage { symbol: SymbolId, report: NodeId },
    /// Neither this node nor its descendants are scanned.
    SkipSubtree,
}

/// Classifies `node`.
pub(crate) fn classify(
    model: &dyn ProgramModel,
    unit: &SourceUnit,
    node: NodeId,
    resolver: &mut ObsolescenceResolver<'_>,
) -> Classification {
    if scope_skip::should_skip(model, unit, node, resolver) {
        return Classification::SkipSubtree;
    }

    let tree = &unit.tree;
    let file = unit.id;
    let resolved = |target: NodeId, report: NodeId| match model.resolve_symbol(file, target) {
        Some(symbol) => Classification::Usage { symbol, report },
        None => Classification::Continue,
    };
    let aliased = |local: NodeId, report: NodeId| {
        match model
            .resolve_symbol(file, local)
            .and_then(|alias| model.immediate_alias_target(alias))
        {
            Some(symbol) => Classification::Usage { symbol, report },
            None => Classification::Continue,
        }
    };

    let Some(kind) = tree.kind(node) else {
        return Classification::Continue;
    };
    match kind {
        NodeKind::Identifier { .. } => {
            if is_declaration_name(tree, node) || is_claimed(tree, node) {
                Classification::Continue
            } else {
                resolved(node, node)
            }
        }
        NodeKind::PropertyAccess { .. } => {
            if is_callee(tree, node) || is_jsx_tag(tree, node) {
                Classification::Continue
            } else {
                resolved(node, node)
            }
        }
        NodeKind::ElementAccess { .. } => resolved(node, node),
        NodeKind::Call { callee } | NodeKind::New { callee } => resolved(*callee, *callee),
        NodeKind::ImportSpecifier { .. } | NodeKind::ExportSpecifier { .. } => aliased(node, node),
        NodeKind::ImportClause {
            default_name: Some(name),
        } => aliased(*name, *name),
        NodeKind::TypeReference { name } => resolved(*name, *name),
        NodeKind::JsxElement { tag, .. } => resolved(*tag, *tag),
        NodeKind::JsxAttribute { name } => {
            let symbol = model
                .jsx_attribute_property(file, node)
                .or_else(|| model.resolve_symbol(file, *name))
                .or_else(|| {
                    let tag = jsx_tag(tree, node)?;
                    model.jsx_props_from_signatures(file, tag, tree.name_text(*name)?)
                });
            match symbol {
                Some(symbol) => Classification::Usage {
                    symbol,
                    report: *name,
                },
                None => Classification::Continue,
            }
        }
        NodeKind::JsxSpreadAttribute { expression } => resolved(*expression, *expression),
        NodeKind::SourceFile
        | NodeKind::StringLiteral { .. }
        | NodeKind::This
        | NodeKind::ObjectLiteral
        | NodeKind::PropertyAssignment { .. }
        | NodeKind::ShorthandPropertyAssignment { .. }
        | NodeKind::ImportDeclaration { .. }
        | NodeKind::ImportClause { default_name: None }
        | NodeKind::NamespaceImport { .. }
        | NodeKind::ExportDeclaration { .. }
        | NodeKind::ExportAssignment { .. }
        | NodeKind::QualifiedName { .. }
        | NodeKind::TypeLiteral
        | NodeKind::JsxClosingElement { .. }
        | NodeKind::FunctionDeclaration { .. }
        | NodeKind::FunctionExpression { .. }
        | NodeKind::ArrowFunction
        | NodeKind::MethodDeclaration { .. }
        | NodeKind::Constructor
        | NodeKind::Parameter { .. }
        | NodeKind::ClassDeclaration { .. }
        | NodeKind::Heritage { .. }
        | NodeKind::InterfaceDeclaration { .. }
        | NodeKind::TypeAliasDeclaration { .. }
        | NodeKind::EnumDeclaration { .. }
        | NodeKind::EnumMember { .. }
        | NodeKind::ModuleDeclaration { .. }
        | NodeKind::PropertyDeclaration { .. }
        | NodeKind::PropertySignature { .. }
        | NodeKind::MethodSignature { .. }
        | NodeKind::VariableStatement { .. }
        | NodeKind::VariableDeclaration { .. }
        | NodeKind::BindingPattern
        | NodeKind::BindingElement { .. }
        | NodeKind::Block
        | NodeKind::ForStatement
        | NodeKind::CatchClause
        | NodeKind::Other { .. } => Classification::Continue,
    }
}

/// Identifier that names the declaration it belongs to.
fn is_declaration_name(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    let Some(kind) = tree.kind(parent) else {
        return false;
    };
    if kind.declaration_name() == Some(node) {
        return true;
    }
    match kind {
        NodeKind::BindingElement { name, property, .. } => *name == node || *property == Some(node),
        NodeKind::Other {
            kind: "type_parameter" | "mapped_type_clause" | "infer_type",
        } => tree.children(parent).first() == Some(&node),
        _ => false,
    }
}

/// Identifier whose parent reports (or deliberately ignores) it.
fn is_claimed(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    match tree.kind(parent) {
        Some(NodeKind::Call { callee } | NodeKind::New { callee }) => *callee == node,
        Some(NodeKind::PropertyAccess { name, .. }) => *name == node,
        Some(NodeKind::QualifiedName { right, .. }) => *right == node,
        Some(NodeKind::TypeReference { name }) => *name == node,
        Some(NodeKind::JsxElement { tag, .. } | NodeKind::JsxClosingElement { tag }) => *tag == node,
        Some(NodeKind::JsxAttribute { name }) => *name == node,
        Some(NodeKind::JsxSpreadAttribute { expression }) => *expression == node,
        Some(NodeKind::ImportClause { default_name }) => *default_name == Some(node),
        Some(NodeKind::ImportSpecifier { .. } | NodeKind::ExportSpecifier { .. }) => true,
        _ => false,
    }
}

fn is_callee(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.parent(node).is_some_and(|p| {
        matches!(
            tree.kind(p),
            Some(NodeKind::Call { callee } | NodeKind::New { callee }) if *callee == node
        )
    })
}

fn is_jsx_tag(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.parent(node).is_some_and(|p| {
        matches!(
            tree.kind(p),
            Some(NodeKind::JsxElement { tag, .. } | NodeKind::JsxClosingElement { tag }) if *tag == node
        )
    })
}

fn jsx_tag(tree: &SyntaxTree, attribute: NodeId) -> Option<NodeId> {
    match tree.kind(tree.parent(attribute)?)? {
        NodeKind::JsxElement { tag, .. } => Some(*tag),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmax_ts::TsProgram;

    /// `(reported text, symbol name)` for every usage in the first file.
    fn usages(files: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut builder = TsProgram::builder();
        for (path, text) in files {
            builder = builder.file(*path, *text);
        }
        let program = builder.build().unwrap();
        let unit = &program.source_units()[0];
        let mut resolver = ObsolescenceResolver::new(&program);
        let mut found = Vec::new();
        let mut stack = vec![unit.tree.root()];
        while let Some(node) = stack.pop() {
            match classify(&program, unit, node, &mut resolver) {
                Classification::SkipSubtree => continue,
                Classification::Usage { symbol, report } => found.push((
                    unit.node_text(report).to_string(),
                    program.symbol(symbol).unwrap().name.clone(),
                )),
                Classification::Continue => {}
            }
            stack.extend(unit.tree.children(node).iter().rev());
        }
        found
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    #[test]
    fn calls_report_the_callee_once() {
        let found = usages(&[("a.ts", "function f() {}\nconst o = { m() {} };\nf();\no.m();\nnew Date();\n")]);
        assert_eq!(found, pairs(&[("f", "f"), ("o.m", "m"), ("o", "o")]));
    }

    #[test]
    fn declaration_names_are_not_usages() {
        let found = usages(&[(
            "a.ts",
            "interface I<T> { a: T }\nconst { a, b: c } = { a: 1, b: 2 };\nfunction g(p: I<string>) { return p.a; }\n",
        )]);
        assert_eq!(
            found,
            pairs(&[("T", "T"), ("I", "I"), ("p.a", "a"), ("p", "p")])
        );
    }

    #[test]
    fn imports_report_the_alias_target_at_the_specifier() {
        let found = usages(&[
            ("main.ts", "import def, { x as local } from './m';\nlocal();\n"),
            ("m.ts", "export default function named() {}\nfunction y() {}\nexport { y as x };\n"),
        ]);
        assert_eq!(
            found,
            pairs(&[("def", "named"), ("x as local", "y"), ("local", "local")])
        );
    }

    #[test]
    fn jsx_tags_attributes_and_spreads() {
        let found = usages(&[(
            "App.tsx",
            "function Comp(props: { legacy?: string }) { return null; }\nconst rest = {};\nconst e = <Comp legacy=\"x\" {...rest}></Comp>;\nconst d = <div id=\"x\" />;\n",
        )]);
        assert_eq!(
            found,
            pairs(&[("Comp", "Comp"), ("legacy", "legacy"), ("rest", "rest")])
        );
    }
}
