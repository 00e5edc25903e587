//! Reference resolution on top of the binder.
//!
//! Resolves identifiers through lexical scopes and member accesses through
//! a small structural type model: declared type annotations, initializers,
//! `new` expressions, return type annotations and class/interface heritage.
//! Anything inferred beyond that resolves to nothing.

use pmax_core::syntax::{HeritageKind, NodeId, NodeKind};
use pmax_core::{DeclarationRef, FileId, SourceUnit, SymbolId};

use crate::binder::{Bindings, MemberKey, Meaning, SymbolKind};

/// Bound on alias chains and nested type lookups.
const MAX_DEPTH: usize = 16;

/// Something members can be looked up on.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Container {
    /// Instance side of a class or interface symbol.
    Instance(SymbolId),
    /// Static side of a class, enum members, namespace exports.
    Static(SymbolId),
    /// Exports of a module (`import * as ns`).
    Module(FileId),
    /// Type or object literal.
    Literal(DeclarationRef),
    /// Intersection or union; first match wins.
    Union(Vec<Container>),
}

pub(crate) struct Checker<'a> {
    units: &'a [SourceUnit],
    bindings: &'a Bindings,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(units: &'a [SourceUnit], bindings: &'a Bindings) -> Self {
        Self { units, bindings }
    }

    fn unit(&self, file: FileId) -> Option<&'a SourceUnit> {
        self.units.get(file.index())
    }

    /// Symbol a reference node names.
    pub(crate) fn resolve(&self, file: FileId, node: NodeId) -> Option<SymbolId> {
        self.resolve_at(file, node, 0)
    }

    fn resolve_at(&self, file: FileId, node: NodeId, depth: usize) -> Option<SymbolId> {
        if depth > MAX_DEPTH {
            return None;
        }
        if let Some(id) = self.bindings.declared(file, node) {
            return Some(id);
        }
        let unit = self.unit(file)?;
        let tree = &unit.tree;
        match tree.kind(node)? {
            NodeKind::Identifier { text } => self.resolve_identifier(unit, node, text, depth),
            NodeKind::PropertyAccess { object, name } => {
                self.member_of_expression(unit, *object, tree.name_text(*name)?, depth + 1)
            }
            NodeKind::ElementAccess {
                object,
                argument: Some(argument),
            } => match tree.kind(*argument)? {
                NodeKind::StringLiteral { value } => {
                    self.member_of_expression(unit, *object, value, depth + 1)
                }
                _ => None,
            },
            NodeKind::QualifiedName { left, right } => {
                self.member_of_qualifier(unit, *left, tree.name_text(*right)?, depth + 1)
            }
            NodeKind::TypeReference { name } => self.resolve_at(file, *name, depth + 1),
            NodeKind::JsxAttribute { .. } => self.jsx_attribute_property(file, node),
            _ => None,
        }
    }

    fn resolve_identifier(
        &self,
        unit: &SourceUnit,
        node: NodeId,
        text: &str,
        depth: usize,
    ) -> Option<SymbolId> {
        let tree = &unit.tree;
        let Some(parent) = tree.parent(node) else {
            return self.bindings.lookup(unit, node, text, Meaning::Value);
        };
        match tree.kind(parent)? {
            NodeKind::PropertyAccess { object, name } if *name == node => {
                self.member_of_expression(unit, *object, text, depth + 1)
            }
            NodeKind::QualifiedName { left, right } if *right == node => {
                self.member_of_qualifier(unit, *left, text, depth + 1)
            }
            NodeKind::JsxAttribute { name } if *name == node => {
                self.jsx_attribute_property(unit.id, parent).or_else(|| {
                    let tag = jsx_tag_of_attribute(unit, parent)?;
                    self.jsx_props_from_signatures(unit.id, tag, text)
                })
            }
            NodeKind::JsxElement { tag, .. } | NodeKind::JsxClosingElement { tag }
                if *tag == node && text.starts_with(|c: char| c.is_ascii_lowercase()) =>
            {
                None
            }
            NodeKind::TypeReference { name } if *name == node => {
                self.bindings.lookup(unit, node, text, Meaning::Type)
            }
            NodeKind::ImportSpecifier { name, .. } if *name == node => {
                self.alias_target_of(unit.id, parent)
            }
            NodeKind::ExportSpecifier { name, .. } if *name == node => {
                let reexport = tree.parent(parent).is_some_and(|d| {
                    matches!(
                        tree.kind(d),
                        Some(NodeKind::ExportDeclaration {
                            module: Some(_),
                            ..
                        })
                    )
                });
                if reexport {
                    self.alias_target_of(unit.id, parent)
                } else {
                    self.bindings
                        .lookup(unit, node, text, Meaning::Value)
                        .or_else(|| self.bindings.lookup(unit, node, text, Meaning::Type))
                }
            }
            _ => self.bindings.lookup(unit, node, text, Meaning::Value),
        }
    }

    fn alias_target_of(&self, file: FileId, specifier: NodeId) -> Option<SymbolId> {
        let alias = self.bindings.declared(file, specifier)?;
        self.immediate_target(alias)
    }

    /// One alias hop.
    pub(crate) fn immediate_target(&self, symbol: SymbolId) -> Option<SymbolId> {
        let entry = self.bindings.entry(symbol)?;
        if entry.symbol.is_alias {
            entry.target
        } else {
            None
        }
    }

    /// Follows alias hops to the declared symbol.
    fn follow_aliases(&self, mut symbol: SymbolId) -> Option<SymbolId> {
        for _ in 0..MAX_DEPTH {
            let entry = self.bindings.entry(symbol)?;
            if !entry.symbol.is_alias {
                return Some(symbol);
            }
            symbol = entry.target?;
        }
        None
    }

    fn member_of_expression(
        &self,
        unit: &SourceUnit,
        object: NodeId,
        name: &str,
        depth: usize,
    ) -> Option<SymbolId> {
        let container = self.expression_container(unit, object, depth)?;
        self.lookup_member(&container, name, depth + 1)
    }

    /// `Left.name` where `Left` is a namespace, enum, class or module.
    fn member_of_qualifier(
        &self,
        unit: &SourceUnit,
        left: NodeId,
        name: &str,
        depth: usize,
    ) -> Option<SymbolId> {
        let tree = &unit.tree;
        let qualifier = match tree.kind(left)? {
            NodeKind::Identifier { text } => {
                self.bindings.lookup(unit, left, text, Meaning::Value)?
            }
            _ => self.resolve_at(unit.id, left, depth + 1)?,
        };
        let container = self.container_of_symbol(qualifier, depth + 1)?;
        self.lookup_member(&container, name, depth + 1)
    }

    /// Container for the value of a symbol used as an expression.
    fn container_of_symbol(&self, symbol: SymbolId, depth: usize) -> Option<Container> {
        if depth > MAX_DEPTH {
            return None;
        }
        let symbol = self.follow_aliases(symbol)?;
        let entry = self.bindings.entry(symbol)?;
        if entry.kind == SymbolKind::NamespaceImport {
            return entry.module.map(Container::Module);
        }

        let has_static_side = entry.symbol.declarations.iter().any(|d| {
            matches!(
                self.kind_of(*d),
                Some(
                    NodeKind::ClassDeclaration { .. }
                        | NodeKind::EnumDeclaration { .. }
                        | NodeKind::ModuleDeclaration { .. }
                )
            )
        });
        if has_static_side {
            return Some(Container::Static(symbol));
        }

        let declaration = entry.symbol.primary_declaration()?;
        let unit = self.unit(declaration.file)?;
        match unit.tree.kind(declaration.node)? {
            NodeKind::VariableDeclaration {
                type_annotation,
                initializer,
                ..
            }
            | NodeKind::PropertyDeclaration {
                type_annotation,
                initializer,
                ..
            } => type_annotation
                .and_then(|t| self.type_container(unit, t, depth + 1))
                .or_else(|| {
                    initializer.and_then(|i| self.expression_container(unit, i, depth + 1))
                }),
            NodeKind::Parameter {
                type_annotation, ..
            }
            | NodeKind::PropertySignature {
                type_annotation, ..
            } => type_annotation.and_then(|t| self.type_container(unit, t, depth + 1)),
            NodeKind::PropertyAssignment {
                initializer: Some(initializer),
                ..
            } => self.expression_container(unit, *initializer, depth + 1),
            NodeKind::ShorthandPropertyAssignment { name } => {
                let text = unit.tree.name_text(*name)?;
                let value = self.bindings.lookup(unit, declaration.node, text, Meaning::Value)?;
                if value == symbol {
                    return None;
                }
                self.container_of_symbol(value, depth + 1)
            }
            _ => None,
        }
    }

    fn kind_of(&self, declaration: DeclarationRef) -> Option<&'a NodeKind> {
        self.unit(declaration.file)?.tree.kind(declaration.node)
    }

    /// Container for the value an expression evaluates to.
    fn expression_container(&self, unit: &SourceUnit, expr: NodeId, depth: usize) -> Option<Container> {
        if depth > MAX_DEPTH {
            return None;
        }
        let tree = &unit.tree;
        match tree.kind(expr)? {
            NodeKind::Identifier { .. } | NodeKind::PropertyAccess { .. } | NodeKind::ElementAccess { .. } => {
                let symbol = self.resolve_at(unit.id, expr, depth + 1)?;
                self.container_of_symbol(symbol, depth + 1)
            }
            NodeKind::This => self.this_container(unit, expr),
            NodeKind::New { callee } => {
                let symbol = self.resolve_at(unit.id, *callee, depth + 1)?;
                match self.container_of_symbol(symbol, depth + 1)? {
                    Container::Static(class) => Some(Container::Instance(class)),
                    _ => None,
                }
            }
            NodeKind::Call { callee } => {
                let symbol = self.resolve_at(unit.id, *callee, depth + 1)?;
                let symbol = self.follow_aliases(symbol)?;
                let entry = self.bindings.entry(symbol)?;
                entry
                    .symbol
                    .declarations
                    .iter()
                    .find_map(|d| self.return_container(*d, depth + 1))
            }
            NodeKind::ObjectLiteral => Some(Container::Literal(DeclarationRef {
                file: unit.id,
                node: expr,
            })),
            NodeKind::Other {
                kind: "as_expression" | "satisfies_expression",
            } => {
                let children = tree.children(expr);
                let ty = children.get(1).and_then(|t| self.type_container(unit, *t, depth + 1));
                ty.or_else(|| {
                    children
                        .first()
                        .and_then(|e| self.expression_container(unit, *e, depth + 1))
                })
            }
            NodeKind::Other {
                kind: "non_null_expression" | "await_expression",
            } => {
                let inner = *tree.children(expr).first()?;
                self.expression_container(unit, inner, depth + 1)
            }
            _ => None,
        }
    }

    /// `this` inside a class body: instance side, or static side in static members.
    fn this_container(&self, unit: &SourceUnit, node: NodeId) -> Option<Container> {
        let tree = &unit.tree;
        let mut is_static = false;
        for ancestor in tree.ancestors(node) {
            match tree.kind(ancestor)? {
                NodeKind::ClassDeclaration { .. } => {
                    let class = self.bindings.declared(unit.id, ancestor)?;
                    return Some(if is_static {
                        Container::Static(class)
                    } else {
                        Container::Instance(class)
                    });
                }
                NodeKind::FunctionDeclaration { .. } | NodeKind::FunctionExpression { .. } => return None,
                _ => is_static |= tree.modifiers(ancestor).is_static,
            }
        }
        None
    }

    /// Container of a function declaration's annotated return type.
    fn return_container(&self, declaration: DeclarationRef, depth: usize) -> Option<Container> {
        let unit = self.unit(declaration.file)?;
        let tree = &unit.tree;
        let function = match tree.kind(declaration.node)? {
            NodeKind::VariableDeclaration {
                initializer: Some(init),
                ..
            } => *init,
            _ => declaration.node,
        };
        if !tree.kind(function)?.is_function_like() && !matches!(tree.kind(function)?, NodeKind::MethodSignature { .. }) {
            return None;
        }
        let children = tree.children(function);
        let params = children
            .iter()
            .position(|&c| matches!(tree.kind(c), Some(NodeKind::Other { kind: "formal_parameters" })))?;
        let ty = *children.get(params + 1)?;
        self.type_container(unit, ty, depth + 1)
    }

    /// Container for a type node.
    fn type_container(&self, unit: &SourceUnit, ty: NodeId, depth: usize) -> Option<Container> {
        if depth > MAX_DEPTH {
            return None;
        }
        let tree = &unit.tree;
        match tree.kind(ty)? {
            NodeKind::TypeReference { .. } => {
                let symbol = self.resolve_at(unit.id, ty, depth + 1)?;
                let symbol = self.follow_aliases(symbol)?;
                let entry = self.bindings.entry(symbol)?;
                match entry.kind {
                    SymbolKind::Class | SymbolKind::Interface => Some(Container::Instance(symbol)),
                    SymbolKind::TypeAlias => {
                        let declaration = entry.symbol.primary_declaration()?;
                        let decl_unit = self.unit(declaration.file)?;
                        match decl_unit.tree.kind(declaration.node)? {
                            NodeKind::TypeAliasDeclaration {
                                value: Some(value), ..
                            } => self.type_container(decl_unit, *value, depth + 1),
                            _ => None,
                        }
                    }
                    _ => None,
                }
            }
            NodeKind::TypeLiteral => Some(Container::Literal(DeclarationRef {
                file: unit.id,
                node: ty,
            })),
            NodeKind::Other {
                kind: "intersection_type" | "union_type",
            } => {
                let parts: Vec<_> = tree
                    .children(ty)
                    .iter()
                    .filter_map(|&c| self.type_container(unit, c, depth + 1))
                    .collect();
                (!parts.is_empty()).then_some(Container::Union(parts))
            }
            NodeKind::Other {
                kind: "parenthesized_type",
            } => {
                let inner = *tree.children(ty).first()?;
                self.type_container(unit, inner, depth + 1)
            }
            _ => None,
        }
    }

    fn lookup_member(&self, container: &Container, name: &str, depth: usize) -> Option<SymbolId> {
        if depth > MAX_DEPTH {
            return None;
        }
        match container {
            Container::Instance(symbol) => self.lookup_on_declarations(*symbol, name, false, depth),
            Container::Static(symbol) => self.lookup_on_declarations(*symbol, name, true, depth),
            Container::Module(file) => self.bindings.export_of(*file, name),
            Container::Literal(declaration) => self.bindings.member(
                MemberKey {
                    container: *declaration,
                    is_static: false,
                },
                name,
            ),
            Container::Union(parts) => parts
                .iter()
                .find_map(|p| self.lookup_member(p, name, depth + 1)),
        }
    }

    fn lookup_on_declarations(
        &self,
        symbol: SymbolId,
        name: &str,
        is_static: bool,
        depth: usize,
    ) -> Option<SymbolId> {
        let entry = self.bindings.entry(symbol)?;
        for declaration in &entry.symbol.declarations {
            let key = MemberKey {
                container: *declaration,
                is_static,
            };
            if let Some(member) = self.bindings.member(key, name) {
                return Some(member);
            }
        }
        for declaration in &entry.symbol.declarations {
            if let Some(member) = self.lookup_inherited(*declaration, name, is_static, depth + 1) {
                return Some(member);
            }
        }
        None
    }

    /// Looks `name` up on the `extends` bases of a class or interface.
    fn lookup_inherited(
        &self,
        declaration: DeclarationRef,
        name: &str,
        is_static: bool,
        depth: usize,
    ) -> Option<SymbolId> {
        let unit = self.unit(declaration.file)?;
        let tree = &unit.tree;
        let is_class = matches!(tree.kind(declaration.node)?, NodeKind::ClassDeclaration { .. });
        if is_static && !is_class {
            return None;
        }
        tree.children(declaration.node).iter().find_map(|&child| {
            let NodeKind::Heritage {
                kind: HeritageKind::Extends,
                expression,
            } = tree.kind(child)?
            else {
                return None;
            };
            let base = if is_class {
                match self.expression_container(unit, *expression, depth + 1)? {
                    Container::Static(base) if !is_static => Container::Instance(base),
                    other => other,
                }
            } else {
                self.type_container(unit, *expression, depth + 1)?
            };
            self.lookup_member(&base, name, depth + 1)
        })
    }

    /// Property of the props type given by a component's `FC<Props>` style annotation.
    pub(crate) fn jsx_attribute_property(&self, file: FileId, attribute: NodeId) -> Option<SymbolId> {
        let unit = self.unit(file)?;
        let tree = &unit.tree;
        let NodeKind::JsxAttribute { name } = tree.kind(attribute)? else {
            return None;
        };
        let name = tree.name_text(*name)?;
        let tag = jsx_tag_of_attribute(unit, attribute)?;
        let component = self.follow_aliases(self.resolve_at(file, tag, 1)?)?;
        let entry = self.bindings.entry(component)?;

        entry.symbol.declarations.iter().find_map(|declaration| {
            let decl_unit = self.unit(declaration.file)?;
            let decl_tree = &decl_unit.tree;
            let NodeKind::VariableDeclaration {
                type_annotation: Some(annotation),
                ..
            } = decl_tree.kind(declaration.node)?
            else {
                return None;
            };
            let props = first_type_argument(decl_unit, *annotation)?;
            let container = self.type_container(decl_unit, props, 1)?;
            self.lookup_member(&container, name, 1)
        })
    }

    /// Property `name` of the props parameter of a function component or
    /// the props type argument of a class component.
    pub(crate) fn jsx_props_from_signatures(&self, file: FileId, tag: NodeId, name: &str) -> Option<SymbolId> {
        let component = self.follow_aliases(self.resolve_at(file, tag, 1)?)?;
        let entry = self.bindings.entry(component)?;

        entry.symbol.declarations.iter().find_map(|declaration| {
            let unit = self.unit(declaration.file)?;
            let tree = &unit.tree;
            let props = match tree.kind(declaration.node)? {
                NodeKind::FunctionDeclaration { .. } => first_parameter_type(unit, declaration.node),
                NodeKind::VariableDeclaration {
                    initializer: Some(init),
                    ..
                } if matches!(
                    tree.kind(*init),
                    Some(NodeKind::ArrowFunction | NodeKind::FunctionExpression { .. })
                ) =>
                {
                    first_parameter_type(unit, *init)
                }
                NodeKind::ClassDeclaration { .. } => tree.children(declaration.node).iter().find_map(|&c| {
                    match tree.kind(c)? {
                        NodeKind::Heritage {
                            kind: HeritageKind::Extends,
                            ..
                        } => first_type_argument(unit, c),
                        _ => None,
                    }
                }),
                _ => None,
            }?;
            let container = self.type_container(unit, props, 1)?;
            self.lookup_member(&container, name, 1)
        })
    }
}

fn jsx_tag_of_attribute(unit: &SourceUnit, attribute: NodeId) -> Option<NodeId> {
    let element = unit.tree.parent(attribute)?;
    match unit.tree.kind(element)? {
        NodeKind::JsxElement { tag, .. } => Some(*tag),
        _ => None,
    }
}

/// First child of the `type_arguments` under a generic reference or heritage entry.
fn first_type_argument(unit: &SourceUnit, node: NodeId) -> Option<NodeId> {
    let tree = &unit.tree;
    let arguments = tree
        .children(node)
        .iter()
        .copied()
        .find(|&c| matches!(tree.kind(c), Some(NodeKind::Other { kind: "type_arguments" })))?;
    tree.children(arguments).first().copied()
}

fn first_parameter_type(unit: &SourceUnit, function: NodeId) -> Option<NodeId> {
    let tree = &unit.tree;
    let parameters = tree
        .children(function)
        .iter()
        .find(|&&c| matches!(tree.kind(c), Some(NodeKind::Other { kind: "formal_parameters" })))
        .map_or_else(|| tree.children(function), |&p| tree.children(p));
    parameters.iter().find_map(|&p| match tree.kind(p)? {
        NodeKind::Parameter {
            type_annotation, ..
        } => *type_annotation,
        _ => None,
    })
}
