//! Declaration binding.
//!
//! Walks every lowered file once, creating symbols for declarations and
//! recording them in lexical scopes, member tables (classes, interfaces,
//! type literals, object literals, enums, namespaces) and module export
//! tables. Import and export aliases are linked to their targets in a
//! second pass once every file's exports are known.

use std::collections::{HashMap, HashSet};

use pmax_core::syntax::{BindingKind, Modifiers, NodeId, NodeKind, SyntaxTree};
use pmax_core::{DeclarationRef, FileId, SourceUnit, Symbol, SymbolId};
use tracing::debug;

use crate::modules::ModuleMap;

/// What a symbol declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    EnumMember,
    Namespace,
    Property,
    Method,
    TypeParameter,
    /// Local name introduced by an import.
    Import,
    /// `import * as ns`.
    NamespaceImport,
    /// Name introduced by an export specifier.
    Export,
}

impl SymbolKind {
    fn is_alias(self) -> bool {
        matches!(self, Self::Import | Self::Export)
    }

    /// Declarations that TypeScript merges into one symbol.
    fn merges_with(self, other: Self) -> bool {
        use SymbolKind::{Class, Enum, Function, Interface, Namespace};
        matches!(
            (self, other),
            (Function, Function)
                | (Interface, Interface)
                | (Class | Interface, Class | Interface)
                | (Enum, Enum)
                | (Namespace, Namespace | Function | Class | Enum)
                | (Function | Class | Enum, Namespace)
        )
    }
}

/// Name space a lookup searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Meaning {
    Value,
    Type,
}

#[derive(Debug, Clone, Copy)]
struct Declares {
    value: bool,
    ty: bool,
}

const VALUE: Declares = Declares {
    value: true,
    ty: false,
};
const TYPE: Declares = Declares {
    value: false,
    ty: true,
};
const BOTH: Declares = Declares {
    value: true,
    ty: true,
};

/// A bound symbol.
#[derive(Debug, Clone)]
pub(crate) struct SymbolEntry {
    pub symbol: Symbol,
    pub kind: SymbolKind,
    /// One-hop alias target, filled in while linking.
    pub target: Option<SymbolId>,
    /// Module a namespace import stands for.
    pub module: Option<FileId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    File,
    Function,
    Module(NodeId),
    Block,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<usize>,
    values: HashMap<String, SymbolId>,
    types: HashMap<String, SymbolId>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<usize>) -> Self {
        Self {
            kind,
            parent,
            values: HashMap::new(),
            types: HashMap::new(),
        }
    }

    fn table(&self, meaning: Meaning) -> &HashMap<String, SymbolId> {
        match meaning {
            Meaning::Value => &self.values,
            Meaning::Type => &self.types,
        }
    }
}

/// Per-file binding results.
#[derive(Debug)]
pub(crate) struct FileBindings {
    scopes: Vec<Scope>,
    scope_of: HashMap<NodeId, usize>,
    /// Declaration nodes and their name nodes.
    declared: HashMap<NodeId, SymbolId>,
    exports: HashMap<String, SymbolId>,
    star_exports: Vec<FileId>,
    is_module: bool,
}

impl FileBindings {
    fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::File, None)],
            scope_of: HashMap::from([(NodeId::ROOT, 0)]),
            declared: HashMap::new(),
            exports: HashMap::new(),
            star_exports: Vec::new(),
            is_module: false,
        }
    }
}

/// Owner of a member table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MemberKey {
    pub container: DeclarationRef,
    /// Static class members, enum members and namespace exports.
    pub is_static: bool,
}

/// Binding results for a whole program.
#[derive(Debug)]
pub(crate) struct Bindings {
    symbols: Vec<SymbolEntry>,
    files: Vec<FileBindings>,
    members: HashMap<MemberKey, HashMap<String, SymbolId>>,
    globals: Scope,
}

impl Bindings {
    pub(crate) fn entry(&self, id: SymbolId) -> Option<&SymbolEntry> {
        self.symbols.get(id.index())
    }

    /// Symbol declared by a declaration node or its name node.
    pub(crate) fn declared(&self, file: FileId, node: NodeId) -> Option<SymbolId> {
        self.files.get(file.index())?.declared.get(&node).copied()
    }

    /// Lexical lookup of `name` as seen from `node`.
    pub(crate) fn lookup(
        &self,
        unit: &SourceUnit,
        node: NodeId,
        name: &str,
        meaning: Meaning,
    ) -> Option<SymbolId> {
        let bindings = self.files.get(unit.id.index())?;
        let mut scope = std::iter::once(node)
            .chain(unit.tree.ancestors(node))
            .find_map(|n| bindings.scope_of.get(&n).copied())
            .unwrap_or(0);
        loop {
            let current = bindings.scopes.get(scope)?;
            if let Some(id) = current.table(meaning).get(name) {
                return Some(*id);
            }
            match current.parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        self.globals.table(meaning).get(name).copied()
    }

    /// Looks up an export of a module, following `export *`.
    pub(crate) fn export_of(&self, file: FileId, name: &str) -> Option<SymbolId> {
        let mut visited = HashSet::new();
        self.export_of_inner(file, name, &mut visited)
    }

    fn export_of_inner(
        &self,
        file: FileId,
        name: &str,
        visited: &mut HashSet<FileId>,
    ) -> Option<SymbolId> {
        if !visited.insert(file) {
            return None;
        }
        let bindings = self.files.get(file.index())?;
        if let Some(id) = bindings.exports.get(name) {
            return Some(*id);
        }
        if name == "default" {
            return None;
        }
        bindings
            .star_exports
            .iter()
            .find_map(|&star| self.export_of_inner(star, name, visited))
    }

    /// Member named `name` in the table of `key`.
    pub(crate) fn member(&self, key: MemberKey, name: &str) -> Option<SymbolId> {
        self.members.get(&key)?.get(name).copied()
    }
}

/// Pending alias links, resolved after all files are bound.
enum Link {
    /// Target is export `name` of `module`.
    Import {
        alias: SymbolId,
        module: Option<FileId>,
        name: String,
    },
    /// `export { name as exported }` or `export default name` of a local.
    LocalExport {
        file: FileId,
        name: String,
        exported: String,
        alias: Option<SymbolId>,
    },
}

/// Binds every unit of a program.
pub(crate) fn bind(units: &[SourceUnit], modules: &ModuleMap) -> Bindings {
    let mut binder = Binder {
        bindings: Bindings {
            symbols: Vec::new(),
            files: Vec::with_capacity(units.len()),
            members: HashMap::new(),
            globals: Scope::new(ScopeKind::File, None),
        },
        links: Vec::new(),
        modules,
    };
    for unit in units {
        let file = binder.bind_file(unit);
        binder.bindings.files.push(file);
    }
    binder.publish_globals();
    binder.link();
    binder.bindings
}

struct Binder<'m> {
    bindings: Bindings,
    links: Vec<Link>,
    modules: &'m ModuleMap,
}

impl Binder<'_> {
    fn bind_file(&mut self, unit: &SourceUnit) -> FileBindings {
        debug!("Binding {}", unit.path.display());
        let tree = &unit.tree;
        let mut fb = FileBindings::new();
        fb.is_module = tree.children(tree.root()).iter().any(|&c| {
            tree.modifiers(c).export
                || matches!(
                    tree.kind(c),
                    Some(
                        NodeKind::ImportDeclaration { .. }
                            | NodeKind::ExportDeclaration { .. }
                            | NodeKind::ExportAssignment { .. }
                    )
                )
        });

        let mut stack: Vec<(NodeId, usize)> = tree
            .children(tree.root())
            .iter()
            .rev()
            .map(|&c| (c, 0))
            .collect();
        while let Some((node, scope)) = stack.pop() {
            let inner = self.visit(unit, &mut fb, node, scope);
            stack.extend(tree.children(node).iter().rev().map(|&c| (c, inner)));
        }
        fb
    }

    /// Binds one node and returns the scope its children live in.
    fn visit(&mut self, unit: &SourceUnit, fb: &mut FileBindings, node: NodeId, scope: usize) -> usize {
        let tree = &unit.tree;
        let Some(kind) = tree.kind(node) else {
            return scope;
        };
        let modifiers = tree.modifiers(node);

        match kind {
            NodeKind::FunctionDeclaration { name } => {
                self.declare_named(unit, fb, scope, node, *name, SymbolKind::Function, VALUE, modifiers);
            }
            NodeKind::ClassDeclaration { name } => {
                self.declare_named(unit, fb, scope, node, *name, SymbolKind::Class, BOTH, modifiers);
            }
            NodeKind::InterfaceDeclaration { name } => {
                self.declare_named(unit, fb, scope, node, Some(*name), SymbolKind::Interface, TYPE, modifiers);
            }
            NodeKind::TypeAliasDeclaration { name, .. } => {
                self.declare_named(unit, fb, scope, node, Some(*name), SymbolKind::TypeAlias, TYPE, modifiers);
            }
            NodeKind::EnumDeclaration { name } => {
                self.declare_named(unit, fb, scope, node, Some(*name), SymbolKind::Enum, BOTH, modifiers);
            }
            NodeKind::ModuleDeclaration { name } => {
                if matches!(tree.kind(*name), Some(NodeKind::Identifier { .. })) {
                    self.declare_named(unit, fb, scope, node, Some(*name), SymbolKind::Namespace, BOTH, modifiers);
                }
            }
            NodeKind::VariableDeclaration { name, .. } => {
                let statement = tree.parent(node);
                let binding = statement.and_then(|s| match tree.kind(s) {
                    Some(NodeKind::VariableStatement { binding }) => Some(*binding),
                    _ => None,
                });
                let target = if binding == Some(BindingKind::Var) {
                    hoist_target(fb, scope)
                } else {
                    scope
                };
                let statement_modifiers = statement.map(|s| tree.modifiers(s)).unwrap_or_default();
                self.declare_pattern(unit, fb, target, node, *name, SymbolKind::Variable, statement_modifiers);
            }
            NodeKind::Parameter { name, .. } => {
                self.declare_pattern(unit, fb, scope, node, *name, SymbolKind::Parameter, Modifiers::default());
            }
            NodeKind::ImportClause {
                default_name: Some(local),
            } => {
                if let Some(text) = tree.name_text(*local) {
                    let alias = self.declare(fb, scope, text, decl(unit, node), SymbolKind::Import, BOTH);
                    fb.declared.insert(*local, alias);
                    let module = self.import_module(unit, node);
                    self.links.push(Link::Import {
                        alias,
                        module,
                        name: "default".to_string(),
                    });
                }
            }
            NodeKind::NamespaceImport { name } => {
                if let Some(text) = tree.name_text(*name) {
                    let id = self.declare(fb, scope, text, decl(unit, node), SymbolKind::NamespaceImport, BOTH);
                    fb.declared.insert(*name, id);
                    fb.declared.insert(node, id);
                    let module = self.import_module(unit, node);
                    if let Some(entry) = self.bindings.symbols.get_mut(id.index()) {
                        entry.module = module;
                    }
                }
            }
            NodeKind::ImportSpecifier { name, alias } => {
                let local = alias.unwrap_or(*name);
                if let (Some(imported), Some(local_text)) = (tree.name_text(*name), tree.name_text(local)) {
                    let id = self.declare(fb, scope, local_text, decl(unit, node), SymbolKind::Import, BOTH);
                    fb.declared.insert(node, id);
                    fb.declared.insert(local, id);
                    let module = self.import_module(unit, node);
                    self.links.push(Link::Import {
                        alias: id,
                        module,
                        name: imported.to_string(),
                    });
                }
            }
            NodeKind::ExportSpecifier { name, alias } => {
                self.bind_export_specifier(unit, fb, node, *name, *alias);
            }
            NodeKind::ExportDeclaration {
                module: Some(module),
                star: true,
            } => {
                if let Some(target) = self.modules.resolve(&unit.path, module) {
                    fb.star_exports.push(target);
                }
            }
            NodeKind::ExportAssignment { expression } => {
                if let Some(name) = tree.name_text(*expression).filter(|_| {
                    matches!(tree.kind(*expression), Some(NodeKind::Identifier { .. }))
                }) {
                    self.links.push(Link::LocalExport {
                        file: unit.id,
                        name: name.to_string(),
                        exported: "default".to_string(),
                        alias: None,
                    });
                } else {
                    let id = self.new_symbol("default", decl(unit, node), SymbolKind::Variable);
                    fb.declared.insert(node, id);
                    fb.exports.insert("default".to_string(), id);
                }
            }
            NodeKind::Other {
                kind: "type_parameter",
            } => {
                if let Some(&name) = tree.children(node).first() {
                    if let Some(text) = tree.name_text(name) {
                        let id = self.declare(fb, scope, text, decl(unit, node), SymbolKind::TypeParameter, TYPE);
                        fb.declared.insert(name, id);
                    }
                }
            }
            NodeKind::MethodDeclaration { name } | NodeKind::MethodSignature { name } => {
                self.declare_member(unit, fb, node, *name, SymbolKind::Method);
            }
            NodeKind::PropertyDeclaration { name, .. }
            | NodeKind::PropertySignature { name, .. }
            | NodeKind::PropertyAssignment { name, .. }
            | NodeKind::ShorthandPropertyAssignment { name } => {
                self.declare_member(unit, fb, node, *name, SymbolKind::Property);
            }
            NodeKind::EnumMember { name } => {
                self.declare_member(unit, fb, node, *name, SymbolKind::EnumMember);
            }
            _ => {}
        }

        self.child_scope(unit, fb, node, scope)
    }

    /// Creates the scope owned by `node`, if any.
    fn child_scope(&mut self, unit: &SourceUnit, fb: &mut FileBindings, node: NodeId, scope: usize) -> usize {
        let tree = &unit.tree;
        let kind = match tree.kind(node) {
            Some(k) if k.is_function_like() => ScopeKind::Function,
            Some(NodeKind::ModuleDeclaration { .. }) => ScopeKind::Module(node),
            Some(
                NodeKind::ClassDeclaration { .. }
                | NodeKind::InterfaceDeclaration { .. }
                | NodeKind::TypeAliasDeclaration { .. }
                | NodeKind::ForStatement
                | NodeKind::CatchClause,
            ) => ScopeKind::Block,
            Some(NodeKind::Block) => {
                // Bodies share the scope of their function, namespace or catch clause.
                let owner = tree.parent(node).and_then(|p| tree.kind(p));
                let shares = owner.is_some_and(|k| {
                    k.is_function_like()
                        || matches!(k, NodeKind::ModuleDeclaration { .. } | NodeKind::CatchClause)
                });
                if shares {
                    return scope;
                }
                ScopeKind::Block
            }
            _ => return scope,
        };

        let id = fb.scopes.len();
        fb.scopes.push(Scope::new(kind, Some(scope)));
        fb.scope_of.insert(node, id);

        if let Some(NodeKind::FunctionExpression { name: Some(name) }) = tree.kind(node) {
            if let Some(text) = tree.name_text(*name) {
                let sym = self.declare(fb, id, text, decl(unit, node), SymbolKind::Function, VALUE);
                fb.declared.insert(node, sym);
                fb.declared.insert(*name, sym);
            }
        }
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn declare_named(
        &mut self,
        unit: &SourceUnit,
        fb: &mut FileBindings,
        scope: usize,
        node: NodeId,
        name: Option<NodeId>,
        kind: SymbolKind,
        declares: Declares,
        modifiers: Modifiers,
    ) {
        let tree = &unit.tree;
        let id = match name.and_then(|n| tree.name_text(n)) {
            Some(text) => self.declare(fb, scope, text, decl(unit, node), kind, declares),
            None if modifiers.default => self.new_symbol("default", decl(unit, node), kind),
            None => return,
        };
        fb.declared.insert(node, id);
        if let Some(name) = name {
            fb.declared.insert(name, id);
        }
        if let Some(text) = name.and_then(|n| tree.name_text(n)) {
            self.export_if_needed(unit, fb, scope, text, id, modifiers);
        } else if modifiers.export && modifiers.default {
            fb.exports.insert("default".to_string(), id);
        }
    }

    /// Declares every identifier bound by a name or destructuring pattern.
    #[allow(clippy::too_many_arguments)]
    fn declare_pattern(
        &mut self,
        unit: &SourceUnit,
        fb: &mut FileBindings,
        scope: usize,
        node: NodeId,
        name: NodeId,
        kind: SymbolKind,
        modifiers: Modifiers,
    ) {
        let tree = &unit.tree;
        match tree.kind(name) {
            Some(NodeKind::Identifier { text }) => {
                let id = self.declare(fb, scope, text, decl(unit, node), kind, VALUE);
                fb.declared.insert(node, id);
                fb.declared.insert(name, id);
                self.export_if_needed(unit, fb, scope, text, id, modifiers);
            }
            Some(NodeKind::BindingPattern) => {
                for &element in tree.children(name) {
                    if let Some(NodeKind::BindingElement { name: inner, .. }) = tree.kind(element) {
                        self.declare_pattern(unit, fb, scope, element, *inner, kind, modifiers);
                    }
                }
            }
            _ => {}
        }
    }

    fn declare_member(
        &mut self,
        unit: &SourceUnit,
        fb: &mut FileBindings,
        node: NodeId,
        name: NodeId,
        kind: SymbolKind,
    ) {
        let tree = &unit.tree;
        let Some(container) = member_container(tree, node) else {
            return;
        };
        let Some(text) = tree.name_text(name) else {
            return;
        };
        let is_static = tree.modifiers(node).is_static
            || matches!(tree.kind(container), Some(NodeKind::EnumDeclaration { .. }));
        let key = MemberKey {
            container: decl(unit, container),
            is_static,
        };
        let id = self.add_member(key, text, decl(unit, node), kind);
        fb.declared.insert(node, id);
        // `{ x }` names the referenced variable, not the property.
        if !matches!(tree.kind(node), Some(NodeKind::ShorthandPropertyAssignment { .. })) {
            fb.declared.insert(name, id);
        }
    }

    fn add_member(&mut self, key: MemberKey, name: &str, declaration: DeclarationRef, kind: SymbolKind) -> SymbolId {
        if let Some(&existing) = self.bindings.members.get(&key).and_then(|t| t.get(name)) {
            if let Some(entry) = self.bindings.symbols.get_mut(existing.index()) {
                entry.symbol.declarations.push(declaration);
            }
            return existing;
        }
        let id = self.new_symbol(name, declaration, kind);
        self.bindings
            .members
            .entry(key)
            .or_default()
            .insert(name.to_string(), id);
        id
    }

    fn bind_export_specifier(
        &mut self,
        unit: &SourceUnit,
        fb: &mut FileBindings,
        node: NodeId,
        name: NodeId,
        alias: Option<NodeId>,
    ) {
        let tree = &unit.tree;
        let Some(local) = tree.name_text(name) else {
            return;
        };
        let exported = alias.and_then(|a| tree.name_text(a)).unwrap_or(local).to_string();
        let id = self.new_symbol(&exported, decl(unit, node), SymbolKind::Export);
        fb.declared.insert(node, id);
        if let Some(alias) = alias {
            fb.declared.insert(alias, id);
        }

        let module = tree.parent(node).and_then(|p| match tree.kind(p) {
            Some(NodeKind::ExportDeclaration { module, .. }) => module.clone(),
            _ => None,
        });
        match module {
            Some(module) => {
                fb.exports.insert(exported, id);
                self.links.push(Link::Import {
                    alias: id,
                    module: self.modules.resolve(&unit.path, &module),
                    name: local.to_string(),
                });
            }
            None => self.links.push(Link::LocalExport {
                file: unit.id,
                name: local.to_string(),
                exported,
                alias: Some(id),
            }),
        }
    }

    fn export_if_needed(
        &mut self,
        unit: &SourceUnit,
        fb: &mut FileBindings,
        scope: usize,
        name: &str,
        id: SymbolId,
        modifiers: Modifiers,
    ) {
        if !modifiers.export {
            return;
        }
        match fb.scopes.get(scope).map(|s| s.kind) {
            Some(ScopeKind::File) => {
                fb.exports.insert(name.to_string(), id);
                if modifiers.default {
                    fb.exports.insert("default".to_string(), id);
                }
            }
            Some(ScopeKind::Module(owner)) => {
                let key = MemberKey {
                    container: decl(unit, owner),
                    is_static: true,
                };
                self.bindings
                    .members
                    .entry(key)
                    .or_default()
                    .insert(name.to_string(), id);
            }
            _ => {}
        }
    }

    fn declare(
        &mut self,
        fb: &mut FileBindings,
        scope: usize,
        name: &str,
        declaration: DeclarationRef,
        kind: SymbolKind,
        declares: Declares,
    ) -> SymbolId {
        let Some(table) = fb.scopes.get(scope) else {
            return self.new_symbol(name, declaration, kind);
        };
        let existing = [
            declares.value.then(|| table.values.get(name)).flatten(),
            declares.ty.then(|| table.types.get(name)).flatten(),
        ]
        .into_iter()
        .flatten()
        .copied()
        .find(|id| {
            self.bindings
                .entry(*id)
                .is_some_and(|e| e.kind.merges_with(kind))
        });

        let id = match existing {
            Some(id) => {
                if let Some(entry) = self.bindings.symbols.get_mut(id.index()) {
                    entry.symbol.declarations.push(declaration);
                }
                id
            }
            None => self.new_symbol(name, declaration, kind),
        };

        if let Some(table) = fb.scopes.get_mut(scope) {
            if declares.value {
                table.values.insert(name.to_string(), id);
            }
            if declares.ty {
                table.types.insert(name.to_string(), id);
            }
        }
        id
    }

    fn new_symbol(&mut self, name: &str, declaration: DeclarationRef, kind: SymbolKind) -> SymbolId {
        let id = SymbolId::new(self.bindings.symbols.len());
        let mut symbol = Symbol::new(name, declaration);
        if kind.is_alias() {
            symbol = symbol.alias();
        }
        self.bindings.symbols.push(SymbolEntry {
            symbol,
            kind,
            target: None,
            module: None,
        });
        id
    }

    /// Resolves the module of the import declaration enclosing `node`.
    fn import_module(&self, unit: &SourceUnit, node: NodeId) -> Option<FileId> {
        let tree = &unit.tree;
        let specifier = tree.ancestors(node).find_map(|a| match tree.kind(a) {
            Some(NodeKind::ImportDeclaration { module }) => Some(module.as_str()),
            _ => None,
        })?;
        let resolved = self.modules.resolve(&unit.path, specifier);
        if resolved.is_none() {
            debug!("Unresolved module '{}' in {}", specifier, unit.path.display());
        }
        resolved
    }

    /// Top-level declarations of non-module files are global.
    fn publish_globals(&mut self) {
        for fb in &self.bindings.files {
            if fb.is_module {
                continue;
            }
            let Some(file_scope) = fb.scopes.first() else {
                continue;
            };
            for (name, id) in &file_scope.values {
                self.bindings.globals.values.entry(name.clone()).or_insert(*id);
            }
            for (name, id) in &file_scope.types {
                self.bindings.globals.types.entry(name.clone()).or_insert(*id);
            }
        }
    }

    fn link(&mut self) {
        let links = std::mem::take(&mut self.links);
        let (locals, imports): (Vec<_>, Vec<_>) = links
            .into_iter()
            .partition(|l| matches!(l, Link::LocalExport { .. }));

        for link in locals {
            let Link::LocalExport {
                file,
                name,
                exported,
                alias,
            } = link
            else {
                continue;
            };
            let Some(fb) = self.bindings.files.get_mut(file.index()) else {
                continue;
            };
            let target = fb.scopes.first().and_then(|s| {
                s.values
                    .get(&name)
                    .or_else(|| s.types.get(&name))
                    .copied()
            });
            if let Some(target) = target {
                fb.exports.insert(exported, target);
            }
            if let Some(entry) = alias.and_then(|a| self.bindings.symbols.get_mut(a.index())) {
                entry.target = target;
            }
        }

        for link in imports {
            let Link::Import {
                alias,
                module,
                name,
            } = link
            else {
                continue;
            };
            let target = module.and_then(|m| self.bindings.export_of(m, &name));
            if let Some(entry) = self.bindings.symbols.get_mut(alias.index()) {
                entry.target = target;
            }
        }
    }
}

fn decl(unit: &SourceUnit, node: NodeId) -> DeclarationRef {
    DeclarationRef {
        file: unit.id,
        node,
    }
}

/// Nearest enclosing scope that `var` hoists to.
fn hoist_target(fb: &FileBindings, mut scope: usize) -> usize {
    while let Some(s) = fb.scopes.get(scope) {
        match (s.kind, s.parent) {
            (ScopeKind::Block, Some(parent)) => scope = parent,
            _ => break,
        }
    }
    scope
}

/// Class, interface, type literal, object literal or enum owning a member.
pub(crate) fn member_container(tree: &SyntaxTree, member: NodeId) -> Option<NodeId> {
    let parent = tree.parent(member)?;
    match tree.kind(parent)? {
        NodeKind::TypeLiteral => {
            let owner = tree.parent(parent);
            match owner.and_then(|o| tree.kind(o)) {
                Some(NodeKind::InterfaceDeclaration { .. }) => owner,
                _ => Some(parent),
            }
        }
        NodeKind::ClassDeclaration { .. }
        | NodeKind::InterfaceDeclaration { .. }
        | NodeKind::ObjectLiteral
        | NodeKind::EnumDeclaration { .. } => Some(parent),
        NodeKind::Other {
            kind: "class_body" | "interface_body" | "enum_body",
        } => tree.parent(parent),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::TsProgram;
    use pmax_core::syntax::NodeKind;
    use pmax_core::{FileId, ProgramModel, SourceUnit};

    fn ident(unit: &SourceUnit, text: &str, nth: usize) -> pmax_core::NodeId {
        unit.tree
            .node_ids()
            .filter(|&id| matches!(unit.tree.kind(id), Some(NodeKind::Identifier { text: t }) if t == text))
            .nth(nth)
            .unwrap()
    }

    fn resolved_name(program: &TsProgram, file: usize, text: &str, nth: usize) -> Option<String> {
        let unit = &program.source_units()[file];
        let node = ident(unit, text, nth);
        let id = program.resolve_symbol(FileId::new(file), node)?;
        Some(program.symbol(id)?.name.clone())
    }

    #[test]
    fn block_scopes_shadow() {
        let program = TsProgram::builder()
            .file("a.ts", "const x = 1;\n{ const x = 2; x; }\nx;\n")
            .build()
            .unwrap();
        let unit = &program.source_units()[0];
        let outer = program.resolve_symbol(FileId::new(0), ident(unit, "x", 0)).unwrap();
        let inner = program.resolve_symbol(FileId::new(0), ident(unit, "x", 1)).unwrap();
        assert_ne!(outer, inner);
        assert_eq!(program.resolve_symbol(FileId::new(0), ident(unit, "x", 2)), Some(inner));
        assert_eq!(program.resolve_symbol(FileId::new(0), ident(unit, "x", 3)), Some(outer));
    }

    #[test]
    fn var_hoists_out_of_blocks() {
        let program = TsProgram::builder()
            .file("a.ts", "function f() { if (1) { var v = 1; } return v; }\n")
            .build()
            .unwrap();
        let unit = &program.source_units()[0];
        let decl = program.resolve_symbol(FileId::new(0), ident(unit, "v", 0));
        let usage = program.resolve_symbol(FileId::new(0), ident(unit, "v", 1));
        assert!(decl.is_some());
        assert_eq!(decl, usage);
    }

    #[test]
    fn interfaces_merge() {
        let program = TsProgram::builder()
            .file("a.ts", "interface A { x: number }\ninterface A { y: number }\nlet a: A;\n")
            .build()
            .unwrap();
        let unit = &program.source_units()[0];
        let id = program.resolve_symbol(FileId::new(0), ident(unit, "A", 2)).unwrap();
        assert_eq!(program.symbol(id).unwrap().declarations.len(), 2);
    }

    #[test]
    fn types_and_values_are_separate() {
        let program = TsProgram::builder()
            .file("a.ts", "type T = string;\nconst T = 1;\nlet a: T = T;\n")
            .build()
            .unwrap();
        let unit = &program.source_units()[0];
        let ty = program.resolve_symbol(FileId::new(0), ident(unit, "T", 2)).unwrap();
        let value = program.resolve_symbol(FileId::new(0), ident(unit, "T", 3)).unwrap();
        assert_ne!(ty, value);
    }

    #[test]
    fn imports_link_one_hop() {
        let program = TsProgram::builder()
            .file("m.ts", "function y() {}\nexport { y as x };\n")
            .file("r.ts", "export { x as z } from './m';\n")
            .file("main.ts", "import { x } from './m';\nimport { z } from './r';\n")
            .build()
            .unwrap();
        let main = &program.source_units()[2];
        let specifiers: Vec<_> = main
            .tree
            .node_ids()
            .filter(|&id| matches!(main.tree.kind(id), Some(NodeKind::ImportSpecifier { .. })))
            .collect();

        let x = program.resolve_symbol(FileId::new(2), specifiers[0]).unwrap();
        let target = program.immediate_alias_target(x).unwrap();
        assert_eq!(program.symbol(target).unwrap().name, "y");

        let z = program.resolve_symbol(FileId::new(2), specifiers[1]).unwrap();
        let hop = program.immediate_alias_target(z).unwrap();
        let hop_symbol = program.symbol(hop).unwrap();
        assert!(hop_symbol.is_alias);
        assert_eq!(hop_symbol.name, "z");
    }

    #[test]
    fn star_exports_and_globals() {
        let program = TsProgram::builder()
            .file("lib/a.ts", "export function a() {}\n")
            .file("lib/index.ts", "export * from './a';\n")
            .file("globals.d.ts", "declare function legacyGlobal(): void;\n")
            .file("main.ts", "import { a } from './lib';\nlegacyGlobal();\n")
            .build()
            .unwrap();
        assert_eq!(resolved_name(&program, 3, "legacyGlobal", 0).as_deref(), Some("legacyGlobal"));

        let main = &program.source_units()[3];
        let spec = main
            .tree
            .node_ids()
            .find(|&id| matches!(main.tree.kind(id), Some(NodeKind::ImportSpecifier { .. })))
            .unwrap();
        let alias = program.resolve_symbol(FileId::new(3), spec).unwrap();
        let target = program.immediate_alias_target(alias).unwrap();
        assert_eq!(program.symbol(target).unwrap().declarations[0].file, FileId::new(0));
    }
}
