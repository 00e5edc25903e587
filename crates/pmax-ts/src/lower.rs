//! Lowering of Tree-sitter TypeScript trees into the core syntax arena.
//!
//! Wrapper nodes with no meaning of their own (type annotations,
//! parentheses, import/export clauses, class heritage) are spliced away so
//! that variant fields always point at direct children. `export <decl>` and
//! `declare <decl>` lower to the declaration itself with modifiers set and
//! its span extended over the keyword, so leading comments attach to it.

use std::collections::HashMap;
use tree_sitter::{Node, Tree};

use pmax_core::syntax::{
    BindingKind, CommentKind, HeritageKind, Modifiers, NodeId, NodeKind, Span, SyntaxTree,
    TreeBuilder,
};

/// Tree-sitter kinds that never become nodes.
const SKIPPED: &[&str] = &[
    "comment",
    "html_comment",
    "hash_bang_line",
    "jsx_text",
    "string_fragment",
    "escape_sequence",
    "statement_identifier",
];

/// Tree-sitter kinds whose named children are lowered in their place.
const TRANSPARENT: &[&str] = &[
    "type_annotation",
    "opting_type_annotation",
    "omitting_type_annotation",
    "adding_type_annotation",
    "parenthesized_expression",
    "named_imports",
    "export_clause",
    "class_heritage",
];

/// Lowers a parsed file.
pub(crate) fn lower(text: &str, tree: &Tree) -> SyntaxTree {
    let mut lowerer = Lowerer {
        src: text,
        out: TreeBuilder::new(),
        ids: HashMap::new(),
        tasks: Vec::new(),
    };
    let root = tree.root_node();
    lowerer.collect_comments(root);

    let file = lowerer
        .out
        .push(NodeKind::SourceFile, Span::new(0, text.len()), None);
    for child in named_children(root) {
        lowerer.lower(child, Some(file));
    }
    lowerer.out.finish()
}

/// Deferred lowering work. Generic nodes are pushed when visited; their
/// children and final kind are handled through the work list so nesting
/// depth never grows the call stack.
enum Task<'t> {
    Visit {
        node: Node<'t>,
        parent: Option<NodeId>,
    },
    Children {
        node: Node<'t>,
        id: NodeId,
    },
    Finish {
        node: Node<'t>,
        id: NodeId,
    },
    BareParameter {
        node: Node<'t>,
        owner: Node<'t>,
        parent: NodeId,
    },
}

struct Lowerer<'s, 't> {
    src: &'s str,
    out: TreeBuilder,
    /// Tree-sitter node id -> lowered node.
    ids: HashMap<usize, NodeId>,
    tasks: Vec<Task<'t>>,
}

impl<'s, 't> Lowerer<'s, 't> {
    fn text(&self, n: Node<'_>) -> &'s str {
        self.src.get(n.start_byte()..n.end_byte()).unwrap_or("")
    }

    fn field(&self, n: Node<'_>, name: &str) -> Option<NodeId> {
        n.child_by_field_name(name)
            .and_then(|c| self.ids.get(&c.id()).copied())
    }

    fn lowered(&self, n: Node<'_>) -> Option<NodeId> {
        self.ids.get(&n.id()).copied()
    }

    fn collect_comments(&mut self, root: Node<'_>) {
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            if n.kind() == "comment" {
                let kind = if self.text(n).starts_with("//") {
                    CommentKind::Line
                } else {
                    CommentKind::Block
                };
                self.out.comment(span(n), kind);
                continue;
            }
            let mut cursor = n.walk();
            stack.extend(n.children(&mut cursor));
        }
    }

    fn push(&mut self, n: Node<'_>, parent: Option<NodeId>) -> NodeId {
        self.out
            .push(NodeKind::Other { kind: n.kind() }, span(n), parent)
    }

    /// Pushes an identifier leaf covering `n`.
    fn ident(&mut self, n: Node<'_>, parent: NodeId) -> NodeId {
        let text = self.text(n).to_string();
        self.out
            .push(NodeKind::Identifier { text }, span(n), Some(parent))
    }

    /// Lowers `n` and everything below it before returning.
    fn lower(&mut self, n: Node<'t>, parent: Option<NodeId>) -> Option<NodeId> {
        let base = self.tasks.len();
        let id = self.visit(n, parent);
        while self.tasks.len() > base {
            let Some(task) = self.tasks.pop() else {
                break;
            };
            self.run(task);
        }
        id
    }

    fn run(&mut self, task: Task<'t>) {
        match task {
            Task::Visit { node, parent } => {
                self.visit(node, parent);
            }
            Task::Children { node, id } => self.lower_children(node, id),
            Task::Finish { node, id } => {
                let kind = self
                    .classify(node)
                    .unwrap_or(NodeKind::Other { kind: node.kind() });
                self.out.set_kind(id, kind);
            }
            Task::BareParameter {
                node,
                owner,
                parent,
            } => self.lower_bare_parameter(node, owner, parent),
        }
    }

    /// Queues tasks so that they run in the given order.
    fn schedule(&mut self, tasks: Vec<Task<'t>>) {
        self.tasks.extend(tasks.into_iter().rev());
    }

    /// Pushes the node for `n`; generic descendants are left on the work list.
    fn visit(&mut self, n: Node<'t>, parent: Option<NodeId>) -> Option<NodeId> {
        let mut wrappers = Vec::new();
        let mut n = n;
        while TRANSPARENT.contains(&n.kind()) {
            match named_children(n).as_slice() {
                [only] => {
                    wrappers.push(n);
                    n = *only;
                }
                _ => break,
            }
        }
        let id = self.visit_node(n, parent)?;
        for wrapper in wrappers {
            self.ids.insert(wrapper.id(), id);
        }
        Some(id)
    }

    fn visit_node(&mut self, n: Node<'t>, parent: Option<NodeId>) -> Option<NodeId> {
        let kind = n.kind();
        if SKIPPED.contains(&kind) || !n.is_named() {
            return None;
        }

        let id = if TRANSPARENT.contains(&kind) {
            let mut first = None;
            for child in named_children(n) {
                let lowered = self.lower(child, parent);
                first = first.or(lowered);
            }
            first?
        } else {
            match kind {
                "export_statement" => self.lower_export(n, parent)?,
                "ambient_declaration" => self.lower_ambient(n, parent)?,
                "extends_clause" | "implements_clause" | "extends_type_clause" => {
                    self.lower_heritage(n, parent?)?
                }
                "identifier"
                | "property_identifier"
                | "private_property_identifier"
                | "shorthand_property_identifier_pattern" => self.ident(n, parent?),
                "type_identifier" if is_name_field(n) => self.ident(n, parent?),
                "type_identifier" => {
                    let id = self.push(n, parent);
                    let name = self.ident(n, id);
                    self.out.set_kind(id, NodeKind::TypeReference { name });
                    id
                }
                "nested_type_identifier" if is_name_field(n) => self.lower_generic(n, parent),
                "nested_type_identifier" => {
                    let id = self.push(n, parent);
                    let name = self.lower_generic(n, Some(id));
                    self.out.set_kind(id, NodeKind::TypeReference { name });
                    id
                }
                "shorthand_property_identifier" => {
                    let id = self.push(n, parent);
                    let name = self.ident(n, id);
                    self.out
                        .set_kind(id, NodeKind::ShorthandPropertyAssignment { name });
                    id
                }
                "string" => {
                    let value = unquote(self.text(n)).to_string();
                    self.out
                        .push(NodeKind::StringLiteral { value }, span(n), parent)
                }
                "this" => self.out.push(NodeKind::This, span(n), parent),
                _ => self.lower_generic(n, parent),
            }
        };

        self.ids.insert(n.id(), id);
        Some(id)
    }

    /// Pushes `n`; its children and kind follow from the work list.
    fn lower_generic(&mut self, n: Node<'t>, parent: Option<NodeId>) -> NodeId {
        let id = self.push(n, parent);
        if has_token(n, "static") {
            let mut modifiers = self.out.get(id).map(|x| x.modifiers).unwrap_or_default();
            modifiers.is_static = true;
            self.out.set_modifiers(id, modifiers);
        }
        self.tasks.push(Task::Finish { node: n, id });
        self.tasks.push(Task::Children { node: n, id });
        id
    }

    fn lower_children(&mut self, n: Node<'t>, id: NodeId) {
        match n.kind() {
            "object_pattern" | "array_pattern" => {
                for child in named_children(n) {
                    self.lower_binding_element(child, id);
                }
            }
            "arrow_function" | "catch_clause" => {
                let param = n.child_by_field_name("parameter").map(|p| p.id());
                let catch_type = n.child_by_field_name("type").map(|t| t.id());
                let tasks = named_children(n)
                    .into_iter()
                    .filter(|child| Some(child.id()) != catch_type)
                    .map(|child| {
                        if Some(child.id()) == param {
                            Task::BareParameter {
                                node: child,
                                owner: n,
                                parent: id,
                            }
                        } else {
                            Task::Visit {
                                node: child,
                                parent: Some(id),
                            }
                        }
                    })
                    .collect();
                self.schedule(tasks);
            }
            "required_parameter" | "optional_parameter" => {
                for child in named_children(n) {
                    if child.kind() == "rest_pattern" {
                        let inner = named_children(child)
                            .into_iter()
                            .find_map(|c| self.lower(c, Some(id)));
                        if let Some(inner) = inner {
                            self.ids.insert(child.id(), inner);
                        }
                    } else {
                        self.lower(child, Some(id));
                    }
                }
            }
            "enum_body" => {
                for child in named_children(n) {
                    if matches!(child.kind(), "property_identifier" | "string") {
                        let member = self.push(child, Some(id));
                        if let Some(name) = self.lower(child, Some(member)) {
                            self.out.set_kind(member, NodeKind::EnumMember { name });
                        }
                    } else {
                        self.lower(child, Some(id));
                    }
                }
            }
            "jsx_opening_element" | "jsx_self_closing_element" => {
                for child in named_children(n) {
                    if child.kind() == "jsx_expression" && self.lower_jsx_spread(child, id) {
                        continue;
                    }
                    self.lower(child, Some(id));
                }
            }
            _ => {
                let tasks = named_children(n)
                    .into_iter()
                    .map(|child| Task::Visit {
                        node: child,
                        parent: Some(id),
                    })
                    .collect();
                self.schedule(tasks);
            }
        }
    }

    /// Maps a Tree-sitter node to its core kind once its children exist.
    fn classify(&self, n: Node<'_>) -> Option<NodeKind> {
        let kind = match n.kind() {
            "program" => NodeKind::SourceFile,
            "member_expression" => NodeKind::PropertyAccess {
                object: self.field(n, "object")?,
                name: self.field(n, "property")?,
            },
            "subscript_expression" => NodeKind::ElementAccess {
                object: self.field(n, "object")?,
                argument: self.field(n, "index"),
            },
            "call_expression" => NodeKind::Call {
                callee: self.field(n, "function")?,
            },
            "new_expression" => NodeKind::New {
                callee: self.field(n, "constructor")?,
            },
            "object" => NodeKind::ObjectLiteral,
            "pair" => NodeKind::PropertyAssignment {
                name: self.field(n, "key")?,
                initializer: self.field(n, "value"),
            },
            "import_statement" => NodeKind::ImportDeclaration {
                module: unquote(self.text(n.child_by_field_name("source")?)).to_string(),
            },
            "import_clause" => NodeKind::ImportClause {
                default_name: named_children(n)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                    .and_then(|c| self.lowered(c)),
            },
            "namespace_import" => NodeKind::NamespaceImport {
                name: named_children(n)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                    .and_then(|c| self.lowered(c))?,
            },
            "import_specifier" => NodeKind::ImportSpecifier {
                name: self.field(n, "name")?,
                alias: self.field(n, "alias"),
            },
            "export_specifier" => NodeKind::ExportSpecifier {
                name: self.field(n, "name")?,
                alias: self.field(n, "alias"),
            },
            "lexical_declaration" => {
                let keyword = n
                    .child_by_field_name("kind")
                    .map_or_else(|| self.text(n), |k| self.text(k));
                NodeKind::VariableStatement {
                    binding: if keyword.starts_with("const") {
                        BindingKind::Const
                    } else {
                        BindingKind::Let
                    },
                }
            }
            "variable_declaration" => NodeKind::VariableStatement {
                binding: BindingKind::Var,
            },
            "variable_declarator" => NodeKind::VariableDeclaration {
                name: self.field(n, "name")?,
                type_annotation: self.field(n, "type"),
                initializer: self.field(n, "value"),
            },
            "object_pattern" | "array_pattern" => NodeKind::BindingPattern,
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                NodeKind::FunctionDeclaration {
                    name: self.field(n, "name"),
                }
            }
            "function_expression" | "function" | "generator_function" => {
                NodeKind::FunctionExpression {
                    name: self.field(n, "name"),
                }
            }
            "arrow_function" => NodeKind::ArrowFunction,
            "method_definition" => {
                let name = n.child_by_field_name("name")?;
                if self.text(name) == "constructor" {
                    NodeKind::Constructor
                } else {
                    NodeKind::MethodDeclaration {
                        name: self.lowered(name)?,
                    }
                }
            }
            "method_signature" | "abstract_method_signature" => NodeKind::MethodSignature {
                name: self.field(n, "name")?,
            },
            "class_declaration" | "abstract_class_declaration" | "class" => {
                NodeKind::ClassDeclaration {
                    name: self.field(n, "name"),
                }
            }
            "public_field_definition" => NodeKind::PropertyDeclaration {
                name: self.field(n, "name")?,
                type_annotation: self.field(n, "type"),
                initializer: self.field(n, "value"),
            },
            "interface_declaration" => NodeKind::InterfaceDeclaration {
                name: self.field(n, "name")?,
            },
            "object_type" => NodeKind::TypeLiteral,
            "property_signature" => NodeKind::PropertySignature {
                name: self.field(n, "name")?,
                type_annotation: self.field(n, "type"),
            },
            "type_alias_declaration" => NodeKind::TypeAliasDeclaration {
                name: self.field(n, "name")?,
                value: self.field(n, "value"),
            },
            "enum_declaration" => NodeKind::EnumDeclaration {
                name: self.field(n, "name")?,
            },
            "enum_assignment" => NodeKind::EnumMember {
                name: self.field(n, "name")?,
            },
            "internal_module" | "module" => NodeKind::ModuleDeclaration {
                name: self.field(n, "name")?,
            },
            "required_parameter" | "optional_parameter" => NodeKind::Parameter {
                name: self.field(n, "pattern")?,
                type_annotation: self.field(n, "type"),
            },
            "generic_type" => NodeKind::TypeReference {
                name: self.field(n, "name")?,
            },
            "nested_type_identifier" => NodeKind::QualifiedName {
                left: self.field(n, "module")?,
                right: self.field(n, "name")?,
            },
            "nested_identifier" => {
                let parts = named_children(n);
                NodeKind::QualifiedName {
                    left: self.lowered(*parts.first()?)?,
                    right: self.lowered(*parts.last()?)?,
                }
            }
            "jsx_opening_element" => NodeKind::JsxElement {
                tag: self.field(n, "name")?,
                self_closing: false,
            },
            "jsx_self_closing_element" => NodeKind::JsxElement {
                tag: self.field(n, "name")?,
                self_closing: true,
            },
            "jsx_closing_element" => NodeKind::JsxClosingElement {
                tag: self.field(n, "name")?,
            },
            "jsx_attribute" => NodeKind::JsxAttribute {
                name: self.lowered(*named_children(n).first()?)?,
            },
            "statement_block" | "class_static_block" => NodeKind::Block,
            "for_statement" | "for_in_statement" => NodeKind::ForStatement,
            "catch_clause" => NodeKind::CatchClause,
            _ => return None,
        };
        Some(kind)
    }

    /// `export ...` forms.
    fn lower_export(&mut self, n: Node<'t>, parent: Option<NodeId>) -> Option<NodeId> {
        let is_default = has_token(n, "default");
        if let Some(declaration) = n.child_by_field_name("declaration") {
            let id = self.visit(declaration, parent)?;
            self.extend_with_modifier(id, n, |m| {
                m.export = true;
                m.default |= is_default;
            });
            return Some(id);
        }

        let id = self.push(n, parent);
        for child in named_children(n) {
            self.lower(child, Some(id));
        }

        let expression = n
            .child_by_field_name("value")
            .and_then(|v| self.lowered(v))
            .or_else(|| {
                has_token(n, "=")
                    .then(|| named_children(n).into_iter().find_map(|c| self.lowered(c)))
                    .flatten()
            });

        let kind = if let Some(expression) = expression {
            NodeKind::ExportAssignment { expression }
        } else {
            let namespace_export = named_children(n)
                .iter()
                .any(|c| c.kind() == "namespace_export");
            NodeKind::ExportDeclaration {
                module: n
                    .child_by_field_name("source")
                    .map(|s| unquote(self.text(s)).to_string()),
                star: has_token(n, "*") && !namespace_export,
            }
        };
        self.out.set_kind(id, kind);
        Some(id)
    }

    /// `declare <decl>`; other ambient forms stay opaque.
    fn lower_ambient(&mut self, n: Node<'t>, parent: Option<NodeId>) -> Option<NodeId> {
        let children = named_children(n);
        if let [declaration] = children.as_slice() {
            if declaration.kind() != "statement_block" {
                let id = self.visit(*declaration, parent)?;
                self.extend_with_modifier(id, n, |m| m.ambient = true);
                return Some(id);
            }
        }
        Some(self.lower_generic(n, parent))
    }

    fn extend_with_modifier(
        &mut self,
        id: NodeId,
        keyword_owner: Node<'_>,
        apply: impl FnOnce(&mut Modifiers),
    ) {
        let Some(node) = self.out.get(id) else {
            return;
        };
        let end = node.span.end.max(keyword_owner.end_byte());
        let mut modifiers = node.modifiers;
        apply(&mut modifiers);
        self.out
            .set_span(id, Span::new(keyword_owner.start_byte(), end));
        self.out.set_modifiers(id, modifiers);
    }

    /// One `Heritage` node per entry of an extends/implements clause.
    fn lower_heritage(&mut self, clause: Node<'t>, parent: NodeId) -> Option<NodeId> {
        let kind = if clause.kind() == "implements_clause" {
            HeritageKind::Implements
        } else {
            HeritageKind::Extends
        };

        let mut first = None;
        let mut current = None;
        for child in named_children(clause) {
            if child.kind() == "type_arguments" {
                if let Some(heritage) = current {
                    self.lower(child, Some(heritage));
                    let start = self.out.get(heritage).map_or(child.start_byte(), |h| h.span.start);
                    self.out
                        .set_span(heritage, Span::new(start, child.end_byte()));
                }
                continue;
            }
            let heritage = self.push(clause, Some(parent));
            self.out.set_span(heritage, span(child));
            if let Some(expression) = self.lower(child, Some(heritage)) {
                self.out
                    .set_kind(heritage, NodeKind::Heritage { kind, expression });
            }
            current = Some(heritage);
            first = first.or(current);
        }
        first
    }

    /// Patterns inside `{ ... }` / `[ ... ]` destructuring.
    fn lower_binding_element(&mut self, n: Node<'t>, pattern: NodeId) {
        let element = self.push(n, Some(pattern));
        let kind = match n.kind() {
            "pair_pattern" => {
                self.lower_children_of_field(n, "key", element);
                let property = self.field(n, "key");
                match n.child_by_field_name("value") {
                    Some(value) if value.kind() == "assignment_pattern" => {
                        let (name, initializer) = self.lower_assignment_pattern(value, element);
                        name.map(|name| NodeKind::BindingElement {
                            name,
                            property,
                            initializer,
                        })
                    }
                    Some(value) => self.lower(value, Some(element)).map(|name| {
                        NodeKind::BindingElement {
                            name,
                            property,
                            initializer: None,
                        }
                    }),
                    None => None,
                }
            }
            "object_assignment_pattern" | "assignment_pattern" => {
                let (name, initializer) = self.lower_assignment_pattern(n, element);
                name.map(|name| NodeKind::BindingElement {
                    name,
                    property: None,
                    initializer,
                })
            }
            "rest_pattern" => named_children(n)
                .into_iter()
                .find_map(|c| self.lower(c, Some(element)))
                .map(|name| NodeKind::BindingElement {
                    name,
                    property: None,
                    initializer: None,
                }),
            _ => self
                .lower(n, Some(element))
                .map(|name| NodeKind::BindingElement {
                    name,
                    property: None,
                    initializer: None,
                }),
        };
        if let Some(kind) = kind {
            self.out.set_kind(element, kind);
        }
        self.ids.insert(n.id(), element);
    }

    fn lower_children_of_field(&mut self, n: Node<'t>, field: &str, parent: NodeId) {
        if let Some(child) = n.child_by_field_name(field) {
            self.lower(child, Some(parent));
        }
    }

    fn lower_assignment_pattern(
        &mut self,
        n: Node<'t>,
        element: NodeId,
    ) -> (Option<NodeId>, Option<NodeId>) {
        let name = n
            .child_by_field_name("left")
            .and_then(|l| self.lower(l, Some(element)));
        let initializer = n
            .child_by_field_name("right")
            .and_then(|r| self.lower(r, Some(element)));
        (name, initializer)
    }

    /// `x => ...` and `catch (e)` parameters, which Tree-sitter leaves bare.
    fn lower_bare_parameter(&mut self, n: Node<'t>, owner: Node<'t>, parent: NodeId) {
        let param = self.push(n, Some(parent));
        if let Some(name) = self.lower(n, Some(param)) {
            let type_annotation = if owner.kind() == "catch_clause" {
                self.lower_children_of_field(owner, "type", param);
                self.field(owner, "type")
            } else {
                None
            };
            self.out.set_kind(
                param,
                NodeKind::Parameter {
                    name,
                    type_annotation,
                },
            );
        }
    }

    /// `{...props}` inside a JSX tag. Returns false if `n` is not a spread.
    fn lower_jsx_spread(&mut self, n: Node<'t>, element: NodeId) -> bool {
        let Some(spread) = named_children(n)
            .into_iter()
            .find(|c| c.kind() == "spread_element")
        else {
            return false;
        };
        let id = self.push(n, Some(element));
        if let Some(expression) = named_children(spread)
            .into_iter()
            .find_map(|c| self.lower(c, Some(id)))
        {
            self.out
                .set_kind(id, NodeKind::JsxSpreadAttribute { expression });
        }
        self.ids.insert(n.id(), id);
        true
    }
}

fn span(n: Node<'_>) -> Span {
    Span::new(n.start_byte(), n.end_byte())
}

fn named_children(n: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = n.walk();
    n.named_children(&mut cursor).collect()
}

fn has_token(n: Node<'_>, token: &str) -> bool {
    let mut cursor = n.walk();
    let found = n
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// True if `n` is the `name` field of its parent.
fn is_name_field(n: Node<'_>) -> bool {
    n.parent()
        .and_then(|p| p.child_by_field_name("name"))
        .is_some_and(|c| c.id() == n.id())
}

fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'' | '`')), Some(close)) if open == close => {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}
