//! Language-neutral syntax tree consumed by rules.
//!
//! Program models lower their parser output into this arena. Node kinds form
//! a closed set so rules can dispatch with a single exhaustive `match`.
//! Variant fields always reference direct children of the node.

/// Index of a node inside a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: Self = Self(0);

    /// Returns the arena index of this node.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Byte range of a node or comment in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true for zero-length spans.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Slices `text` with this span, returning `""` when out of range.
    #[must_use]
    pub fn slice(self, text: &str) -> &str {
        text.get(self.start..self.end).unwrap_or("")
    }
}

/// Declaration modifiers that matter to binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// `export` keyword present.
    pub export: bool,
    /// `export default`.
    pub default: bool,
    /// `static` class member.
    pub is_static: bool,
    /// `declare` ambient declaration.
    pub ambient: bool,
}

/// Which heritage keyword introduced a base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeritageKind {
    /// `extends`
    Extends,
    /// `implements`
    Implements,
}

/// How a variable-like binding was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `var`, hoisted to the enclosing function.
    Var,
    /// `let`
    Let,
    /// `const`
    Const,
}

/// Closed set of syntax node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a file.
    SourceFile,
    /// Any identifier, including property and type names.
    Identifier {
        /// Identifier text.
        text: String,
    },
    /// String literal with quotes removed.
    StringLiteral {
        /// Unquoted value.
        value: String,
    },
    /// `this`
    This,
    /// `object.name`
    PropertyAccess {
        /// Accessed expression.
        object: NodeId,
        /// Member name identifier.
        name: NodeId,
    },
    /// `object[argument]`
    ElementAccess {
        /// Accessed expression.
        object: NodeId,
        /// Index expression.
        argument: Option<NodeId>,
    },
    /// `callee(...)`
    Call {
        /// Called expression.
        callee: NodeId,
    },
    /// `new callee(...)`
    New {
        /// Constructed expression.
        callee: NodeId,
    },
    /// `{ ... }` object literal.
    ObjectLiteral,
    /// `name: value` inside an object literal.
    PropertyAssignment {
        /// Key identifier or literal.
        name: NodeId,
        /// Value expression.
        initializer: Option<NodeId>,
    },
    /// `{ name }` inside an object literal.
    ShorthandPropertyAssignment {
        /// Identifier that is both key and referenced value.
        name: NodeId,
    },
    /// `import ... from "module"`.
    ImportDeclaration {
        /// Module specifier text.
        module: String,
    },
    /// Bindings part of an import declaration.
    ImportClause {
        /// Local name of the default import.
        default_name: Option<NodeId>,
    },
    /// `* as name`
    NamespaceImport {
        /// Local namespace name.
        name: NodeId,
    },
    /// `name` or `name as alias` inside `import { ... }`.
    ImportSpecifier {
        /// Imported (exported-side) name.
        name: NodeId,
        /// Local alias.
        alias: Option<NodeId>,
    },
    /// `export { ... } [from "m"]` or `export * [as ns] from "m"`.
    ExportDeclaration {
        /// Module specifier of a re-export.
        module: Option<String>,
        /// True for `export * from`.
        star: bool,
    },
    /// `name` or `name as alias` inside `export { ... }`.
    ExportSpecifier {
        /// Local (or re-exported) name.
        name: NodeId,
        /// Exported alias.
        alias: Option<NodeId>,
    },
    /// `export default expr` or `export = expr`.
    ExportAssignment {
        /// Exported expression.
        expression: NodeId,
    },
    /// A reference to a named type.
    TypeReference {
        /// Identifier or qualified name.
        name: NodeId,
    },
    /// `Left.Right` in type position.
    QualifiedName {
        /// Qualifier.
        left: NodeId,
        /// Member name identifier.
        right: NodeId,
    },
    /// `{ a: T }` object type.
    TypeLiteral,
    /// Opening or self-closing JSX element.
    JsxElement {
        /// Tag name expression.
        tag: NodeId,
        /// True for `<Tag />`.
        self_closing: bool,
    },
    /// `</Tag>`
    JsxClosingElement {
        /// Tag name expression.
        tag: NodeId,
    },
    /// `name="value"`
    JsxAttribute {
        /// Attribute name identifier.
        name: NodeId,
    },
    /// `{...expression}`
    JsxSpreadAttribute {
        /// Spread expression.
        expression: NodeId,
    },
    /// `function name() {}` including overload signatures.
    FunctionDeclaration {
        /// Function name.
        name: Option<NodeId>,
    },
    /// `function () {}` in expression position.
    FunctionExpression {
        /// Optional own name.
        name: Option<NodeId>,
    },
    /// `() => {}`
    ArrowFunction,
    /// Class or object-literal method.
    MethodDeclaration {
        /// Method name.
        name: NodeId,
    },
    /// Class constructor.
    Constructor,
    /// Function parameter.
    Parameter {
        /// Identifier or binding pattern.
        name: NodeId,
        /// Annotated type.
        type_annotation: Option<NodeId>,
    },
    /// Class declaration or expression.
    ClassDeclaration {
        /// Class name.
        name: Option<NodeId>,
    },
    /// One `extends X<T>` / `implements X` entry.
    Heritage {
        /// Keyword kind.
        kind: HeritageKind,
        /// Base expression or type.
        expression: NodeId,
    },
    /// `interface Name { ... }`
    InterfaceDeclaration {
        /// Interface name.
        name: NodeId,
    },
    /// `type Name = ...`
    TypeAliasDeclaration {
        /// Alias name.
        name: NodeId,
        /// Aliased type.
        value: Option<NodeId>,
    },
    /// `enum Name { ... }`
    EnumDeclaration {
        /// Enum name.
        name: NodeId,
    },
    /// Enum member.
    EnumMember {
        /// Member name.
        name: NodeId,
    },
    /// `namespace Name { ... }`
    ModuleDeclaration {
        /// Namespace name.
        name: NodeId,
    },
    /// Class field.
    PropertyDeclaration {
        /// Field name.
        name: NodeId,
        /// Annotated type.
        type_annotation: Option<NodeId>,
        /// Initializer expression.
        initializer: Option<NodeId>,
    },
    /// Interface or type-literal property.
    PropertySignature {
        /// Property name.
        name: NodeId,
        /// Annotated type.
        type_annotation: Option<NodeId>,
    },
    /// Interface or type-literal method.
    MethodSignature {
        /// Method name.
        name: NodeId,
    },
    /// `let`/`const`/`var` statement.
    VariableStatement {
        /// Declaration keyword.
        binding: BindingKind,
    },
    /// One declarator of a variable statement.
    VariableDeclaration {
        /// Identifier or binding pattern.
        name: NodeId,
        /// Annotated type.
        type_annotation: Option<NodeId>,
        /// Initializer expression.
        initializer: Option<NodeId>,
    },
    /// Object or array destructuring pattern.
    BindingPattern,
    /// One element of a destructuring pattern.
    BindingElement {
        /// Bound identifier or nested pattern.
        name: NodeId,
        /// Property key for `{ key: name }`.
        property: Option<NodeId>,
        /// Default value.
        initializer: Option<NodeId>,
    },
    /// `{ ... }` statement block or class static block.
    Block,
    /// `for (...)` statement with its own scope.
    ForStatement,
    /// `catch (e) { ... }`
    CatchClause,
    /// Anything the rules do not distinguish.
    Other {
        /// Parser-specific kind name, for debugging.
        kind: &'static str,
    },
}

impl NodeKind {
    /// Returns true for function-like declarations that own a body.
    #[must_use]
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration { .. }
                | Self::FunctionExpression { .. }
                | Self::ArrowFunction
                | Self::MethodDeclaration { .. }
                | Self::Constructor
        )
    }

    /// Returns the declared name node for named declarations.
    #[must_use]
    pub fn declaration_name(&self) -> Option<NodeId> {
        match self {
            Self::FunctionDeclaration { name }
            | Self::FunctionExpression { name }
            | Self::ClassDeclaration { name } => *name,
            Self::MethodDeclaration { name }
            | Self::InterfaceDeclaration { name }
            | Self::TypeAliasDeclaration { name, .. }
            | Self::EnumDeclaration { name }
            | Self::EnumMember { name }
            | Self::ModuleDeclaration { name }
            | Self::PropertyDeclaration { name, .. }
            | Self::PropertySignature { name, .. }
            | Self::MethodSignature { name }
            | Self::PropertyAssignment { name, .. }
            | Self::VariableDeclaration { name, .. }
            | Self::Parameter { name, .. }
            | Self::NamespaceImport { name } => Some(*name),
            _ => None,
        }
    }
}

/// Comment syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...`
    Line,
    /// `/* ... */`, including JSDoc.
    Block,
}

/// A comment in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    /// Byte range including the delimiters.
    pub span: Span,
    /// Line or block.
    pub kind: CommentKind,
}

impl Comment {
    /// Returns true for `/** ... */` documentation comments.
    #[must_use]
    pub fn is_jsdoc(&self, text: &str) -> bool {
        let body = self.span.slice(text);
        self.kind == CommentKind::Block && body.starts_with("/**") && body != "/**/"
    }
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Node kind with structural links.
    pub kind: NodeKind,
    /// Source range.
    pub span: Span,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Children in source order.
    pub children: Vec<NodeId>,
    /// Declaration modifiers.
    pub modifiers: Modifiers,
}

/// Control returned by [`SyntaxTree::walk`] callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Visit children.
    Continue,
    /// Do not descend into this node's children.
    SkipChildren,
}

/// Arena-allocated syntax tree of one file.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    comments: Vec<Comment>,
}

impl SyntaxTree {
    /// Returns the root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    /// Returns the span of a node, or an empty span for unknown ids.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).map(|n| n.span).unwrap_or_default()
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Returns the children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Returns the modifiers of a node.
    #[must_use]
    pub fn modifiers(&self, id: NodeId) -> Modifiers {
        self.get(id).map(|n| n.modifiers).unwrap_or_default()
    }

    /// Returns the text of an identifier or string literal node.
    #[must_use]
    pub fn name_text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Identifier { text } => Some(text),
            NodeKind::StringLiteral { value } => Some(value),
            _ => None,
        }
    }

    /// Iterates over the ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// All comments in source order.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Iterates over all node ids in allocation (pre-)order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).filter_map(|i| u32::try_from(i).ok().map(NodeId))
    }

    /// Walks the subtree under `start` in pre-order.
    ///
    /// The callback decides per node whether its children are visited.
    pub fn walk<F>(&self, start: NodeId, mut visit: F)
    where
        F: FnMut(NodeId, &Node) -> WalkControl,
    {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if visit(id, node) == WalkControl::Continue {
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }
}

/// Incrementally builds a [`SyntaxTree`].
///
/// The first pushed node becomes the root.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: SyntaxTree,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node as the last child of `parent`.
    pub fn push(&mut self, kind: NodeKind, span: Span, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.tree.nodes.len()).unwrap_or(u32::MAX));
        self.tree.nodes.push(Node {
            kind,
            span,
            parent,
            children: Vec::new(),
            modifiers: Modifiers::default(),
        });
        if let Some(parent) = parent.and_then(|p| self.tree.nodes.get_mut(p.index())) {
            parent.children.push(id);
        }
        id
    }

    /// Replaces the kind of an already pushed node.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        if let Some(node) = self.tree.nodes.get_mut(id.index()) {
            node.kind = kind;
        }
    }

    /// Replaces the span of an already pushed node.
    pub fn set_span(&mut self, id: NodeId, span: Span) {
        if let Some(node) = self.tree.nodes.get_mut(id.index()) {
            node.span = span;
        }
    }

    /// Sets the modifiers of an already pushed node.
    pub fn set_modifiers(&mut self, id: NodeId, modifiers: Modifiers) {
        if let Some(node) = self.tree.nodes.get_mut(id.index()) {
            node.modifiers = modifiers;
        }
    }

    /// Returns a node pushed earlier.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }

    /// Records a comment.
    pub fn comment(&mut self, span: Span, kind: CommentKind) {
        self.tree.comments.push(Comment { span, kind });
    }

    /// Finishes the tree, sorting comments by position.
    #[must_use]
    pub fn finish(mut self) -> SyntaxTree {
        self.tree.comments.sort_by_key(|c| c.span.start);
        self.tree.comments.dedup();
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(b: &mut TreeBuilder, text: &str, span: Span, parent: NodeId) -> NodeId {
        b.push(
            NodeKind::Identifier {
                text: text.to_string(),
            },
            span,
            Some(parent),
        )
    }

    #[test]
    fn builder_links_parents_and_children() {
        let mut b = TreeBuilder::new();
        let root = b.push(NodeKind::SourceFile, Span::new(0, 3), None);
        let call = b.push(NodeKind::Other { kind: "call" }, Span::new(0, 3), Some(root));
        let callee = ident(&mut b, "f", Span::new(0, 1), call);
        b.set_kind(call, NodeKind::Call { callee });
        let tree = b.finish();

        assert_eq!(tree.root(), root);
        assert_eq!(tree.children(root), &[call]);
        assert_eq!(tree.parent(callee), Some(call));
        assert_eq!(tree.kind(call), Some(&NodeKind::Call { callee }));
        assert_eq!(tree.name_text(callee), Some("f"));
        assert_eq!(tree.ancestors(callee).collect::<Vec<_>>(), vec![call, root]);
    }

    #[test]
    fn walk_is_preorder_and_respects_skip() {
        let mut b = TreeBuilder::new();
        let root = b.push(NodeKind::SourceFile, Span::new(0, 10), None);
        let arrow = b.push(NodeKind::ArrowFunction, Span::new(0, 5), Some(root));
        ident(&mut b, "hidden", Span::new(1, 2), arrow);
        let visible = ident(&mut b, "visible", Span::new(6, 7), root);
        let tree = b.finish();

        let mut seen = Vec::new();
        tree.walk(tree.root(), |id, node| {
            seen.push(id);
            if node.kind.is_function_like() {
                WalkControl::SkipChildren
            } else {
                WalkControl::Continue
            }
        });
        assert_eq!(seen, vec![root, arrow, visible]);
    }

    #[test]
    fn comments_are_sorted_and_jsdoc_detected() {
        let text = "/** doc */ // line\n/**/";
        let mut b = TreeBuilder::new();
        b.push(NodeKind::SourceFile, Span::new(0, text.len()), None);
        b.comment(Span::new(11, 18), CommentKind::Line);
        b.comment(Span::new(0, 10), CommentKind::Block);
        b.comment(Span::new(19, 23), CommentKind::Block);
        let tree = b.finish();

        let comments = tree.comments();
        assert_eq!(comments[0].span.start, 0);
        assert!(comments[0].is_jsdoc(text));
        assert!(!comments[1].is_jsdoc(text));
        assert!(!comments[2].is_jsdoc(text));
    }
}
