//! Program model abstraction.
//!
//! A program model is a compiled, bound view of a source tree: syntax trees
//! per file plus a resolver from reference nodes to declaration symbols.
//! Rules depend on [`ProgramModel`] only; concrete models live in their own
//! crates (see `pmax-ts`).

use crate::jsdoc::DocTag;
use crate::source::{FileId, SourceUnit};
use crate::syntax::NodeId;

/// Handle of a symbol inside a program model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Creates a symbol id from a table index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Returns the table index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node that declares a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclarationRef {
    /// File containing the declaration.
    pub file: FileId,
    /// Declaration node.
    pub node: NodeId,
}

/// The thing a reference points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Display name.
    pub name: String,
    /// Declaring nodes; the first one is the primary declaration.
    pub declarations: Vec<DeclarationRef>,
    /// True for import/export aliases that re-point to another symbol.
    pub is_alias: bool,
}

impl Symbol {
    /// Creates a symbol with a single declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, declaration: DeclarationRef) -> Self {
        Self {
            name: name.into(),
            declarations: vec![declaration],
            is_alias: false,
        }
    }

    /// Marks the symbol as an alias.
    #[must_use]
    pub fn alias(mut self) -> Self {
        self.is_alias = true;
        self
    }

    /// Returns the primary declaration.
    #[must_use]
    pub fn primary_declaration(&self) -> Option<DeclarationRef> {
        self.declarations.first().copied()
    }
}

/// Errors a program model may report from metadata lookups.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The symbol id does not belong to this model.
    #[error("Unknown symbol {0:?}")]
    UnknownSymbol(SymbolId),

    /// A declaration could not be interpreted.
    #[error("Malformed declaration in {file:?} at node {node:?}: {message}")]
    MalformedDeclaration {
        /// File of the declaration.
        file: FileId,
        /// Declaration node.
        node: NodeId,
        /// What went wrong.
        message: String,
    },
}

/// Compiled program consumed by rules.
///
/// Unit ids must equal their index in [`ProgramModel::source_units`].
pub trait ProgramModel {
    /// All units of the program, including external and declaration-only ones.
    fn source_units(&self) -> &[SourceUnit];

    /// Looks up a unit by id.
    fn source_unit(&self, file: FileId) -> Option<&SourceUnit> {
        self.source_units().get(file.index())
    }

    /// Resolves a reference node to the symbol it names.
    fn resolve_symbol(&self, file: FileId, node: NodeId) -> Option<SymbolId>;

    /// Follows an alias exactly one hop.
    fn immediate_alias_target(&self, symbol: SymbolId) -> Option<SymbolId>;

    /// Returns symbol data.
    fn symbol(&self, symbol: SymbolId) -> Option<&Symbol>;

    /// Documentation tags of all declarations of a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error when a declaration cannot be interpreted.
    fn documentation_tags(&self, symbol: SymbolId) -> Result<Vec<DocTag>, ModelError>;

    /// Legacy "deprecated" marker on a declaration, independent of JSDoc tags.
    fn has_legacy_deprecated_flag(&self, declaration: DeclarationRef) -> bool;

    /// Property of the contextual attributes type of a JSX attribute.
    fn jsx_attribute_property(&self, _file: FileId, _attribute: NodeId) -> Option<SymbolId> {
        None
    }

    /// Property `name` of the props type inferred from a JSX tag's
    /// call or construct signatures.
    fn jsx_props_from_signatures(
        &self,
        _file: FileId,
        _tag: NodeId,
        _name: &str,
    ) -> Option<SymbolId> {
        None
    }

    /// Whether the model carries enough type information for semantic rules.
    fn supports_type_checking(&self) -> bool {
        true
    }
}
