//! The TypeScript [`ProgramModel`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use pmax_core::source::is_external_path;
use pmax_core::syntax::SyntaxTree;
use pmax_core::{
    DeclarationRef, DocTag, FileId, ModelError, NodeId, NodeKind, ProgramModel, SourceUnit,
    Symbol, SymbolId,
};
use tracing::{debug, warn};

use crate::binder::{self, Bindings};
use crate::checker::Checker;
use crate::docs;
use crate::lower::lower;
use crate::modules::{self, normalize, ModuleMap};
use crate::parser::{parse, Dialect};

/// Errors raised while building a program.
#[derive(Debug, thiserror::Error)]
pub enum TsProgramError {
    /// A source file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The Tree-sitter grammar could not be loaded.
    #[error("Failed to load {dialect} grammar: {message}")]
    Language {
        /// Dialect whose grammar failed.
        dialect: &'static str,
        /// Parser error message.
        message: String,
    },

    /// Tree-sitter returned no tree.
    #[error("Failed to parse {path}")]
    Parse {
        /// File path.
        path: PathBuf,
    },
}

/// A parsed and bound set of TypeScript files.
///
/// Every file the program should see, including `.d.ts` files and
/// `node_modules` sources, must be added; imports of files outside the
/// program resolve to nothing.
#[derive(Debug)]
pub struct TsProgram {
    units: Vec<SourceUnit>,
    bindings: Bindings,
}

impl TsProgram {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> TsProgramBuilder {
        TsProgramBuilder::default()
    }

    /// Reads, parses and binds the given files.
    ///
    /// Files inside `node_modules` reached by an import, directly or through
    /// other dependency files, are loaded as well so that references into
    /// packages resolve. They are never scanned by rules.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file cannot be read, or any loaded file
    /// cannot be parsed.
    pub fn load<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self, TsProgramError> {
        let mut loader = Loader::default();
        for path in paths {
            loader.enqueue(path.as_ref().to_path_buf(), true);
        }
        loader.run()
    }

    fn checker(&self) -> Checker<'_> {
        Checker::new(&self.units, &self.bindings)
    }
}

impl ProgramModel for TsProgram {
    fn source_units(&self) -> &[SourceUnit] {
        &self.units
    }

    fn resolve_symbol(&self, file: FileId, node: NodeId) -> Option<SymbolId> {
        self.checker().resolve(file, node)
    }

    fn immediate_alias_target(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.checker().immediate_target(symbol)
    }

    fn symbol(&self, symbol: SymbolId) -> Option<&Symbol> {
        self.bindings.entry(symbol).map(|e| &e.symbol)
    }

    fn documentation_tags(&self, symbol: SymbolId) -> Result<Vec<DocTag>, ModelError> {
        let entry = self
            .bindings
            .entry(symbol)
            .ok_or(ModelError::UnknownSymbol(symbol))?;
        let mut tags = Vec::new();
        for declaration in &entry.symbol.declarations {
            let unit = self.source_unit(declaration.file).ok_or_else(|| {
                ModelError::MalformedDeclaration {
                    file: declaration.file,
                    node: declaration.node,
                    message: "declaration file is not part of the program".to_string(),
                }
            })?;
            tags.extend(docs::declaration_tags(unit, declaration.node));
        }
        Ok(tags)
    }

    fn has_legacy_deprecated_flag(&self, declaration: DeclarationRef) -> bool {
        self.source_unit(declaration.file)
            .is_some_and(|unit| docs::has_legacy_flag(unit, declaration))
    }

    fn jsx_attribute_property(&self, file: FileId, attribute: NodeId) -> Option<SymbolId> {
        self.checker().jsx_attribute_property(file, attribute)
    }

    fn jsx_props_from_signatures(&self, file: FileId, tag: NodeId, name: &str) -> Option<SymbolId> {
        self.checker().jsx_props_from_signatures(file, tag, name)
    }
}

/// Builder for [`TsProgram`].
#[derive(Debug, Default)]
pub struct TsProgramBuilder {
    files: Vec<(PathBuf, String)>,
}

impl TsProgramBuilder {
    /// Adds a file with its source text.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.push((path.into(), text.into()));
        self
    }

    /// Parses and binds all added files.
    ///
    /// Files whose extension is not recognised are parsed as plain
    /// TypeScript.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or a parse fails.
    pub fn build(self) -> Result<TsProgram, TsProgramError> {
        let mut units = Vec::with_capacity(self.files.len());
        let mut modules = ModuleMap::default();

        for (index, (path, text)) in self.files.into_iter().enumerate() {
            let unit = parse_unit(FileId::new(index), path, text)?;
            modules.insert(&unit.path, unit.id);
            units.push(unit);
        }

        Ok(TsProgram::bind(units, &modules))
    }
}

impl TsProgram {
    fn bind(units: Vec<SourceUnit>, modules: &ModuleMap) -> Self {
        let bindings = binder::bind(&units, modules);
        debug!("Bound {} source files", units.len());
        Self { units, bindings }
    }
}

/// Parses and lowers one file. Unknown extensions parse as TypeScript.
fn parse_unit(id: FileId, path: PathBuf, text: String) -> Result<SourceUnit, TsProgramError> {
    let dialect = Dialect::for_path(&path).unwrap_or(Dialect::TypeScript);
    let parsed = parse(&path, &text, dialect)?;
    if parsed.root_node().has_error() {
        warn!("Syntax errors in {}, continuing with recovered tree", path.display());
    }
    let tree = lower(&text, &parsed);
    Ok(SourceUnit::new(id, path, text, tree))
}

/// Module specifiers of the imports and re-exports in a file.
fn module_specifiers(tree: &SyntaxTree) -> Vec<&str> {
    tree.node_ids()
        .filter_map(|id| match tree.kind(id)? {
            NodeKind::ImportDeclaration { module }
            | NodeKind::ExportDeclaration {
                module: Some(module),
                ..
            } => Some(module.as_str()),
            _ => None,
        })
        .collect()
}

/// Work list for [`TsProgram::load`].
#[derive(Debug, Default)]
struct Loader {
    units: Vec<SourceUnit>,
    modules: ModuleMap,
    /// Files to read; `true` for files the caller asked for.
    queue: VecDeque<(PathBuf, bool)>,
    queued: HashSet<PathBuf>,
    /// Package directory -> typings entry, as read from `package.json`.
    packages: HashMap<PathBuf, Option<String>>,
}

impl Loader {
    fn enqueue(&mut self, path: PathBuf, requested: bool) {
        if self.queued.insert(normalize(&path)) {
            self.queue.push_back((path, requested));
        }
    }

    fn run(mut self) -> Result<TsProgram, TsProgramError> {
        while let Some((path, requested)) = self.queue.pop_front() {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(source) if requested => return Err(TsProgramError::Io { path, source }),
                Err(e) => {
                    warn!("Skipping dependency {}: {}", path.display(), e);
                    continue;
                }
            };
            let unit = parse_unit(FileId::new(self.units.len()), path, text)?;

            let dependencies: Vec<PathBuf> = module_specifiers(&unit.tree)
                .into_iter()
                .filter_map(|specifier| self.locate_dependency(&unit.path, specifier))
                .collect();
            for dependency in dependencies {
                debug!("Loading dependency {}", dependency.display());
                self.enqueue(dependency, false);
            }

            self.modules.insert(&unit.path, unit.id);
            self.units.push(unit);
        }

        for (dir, entry) in &self.packages {
            if let Some(entry) = entry {
                self.modules.insert_package(dir, entry);
            }
        }
        Ok(TsProgram::bind(self.units, &self.modules))
    }

    /// File inside `node_modules` that `specifier` names on disk.
    fn locate_dependency(&mut self, importer: &Path, specifier: &str) -> Option<PathBuf> {
        let packages = &mut self.packages;
        let found = modules::resolve_specifier(
            importer,
            specifier,
            |path| path.is_file().then(|| path.to_path_buf()),
            |dir| {
                packages
                    .entry(dir.to_path_buf())
                    .or_insert_with(|| modules::read_package_entry(dir))
                    .as_deref()
                    .map(|entry| normalize(&dir.join(entry)))
            },
        )?;
        is_external_path(&found).then_some(found)
    }
}
