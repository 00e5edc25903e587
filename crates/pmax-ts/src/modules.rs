//! Module specifier resolution.
//!
//! The same lookup runs against the files loaded into a program
//! ([`ModuleMap`]) and against the file system while dependencies are
//! loaded on demand. Bare specifiers search `node_modules` and `@types`
//! up the directory tree and honour the `types`/`typings` entry of a
//! package's `package.json`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use pmax_core::FileId;
use serde::Deserialize;
use tracing::debug;

/// Suffixes tried, in order, after an extensionless specifier.
const SOURCE_SUFFIXES: &[&str] = &[".ts", ".tsx", ".d.ts", ".mts", ".cts"];

/// Emitted-JavaScript suffixes and the sources they compile from.
const JS_EQUIVALENTS: [(&str, &[&str]); 4] = [
    (".js", &[".ts", ".tsx", ".d.ts"]),
    (".jsx", &[".tsx"]),
    (".mjs", &[".mts", ".d.mts"]),
    (".cjs", &[".cts", ".d.cts"]),
];

/// The `package.json` fields that locate a package's typings.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    types: Option<String>,
    typings: Option<String>,
    main: Option<String>,
}

/// Typings entry of the package in `dir`, relative to `dir`.
///
/// `types` wins over `typings`, which wins over `main`. Missing or
/// malformed manifests yield `None`.
pub(crate) fn read_package_entry(dir: &Path) -> Option<String> {
    let path = dir.join("package.json");
    let text = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<PackageManifest>(&text) {
        Ok(manifest) => manifest.types.or(manifest.typings).or(manifest.main),
        Err(e) => {
            debug!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolves `specifier` as imported from `importer`.
///
/// `file` answers whether a normalized path names a module; `package_entry`
/// returns the normalized typings path of a package directory.
pub(crate) fn resolve_specifier<T>(
    importer: &Path,
    specifier: &str,
    mut file: impl FnMut(&Path) -> Option<T>,
    mut package_entry: impl FnMut(&Path) -> Option<PathBuf>,
) -> Option<T> {
    let dir = importer.parent().unwrap_or_else(|| Path::new(""));
    if is_relative(specifier) {
        return resolve_path(&normalize(&dir.join(specifier)), &mut file);
    }

    for ancestor in dir.ancestors() {
        let modules = ancestor.join("node_modules");
        let packages = [
            modules.join(specifier),
            modules.join("@types").join(types_package_name(specifier)),
        ];
        for package in packages {
            let package = normalize(&package);
            if let Some(entry) = package_entry(&package) {
                if let Some(found) = resolve_path(&entry, &mut file) {
                    return Some(found);
                }
            }
            if let Some(found) = resolve_path(&package, &mut file) {
                return Some(found);
            }
        }
    }
    None
}

fn resolve_path<T>(base: &Path, file: &mut impl FnMut(&Path) -> Option<T>) -> Option<T> {
    if let Some(found) = file(base) {
        return Some(found);
    }

    let name = base.to_string_lossy();
    // `./x.js` written for ESM output refers to `./x.ts`.
    for (js, ts) in JS_EQUIVALENTS {
        if let Some(stem) = name.strip_suffix(js) {
            for ext in ts {
                if let Some(found) = file(Path::new(&format!("{stem}{ext}"))) {
                    return Some(found);
                }
            }
        }
    }

    for suffix in SOURCE_SUFFIXES {
        if let Some(found) = file(Path::new(&format!("{name}{suffix}"))) {
            return Some(found);
        }
    }
    for suffix in SOURCE_SUFFIXES {
        if let Some(found) = file(&base.join(format!("index{suffix}"))) {
            return Some(found);
        }
    }
    None
}

/// Index of loaded files and package typings by normalized path.
#[derive(Debug, Default)]
pub(crate) struct ModuleMap {
    by_path: HashMap<PathBuf, FileId>,
    packages: HashMap<PathBuf, PathBuf>,
}

impl ModuleMap {
    pub(crate) fn insert(&mut self, path: &Path, file: FileId) {
        self.by_path.insert(normalize(path), file);
    }

    /// Records the typings `entry` of the package in `dir`.
    pub(crate) fn insert_package(&mut self, dir: &Path, entry: &str) {
        self.packages
            .insert(normalize(dir), normalize(&dir.join(entry)));
    }

    /// Resolves `specifier` as imported from `importer`.
    pub(crate) fn resolve(&self, importer: &Path, specifier: &str) -> Option<FileId> {
        resolve_specifier(
            importer,
            specifier,
            |path| self.by_path.get(path).copied(),
            |dir| self.packages.get(dir).cloned(),
        )
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

/// `@scope/pkg` -> `scope__pkg`, the DefinitelyTyped naming scheme.
fn types_package_name(specifier: &str) -> String {
    specifier
        .strip_prefix('@')
        .map_or_else(|| specifier.to_string(), |s| s.replacen('/', "__", 1))
}

/// Lexically removes `.` and `..` components.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
