//! # pmax-core
//!
//! Core framework for semantic lint rules over compiled TypeScript programs.
//!
//! This crate provides the foundational traits and types for building
//! program-wide linters. It includes:
//!
//! - [`ProgramModel`] trait abstracting a bound, type-aware source tree
//! - [`SyntaxTree`] and the closed [`NodeKind`] set that rules match on
//! - [`ProgramRule`] trait for whole-program rules
//! - [`Analyzer`] for orchestrating lint execution
//! - [`Diagnostic`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use pmax_core::{Analyzer, Config};
//!
//! let analyzer = Analyzer::builder()
//!     .rule(MyRule::new())
//!     .config(Config::default())
//!     .build()?;
//!
//! let result = analyzer.analyze(&program);
//! for diagnostic in &result.diagnostics {
//!     println!("{diagnostic}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod rule;
mod types;

pub mod comments;
pub mod jsdoc;
pub mod program;
pub mod source;
pub mod syntax;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use context::ProgramContext;
pub use jsdoc::DocTag;
pub use program::{DeclarationRef, ModelError, ProgramModel, Symbol, SymbolId};
pub use rule::{ProgramRule, ProgramRuleBox};
pub use source::{FileId, LineCol, LineIndex, Position, SourceUnit};
pub use syntax::{NodeId, NodeKind, Span, SyntaxTree, WalkControl};
pub use types::{Diagnostic, LintResult, Location, Severity};
