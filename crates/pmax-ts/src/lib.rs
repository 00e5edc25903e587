//! # pmax-ts
//!
//! Tree-sitter based TypeScript program model for pmax-lint.
//!
//! Parses `.ts`/`.tsx` sources, lowers them into the `pmax-core` syntax
//! arena and binds declarations across files so that rules can resolve
//! references to symbols and read their documentation. It provides:
//!
//! - [`TsProgram`], the [`pmax_core::ProgramModel`] implementation
//! - [`TsProgramBuilder`] for assembling programs from in-memory sources
//! - [`Dialect`] for picking the TypeScript or TSX grammar per file

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binder;
mod checker;
mod docs;
mod lower;
mod modules;
mod parser;
mod program;

pub use parser::Dialect;
pub use program::{TsProgram, TsProgramBuilder, TsProgramError};
