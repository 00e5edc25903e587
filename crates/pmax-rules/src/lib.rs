//! # pmax-rules
//!
//! Built-in lint rules for pmax.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | PMAX001 | `no-deprecated` | Forbids usages of `@deprecated` declarations |
//! | PMAX002 | `no-deprecated` | Reports suppression directives that suppress nothing |
//!
//! ## Usage
//!
//! ```ignore
//! use pmax_core::Analyzer;
//! use pmax_rules::NoDeprecated;
//!
//! let analyzer = Analyzer::builder()
//!     .rule(NoDeprecated::new())
//!     .build()?;
//! let result = analyzer.analyze(&program);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod no_deprecated;
mod presets;

pub use no_deprecated::{DedupeMode, NoDeprecated, NoDeprecatedOptions, ObsolescenceInfo};
pub use presets::{all_rules, recommended_rules, Preset};

/// Re-export core types for convenience.
pub use pmax_core::{Diagnostic, ProgramRule, Severity};
