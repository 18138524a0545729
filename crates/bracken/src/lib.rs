//! # Bracken
//!
//! The evaluation core of a Less-style CSS preprocessor.
//!
//! Bracken takes a parsed AST of style rules, selectors, mixins and
//! expressions and produces a fully resolved rule tree ready for
//! textual serialization. It owns the hard middle of the compiler:
//! lexical scoping over a frame stack, the parent-selector (`&`)
//! joining algebra, two-pass `:extend` resolution, mixin argument and
//! guard resolution, and the per-scope orchestration that drives
//! imports, eval-first nodes, call expansion, parent folding and media
//! bubbling.
//!
//! ## Architecture
//!
//! - **tree**: the closed AST node union and its CSS serialization
//! - **eval**: per-kind tree-walking evaluation against an [`EvalContext`]
//! - **visit**: post-eval passes (join, visibility, extend, cleanup)
//! - **transform**: the pipeline gluing the above together
//!
//! Parsing, file I/O and leaf-value semantics (color math, unit
//! conversion, URL rewriting) are collaborators behind the same
//! `eval`/`gen_css` contract and live outside this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod eval;
pub mod output;
pub mod registry;
pub mod transform;
pub mod tree;
pub mod visit;

// Re-export main types
pub use context::{EvalContext, Frame, MathMode, Options};
pub use error::{EvalError, Result};
pub use eval::Evaluate;
pub use output::{CssContext, GenCss, Output};
pub use registry::{BuiltinFn, Registry};
pub use transform::{render, transform};

/// Bracken version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
