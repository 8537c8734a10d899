//! Rewriter errors
//!
//! The only raised failures originate in the source parser; everything
//! else in the engine is resolved by policy. A node with a missing span is
//! skipped, and overlapping patch ranges are a warning unless the caller
//! opted into strict mode.

use quill_syntax::diagnostic::Diagnostic;
use thiserror::Error;

/// The original source failed to parse
#[derive(Debug, Clone, Error)]
#[error("source failed to parse ({} diagnostic(s))", diagnostics.len())]
pub struct ParseError {
    pub diagnostics: Vec<Diagnostic>,
}

/// Top-level reconstruction error
#[derive(Debug, Clone, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Strict mode only: computed patch ranges overlap
    #[error("overlapping patch ranges: {}", .0.join("; "))]
    OverlappingPatches(Vec<String>),
}
