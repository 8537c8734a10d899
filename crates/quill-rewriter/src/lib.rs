//! Quill Rewriter - format-preserving source reconstruction
//!
//! Given the original source text and an AST derived from (and possibly
//! edited relative to) that text, produce updated source reflecting the
//! AST's current shape while keeping every byte of original formatting
//! for the parts that did not change: indentation, comment placement,
//! blank-line runs, trailing-newline presence.
//!
//! Pipeline: [`PatchPlanner`] diffs the modified AST against a fresh
//! reparse of the original (awaiting the [`SourceParser`] seam), emits a
//! [`Patch`] list, and [`applier::apply`] splices the patches in
//! descending-offset order.

/// Quill rewriter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod applier;
pub mod bridge;
pub mod comments;
pub mod error;
pub mod line_index;
pub mod planner;

pub use applier::{apply, validate_patches};
pub use bridge::{QuillParser, QuillPrinter};
pub use comments::CommentLayout;
pub use error::{ParseError, RewriteError};
pub use line_index::LineIndex;
pub use planner::{NodePrinter, Patch, PatchPlanner, PrintContext, SourceParser};

use quill_syntax::ast::Stmt;

/// Reconfigurable reconstruction entry point.
///
/// Defaults to the Quill parser and printer adapters, warn-only overlap
/// handling, and one planner per call.
pub struct Rewriter {
    parser: Box<dyn SourceParser>,
    printer: Box<dyn NodePrinter>,
    strict: bool,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Rewriter {
    pub fn new() -> Self {
        Self {
            parser: Box::new(QuillParser),
            printer: Box::new(QuillPrinter::default()),
            strict: false,
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_printer(mut self, printer: Box<dyn NodePrinter>) -> Self {
        self.printer = printer;
        self
    }

    /// Fail on overlapping patch ranges instead of warning
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reconstruct source text for a modified AST
    pub async fn reconstruct(&self, source: &str, modified: &[Stmt]) -> Result<String, RewriteError> {
        let mut planner = PatchPlanner::new(source, self.parser.as_ref(), self.printer.as_ref());
        let patches = planner.plan_patches(modified).await?;
        if self.strict {
            let warnings = validate_patches(&patches);
            if !warnings.is_empty() {
                return Err(RewriteError::OverlappingPatches(warnings));
            }
        }
        Ok(apply(source, &patches))
    }
}

/// Reconstruct source text for a modified AST with the default adapters
pub async fn reconstruct(source: &str, modified: &[Stmt]) -> Result<String, RewriteError> {
    Rewriter::new().reconstruct(source, modified).await
}

/// Parse, reconstruct with the unmodified AST, and compare: true when
/// the source round-trips byte-for-byte
pub async fn check_reconstructible(source: &str) -> Result<bool, RewriteError> {
    let modified = QuillParser.parse(source).await?;
    Ok(reconstruct(source, &modified).await? == source)
}

/// Remove every comment from the source while leaving code bytes and
/// line structure untouched.
///
/// Pure text transformation: a whole-line comment becomes an empty line,
/// an inline comment is cut together with the whitespace separating it
/// from the code. A `#` inside a string literal is not a comment.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let (text, newline) = match line.strip_suffix('\n') {
            Some(text) => (text, "\n"),
            None => (line, ""),
        };
        match planner::comment_start_in_line(text) {
            Some(idx) => {
                out.push_str(text[..idx].trim_end());
                out.push_str(newline);
            }
            None => out.push_str(line),
        }
    }
    out
}
