//! Quill Syntax - language front end
//!
//! This library provides the Quill language front end:
//! - Lexical analysis and parsing into a position-annotated AST
//! - Canonical statement rendering (printer)
//! - Diagnostics and versioned AST JSON dumps

/// Quill syntax version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod span;
pub mod token;

// Re-export commonly used types
pub use ast::{
    same_shape, same_shape_all, CommentPos, Decorator, Expr, Script, Stmt, VersionedScript,
    AST_VERSION,
};
pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use lexer::Lexer;
pub use parser::Parser;
pub use printer::{print_expr, PrintConfig, Printer};
pub use span::CodePos;
pub use token::{Token, TokenKind};
