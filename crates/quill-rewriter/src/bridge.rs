//! Default collaborator adapters backed by `quill-syntax`

use async_trait::async_trait;
use quill_syntax::ast::{CommentPos, Stmt};
use quill_syntax::diagnostic::DiagnosticLevel;
use quill_syntax::parser::Parser;
use quill_syntax::printer::{PrintConfig, Printer};

use crate::error::ParseError;
use crate::planner::{NodePrinter, PrintContext, SourceParser};

/// The Quill parser behind the [`SourceParser`] seam
#[derive(Debug, Clone, Copy, Default)]
pub struct QuillParser;

#[async_trait]
impl SourceParser for QuillParser {
    async fn parse(&self, source: &str) -> Result<Vec<Stmt>, ParseError> {
        let (script, diagnostics) = Parser::new(source).parse();
        if diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
        {
            return Err(ParseError { diagnostics });
        }
        Ok(script.statements)
    }
}

/// The Quill canonical printer behind the [`NodePrinter`] seam
#[derive(Debug, Clone, Default)]
pub struct QuillPrinter {
    printer: Printer,
}

impl QuillPrinter {
    pub fn new(config: PrintConfig) -> Self {
        Self {
            printer: Printer::new(config),
        }
    }
}

impl NodePrinter for QuillPrinter {
    fn print_node(&self, node: &Stmt, ctx: &PrintContext<'_>) -> Option<String> {
        self.printer.print_stmt(node, ctx.indent_level)
    }

    fn print_comment(&self, comment: &CommentPos, indent_level: usize) -> String {
        self.printer.print_comment(comment, indent_level)
    }
}
