//! Canonical statement rendering
//!
//! The printer turns one AST node into standalone formatted text. It is
//! pure: it never sees the original source bytes, so its output is the
//! canonical form (the rewriter decides when canonical text replaces
//! original bytes and re-applies original indentation).
//!
//! Statement-level output ends with exactly one newline. A node's own
//! leading comments are not printed (the rewriter patches those as a
//! separate block) but its inline comment is; nested children print in
//! full, including their comments and attributed blank lines, because a
//! regenerated parent is the only patch covering them.

use crate::ast::*;
use serde::{Deserialize, Serialize};

/// Printer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintConfig {
    /// Number of spaces per indentation level (default: 4)
    pub indent_size: usize,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self { indent_size: 4 }
    }
}

impl PrintConfig {
    /// Create config with custom indent size
    pub fn with_indent_size(mut self, size: usize) -> Self {
        self.indent_size = size;
        self
    }
}

/// The canonical Quill renderer
#[derive(Debug, Clone, Default)]
pub struct Printer {
    config: PrintConfig,
}

impl Printer {
    pub fn new(config: PrintConfig) -> Self {
        Self { config }
    }

    /// Render one statement at the given indent level.
    ///
    /// The node's own leading comments are omitted; its inline comment and
    /// everything inside it (children, their comments, their blank lines)
    /// is included. Output ends with one newline.
    pub fn print_stmt(&self, stmt: &Stmt, indent_level: usize) -> Option<String> {
        let mut out = String::new();
        self.write_stmt(&mut out, stmt, indent_level, false);
        Some(out)
    }

    /// Render a single comment at the given indent level (no newline)
    pub fn print_comment(&self, comment: &CommentPos, indent_level: usize) -> String {
        format!("{}{}", self.indent(indent_level), comment.text)
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.config.indent_size)
    }

    fn write_stmt(&self, out: &mut String, stmt: &Stmt, level: usize, with_leading: bool) {
        if with_leading {
            for comment in leading_comments(stmt) {
                out.push_str(&self.print_comment(comment, level));
                out.push('\n');
            }
        }

        match stmt {
            Stmt::Command(s) => {
                out.push_str(&self.indent(level));
                out.push_str(&s.name);
                for arg in &s.args {
                    out.push(' ');
                    out.push_str(&print_expr(arg));
                }
                self.finish_line(out, stmt);
            }
            Stmt::Assign(s) => {
                out.push_str(&self.indent(level));
                let op = match s.op {
                    AssignOp::Set => "=",
                    AssignOp::Add => "+=",
                    AssignOp::Sub => "-=",
                    AssignOp::Mul => "*=",
                    AssignOp::Div => "/=",
                    AssignOp::Mod => "%=",
                };
                out.push_str(&format!("{} {} {}", s.target, op, print_expr(&s.value)));
                self.finish_line(out, stmt);
            }
            Stmt::If(s) => {
                for (i, branch) in s.branches.iter().enumerate() {
                    out.push_str(&self.indent(level));
                    if i == 0 {
                        out.push_str("if ");
                    } else {
                        out.push_str("elseif ");
                    }
                    out.push_str(&print_expr(&branch.cond));
                    out.push('\n');
                    self.write_body(out, &branch.body, level + 1);
                }
                if let Some(else_body) = &s.else_body {
                    out.push_str(&self.indent(level));
                    out.push_str("else\n");
                    self.write_body(out, else_body, level + 1);
                }
                self.write_end(out, stmt, level);
            }
            Stmt::Loop(s) => {
                out.push_str(&self.indent(level));
                match &s.count {
                    Some(count) => out.push_str(&format!("loop {}\n", print_expr(count))),
                    None => out.push_str("loop\n"),
                }
                self.write_body(out, &s.body, level + 1);
                self.write_end(out, stmt, level);
            }
            Stmt::Function(s) => {
                self.write_decorators(out, &s.decorators, level);
                out.push_str(&self.indent(level));
                out.push_str(&format!("fn {}({})\n", s.name, s.params.join(", ")));
                self.write_body(out, &s.body, level + 1);
                self.write_end(out, stmt, level);
            }
            Stmt::Handler(s) => {
                self.write_decorators(out, &s.decorators, level);
                out.push_str(&self.indent(level));
                out.push_str(&format!("on {}\n", s.event));
                self.write_body(out, &s.body, level + 1);
                self.write_end(out, stmt, level);
            }
            Stmt::Scope(s) => {
                out.push_str(&self.indent(level));
                out.push_str("scope\n");
                self.write_body(out, &s.body, level + 1);
                self.write_end(out, stmt, level);
            }
            Stmt::Return(s) => {
                out.push_str(&self.indent(level));
                match &s.value {
                    Some(value) => out.push_str(&format!("return {}", print_expr(value))),
                    None => out.push_str("return"),
                }
                self.finish_line(out, stmt);
            }
            Stmt::Break(_) => {
                out.push_str(&self.indent(level));
                out.push_str("break");
                self.finish_line(out, stmt);
            }
            Stmt::Continue(_) => {
                out.push_str(&self.indent(level));
                out.push_str("continue");
                self.finish_line(out, stmt);
            }
            Stmt::CommentGroup(s) => {
                for comment in s.comments.as_deref().unwrap_or(&[]) {
                    out.push_str(&self.print_comment(comment, level));
                    out.push('\n');
                }
            }
        }
    }

    fn write_decorators(&self, out: &mut String, decorators: &[Decorator], level: usize) {
        for decorator in decorators {
            out.push_str(&self.indent(level));
            out.push('@');
            out.push_str(&decorator.name);
            if !decorator.args.is_empty() {
                let args: Vec<String> = decorator.args.iter().map(print_expr).collect();
                out.push_str(&format!("({})", args.join(", ")));
            }
            out.push('\n');
        }
    }

    /// Write nested statements including their comments and blank lines
    fn write_body(&self, out: &mut String, body: &[Stmt], level: usize) {
        for stmt in body {
            self.write_stmt(out, stmt, level, true);
            if let Some(blank_lines) = stmt.trailing_blank_lines() {
                for _ in 0..blank_lines {
                    out.push('\n');
                }
            }
        }
    }

    /// Close a block: `end`, then the block's inline comment if any
    fn write_end(&self, out: &mut String, stmt: &Stmt, level: usize) {
        out.push_str(&self.indent(level));
        out.push_str("end");
        self.finish_line(out, stmt);
    }

    /// Append the inline comment (two-space gap, canonical) and newline
    fn finish_line(&self, out: &mut String, stmt: &Stmt) {
        if let Some(inline) = inline_comment(stmt) {
            out.push_str("  ");
            out.push_str(&inline.text);
        }
        out.push('\n');
    }
}

/// A comment counts as empty when nothing follows its `#` marker
fn has_text(comment: &CommentPos) -> bool {
    !comment.text.trim_start_matches('#').trim().is_empty()
}

fn leading_comments(stmt: &Stmt) -> impl Iterator<Item = &CommentPos> {
    stmt.comments()
        .unwrap_or(&[])
        .iter()
        .filter(|c| !c.inline && has_text(c))
}

fn inline_comment(stmt: &Stmt) -> Option<&CommentPos> {
    stmt.comments()
        .unwrap_or(&[])
        .iter()
        .find(|c| c.inline && has_text(c))
}

/// Render an expression in canonical form
pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Number { lexeme } => lexeme.clone(),
        Expr::Str { lexeme } => lexeme.clone(),
        Expr::Bool { value } => value.to_string(),
        Expr::Null => "null".to_string(),
        Expr::Ident { name } => name.clone(),
        Expr::Unary { op, expr } => {
            let op = match op {
                UnaryOp::Not => "!",
                UnaryOp::Neg => "-",
            };
            format!("{}{}", op, print_expr(expr))
        }
        Expr::Binary { op, lhs, rhs } => {
            format!("{} {} {}", print_expr(lhs), op.as_str(), print_expr(rhs))
        }
        Expr::Call { name, args } => {
            let args: Vec<String> = args.iter().map(print_expr).collect();
            format!("{}({})", name, args.join(", "))
        }
        Expr::Paren { expr } => format!("({})", print_expr(expr)),
    }
}
