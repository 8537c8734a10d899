//! Parsing (tokens to AST)
//!
//! The parser converts the lexer's token stream into position-annotated
//! statements. Uses precedence climbing for expressions and recursive
//! descent for statements. Comment attachment and blank-line attribution
//! happen here, so a freshly parsed AST carries everything the rewriter
//! needs for format-preserving reconstruction:
//!
//! - a run of whole-line comments directly above a statement becomes that
//!   statement's leading comments;
//! - a run separated from the next statement by a blank line, or followed
//!   by `end`/end-of-file, becomes a standalone comment-group node;
//! - a comment after code becomes the inline comment of the innermost
//!   statement starting (else ending) on that row;
//! - every statement records the count of blank rows immediately below it.

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::span::CodePos;
use crate::token::{Token, TokenKind};

/// Parser state for building an AST from source text
pub struct Parser {
    tokens: Vec<Token>,
    line_comments: Vec<CommentPos>,
    inline_comments: Vec<CommentPos>,
    next_line_comment: usize,
    lines: Vec<String>,
    ends_with_newline: bool,
    current: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Create a new parser for the given source
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let (tokens, comments, diagnostics) = lexer.tokenize();
        let (inline_comments, line_comments): (Vec<_>, Vec<_>) =
            comments.into_iter().partition(|c| c.inline);

        let mut lines: Vec<String> = source.split('\n').map(|l| l.to_string()).collect();
        if source.ends_with('\n') {
            lines.pop();
        }
        if source.is_empty() {
            lines.clear();
        }

        Self {
            tokens,
            line_comments,
            inline_comments,
            next_line_comment: 0,
            lines,
            ends_with_newline: source.ends_with('\n'),
            current: 0,
            diagnostics,
        }
    }

    /// Parse the source into an AST
    pub fn parse(&mut self) -> (Script, Vec<Diagnostic>) {
        let mut statements = self.parse_statements(&[]);

        let inline = std::mem::take(&mut self.inline_comments);
        for comment in inline {
            if !attach_inline(&mut statements, &comment) {
                self.diagnostics.push(Diagnostic::warning(
                    "QL0003",
                    format!(
                        "inline comment on line {} is not attached to any statement",
                        comment.pos.start_row + 1
                    ),
                    comment.pos,
                ));
            }
        }

        compute_blank_lines(
            &mut statements,
            &self.lines,
            true,
            self.ends_with_newline,
        );

        (
            Script { statements },
            std::mem::take(&mut self.diagnostics),
        )
    }

    // === Statement parsing ===

    /// Parse statements until end-of-input or one of `terminators`
    fn parse_statements(&mut self, terminators: &[TokenKind]) -> Vec<Stmt> {
        let mut statements = Vec::new();

        loop {
            self.skip_newlines();
            let boundary_row = self.peek().pos.start_row;
            let at_boundary = self.is_at_end() || terminators.contains(&self.peek().kind);

            let mut leading = self.take_comment_runs(boundary_row, at_boundary, &mut statements);
            if at_boundary {
                break;
            }

            match self.parse_statement() {
                Ok(mut stmt) => {
                    if let Some(run) = leading.take() {
                        for comment in run {
                            stmt.push_comment(comment);
                        }
                    }
                    statements.push(stmt);
                }
                Err(()) => {
                    if let Some(run) = leading.take() {
                        statements.push(comment_group(run));
                    }
                    self.synchronize();
                }
            }
        }

        statements
    }

    /// Pull comment lines lying above `boundary_row` out of the side
    /// channel. Runs not directly adjacent to the upcoming statement are
    /// appended to `out` as standalone comment groups; a run whose last
    /// row touches the statement is returned for attachment.
    fn take_comment_runs(
        &mut self,
        boundary_row: usize,
        at_boundary: bool,
        out: &mut Vec<Stmt>,
    ) -> Option<Vec<CommentPos>> {
        let mut pending = Vec::new();
        while self.next_line_comment < self.line_comments.len()
            && self.line_comments[self.next_line_comment].pos.start_row < boundary_row
        {
            pending.push(self.line_comments[self.next_line_comment].clone());
            self.next_line_comment += 1;
        }
        if pending.is_empty() {
            return None;
        }

        let mut runs: Vec<Vec<CommentPos>> = Vec::new();
        for comment in pending {
            match runs.last_mut() {
                Some(run)
                    if run
                        .last()
                        .is_some_and(|last| last.pos.end_row + 1 == comment.pos.start_row) =>
                {
                    run.push(comment);
                }
                _ => runs.push(vec![comment]),
            }
        }

        let attach_last = !at_boundary
            && runs
                .last()
                .is_some_and(|run| {
                    run.last()
                        .is_some_and(|last| last.pos.end_row + 1 == boundary_row)
                });

        let count = runs.len();
        for (i, run) in runs.into_iter().enumerate() {
            if attach_last && i + 1 == count {
                return Some(run);
            }
            out.push(comment_group(run));
        }
        None
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<Stmt, ()> {
        match self.peek().kind {
            TokenKind::At | TokenKind::Fn | TokenKind::On => self.parse_definition(),
            TokenKind::If => self.parse_if(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::Scope => self.parse_scope(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::Identifier => self.parse_command_or_assign(),
            _ => {
                let pos = self.peek().pos;
                self.error("Expected a statement", pos);
                Err(())
            }
        }
    }

    /// Parse decorators followed by a function or handler definition
    fn parse_definition(&mut self) -> Result<Stmt, ()> {
        let decorators = self.parse_decorators()?;

        match self.peek().kind {
            TokenKind::Fn => self.parse_function(decorators),
            TokenKind::On => self.parse_handler(decorators),
            _ => {
                let pos = self.peek().pos;
                self.error(
                    "Decorators must be followed by a function or handler definition",
                    pos,
                );
                Err(())
            }
        }
    }

    /// Parse decorator lines: `@name` or `@name(args)`
    fn parse_decorators(&mut self) -> Result<Vec<Decorator>, ()> {
        let mut decorators = Vec::new();

        while self.check(TokenKind::At) {
            let at_pos = self.advance().pos;
            let name_tok = self.consume(TokenKind::Identifier, "Expected a decorator name")?;
            let name = name_tok.lexeme;
            let mut end_pos = name_tok.pos;

            let mut args = Vec::new();
            if self.match_token(TokenKind::LeftParen) {
                if !self.check(TokenKind::RightParen) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.match_token(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                end_pos = self
                    .consume(TokenKind::RightParen, "Expected ')' after decorator arguments")?
                    .pos;
            }

            decorators.push(Decorator {
                name,
                args,
                pos: at_pos.merge(end_pos),
            });
            self.consume_newline()?;
        }

        Ok(decorators)
    }

    /// Parse a function definition
    fn parse_function(&mut self, decorators: Vec<Decorator>) -> Result<Stmt, ()> {
        let fn_pos = self.consume(TokenKind::Fn, "Expected 'fn'")?.pos;
        let name = self
            .consume(TokenKind::Identifier, "Expected a function name")?
            .lexeme;

        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(
                    self.consume(TokenKind::Identifier, "Expected a parameter name")?
                        .lexeme,
                );
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;
        self.consume_newline()?;

        let body = self.parse_statements(&[TokenKind::End]);
        let end_pos = self.consume(TokenKind::End, "Expected 'end' to close 'fn'")?.pos;
        self.consume_newline()?;

        Ok(Stmt::Function(FunctionStmt {
            name,
            params,
            body,
            decorators,
            pos: Some(fn_pos.merge(end_pos)),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse an event-handler definition
    fn parse_handler(&mut self, decorators: Vec<Decorator>) -> Result<Stmt, ()> {
        let on_pos = self.consume(TokenKind::On, "Expected 'on'")?.pos;
        let event = self
            .consume(TokenKind::Identifier, "Expected an event name")?
            .lexeme;
        self.consume_newline()?;

        let body = self.parse_statements(&[TokenKind::End]);
        let end_pos = self.consume(TokenKind::End, "Expected 'end' to close 'on'")?.pos;
        self.consume_newline()?;

        Ok(Stmt::Handler(HandlerStmt {
            event,
            body,
            decorators,
            pos: Some(on_pos.merge(end_pos)),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse an if statement with optional elseif/else arms
    fn parse_if(&mut self) -> Result<Stmt, ()> {
        let if_pos = self.consume(TokenKind::If, "Expected 'if'")?.pos;
        let arm_terminators = [TokenKind::Elseif, TokenKind::Else, TokenKind::End];

        let cond = self.parse_expression()?;
        self.consume_newline()?;
        let mut branches = vec![CondBranch {
            cond,
            body: self.parse_statements(&arm_terminators),
        }];

        while self.match_token(TokenKind::Elseif) {
            let cond = self.parse_expression()?;
            self.consume_newline()?;
            branches.push(CondBranch {
                cond,
                body: self.parse_statements(&arm_terminators),
            });
        }

        let else_body = if self.match_token(TokenKind::Else) {
            self.consume_newline()?;
            Some(self.parse_statements(&[TokenKind::End]))
        } else {
            None
        };

        let end_pos = self.consume(TokenKind::End, "Expected 'end' to close 'if'")?.pos;
        self.consume_newline()?;

        Ok(Stmt::If(IfStmt {
            branches,
            else_body,
            pos: Some(if_pos.merge(end_pos)),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse a loop statement with optional count expression
    fn parse_loop(&mut self) -> Result<Stmt, ()> {
        let loop_pos = self.consume(TokenKind::Loop, "Expected 'loop'")?.pos;

        let count = if self.check(TokenKind::Newline) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_newline()?;

        let body = self.parse_statements(&[TokenKind::End]);
        let end_pos = self
            .consume(TokenKind::End, "Expected 'end' to close 'loop'")?
            .pos;
        self.consume_newline()?;

        Ok(Stmt::Loop(LoopStmt {
            count,
            body,
            pos: Some(loop_pos.merge(end_pos)),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse a scope block
    fn parse_scope(&mut self) -> Result<Stmt, ()> {
        let scope_pos = self.consume(TokenKind::Scope, "Expected 'scope'")?.pos;
        self.consume_newline()?;

        let body = self.parse_statements(&[TokenKind::End]);
        let end_pos = self
            .consume(TokenKind::End, "Expected 'end' to close 'scope'")?
            .pos;
        self.consume_newline()?;

        Ok(Stmt::Scope(ScopeStmt {
            body,
            pos: Some(scope_pos.merge(end_pos)),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse a return statement with optional value
    fn parse_return(&mut self) -> Result<Stmt, ()> {
        let return_pos = self.consume(TokenKind::Return, "Expected 'return'")?.pos;

        let value = if self.check(TokenKind::Newline) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end_pos = self.previous().pos;
        self.consume_newline()?;

        Ok(Stmt::Return(ReturnStmt {
            value,
            pos: Some(return_pos.merge(end_pos)),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse a break statement
    fn parse_break(&mut self) -> Result<Stmt, ()> {
        let pos = self.consume(TokenKind::Break, "Expected 'break'")?.pos;
        self.consume_newline()?;
        Ok(Stmt::Break(BreakStmt {
            pos: Some(pos),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse a continue statement
    fn parse_continue(&mut self) -> Result<Stmt, ()> {
        let pos = self.consume(TokenKind::Continue, "Expected 'continue'")?.pos;
        self.consume_newline()?;
        Ok(Stmt::Continue(ContinueStmt {
            pos: Some(pos),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    /// Parse an assignment or a command statement
    fn parse_command_or_assign(&mut self) -> Result<Stmt, ()> {
        let name_tok = self.advance();

        let op = match self.peek().kind {
            TokenKind::Equal => Some(AssignOp::Set),
            TokenKind::PlusEqual => Some(AssignOp::Add),
            TokenKind::MinusEqual => Some(AssignOp::Sub),
            TokenKind::StarEqual => Some(AssignOp::Mul),
            TokenKind::SlashEqual => Some(AssignOp::Div),
            TokenKind::PercentEqual => Some(AssignOp::Mod),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let value = self.parse_expression()?;
            let end_pos = self.previous().pos;
            self.consume_newline()?;
            return Ok(Stmt::Assign(AssignStmt {
                target: name_tok.lexeme,
                op,
                value,
                pos: Some(name_tok.pos.merge(end_pos)),
                comments: None,
                trailing_blank_lines: None,
            }));
        }

        // Command arguments are primaries, so `move 1 -2` stays two args
        let mut args = Vec::new();
        while !self.check(TokenKind::Newline) && !self.is_at_end() {
            args.push(self.parse_unary()?);
        }
        let end_pos = self.previous().pos;
        self.consume_newline()?;

        Ok(Stmt::Command(CommandStmt {
            name: name_tok.lexeme,
            args,
            pos: Some(name_tok.pos.merge(end_pos)),
            comments: None,
            trailing_blank_lines: None,
        }))
    }

    // === Expression parsing ===

    /// Parse an expression (precedence climbing)
    fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ()> {
        let mut lhs = self.parse_unary()?;

        while let Some((op, prec)) = binary_op(self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let op = match self.peek().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::Number => {
                let lexeme = self.advance().lexeme;
                Ok(Expr::Number { lexeme })
            }
            TokenKind::Str => {
                let lexeme = self.advance().lexeme;
                Ok(Expr::Str { lexeme })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool { value: true })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool { value: false })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::Identifier => {
                let name = self.advance().lexeme;
                if self.match_token(TokenKind::LeftParen) {
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.match_token(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.consume(TokenKind::RightParen, "Expected ')' after call arguments")?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident { name })
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(Expr::Paren {
                    expr: Box::new(expr),
                })
            }
            _ => {
                let pos = self.peek().pos;
                self.error("Expected an expression", pos);
                Err(())
            }
        }
    }

    // === Token helpers ===

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ()> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let pos = self.peek().pos;
        self.error(message, pos);
        Err(())
    }

    /// Expect the end of a logical line (newline or end-of-input)
    fn consume_newline(&mut self) -> Result<(), ()> {
        if self.match_token(TokenKind::Newline) || self.is_at_end() {
            return Ok(());
        }
        let pos = self.peek().pos;
        self.error("Expected end of line", pos);
        Err(())
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn error(&mut self, message: &str, pos: CodePos) {
        self.diagnostics
            .push(Diagnostic::error("QL0100", message, pos));
    }

    /// Skip to the start of the next logical line after a parse error
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.advance().kind == TokenKind::Newline {
                return;
            }
        }
    }
}

/// Binary operator and precedence for a token, if it is one. Higher binds
/// tighter.
fn binary_op(kind: TokenKind) -> Option<(BinOp, u8)> {
    let entry = match kind {
        TokenKind::PipePipe => (BinOp::Or, 1),
        TokenKind::AmpAmp => (BinOp::And, 2),
        TokenKind::EqualEqual => (BinOp::Eq, 3),
        TokenKind::BangEqual => (BinOp::Ne, 3),
        TokenKind::Less => (BinOp::Lt, 4),
        TokenKind::LessEqual => (BinOp::Le, 4),
        TokenKind::Greater => (BinOp::Gt, 4),
        TokenKind::GreaterEqual => (BinOp::Ge, 4),
        TokenKind::Plus => (BinOp::Add, 5),
        TokenKind::Minus => (BinOp::Sub, 5),
        TokenKind::Star => (BinOp::Mul, 6),
        TokenKind::Slash => (BinOp::Div, 6),
        TokenKind::Percent => (BinOp::Mod, 6),
        _ => return None,
    };
    Some(entry)
}

/// Build a standalone comment-group statement from a run of comments
fn comment_group(run: Vec<CommentPos>) -> Stmt {
    let pos = run
        .iter()
        .map(|c| c.pos)
        .reduce(|a, b| a.merge(b));
    Stmt::CommentGroup(CommentGroupStmt {
        pos,
        comments: Some(run),
        trailing_blank_lines: None,
    })
}

/// Attach an inline comment to the innermost statement starting (else
/// ending) on the comment's row. Returns false if no statement matches.
fn attach_inline(statements: &mut [Stmt], comment: &CommentPos) -> bool {
    let row = comment.pos.start_row;
    for stmt in statements.iter_mut() {
        let Some(pos) = stmt.pos().copied() else {
            continue;
        };
        if row < pos.start_row || row > pos.end_row {
            continue;
        }
        for list in stmt.child_lists_mut() {
            if attach_inline(list, comment) {
                return true;
            }
        }
        if pos.start_row == row || pos.end_row == row {
            stmt.push_comment(comment.clone());
            return true;
        }
    }
    false
}

/// Attribute blank rows to the statement they follow.
///
/// For the last top-level statement of a newline-terminated file the count
/// is incremented by one when non-zero, so the rewriter's end-of-file
/// suffix arithmetic round-trips trailing blank runs exactly.
fn compute_blank_lines(
    statements: &mut [Stmt],
    lines: &[String],
    top_level: bool,
    ends_with_newline: bool,
) {
    let len = statements.len();
    for (i, stmt) in statements.iter_mut().enumerate() {
        for list in stmt.child_lists_mut() {
            compute_blank_lines(list, lines, false, ends_with_newline);
        }
        let Some(pos) = stmt.pos().copied() else {
            continue;
        };
        let mut count = 0;
        let mut row = pos.end_row + 1;
        while row < lines.len() && lines[row].trim().is_empty() {
            count += 1;
            row += 1;
        }
        if top_level && i + 1 == len && count > 0 && ends_with_newline {
            count += 1;
        }
        stmt.set_trailing_blank_lines(if count > 0 { Some(count) } else { None });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<Stmt> {
        let (script, diags) = Parser::new(source).parse();
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        script.statements
    }

    #[test]
    fn test_command_with_args() {
        let stmts = parse("add 2 3\n");
        assert_eq!(stmts.len(), 1);
        let Stmt::Command(cmd) = &stmts[0] else {
            panic!("expected command");
        };
        assert_eq!(cmd.name, "add");
        assert_eq!(cmd.args.len(), 2);
        assert_eq!(cmd.pos, Some(CodePos::new(0, 0, 0, 6)));
    }

    #[test]
    fn test_assignment_and_compound() {
        let stmts = parse("x = 1 + 2\nx += 5\n");
        let Stmt::Assign(a) = &stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(a.op, AssignOp::Set);
        assert!(matches!(a.value, Expr::Binary { op: BinOp::Add, .. }));
        let Stmt::Assign(b) = &stmts[1] else {
            panic!("expected assignment");
        };
        assert_eq!(b.op, AssignOp::Add);
    }

    #[test]
    fn test_if_elseif_else_spans() {
        let source = "if x > 1\n    tick\nelseif x > 0\n    tock\nelse\n    rest\nend\n";
        let stmts = parse(source);
        let Stmt::If(s) = &stmts[0] else {
            panic!("expected if");
        };
        assert_eq!(s.branches.len(), 2);
        assert_eq!(s.else_body.as_ref().unwrap().len(), 1);
        assert_eq!(s.pos, Some(CodePos::new(0, 0, 6, 2)));
        assert_eq!(
            s.branches[0].body[0].pos(),
            Some(&CodePos::new(1, 4, 1, 7))
        );
    }

    #[test]
    fn test_function_with_decorator() {
        let source = "@throttle(100)\nfn helper(a, b)\n    return a + b\nend\n";
        let stmts = parse(source);
        let Stmt::Function(f) = &stmts[0] else {
            panic!("expected function");
        };
        assert_eq!(f.name, "helper");
        assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.decorators.len(), 1);
        assert_eq!(f.decorators[0].name, "throttle");
        assert_eq!(f.decorators[0].pos, CodePos::new(0, 0, 0, 13));
        // Node's own span starts at `fn`, not at the decorator
        assert_eq!(f.pos, Some(CodePos::new(1, 0, 3, 2)));
    }

    #[test]
    fn test_leading_comment_attachment() {
        let stmts = parse("# setup\n# more\nadd 2 3\n");
        assert_eq!(stmts.len(), 1);
        let comments = stmts[0].comments().unwrap();
        assert_eq!(comments.len(), 2);
        assert!(!comments[0].inline);
        assert_eq!(comments[0].text, "# setup");
    }

    #[test]
    fn test_detached_comment_becomes_group() {
        let stmts = parse("# banner\n\nadd 2 3\n");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].is_comment_group());
        assert!(stmts[1].comments().is_none());
    }

    #[test]
    fn test_trailing_comment_group_at_eof() {
        let stmts = parse("add 2 3\n# tail\n");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[1].is_comment_group());
    }

    #[test]
    fn test_inline_comment_attaches_to_innermost() {
        let source = "if x\n    tick  # beat\nend\n";
        let stmts = parse(source);
        let Stmt::If(s) = &stmts[0] else {
            panic!("expected if");
        };
        let comments = s.branches[0].body[0].comments().unwrap();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].inline);
        assert_eq!(comments[0].text, "# beat");
    }

    #[test]
    fn test_inline_comment_on_end_row_attaches_to_block() {
        let source = "scope\n    tick\nend  # done\n";
        let stmts = parse(source);
        let comments = stmts[0].comments().unwrap();
        assert_eq!(comments[0].text, "# done");
        assert!(comments[0].inline);
    }

    #[test]
    fn test_trailing_blank_lines_between_statements() {
        let stmts = parse("a\n\n\nb\n");
        assert_eq!(stmts[0].trailing_blank_lines(), Some(2));
        assert_eq!(stmts[1].trailing_blank_lines(), None);
    }

    #[test]
    fn test_trailing_blank_lines_at_eof_counts_final_newline() {
        let stmts = parse("a\n\n");
        assert_eq!(stmts[0].trailing_blank_lines(), Some(2));
        let stmts = parse("a\n");
        assert_eq!(stmts[0].trailing_blank_lines(), None);
    }

    #[test]
    fn test_nested_blank_lines_are_not_eof_adjusted() {
        let stmts = parse("scope\n    a\n\n    b\nend\n");
        let Stmt::Scope(s) = &stmts[0] else {
            panic!("expected scope");
        };
        assert_eq!(s.body[0].trailing_blank_lines(), Some(1));
    }

    #[test]
    fn test_loop_with_and_without_count() {
        let stmts = parse("loop 3\n    tick\nend\nloop\n    break\nend\n");
        let Stmt::Loop(counted) = &stmts[0] else {
            panic!("expected loop");
        };
        assert!(counted.count.is_some());
        let Stmt::Loop(bare) = &stmts[1] else {
            panic!("expected loop");
        };
        assert!(bare.count.is_none());
    }

    #[test]
    fn test_parse_error_recovers_on_next_line() {
        let (script, diags) = Parser::new("if\nadd 2 3\n").parse();
        assert!(!diags.is_empty());
        assert_eq!(script.statements.len(), 1);
    }

    #[test]
    fn test_handler_and_scope() {
        let stmts = parse("on tick\n    advance\nend\nscope\n    temp = 1\nend\n");
        assert!(matches!(stmts[0], Stmt::Handler(_)));
        assert!(matches!(stmts[1], Stmt::Scope(_)));
    }

    #[test]
    fn test_deterministic_reparse() {
        let source = "# lead\nx = 1\n\nfn f(a)\n    return a\nend\n";
        let (first, _) = Parser::new(source).parse();
        let (second, _) = Parser::new(source).parse();
        assert_eq!(first, second);
    }
}
