//! Lexical analysis (source text to tokens)
//!
//! The Quill lexer is line-oriented: statements end at the newline, so the
//! token stream carries explicit `Newline` tokens for lines that contain
//! code. Comments never reach the parser's token stream; they are collected
//! on the side as [`CommentPos`] values with their `inline` flag already
//! resolved (a comment is inline iff code precedes it on the same row).
//!
//! Columns are byte offsets within a row. A `#` inside a string literal is
//! not a comment; string lexing consumes it first.

use crate::ast::CommentPos;
use crate::diagnostic::Diagnostic;
use crate::span::CodePos;
use crate::token::{Token, TokenKind};

/// Lexer state for tokenizing source text
pub struct Lexer {
    lines: Vec<String>,
}

impl Lexer {
    /// Create a new lexer for the given source
    pub fn new(source: &str) -> Self {
        let mut lines: Vec<String> = source.split('\n').map(|l| l.to_string()).collect();
        if source.ends_with('\n') {
            lines.pop();
        }
        if source.is_empty() {
            lines.clear();
        }
        Self { lines }
    }

    /// Tokenize the source, collecting comments on the side.
    ///
    /// Returns `(tokens, comments, diagnostics)`. The token stream ends
    /// with an `Eof` token and contains a `Newline` token after each row
    /// that produced at least one code token.
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<CommentPos>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut comments = Vec::new();
        let mut diagnostics = Vec::new();

        for (row, line) in self.lines.iter().enumerate() {
            let saw_code = lex_line(row, line, &mut tokens, &mut comments, &mut diagnostics);
            if saw_code {
                tokens.push(Token::new(
                    TokenKind::Newline,
                    "\n",
                    CodePos::at(row, line.len()),
                ));
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            "",
            CodePos::at(self.lines.len(), 0),
        ));
        (tokens, comments, diagnostics)
    }
}

/// Lex one row. Returns true if the row produced at least one code token.
fn lex_line(
    row: usize,
    line: &str,
    tokens: &mut Vec<Token>,
    comments: &mut Vec<CommentPos>,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let bytes = line.as_bytes();
    let mut col = 0;
    let mut saw_code = false;

    while col < bytes.len() {
        let c = bytes[col];
        match c {
            b' ' | b'\t' | b'\r' => {
                col += 1;
            }
            b'#' => {
                let text = line[col..].to_string();
                let end_col = if text.len() > 1 { col + text.len() - 1 } else { col };
                comments.push(CommentPos {
                    text,
                    pos: CodePos::new(row, col, row, end_col),
                    inline: saw_code,
                });
                // Comment runs to end of line
                break;
            }
            b'"' => {
                let (lexeme, terminated) = lex_string(&line[col..]);
                let end_col = col + lexeme.len() - 1;
                if !terminated {
                    diagnostics.push(Diagnostic::error(
                        "QL0002",
                        "unterminated string literal",
                        CodePos::new(row, col, row, end_col),
                    ));
                }
                tokens.push(Token::new(
                    TokenKind::Str,
                    lexeme,
                    CodePos::new(row, col, row, end_col),
                ));
                saw_code = true;
                col = end_col + 1;
            }
            b'0'..=b'9' => {
                let lexeme = lex_number(&line[col..]);
                let end_col = col + lexeme.len() - 1;
                tokens.push(Token::new(
                    TokenKind::Number,
                    lexeme,
                    CodePos::new(row, col, row, end_col),
                ));
                saw_code = true;
                col = end_col + 1;
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let lexeme = lex_identifier(&line[col..]);
                let end_col = col + lexeme.len() - 1;
                let kind = TokenKind::keyword(&lexeme).unwrap_or(TokenKind::Identifier);
                tokens.push(Token::new(
                    kind,
                    lexeme,
                    CodePos::new(row, col, row, end_col),
                ));
                saw_code = true;
                col = end_col + 1;
            }
            _ => match lex_operator(&line[col..]) {
                Some((kind, len)) => {
                    tokens.push(Token::new(
                        kind,
                        &line[col..col + len],
                        CodePos::new(row, col, row, col + len - 1),
                    ));
                    saw_code = true;
                    col += len;
                }
                None => {
                    let ch = line[col..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                    diagnostics.push(Diagnostic::error(
                        "QL0001",
                        format!("unexpected character '{}'", ch),
                        CodePos::at(row, col),
                    ));
                    col += ch.len_utf8();
                }
            },
        }
    }

    saw_code
}

/// Lex a string literal starting at `"`. Returns (lexeme, terminated).
fn lex_string(rest: &str) -> (String, bool) {
    let bytes = rest.as_bytes();
    let mut i = 1;
    let mut escaped = false;
    while i < bytes.len() {
        let c = bytes[i];
        if escaped {
            escaped = false;
        } else if c == b'\\' {
            escaped = true;
        } else if c == b'"' {
            return (rest[..=i].to_string(), true);
        }
        i += 1;
    }
    (rest.to_string(), false)
}

/// Lex a number literal: digits with at most one fractional part
fn lex_number(rest: &str) -> String {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit()) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    rest[..i].to_string()
}

/// Lex an identifier or keyword
fn lex_identifier(rest: &str) -> String {
    let end = rest
        .bytes()
        .position(|b| !(b.is_ascii_alphanumeric() || b == b'_'))
        .unwrap_or(rest.len());
    rest[..end].to_string()
}

/// Match an operator or punctuation token. Longest match first.
fn lex_operator(rest: &str) -> Option<(TokenKind, usize)> {
    let two = rest.get(..2);
    let kind2 = match two {
        Some("==") => Some(TokenKind::EqualEqual),
        Some("!=") => Some(TokenKind::BangEqual),
        Some("<=") => Some(TokenKind::LessEqual),
        Some(">=") => Some(TokenKind::GreaterEqual),
        Some("&&") => Some(TokenKind::AmpAmp),
        Some("||") => Some(TokenKind::PipePipe),
        Some("+=") => Some(TokenKind::PlusEqual),
        Some("-=") => Some(TokenKind::MinusEqual),
        Some("*=") => Some(TokenKind::StarEqual),
        Some("/=") => Some(TokenKind::SlashEqual),
        Some("%=") => Some(TokenKind::PercentEqual),
        _ => None,
    };
    if let Some(kind) = kind2 {
        return Some((kind, 2));
    }

    let kind1 = match rest.as_bytes().first()? {
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Minus,
        b'*' => TokenKind::Star,
        b'/' => TokenKind::Slash,
        b'%' => TokenKind::Percent,
        b'!' => TokenKind::Bang,
        b'<' => TokenKind::Less,
        b'>' => TokenKind::Greater,
        b'=' => TokenKind::Equal,
        b'(' => TokenKind::LeftParen,
        b')' => TokenKind::RightParen,
        b',' => TokenKind::Comma,
        b'@' => TokenKind::At,
        _ => return None,
    };
    Some((kind1, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, Vec<CommentPos>, Vec<Diagnostic>) {
        Lexer::new(source).tokenize()
    }

    #[test]
    fn test_command_line() {
        let (tokens, comments, diags) = lex("add 2 3\n");
        assert!(diags.is_empty());
        assert!(comments.is_empty());
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[0].pos, CodePos::new(0, 0, 0, 2));
        assert_eq!(tokens[2].pos, CodePos::new(0, 6, 0, 6));
    }

    #[test]
    fn test_inline_comment_flag() {
        let (_, comments, _) = lex("add 2 3  # note\n");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].inline);
        assert_eq!(comments[0].text, "# note");
        assert_eq!(comments[0].pos, CodePos::new(0, 9, 0, 14));
    }

    #[test]
    fn test_leading_comment_flag() {
        let (_, comments, _) = lex("# setup\nadd 2 3\n");
        assert_eq!(comments.len(), 1);
        assert!(!comments[0].inline);
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        let (tokens, comments, diags) = lex("say \"#5\"\n");
        assert!(diags.is_empty());
        assert!(comments.is_empty());
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].lexeme, "\"#5\"");
    }

    #[test]
    fn test_comment_only_line_emits_no_newline_token() {
        let (tokens, comments, _) = lex("# alone\n");
        assert_eq!(comments.len(), 1);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_and_operators() {
        let (tokens, _, diags) = lex("if x >= 10 && !done\n");
        assert!(diags.is_empty());
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::If,
                TokenKind::Identifier,
                TokenKind::GreaterEqual,
                TokenKind::Number,
                TokenKind::AmpAmp,
                TokenKind::Bang,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_string_diagnostic() {
        let (_, _, diags) = lex("say \"oops\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "QL0002");
    }

    #[test]
    fn test_decorator_tokens() {
        let (tokens, _, _) = lex("@throttle(100)\n");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::At,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Number,
                TokenKind::RightParen,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_number_lexemes_preserved() {
        let (tokens, _, _) = lex("x = 2.50\n");
        assert_eq!(tokens[2].lexeme, "2.50");
    }
}
