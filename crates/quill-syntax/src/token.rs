//! Token types for lexical analysis
//!
//! Defines all token types recognized by the Quill lexer.

use crate::span::CodePos;
use serde::{Deserialize, Serialize};

/// Token type produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of this token
    pub lexeme: String,
    /// Source location
    pub pos: CodePos,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, pos: CodePos) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            pos,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Number literal (42, 3.14)
    Number,
    /// String literal ("hello")
    Str,
    /// `true` keyword
    True,
    /// `false` keyword
    False,
    /// `null` keyword
    Null,
    /// Identifier
    Identifier,

    // Keywords
    /// `if` keyword
    If,
    /// `elseif` keyword
    Elseif,
    /// `else` keyword
    Else,
    /// `end` keyword (closes a block)
    End,
    /// `loop` keyword
    Loop,
    /// `fn` keyword (function definition)
    Fn,
    /// `on` keyword (event-handler definition)
    On,
    /// `scope` keyword (explicit scope block)
    Scope,
    /// `return` keyword
    Return,
    /// `break` keyword
    Break,
    /// `continue` keyword
    Continue,

    // Operators
    /// `+` (addition)
    Plus,
    /// `-` (subtraction or negation)
    Minus,
    /// `*` (multiplication)
    Star,
    /// `/` (division)
    Slash,
    /// `%` (modulo)
    Percent,
    /// `!` (logical not)
    Bang,
    /// `==` (equality)
    EqualEqual,
    /// `!=` (inequality)
    BangEqual,
    /// `<` (less than)
    Less,
    /// `<=` (less than or equal)
    LessEqual,
    /// `>` (greater than)
    Greater,
    /// `>=` (greater than or equal)
    GreaterEqual,
    /// `&&` (logical and)
    AmpAmp,
    /// `||` (logical or)
    PipePipe,

    // Assignment operators
    /// `=` (assignment)
    Equal,
    /// `+=` (add and assign)
    PlusEqual,
    /// `-=` (subtract and assign)
    MinusEqual,
    /// `*=` (multiply and assign)
    StarEqual,
    /// `/=` (divide and assign)
    SlashEqual,
    /// `%=` (modulo and assign)
    PercentEqual,

    // Punctuation
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `@` (decorator marker)
    At,

    // Layout
    /// End of a logical line
    Newline,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Keyword lookup for identifiers
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "if" => TokenKind::If,
            "elseif" => TokenKind::Elseif,
            "else" => TokenKind::Else,
            "end" => TokenKind::End,
            "loop" => TokenKind::Loop,
            "fn" => TokenKind::Fn,
            "on" => TokenKind::On,
            "scope" => TokenKind::Scope,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => return None,
        };
        Some(kind)
    }
}
