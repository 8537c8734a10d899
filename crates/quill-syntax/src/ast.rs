//! Abstract Syntax Tree (AST) definitions
//!
//! Quill statements are a closed tagged variant over statement kinds. Every
//! statement carries its source span (`pos`), optionally its attached
//! comments, and optionally the count of blank source lines attributed to
//! it. Node identity is positional: two statements are "the same node" iff
//! their `pos` four-tuples are equal.

use crate::span::CodePos;
use serde::{Deserialize, Serialize};

/// AST schema version
///
/// Included in JSON dumps to ensure compatibility. Increment when making
/// breaking changes to the AST structure.
pub const AST_VERSION: u32 = 1;

/// Top-level script containing all statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub statements: Vec<Stmt>,
}

/// Versioned AST wrapper for JSON serialization
///
/// Wraps a Script with version metadata for stable JSON output, used when
/// dumping the AST for external tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedScript {
    /// AST schema version
    pub ast_version: u32,
    /// The actual script AST
    #[serde(flatten)]
    pub script: Script,
}

impl VersionedScript {
    /// Create a new versioned script wrapper
    pub fn new(script: Script) -> Self {
        Self {
            ast_version: AST_VERSION,
            script,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Script> for VersionedScript {
    fn from(script: Script) -> Self {
        Self::new(script)
    }
}

/// A comment with its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPos {
    /// Comment text including the leading `#`
    pub text: String,
    /// Source location
    pub pos: CodePos,
    /// True when the comment follows code on the same line
    pub inline: bool,
}

/// A decorator line preceding a function or handler definition
///
/// Syntax: `@name` or `@name(arg, ...)`, each on its own line. Decorator
/// rows precede the rows of the definition they annotate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decorator {
    pub name: String,
    pub args: Vec<Expr>,
    pub pos: CodePos,
}

/// A statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stmt {
    Command(CommandStmt),
    Assign(AssignStmt),
    If(IfStmt),
    Loop(LoopStmt),
    Function(FunctionStmt),
    Handler(HandlerStmt),
    Scope(ScopeStmt),
    Return(ReturnStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    CommentGroup(CommentGroupStmt),
}

/// Command statement: `name arg1 arg2 ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStmt {
    pub name: String,
    pub args: Vec<Expr>,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Assignment operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Mod,
}

/// Assignment statement: `name = expr` or compound (`+=`, `-=`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: String,
    pub op: AssignOp,
    pub value: Expr,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// One `if`/`elseif` arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondBranch {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

/// If statement: `if`/`elseif`*/`else`?/`end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    /// `if` arm first, then any `elseif` arms in source order
    pub branches: Vec<CondBranch>,
    pub else_body: Option<Vec<Stmt>>,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Loop statement: `loop [count]` ... `end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopStmt {
    /// Iteration count, or `None` for an unbounded loop
    pub count: Option<Expr>,
    pub body: Vec<Stmt>,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Function definition: `fn name(params)` ... `end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionStmt {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Decorator>,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Event-handler definition: `on event` ... `end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerStmt {
    pub event: String,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Decorator>,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Explicit scope block: `scope` ... `end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeStmt {
    pub body: Vec<Stmt>,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Return statement: `return [expr]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Break statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakStmt {
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Continue statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueStmt {
    pub pos: Option<CodePos>,
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Standalone comment group: comment lines not attached to any statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentGroupStmt {
    pub pos: Option<CodePos>,
    /// The group's comment lines, in source order
    pub comments: Option<Vec<CommentPos>>,
    pub trailing_blank_lines: Option<usize>,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Canonical operator text
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// An expression
///
/// Expressions carry no positions; literal lexemes are preserved verbatim
/// so that regeneration does not reformat untouched values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    /// Number literal, raw lexeme as written
    Number { lexeme: String },
    /// String literal, raw lexeme including quotes
    Str { lexeme: String },
    /// Boolean literal
    Bool { value: bool },
    /// Null literal
    Null,
    /// Identifier reference
    Ident { name: String },
    /// Unary operation
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// Binary operation
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Call expression: `name(args)`
    Call { name: String, args: Vec<Expr> },
    /// Parenthesized expression
    Paren { expr: Box<Expr> },
}

impl Stmt {
    /// Kind name, matching the JSON `type` discriminant
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Command(_) => "command",
            Stmt::Assign(_) => "assign",
            Stmt::If(_) => "if",
            Stmt::Loop(_) => "loop",
            Stmt::Function(_) => "function",
            Stmt::Handler(_) => "handler",
            Stmt::Scope(_) => "scope",
            Stmt::Return(_) => "return",
            Stmt::Break(_) => "break",
            Stmt::Continue(_) => "continue",
            Stmt::CommentGroup(_) => "comment_group",
        }
    }

    /// Source span, if this node has been positioned
    pub fn pos(&self) -> Option<&CodePos> {
        match self {
            Stmt::Command(s) => s.pos.as_ref(),
            Stmt::Assign(s) => s.pos.as_ref(),
            Stmt::If(s) => s.pos.as_ref(),
            Stmt::Loop(s) => s.pos.as_ref(),
            Stmt::Function(s) => s.pos.as_ref(),
            Stmt::Handler(s) => s.pos.as_ref(),
            Stmt::Scope(s) => s.pos.as_ref(),
            Stmt::Return(s) => s.pos.as_ref(),
            Stmt::Break(s) => s.pos.as_ref(),
            Stmt::Continue(s) => s.pos.as_ref(),
            Stmt::CommentGroup(s) => s.pos.as_ref(),
        }
    }

    /// Attached comments.
    ///
    /// `None` means "no comment information"; `Some(&[])` is an explicit
    /// empty list, which the rewriter treats as a request to strip any
    /// comments attached to this node in the original source.
    pub fn comments(&self) -> Option<&[CommentPos]> {
        match self {
            Stmt::Command(s) => s.comments.as_deref(),
            Stmt::Assign(s) => s.comments.as_deref(),
            Stmt::If(s) => s.comments.as_deref(),
            Stmt::Loop(s) => s.comments.as_deref(),
            Stmt::Function(s) => s.comments.as_deref(),
            Stmt::Handler(s) => s.comments.as_deref(),
            Stmt::Scope(s) => s.comments.as_deref(),
            Stmt::Return(s) => s.comments.as_deref(),
            Stmt::Break(s) => s.comments.as_deref(),
            Stmt::Continue(s) => s.comments.as_deref(),
            Stmt::CommentGroup(s) => s.comments.as_deref(),
        }
    }

    /// Count of blank source lines attributed to this statement
    pub fn trailing_blank_lines(&self) -> Option<usize> {
        match self {
            Stmt::Command(s) => s.trailing_blank_lines,
            Stmt::Assign(s) => s.trailing_blank_lines,
            Stmt::If(s) => s.trailing_blank_lines,
            Stmt::Loop(s) => s.trailing_blank_lines,
            Stmt::Function(s) => s.trailing_blank_lines,
            Stmt::Handler(s) => s.trailing_blank_lines,
            Stmt::Scope(s) => s.trailing_blank_lines,
            Stmt::Return(s) => s.trailing_blank_lines,
            Stmt::Break(s) => s.trailing_blank_lines,
            Stmt::Continue(s) => s.trailing_blank_lines,
            Stmt::CommentGroup(s) => s.trailing_blank_lines,
        }
    }

    /// Decorators, if this statement kind can carry them
    pub fn decorators(&self) -> &[Decorator] {
        match self {
            Stmt::Function(s) => &s.decorators,
            Stmt::Handler(s) => &s.decorators,
            _ => &[],
        }
    }

    /// True for standalone comment-group nodes
    pub fn is_comment_group(&self) -> bool {
        matches!(self, Stmt::CommentGroup(_))
    }

    /// Attach one more comment to this statement
    pub fn push_comment(&mut self, comment: CommentPos) {
        let slot = match self {
            Stmt::Command(s) => &mut s.comments,
            Stmt::Assign(s) => &mut s.comments,
            Stmt::If(s) => &mut s.comments,
            Stmt::Loop(s) => &mut s.comments,
            Stmt::Function(s) => &mut s.comments,
            Stmt::Handler(s) => &mut s.comments,
            Stmt::Scope(s) => &mut s.comments,
            Stmt::Return(s) => &mut s.comments,
            Stmt::Break(s) => &mut s.comments,
            Stmt::Continue(s) => &mut s.comments,
            Stmt::CommentGroup(s) => &mut s.comments,
        };
        slot.get_or_insert_with(Vec::new).push(comment);
    }

    /// Set the blank-line attribution for this statement
    pub fn set_trailing_blank_lines(&mut self, count: Option<usize>) {
        let slot = match self {
            Stmt::Command(s) => &mut s.trailing_blank_lines,
            Stmt::Assign(s) => &mut s.trailing_blank_lines,
            Stmt::If(s) => &mut s.trailing_blank_lines,
            Stmt::Loop(s) => &mut s.trailing_blank_lines,
            Stmt::Function(s) => &mut s.trailing_blank_lines,
            Stmt::Handler(s) => &mut s.trailing_blank_lines,
            Stmt::Scope(s) => &mut s.trailing_blank_lines,
            Stmt::Return(s) => &mut s.trailing_blank_lines,
            Stmt::Break(s) => &mut s.trailing_blank_lines,
            Stmt::Continue(s) => &mut s.trailing_blank_lines,
            Stmt::CommentGroup(s) => &mut s.trailing_blank_lines,
        };
        *slot = count;
    }

    /// Mutable access to child statement lists
    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<Stmt>> {
        match self {
            Stmt::If(s) => {
                let mut lists: Vec<&mut Vec<Stmt>> =
                    s.branches.iter_mut().map(|b| &mut b.body).collect();
                if let Some(else_body) = &mut s.else_body {
                    lists.push(else_body);
                }
                lists
            }
            Stmt::Loop(s) => vec![&mut s.body],
            Stmt::Function(s) => vec![&mut s.body],
            Stmt::Handler(s) => vec![&mut s.body],
            Stmt::Scope(s) => vec![&mut s.body],
            _ => Vec::new(),
        }
    }

    /// Child statement lists, outermost first (if arms, else body, loop
    /// body, ...). Empty for leaf statements.
    pub fn child_lists(&self) -> Vec<&[Stmt]> {
        match self {
            Stmt::If(s) => {
                let mut lists: Vec<&[Stmt]> =
                    s.branches.iter().map(|b| b.body.as_slice()).collect();
                if let Some(else_body) = &s.else_body {
                    lists.push(else_body.as_slice());
                }
                lists
            }
            Stmt::Loop(s) => vec![s.body.as_slice()],
            Stmt::Function(s) => vec![s.body.as_slice()],
            Stmt::Handler(s) => vec![s.body.as_slice()],
            Stmt::Scope(s) => vec![s.body.as_slice()],
            _ => Vec::new(),
        }
    }
}

/// Structural equality between two statements, ignoring positions,
/// attached comments, and blank-line attribution.
///
/// This is an explicit recursive field-by-field comparator: a container is
/// equal only if its own header fields match and every child statement
/// list is element-wise equal, because a parent can be shallowly identical
/// while containing a changed descendant. Expressions compare by raw
/// lexeme, so `2` and `2.0` are distinct.
pub fn same_shape(a: &Stmt, b: &Stmt) -> bool {
    match (a, b) {
        (Stmt::Command(a), Stmt::Command(b)) => a.name == b.name && a.args == b.args,
        (Stmt::Assign(a), Stmt::Assign(b)) => {
            a.target == b.target && a.op == b.op && a.value == b.value
        }
        (Stmt::If(a), Stmt::If(b)) => {
            a.branches.len() == b.branches.len()
                && a.branches
                    .iter()
                    .zip(&b.branches)
                    .all(|(x, y)| x.cond == y.cond && same_shape_all(&x.body, &y.body))
                && match (&a.else_body, &b.else_body) {
                    (Some(x), Some(y)) => same_shape_all(x, y),
                    (None, None) => true,
                    _ => false,
                }
        }
        (Stmt::Loop(a), Stmt::Loop(b)) => a.count == b.count && same_shape_all(&a.body, &b.body),
        (Stmt::Function(a), Stmt::Function(b)) => {
            a.name == b.name
                && a.params == b.params
                && same_decorators(&a.decorators, &b.decorators)
                && same_shape_all(&a.body, &b.body)
        }
        (Stmt::Handler(a), Stmt::Handler(b)) => {
            a.event == b.event
                && same_decorators(&a.decorators, &b.decorators)
                && same_shape_all(&a.body, &b.body)
        }
        (Stmt::Scope(a), Stmt::Scope(b)) => same_shape_all(&a.body, &b.body),
        (Stmt::Return(a), Stmt::Return(b)) => a.value == b.value,
        (Stmt::Break(_), Stmt::Break(_)) => true,
        (Stmt::Continue(_), Stmt::Continue(_)) => true,
        (Stmt::CommentGroup(a), Stmt::CommentGroup(b)) => {
            // Comment groups ARE their comments; compare the texts only.
            let texts = |c: &Option<Vec<CommentPos>>| -> Vec<String> {
                c.as_deref()
                    .unwrap_or(&[])
                    .iter()
                    .map(|c| c.text.clone())
                    .collect()
            };
            texts(&a.comments) == texts(&b.comments)
        }
        _ => false,
    }
}

/// Element-wise structural equality of two statement lists
pub fn same_shape_all(a: &[Stmt], b: &[Stmt]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_shape(x, y))
}

fn same_decorators(a: &[Decorator], b: &[Decorator]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.name == y.name && x.args == y.args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(name: &str, row: usize) -> Stmt {
        Stmt::Command(CommandStmt {
            name: name.to_string(),
            args: vec![],
            pos: Some(CodePos::new(row, 0, row, name.len() - 1)),
            comments: None,
            trailing_blank_lines: None,
        })
    }

    #[test]
    fn test_same_shape_ignores_position() {
        assert!(same_shape(&command("tick", 0), &command("tick", 7)));
    }

    #[test]
    fn test_same_shape_ignores_comments() {
        let a = command("tick", 0);
        let mut b = command("tick", 0);
        if let Stmt::Command(c) = &mut b {
            c.comments = Some(vec![CommentPos {
                text: "# hi".to_string(),
                pos: CodePos::at(0, 6),
                inline: true,
            }]);
        }
        assert!(same_shape(&a, &b));
    }

    #[test]
    fn test_same_shape_detects_changed_descendant() {
        let outer = |inner: Stmt| {
            Stmt::Scope(ScopeStmt {
                body: vec![inner],
                pos: Some(CodePos::new(0, 0, 2, 2)),
                comments: None,
                trailing_blank_lines: None,
            })
        };
        assert!(same_shape(&outer(command("a", 1)), &outer(command("a", 1))));
        assert!(!same_shape(&outer(command("a", 1)), &outer(command("b", 1))));
    }

    #[test]
    fn test_number_lexemes_are_distinct() {
        let n = |lexeme: &str| Expr::Number {
            lexeme: lexeme.to_string(),
        };
        assert_ne!(n("2"), n("2.0"));
        assert_eq!(n("2"), n("2"));
    }

    #[test]
    fn test_versioned_script_json_roundtrip() {
        let script = Script {
            statements: vec![command("tick", 0)],
        };
        let versioned = VersionedScript::new(script.clone());
        let json = versioned.to_json().unwrap();
        let back = VersionedScript::from_json(&json).unwrap();
        assert_eq!(back.ast_version, AST_VERSION);
        assert_eq!(back.script, script);
    }
}
