//! Comment layout normalization
//!
//! Before patching, a node's attached comments are normalized into a
//! [`CommentLayout`]: leading comments in source order, at most one inline
//! comment, and the blank-line gaps the rewriter needs for range
//! arithmetic. Whitespace-only comments are discarded entirely.

use quill_syntax::ast::{CommentPos, Stmt};

use crate::line_index::LineIndex;

/// Normalized comment layout for one node. Derived per call, never stored.
#[derive(Debug, Clone, Default)]
pub struct CommentLayout {
    /// Non-inline comments in source order
    pub leading_comments: Vec<CommentPos>,
    /// The node's inline comment, if any (first wins if several)
    pub inline_comment: Option<CommentPos>,
    /// Contiguous blank rows between the last leading comment and the
    /// node's first row
    pub leading_gap_lines: usize,
    /// For standalone comment groups only: contiguous blank rows after the
    /// group's last comment, scanned through end of file
    pub trailing_blank_lines_after_group: usize,
}

/// Classify a node's comments and measure its blank-line gaps
pub fn normalize(node: &Stmt, index: &LineIndex) -> CommentLayout {
    let mut layout = CommentLayout::default();

    for comment in node.comments().unwrap_or(&[]) {
        // The text includes the `#` marker; empty means nothing after it.
        if comment.text.trim_start_matches('#').trim().is_empty() {
            continue;
        }
        if comment.inline {
            if layout.inline_comment.is_none() {
                layout.inline_comment = Some(comment.clone());
            }
        } else {
            layout.leading_comments.push(comment.clone());
        }
    }
    layout.leading_comments.sort_by_key(|c| c.pos.start());

    if let (Some(last), Some(pos)) = (layout.leading_comments.last(), node.pos()) {
        if last.pos.end_row < pos.start_row {
            let mut row = last.pos.end_row + 1;
            while row < pos.start_row && index.is_blank(row) {
                layout.leading_gap_lines += 1;
                row += 1;
            }
        }
    }

    if node.is_comment_group() {
        let last_row = layout
            .leading_comments
            .last()
            .map(|c| c.pos.end_row)
            .or_else(|| node.pos().map(|p| p.end_row));
        if let Some(last_row) = last_row {
            let mut row = last_row + 1;
            while row < index.line_count() && index.is_blank(row) {
                layout.trailing_blank_lines_after_group += 1;
                row += 1;
            }
        }
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_syntax::parser::Parser;

    fn parse(source: &str) -> (Vec<Stmt>, LineIndex) {
        let (script, diags) = Parser::new(source).parse();
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        (script.statements, LineIndex::new(source))
    }

    #[test]
    fn test_normalize_splits_leading_and_inline() {
        let (stmts, index) = parse("# one\n# two\nadd 2 3  # note\n");
        let layout = normalize(&stmts[0], &index);
        assert_eq!(layout.leading_comments.len(), 2);
        assert_eq!(layout.leading_comments[0].text, "# one");
        assert_eq!(layout.inline_comment.as_ref().unwrap().text, "# note");
        assert_eq!(layout.leading_gap_lines, 0);
    }

    #[test]
    fn test_normalize_discards_blank_comment_text() {
        use quill_syntax::ast::{CommandStmt, CommentPos};
        use quill_syntax::span::CodePos;
        let stmt = Stmt::Command(CommandStmt {
            name: "tick".to_string(),
            args: vec![],
            pos: Some(CodePos::new(1, 0, 1, 3)),
            comments: Some(vec![CommentPos {
                text: "#   ".to_string(),
                pos: CodePos::new(0, 0, 0, 3),
                inline: false,
            }]),
            trailing_blank_lines: None,
        });
        let index = LineIndex::new("#   \ntick\n");
        let layout = normalize(&stmt, &index);
        assert!(layout.leading_comments.is_empty());
        assert!(layout.inline_comment.is_none());
    }

    #[test]
    fn test_normalize_counts_gap_lines() {
        // Force a gap by hand: a leading comment two blank rows above
        use quill_syntax::ast::{CommandStmt, CommentPos};
        use quill_syntax::span::CodePos;
        let stmt = Stmt::Command(CommandStmt {
            name: "tick".to_string(),
            args: vec![],
            pos: Some(CodePos::new(3, 0, 3, 3)),
            comments: Some(vec![CommentPos {
                text: "# lead".to_string(),
                pos: CodePos::new(0, 0, 0, 5),
                inline: false,
            }]),
            trailing_blank_lines: None,
        });
        let index = LineIndex::new("# lead\n\n\ntick\n");
        let layout = normalize(&stmt, &index);
        assert_eq!(layout.leading_gap_lines, 2);
    }

    #[test]
    fn test_normalize_group_trailing_blanks() {
        let (stmts, index) = parse("# banner\n\n\nadd 2 3\n");
        assert!(stmts[0].is_comment_group());
        let layout = normalize(&stmts[0], &index);
        assert_eq!(layout.trailing_blank_lines_after_group, 2);
    }
}
