//! Patch planning
//!
//! The planner diffs a modified AST against a fresh reparse of the
//! original source, decides per node whether original bytes can be kept
//! or canonical text must be regenerated, and emits byte-range patches.
//! Node identity is positional: a modified node and an original node are
//! the same node iff their spans are exactly equal. Reordering unchanged
//! statements is therefore planned as delete+insert, not as a move.
//!
//! Edge policies that must agree with each other:
//! - deleted nodes take their attributed trailing blank lines with them;
//! - a node starting past the last line is appended at end of file;
//! - leading comments overlapping the statement's rows merge into one
//!   patch over the union range;
//! - decorated nodes always regenerate, the printer owns decorator
//!   placement;
//! - `comments: Some([])` requests stripping the node's existing comments.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use quill_syntax::ast::{same_shape, CommentPos, Stmt};
use quill_syntax::span::CodePos;

use crate::comments::{self, CommentLayout};
use crate::error::ParseError;
use crate::line_index::LineIndex;

/// A text-splice instruction: replace the half-open byte range
/// `start_offset..end_offset` of the original source with `replacement`.
/// Ephemeral, produced and consumed within one reconstruction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub start_offset: usize,
    pub end_offset: usize,
    pub replacement: String,
}

/// Context handed to the printer for one node
pub struct PrintContext<'a> {
    pub indent_level: usize,
    pub line_index: &'a LineIndex,
}

/// Source-to-AST collaborator.
///
/// Must be deterministic: the same source yields identical spans for
/// equivalent nodes, otherwise positional identity breaks down.
#[async_trait]
pub trait SourceParser: Send + Sync {
    async fn parse(&self, source: &str) -> Result<Vec<Stmt>, ParseError>;
}

/// Node-to-canonical-text collaborator.
///
/// `print_node` is pure (no access to original source bytes) and its
/// statement-level output ends with exactly one newline. The node's own
/// leading comments are not printed; its inline comment is, and nested
/// children print in full including their comments and blank lines.
pub trait NodePrinter: Send + Sync {
    fn print_node(&self, node: &Stmt, ctx: &PrintContext<'_>) -> Option<String>;
    fn print_comment(&self, comment: &CommentPos, indent_level: usize) -> String;
}

type NodeKey = (usize, usize, usize, usize);

/// Plans the patch list for one reconstruction call
pub struct PatchPlanner<'a> {
    source: &'a str,
    index: LineIndex,
    parser: &'a dyn SourceParser,
    printer: &'a dyn NodePrinter,
    original: Option<Vec<Stmt>>,
}

impl<'a> PatchPlanner<'a> {
    pub fn new(
        source: &'a str,
        parser: &'a dyn SourceParser,
        printer: &'a dyn NodePrinter,
    ) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            parser,
            printer,
            original: None,
        }
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Diff `modified` against the original AST and emit patches.
    ///
    /// The original AST is derived by awaiting the parser on first use
    /// and cached for the planner's lifetime; no patch is computed before
    /// that completes.
    pub async fn plan_patches(&mut self, modified: &[Stmt]) -> Result<Vec<Patch>, ParseError> {
        if self.original.is_none() {
            self.original = Some(self.parser.parse(self.source).await?);
        }
        let original = self.original.as_deref().unwrap_or(&[]);

        let mut by_key = HashMap::new();
        collect_by_key(original, &mut by_key);

        let pass = Pass {
            source: self.source,
            index: &self.index,
            printer: self.printer,
            by_key,
        };
        Ok(pass.plan(original, modified))
    }
}

/// Byte ranges of one statement.
///
/// `start..core_end` covers the statement text itself, through the end
/// of its last row (inline comment included). `start..end` additionally
/// covers the blank rows attributed to the statement and is the span the
/// emitted patch replaces.
struct StatementRange {
    start: usize,
    end: usize,
    core_end: usize,
    start_row: usize,
    start_col: usize,
}

/// One planning pass over the two ASTs
struct Pass<'a> {
    source: &'a str,
    index: &'a LineIndex,
    printer: &'a dyn NodePrinter,
    by_key: HashMap<NodeKey, &'a Stmt>,
}

impl<'a> Pass<'a> {
    fn plan(&self, original: &[Stmt], modified: &[Stmt]) -> Vec<Patch> {
        let mut patches = Vec::new();

        // Deletion pass: original nodes absent from the modified AST and
        // not overlapped by any modified node are spliced out whole.
        let modified_keys: HashSet<NodeKey> = modified
            .iter()
            .filter_map(|n| n.pos())
            .map(CodePos::key)
            .collect();
        for (j, node) in original.iter().enumerate() {
            let Some(pos) = node.pos() else { continue };
            if modified_keys.contains(&pos.key()) {
                continue;
            }
            if modified
                .iter()
                .filter_map(|n| n.pos())
                .any(|p| p.overlaps(pos))
            {
                continue;
            }
            let layout = comments::normalize(node, self.index);
            if let Some(range) = self.compute_statement_range(node, &layout, original.get(j + 1)) {
                patches.push(Patch {
                    start_offset: range.start,
                    end_offset: range.end,
                    replacement: String::new(),
                });
            }
        }

        // Per-node pass
        for (i, node) in modified.iter().enumerate() {
            let next = modified.get(i + 1);
            let prev = i.checked_sub(1).and_then(|j| modified.get(j));
            let is_last = i + 1 == modified.len();
            let Some(pos) = node.pos() else { continue };
            let layout = comments::normalize(node, self.index);

            if node.is_comment_group() {
                if pos.start_row >= self.index.line_count() {
                    self.plan_append(node, &layout, is_last, &mut patches);
                } else {
                    self.plan_statement(node, &layout, next, is_last, false, false, &mut patches);
                }
                continue;
            }

            // An explicit empty comment list asks for the node's existing
            // comments to be removed. Those comments no longer exist as
            // AST data, so the region is found by a pure text scan.
            let strip = matches!(node.comments(), Some([]));
            if strip {
                self.plan_comment_strip(pos, &mut patches);
            }

            if pos.start_row >= self.index.line_count() {
                self.plan_append(node, &layout, is_last, &mut patches);
                continue;
            }

            let merged = layout
                .leading_comments
                .last()
                .is_some_and(|c| c.pos.end_row >= pos.start_row);
            if !merged && !layout.leading_comments.is_empty() {
                self.plan_leading_comments(pos, &layout, prev, &mut patches);
            }
            self.plan_statement(node, &layout, next, is_last, merged, strip, &mut patches);
        }

        patches
    }

    /// Emit the patch for one statement body (plus its blank-line tail).
    /// With `include_leading` the node's leading comments join the same
    /// patch (their rows overlap the statement's rows, so separate
    /// patches would collide).
    #[allow(clippy::too_many_arguments)]
    fn plan_statement(
        &self,
        node: &Stmt,
        layout: &CommentLayout,
        next: Option<&Stmt>,
        is_last: bool,
        include_leading: bool,
        strip: bool,
        patches: &mut Vec<Patch>,
    ) {
        let Some(range) = self.compute_statement_range(node, layout, next) else {
            return;
        };

        let body = match self.extract_original_code(node, &range) {
            Some(text) if strip => cut_inline_comment(&text),
            Some(text) => text,
            None => {
                let ctx = PrintContext {
                    indent_level: 0,
                    line_index: self.index,
                };
                let Some(printed) = self.printer.print_node(node, &ctx) else {
                    return;
                };
                let mut text = String::new();
                if include_leading {
                    for comment in &layout.leading_comments {
                        text.push_str(&self.printer.print_comment(comment, 0));
                        text.push('\n');
                    }
                }
                text.push_str(&printed);
                self.reindent(&text, range.start_row, range.start_col)
            }
        };

        let mut replacement = body;
        replacement.push_str(&self.blank_suffix(node, layout, is_last));
        patches.push(Patch {
            start_offset: range.start,
            end_offset: range.end,
            replacement,
        });
    }

    /// Emit the patch for a leading-comment block: the comment rows plus
    /// the blank rows between them and the statement, and the blank rows
    /// above the block unless the previous sibling already claims those.
    /// The range ends at column 0 of the statement's row, so the
    /// statement's own indentation bytes stay untouched.
    fn plan_leading_comments(
        &self,
        node_pos: &CodePos,
        layout: &CommentLayout,
        prev: Option<&Stmt>,
        patches: &mut Vec<Patch>,
    ) {
        let Some(first) = layout.leading_comments.first() else {
            return;
        };

        let prev_claims = prev.is_some_and(|p| {
            p.is_comment_group() || self.effective_blank_lines(p).unwrap_or(0) > 0
        });
        let mut block_start_row = first.pos.start_row.min(self.index.line_count());
        let mut blanks_above = 0;
        if !prev_claims {
            while block_start_row > 0 && self.index.is_blank(block_start_row - 1) {
                block_start_row -= 1;
                blanks_above += 1;
            }
        }

        let mut replacement = String::new();
        for _ in 0..blanks_above {
            replacement.push('\n');
        }
        let comments = &layout.leading_comments;
        for (k, comment) in comments.iter().enumerate() {
            replacement.push_str(self.captured_indent(comment.pos.start_row, comment.pos.start_col));
            replacement.push_str(&comment.text);
            replacement.push('\n');
            if let Some(next_comment) = comments.get(k + 1) {
                let mut row = comment.pos.end_row + 1;
                while row < next_comment.pos.start_row && self.index.is_blank(row) {
                    replacement.push('\n');
                    row += 1;
                }
            }
        }
        for _ in 0..layout.leading_gap_lines {
            replacement.push('\n');
        }

        patches.push(Patch {
            start_offset: self.index.offset_at(block_start_row, 0, false),
            end_offset: self.index.offset_at(node_pos.start_row, 0, false),
            replacement,
        });
    }

    /// A node starting past the last line has no location in the original
    /// text: its range collapses to a zero-width point at end of file and
    /// its text is prefixed with one separating newline when the original
    /// content does not already end with one.
    fn plan_append(
        &self,
        node: &Stmt,
        layout: &CommentLayout,
        is_last: bool,
        patches: &mut Vec<Patch>,
    ) {
        let ctx = PrintContext {
            indent_level: 0,
            line_index: self.index,
        };
        let Some(body) = self.printer.print_node(node, &ctx) else {
            return;
        };

        let mut replacement = String::new();
        if !self.source.is_empty() && !self.index.ends_with_newline() {
            replacement.push('\n');
        }
        if !node.is_comment_group() {
            for comment in &layout.leading_comments {
                replacement.push_str(&self.printer.print_comment(comment, 0));
                replacement.push('\n');
            }
        }
        replacement.push_str(&body);
        replacement.push_str(&self.blank_suffix(node, layout, is_last));

        let eof = self.index.len();
        patches.push(Patch {
            start_offset: eof,
            end_offset: eof,
            replacement,
        });
    }

    /// Delete the comment lines directly above the node (scanning at most
    /// 10 rows). The node's own inline comment is removed by the
    /// statement patch itself, which covers the full line.
    fn plan_comment_strip(&self, pos: &CodePos, patches: &mut Vec<Patch>) {
        if pos.start_row >= self.index.line_count() {
            return;
        }
        let mut top = pos.start_row;
        let mut scanned = 0;
        while top > 0 && scanned < 10 {
            match self.index.get_line(top - 1) {
                Some(line) if line.trim_start().starts_with('#') => {
                    top -= 1;
                    scanned += 1;
                }
                _ => break,
            }
        }
        if top < pos.start_row {
            patches.push(Patch {
                start_offset: self.index.offset_at(top, 0, false),
                end_offset: self.index.offset_at(pos.start_row, 0, false),
                replacement: String::new(),
            });
        }
    }

    /// Compute the byte ranges of one statement, or `None` for a node
    /// without a span (skipped, never an error).
    ///
    /// The start is the node's own start, pulled back to the first
    /// decorator if decorators begin on an earlier row, pulled back
    /// further to the first leading comment when that block overlaps the
    /// statement's rows. The end is the node's last row (extended to an
    /// inline comment's row if later), then through the node's attributed
    /// blank rows, stopping at the next sibling's start row or end of
    /// file.
    fn compute_statement_range(
        &self,
        node: &Stmt,
        layout: &CommentLayout,
        next: Option<&Stmt>,
    ) -> Option<StatementRange> {
        let pos = node.pos()?;

        if pos.start_row >= self.index.line_count() {
            let eof = self.index.len();
            return Some(StatementRange {
                start: eof,
                end: eof,
                core_end: eof,
                start_row: pos.start_row,
                start_col: pos.start_col,
            });
        }

        let (mut start_row, mut start_col) = pos.start();
        if let Some(first) = node.decorators().first() {
            if first.pos.start() < (start_row, start_col) {
                (start_row, start_col) = first.pos.start();
            }
        }
        let overlapping = layout
            .leading_comments
            .last()
            .is_some_and(|c| c.pos.end_row >= pos.start_row);
        if overlapping {
            if let Some(first) = layout.leading_comments.first() {
                if first.pos.start() < (start_row, start_col) {
                    (start_row, start_col) = first.pos.start();
                }
            }
        }

        let mut end_row = pos.end_row;
        if let Some(inline) = &layout.inline_comment {
            if inline.pos.end() > pos.end() {
                end_row = inline.pos.end_row;
            }
        }
        let core_end = self.index.line_end_offset(end_row);

        if let Some(count) = self.attributed_blank_lines(node, layout) {
            let stop_row = next
                .and_then(|n| n.pos())
                .map(|p| p.start_row)
                .unwrap_or(usize::MAX);
            let mut remaining = count;
            let mut row = end_row + 1;
            while remaining > 0
                && row < self.index.line_count()
                && row < stop_row
                && self.index.is_blank(row)
            {
                end_row = row;
                row += 1;
                remaining -= 1;
            }
        }

        Some(StatementRange {
            start: self.index.offset_at(start_row, start_col, false),
            end: self.index.line_end_offset(end_row),
            core_end,
            start_row,
            start_col,
        })
    }

    /// Verbatim original bytes for the node's range, iff provably
    /// unchanged: a counterpart exists at the same span and the two nodes
    /// agree structurally (spans, comments and blank-line counts ignored;
    /// container children compared recursively). Decorated nodes are
    /// never extracted: canonical decorator placement belongs to the
    /// printer, not to raw source.
    fn extract_original_code(&self, node: &Stmt, range: &StatementRange) -> Option<String> {
        if !node.decorators().is_empty() {
            return None;
        }
        let pos = node.pos()?;
        let counterpart = *self.by_key.get(&pos.key())?;
        if !same_shape(node, counterpart) {
            return None;
        }
        self.source.get(range.start..range.core_end).map(str::to_string)
    }

    /// Re-indent regenerated text by the literal whitespace found before
    /// the node's first character in the original source. The first line
    /// is left alone: the patch range starts at the node's start column,
    /// so its original indentation bytes survive in place.
    fn reindent(&self, text: &str, row: usize, col: usize) -> String {
        let indent = self.captured_indent(row, col);
        if indent.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        for (i, line) in text.split_inclusive('\n').enumerate() {
            if i > 0 && !line.trim().is_empty() {
                out.push_str(indent);
            }
            out.push_str(line);
        }
        out
    }

    /// The whitespace preceding `(row, col)` on its line, or `""` when
    /// the row does not exist or non-whitespace precedes the column
    fn captured_indent(&self, row: usize, col: usize) -> &'a str {
        let Some(line) = self.index.get_line(row) else {
            return "";
        };
        // Columns come from node spans and may not land on a char
        // boundary of this line; back up rather than split a char.
        let mut end = col.min(line.len());
        while end > 0 && !line.is_char_boundary(end) {
            end -= 1;
        }
        let prefix = &line[..end];
        if prefix.trim().is_empty() {
            prefix
        } else {
            ""
        }
    }

    /// The node's blank-line count, falling back to its original
    /// counterpart at the same span
    fn effective_blank_lines(&self, node: &Stmt) -> Option<usize> {
        if let Some(count) = node.trailing_blank_lines() {
            return Some(count);
        }
        node.pos()
            .and_then(|p| self.by_key.get(&p.key()))
            .and_then(|original| original.trailing_blank_lines())
    }

    /// Like [`Self::effective_blank_lines`], with one more fallback for
    /// comment groups: a hand-built group carries no attributed count, so
    /// the blank rows measured after its last comment line stand in
    fn attributed_blank_lines(&self, node: &Stmt, layout: &CommentLayout) -> Option<usize> {
        if let Some(count) = self.effective_blank_lines(node) {
            return Some(count);
        }
        if node.is_comment_group() && layout.trailing_blank_lines_after_group > 0 {
            return Some(layout.trailing_blank_lines_after_group);
        }
        None
    }

    /// Newline suffix reproducing the node's attributed blank rows.
    ///
    /// For the last node the file-final newline is part of the extracted
    /// or printed body, so one count is folded away; a file without a
    /// final newline gets no suffix at all.
    fn blank_suffix(&self, node: &Stmt, layout: &CommentLayout, is_last: bool) -> String {
        let count = self.attributed_blank_lines(node, layout);
        if is_last {
            if !self.index.ends_with_newline() {
                return String::new();
            }
            match count {
                Some(count) if count > 1 => "\n".repeat(count - 1),
                _ => String::new(),
            }
        } else {
            match count {
                None | Some(0) => String::new(),
                Some(count) => "\n".repeat(count),
            }
        }
    }
}

/// Index statements (recursively) by their positional identity key
fn collect_by_key<'a>(nodes: &'a [Stmt], map: &mut HashMap<NodeKey, &'a Stmt>) {
    for node in nodes {
        if let Some(pos) = node.pos() {
            map.insert(pos.key(), node);
        }
        for list in node.child_lists() {
            collect_by_key(list, map);
        }
    }
}

/// Remove a trailing `#` comment from the first and last lines of `text`,
/// trimming the whitespace that separated it from the code.
///
/// The node's own inline comment sits on its start row for single-line
/// statements and on the closing `end` row for blocks; rows in between
/// belong to children, whose comments stay.
fn cut_inline_comment(text: &str) -> String {
    let cut = |line: &str| match comment_start_in_line(line) {
        Some(idx) => line[..idx].trim_end().to_string(),
        None => line.to_string(),
    };
    let parts: Vec<&str> = text.split_inclusive('\n').collect();
    let count = parts.len();
    let mut out = String::with_capacity(text.len());
    for (i, part) in parts.iter().enumerate() {
        if i == 0 || i + 1 == count {
            let (body, newline) = match part.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (*part, ""),
            };
            out.push_str(&cut(body));
            out.push_str(newline);
        } else {
            out.push_str(part);
        }
    }
    out
}

/// Byte index of the first `#` outside a string literal, if any
pub(crate) fn comment_start_in_line(line: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == '#' {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{QuillParser, QuillPrinter};
    use pretty_assertions::assert_eq;
    use quill_syntax::ast::{AssignStmt, CommandStmt, CommentGroupStmt, Expr};
    use quill_syntax::parser::Parser;

    async fn rebuild(source: &str, edit: impl FnOnce(&mut Vec<Stmt>)) -> String {
        let parser = QuillParser;
        let printer = QuillPrinter::default();
        let (script, diags) = Parser::new(source).parse();
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        let mut modified = script.statements;
        edit(&mut modified);
        let mut planner = PatchPlanner::new(source, &parser, &printer);
        let patches = planner.plan_patches(&modified).await.unwrap();
        crate::applier::apply(source, &patches)
    }

    #[tokio::test]
    async fn test_unmodified_ast_roundtrips() {
        let source = "# setup\nscore = 0\nadd score 10  # bump\n\nif score > 5\n    emit \"big\"\nend\n";
        assert_eq!(rebuild(source, |_| {}).await, source);
    }

    #[tokio::test]
    async fn test_modified_leaf_regenerates_one_statement() {
        let source = "keep 1\nx = 2\nkeep 3\n";
        let out = rebuild(source, |stmts| {
            if let Stmt::Assign(assign) = &mut stmts[1] {
                assign.value = Expr::Number {
                    lexeme: "9".to_string(),
                };
            }
        })
        .await;
        assert_eq!(out, "keep 1\nx = 9\nkeep 3\n");
    }

    #[tokio::test]
    async fn test_delete_takes_trailing_blanks() {
        let source = "one\n\n\ntwo\nthree\n";
        let out = rebuild(source, |stmts| {
            stmts.remove(0);
        })
        .await;
        assert_eq!(out, "two\nthree\n");
    }

    #[tokio::test]
    async fn test_append_after_newline_terminated_file() {
        let source = "one\n";
        let out = rebuild(source, |stmts| {
            stmts.push(Stmt::Command(CommandStmt {
                name: "two".to_string(),
                args: vec![],
                pos: Some(CodePos::new(10, 0, 10, 2)),
                comments: None,
                trailing_blank_lines: None,
            }));
        })
        .await;
        assert_eq!(out, "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_append_inserts_separator_when_newline_missing() {
        let source = "one";
        let out = rebuild(source, |stmts| {
            stmts.push(Stmt::Command(CommandStmt {
                name: "two".to_string(),
                args: vec![],
                pos: Some(CodePos::new(10, 0, 10, 2)),
                comments: None,
                trailing_blank_lines: None,
            }));
        })
        .await;
        assert_eq!(out, "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_strip_comments_signal() {
        let source = "# one\n# two\nadd 2 3  # note\nnext\n";
        let out = rebuild(source, |stmts| {
            if let Stmt::Command(command) = &mut stmts[0] {
                command.comments = Some(vec![]);
            }
        })
        .await;
        assert_eq!(out, "add 2 3\nnext\n");
    }

    #[tokio::test]
    async fn test_decorated_node_is_regenerated_not_extracted() {
        // Odd original decorator spacing collapses to canonical placement
        // even though the node is structurally unchanged.
        let source = "@throttle( 100 )\nfn f(a)\n    return a\nend\n";
        let out = rebuild(source, |_| {}).await;
        assert_eq!(out, "@throttle(100)\nfn f(a)\n    return a\nend\n");
    }

    #[tokio::test]
    async fn test_indented_statement_keeps_original_indentation() {
        let source = "scope\n  x = 1\nend\n";
        let out = rebuild(source, |stmts| {
            if let Stmt::Scope(scope) = &mut stmts[0] {
                if let Stmt::Assign(assign) = &mut scope.body[0] {
                    assign.value = Expr::Number {
                        lexeme: "2".to_string(),
                    };
                }
            }
        })
        .await;
        // Whole scope regenerates; its own indentation (none) is kept and
        // the body re-renders at canonical depth.
        assert_eq!(out, "scope\n    x = 2\nend\n");
    }

    #[tokio::test]
    async fn test_parse_error_propagates() {
        let parser = QuillParser;
        let printer = QuillPrinter::default();
        let mut planner = PatchPlanner::new("if\n", &parser, &printer);
        assert!(planner.plan_patches(&[]).await.is_err());
    }

    #[test]
    fn test_comment_start_respects_strings() {
        assert_eq!(comment_start_in_line("emit \"a # b\"  # real"), Some(14));
        assert_eq!(comment_start_in_line("emit \"a # b\""), None);
        assert_eq!(comment_start_in_line("# whole line"), Some(0));
        assert_eq!(comment_start_in_line("emit \"\\\" # still string\""), None);
    }

    #[test]
    fn test_cut_inline_comment_edge_rows_only() {
        assert_eq!(cut_inline_comment("add 2 3  # note\n"), "add 2 3\n");
        assert_eq!(
            cut_inline_comment("scope\n    tick\nend  # done\n"),
            "scope\n    tick\nend\n"
        );
        assert_eq!(
            cut_inline_comment("if x\n    tick  # keep\nend\n"),
            "if x\n    tick  # keep\nend\n"
        );
    }

    #[tokio::test]
    async fn test_strip_removes_block_end_inline_comment() {
        let source = "scope\n    tick\nend  # done\n";
        let out = rebuild(source, |stmts| {
            if let Stmt::Scope(scope) = &mut stmts[0] {
                scope.comments = Some(vec![]);
            }
        })
        .await;
        assert_eq!(out, "scope\n    tick\nend\n");
    }

    #[tokio::test]
    async fn test_strip_keeps_child_inline_comment() {
        let source = "scope\n    tick  # beat\nend  # done\n";
        let out = rebuild(source, |stmts| {
            if let Stmt::Scope(scope) = &mut stmts[0] {
                scope.comments = Some(vec![]);
            }
        })
        .await;
        assert_eq!(out, "scope\n    tick  # beat\nend\n");
    }

    #[tokio::test]
    async fn test_inserted_group_blank_tail_from_measured_rows() {
        // A hand-built group has no attributed blank-line count; the rows
        // measured after its comment must feed the range and suffix.
        let parser = QuillParser;
        let printer = QuillPrinter::default();
        let source = "tick\n\n\nbeep\n";
        let (script, diags) = Parser::new(source).parse();
        assert!(diags.is_empty());
        let mut modified = script.statements;
        modified.insert(
            1,
            Stmt::CommentGroup(CommentGroupStmt {
                pos: Some(CodePos::new(1, 0, 1, 4)),
                comments: Some(vec![CommentPos {
                    text: "# mid".to_string(),
                    pos: CodePos::new(1, 0, 1, 4),
                    inline: false,
                }]),
                trailing_blank_lines: None,
            }),
        );
        let mut planner = PatchPlanner::new(source, &parser, &printer);
        let patches = planner.plan_patches(&modified).await.unwrap();
        let group = patches
            .iter()
            .find(|p| p.replacement.starts_with("# mid"))
            .unwrap();
        assert_eq!(group.replacement, "# mid\n\n");
        assert_eq!((group.start_offset, group.end_offset), (5, 7));
    }

    #[tokio::test]
    async fn test_regenerated_span_inside_multibyte_char_plans() {
        let parser = QuillParser;
        let printer = QuillPrinter::default();
        let source = "say \"café\"\n";
        let modified = vec![Stmt::Command(CommandStmt {
            name: "beep".to_string(),
            args: vec![],
            pos: Some(CodePos::new(0, 9, 0, 10)),
            comments: None,
            trailing_blank_lines: None,
        })];
        let mut planner = PatchPlanner::new(source, &parser, &printer);
        let patches = planner.plan_patches(&modified).await.unwrap();
        assert_eq!(patches.len(), 1);
        assert!(patches[0].replacement.starts_with("beep"));
    }

    #[tokio::test]
    async fn test_unpositioned_node_is_skipped() {
        let source = "one\n";
        let out = rebuild(source, |stmts| {
            stmts.push(Stmt::Assign(AssignStmt {
                target: "x".to_string(),
                op: quill_syntax::ast::AssignOp::Set,
                value: Expr::Null,
                pos: None,
                comments: None,
                trailing_blank_lines: None,
            }));
        })
        .await;
        assert_eq!(out, "one\n");
    }
}
