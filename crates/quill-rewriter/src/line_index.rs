//! Row/column to byte-offset conversion
//!
//! A [`LineIndex`] is built once per source string and never mutated. It
//! precomputes per-row start offsets so every position query is O(1).
//! Lines are split on `\n` only; `\r` is not special-cased and remains
//! embedded in line text if present.

/// Precomputed line table for one source string
#[derive(Debug, Clone)]
pub struct LineIndex {
    lines: Vec<String>,
    line_starts: Vec<usize>,
    len: usize,
    ends_with_newline: bool,
}

impl LineIndex {
    /// Build the index for a source string
    pub fn new(source: &str) -> Self {
        let ends_with_newline = source.ends_with('\n');
        let mut lines: Vec<String> = source.split('\n').map(String::from).collect();
        if ends_with_newline {
            lines.pop();
        }
        if source.is_empty() {
            lines.clear();
        }

        let mut line_starts = Vec::with_capacity(lines.len());
        let mut offset = 0;
        for line in &lines {
            line_starts.push(offset);
            offset += line.len() + 1;
        }

        Self {
            lines,
            line_starts,
            len: source.len(),
            ends_with_newline,
        }
    }

    /// Number of lines (a trailing newline does not start a new line)
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total source length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the source ends with `\n`
    pub fn ends_with_newline(&self) -> bool {
        self.ends_with_newline
    }

    /// Text of one row, without its newline
    pub fn get_line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(|s| s.as_str())
    }

    /// All rows
    pub fn get_lines(&self) -> &[String] {
        &self.lines
    }

    /// True when the row is terminated by `\n`. Every row except possibly
    /// the last is; the last row only if the source ends with `\n`.
    pub fn has_newline(&self, row: usize) -> bool {
        row + 1 < self.lines.len() || (row + 1 == self.lines.len() && self.ends_with_newline)
    }

    /// True when the row contains only whitespace
    pub fn is_blank(&self, row: usize) -> bool {
        self.get_line(row).is_some_and(|l| l.trim().is_empty())
    }

    /// Byte offset of `(row, col)`.
    ///
    /// Rows past the end clamp to end-of-file; columns past the line's
    /// length clamp to the line's length. With `exclusive` the returned
    /// offset is one past the given column, or one past the row's newline
    /// when `col` is at or beyond end-of-line.
    pub fn offset_at(&self, row: usize, col: usize, exclusive: bool) -> usize {
        if row >= self.lines.len() {
            return self.len;
        }
        let line_len = self.lines[row].len();
        if exclusive && col >= line_len {
            return self.line_end_offset(row);
        }
        let clamped = col.min(line_len);
        let base = self.line_starts[row] + clamped;
        if exclusive {
            base + 1
        } else {
            base
        }
    }

    /// Offset immediately after the row's newline (or end-of-file when the
    /// last row has no trailing newline)
    pub fn line_end_offset(&self, row: usize) -> usize {
        if row >= self.lines.len() {
            return self.len;
        }
        let end = self.line_starts[row] + self.lines[row].len();
        if self.has_newline(row) {
            end + 1
        } else {
            end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count_with_trailing_newline() {
        assert_eq!(LineIndex::new("a\nb\n").line_count(), 2);
        assert_eq!(LineIndex::new("a\nb").line_count(), 2);
        assert_eq!(LineIndex::new("").line_count(), 0);
    }

    #[test]
    fn test_offset_at_basic() {
        let index = LineIndex::new("add 2 3\nsub 1\n");
        assert_eq!(index.offset_at(0, 0, false), 0);
        assert_eq!(index.offset_at(0, 4, false), 4);
        assert_eq!(index.offset_at(1, 0, false), 8);
    }

    #[test]
    fn test_offset_at_exclusive() {
        let index = LineIndex::new("add\nsub\n");
        // one past the column
        assert_eq!(index.offset_at(0, 2, true), 3);
        // at/after end-of-line: one past the newline
        assert_eq!(index.offset_at(0, 3, true), 4);
        assert_eq!(index.offset_at(0, 99, true), 4);
    }

    #[test]
    fn test_offset_clamps() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.offset_at(99, 0, false), 6);
        assert_eq!(index.offset_at(0, 99, false), 2);
    }

    #[test]
    fn test_line_end_offset() {
        let with_newline = LineIndex::new("ab\ncd\n");
        assert_eq!(with_newline.line_end_offset(0), 3);
        assert_eq!(with_newline.line_end_offset(1), 6);
        let without = LineIndex::new("ab\ncd");
        assert_eq!(without.line_end_offset(1), 5);
        assert_eq!(without.line_end_offset(99), 5);
    }

    #[test]
    fn test_has_newline() {
        let index = LineIndex::new("ab\ncd");
        assert!(index.has_newline(0));
        assert!(!index.has_newline(1));
        let terminated = LineIndex::new("ab\ncd\n");
        assert!(terminated.has_newline(1));
    }

    #[test]
    fn test_blank_rows() {
        let index = LineIndex::new("a\n\n  \nb\n");
        assert!(!index.is_blank(0));
        assert!(index.is_blank(1));
        assert!(index.is_blank(2));
        assert!(!index.is_blank(3));
    }
}
