//! Source positions
//!
//! Quill positions are row/column based: every node records the 0-indexed
//! row and column of its first character and of its last character
//! (`end_col` is inclusive of the node's own final character).

use serde::{Deserialize, Serialize};

/// Source span of a token, statement, comment, or decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodePos {
    /// Row of the first character (0-indexed)
    pub start_row: usize,
    /// Column of the first character (0-indexed)
    pub start_col: usize,
    /// Row of the last character (0-indexed)
    pub end_row: usize,
    /// Column of the last character (0-indexed, inclusive)
    pub end_col: usize,
}

impl CodePos {
    /// Create a new span
    pub fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    /// Span covering a single character
    pub fn at(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    /// Identity key for positional node matching.
    ///
    /// Two statements are "the same node" iff their keys are equal; there
    /// is no other identity mechanism.
    pub fn key(&self) -> (usize, usize, usize, usize) {
        (self.start_row, self.start_col, self.end_row, self.end_col)
    }

    /// Start position as an ordered (row, col) pair
    pub fn start(&self) -> (usize, usize) {
        (self.start_row, self.start_col)
    }

    /// End position as an ordered (row, col) pair
    pub fn end(&self) -> (usize, usize) {
        (self.end_row, self.end_col)
    }

    /// Merge two spans into one covering both
    pub fn merge(&self, other: CodePos) -> CodePos {
        let start = self.start().min(other.start());
        let end = self.end().max(other.end());
        CodePos::new(start.0, start.1, end.0, end.1)
    }

    /// Row/col interval overlap test (both ends inclusive)
    pub fn overlaps(&self, other: &CodePos) -> bool {
        self.start() <= other.end() && other.start() <= self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality_is_positional() {
        let a = CodePos::new(1, 0, 1, 7);
        let b = CodePos::new(1, 0, 1, 7);
        let c = CodePos::new(2, 0, 2, 7);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_merge_orders_endpoints() {
        let a = CodePos::new(3, 4, 3, 9);
        let b = CodePos::new(1, 0, 2, 5);
        assert_eq!(a.merge(b), CodePos::new(1, 0, 3, 9));
    }

    #[test]
    fn test_overlap_same_row() {
        let a = CodePos::new(0, 0, 0, 4);
        let b = CodePos::new(0, 4, 0, 9);
        let c = CodePos::new(0, 5, 0, 9);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_overlap_multi_row() {
        let a = CodePos::new(0, 0, 3, 2);
        let b = CodePos::new(2, 0, 5, 0);
        let c = CodePos::new(4, 0, 5, 0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
