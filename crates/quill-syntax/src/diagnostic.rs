//! Diagnostic system for errors and warnings
//!
//! All lexer and parser errors flow through the unified Diagnostic type,
//! ensuring consistent formatting across tooling.

use crate::span::CodePos;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Fatal error that prevents parsing
    Error,
    /// Warning that doesn't prevent parsing
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message (error or warning)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Error code (e.g., "QL0001")
    pub code: String,
    /// Main diagnostic message
    pub message: String,
    /// Source location, when known
    pub pos: Option<CodePos>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: impl Into<String>, message: impl Into<String>, pos: CodePos) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: code.into(),
            message: message.into(),
            pos: Some(pos),
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: impl Into<String>, message: impl Into<String>, pos: CodePos) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            code: code.into(),
            message: message.into(),
            pos: Some(pos),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(
                f,
                "{}[{}]: {} at {}:{}",
                self.level,
                self.code,
                self.message,
                pos.start_row + 1,
                pos.start_col + 1
            ),
            None => write!(f, "{}[{}]: {}", self.level, self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_based() {
        let diag = Diagnostic::error("QL0001", "unexpected token", CodePos::at(0, 4));
        assert_eq!(
            diag.to_string(),
            "error[QL0001]: unexpected token at 1:5"
        );
    }
}
