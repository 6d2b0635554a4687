//! Semantic checks over parsed documents.
//!
//! Scanning never fails on its own; this module decides which documents are
//! acceptable. Errors mark a script that is missing one of its required
//! tags, warnings mark suspicious but usable input.
//!
//! | Code | Severity | Raised when |
//! |------|----------|-------------|
//! | `E_TASK`, `E_ACTION`, `E_GOAL` | error | the tag never appears |
//! | `W_UNDEFINED_CALL` | warning | `CALL f()` with no `DEFINE FUNCTION f` |
//! | `W_UNCLOSED` | warning | `IF`, `FOR EACH` or `ON ERROR` without `END` (from the scan) |
//!
//! Other `W_*` codes are emitted by the scanner for lines it had to skip.

use crate::ast::Document;
use serde::Serialize;
use std::ops::Range;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    /// 1-based line, when the diagnostic points at one.
    pub line: Option<usize>,
    /// Byte range into the source.
    pub span: Option<Range<usize>>,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            line: None,
            span: None,
            hint: None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(code, message)
        }
    }

    pub fn at(mut self, line: usize, span: Range<usize>) -> Self {
        self.line = Some(line);
        self.span = Some(span);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Sort diagnostics into errors and warnings, keeping their order.
    pub fn from_diagnostics(diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        let (errors, warnings) = diagnostics.into_iter().partition(Diagnostic::is_error);
        Self { errors, warnings }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors first, then warnings.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Semantic checks over a parsed document.
pub fn validate_document(document: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // Rule 1: every script states what it is for
    let required = [
        ("TASK", "E_TASK", document.task.is_empty()),
        ("ACTION", "E_ACTION", document.action.is_empty()),
        ("GOAL", "E_GOAL", document.goal.is_empty()),
    ];
    for (tag, code, missing) in required {
        if missing {
            diagnostics.push(
                Diagnostic::error(code, format!("Missing {}", tag))
                    .with_hint(format!("add a '{}: ...' line", tag)),
            );
        }
    }

    // Rule 2: CALL targets should be defined in the same script
    for call in &document.calls {
        if document.function(&call.target).is_none() {
            diagnostics.push(Diagnostic {
                line: Some(call.line),
                ..Diagnostic::warning(
                    "W_UNDEFINED_CALL",
                    format!("CALL target '{}' has no DEFINE FUNCTION", call.target),
                )
            });
        }
    }

    diagnostics
}

/// Combine scan-time diagnostics with the semantic checks.
pub fn validate(document: &Document, scan: &[Diagnostic]) -> ValidationReport {
    ValidationReport::from_diagnostics(scan.iter().cloned().chain(validate_document(document)))
}
