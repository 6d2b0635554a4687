//! Error types and diagnostic reporting for TagScript.
//!
//! Parsing is permissive: a malformed line is skipped and recorded as a
//! warning [`Diagnostic`], and a malformed parameter block degrades to a
//! `{"raw": text}` value. Only a parser running in strict mode surfaces a
//! [`TagScriptError::ParseFailure`]. The remaining variants come from
//! reading source files, see [`crate::source`].
//!
//! Use [`ErrorReporter`] to print diagnostics with source context through
//! [ariadne](https://crates.io/crates/ariadne):
//!
//! ```rust,no_run
//! use tagscript_parser::{parse_with_diagnostics, ErrorReporter};
//!
//! let source = "IF ready\nTASK: ship\n";
//! let (_, diagnostics) = parse_with_diagnostics(source).unwrap();
//! let reporter = ErrorReporter::new("input.tag", source);
//! for diagnostic in &diagnostics {
//!     reporter.report(diagnostic).unwrap();
//! }
//! ```
//!
//! [`Diagnostic`]: crate::validation::Diagnostic

use crate::validation::{Diagnostic, Severity};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::PathBuf;
use thiserror::Error;

/// Errors visible to callers of the parser.
#[derive(Debug, Error)]
pub enum TagScriptError {
    #[error("input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("could not decode {} as {encoding}", path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("unsupported encoding: {name}")]
    UnsupportedEncoding { name: String },

    /// A strict parse hit a malformed line.
    #[error("parse failure at line {line}: {message}")]
    ParseFailure { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for TagScript operations.
pub type Result<T> = std::result::Result<T, TagScriptError>;

/// A malformed line. The scanner recovers from these by skipping the line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum LineError {
    #[error("IF condition must be followed by THEN on the same line")]
    MissingThen,

    #[error("expected FOR EACH <variable> IN <collection> DO")]
    MalformedForEach,

    #[error("expected CALL API <target> WITH <payload>")]
    MissingWith,

    #[error("API target '{target}' has no '.' separating service and endpoint")]
    MissingEndpoint { target: String },

    #[error("{keyword} requires a name")]
    MissingName { keyword: &'static str },
}

impl LineError {
    /// Stable diagnostic code.
    pub(crate) fn code(&self) -> &'static str {
        match self {
            LineError::MissingThen => "W_IF_SYNTAX",
            LineError::MalformedForEach => "W_FOR_SYNTAX",
            LineError::MissingWith => "W_API_SYNTAX",
            LineError::MissingEndpoint { .. } => "W_API_ENDPOINT",
            LineError::MissingName { .. } => "W_MISSING_NAME",
        }
    }

    pub(crate) fn hint(&self) -> Option<&'static str> {
        match self {
            LineError::MissingThen => {
                Some("write the whole condition on one line: IF <condition> THEN")
            }
            LineError::MissingEndpoint { .. } => Some("use service.endpoint, or an @reference"),
            _ => None,
        }
    }
}

/// Pretty-prints diagnostics against the source they came from.
pub struct ErrorReporter<'src> {
    source_name: String,
    source: &'src str,
}

impl<'src> ErrorReporter<'src> {
    /// Create a new error reporter.
    pub fn new(source_name: impl Into<String>, source: &'src str) -> Self {
        Self {
            source_name: source_name.into(),
            source,
        }
    }

    /// Report a diagnostic to stderr.
    pub fn report(&self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let span = diagnostic.span.clone().unwrap_or(0..0);

        let (kind, color) = match diagnostic.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut report = Report::build(kind, &self.source_name, span.start)
            .with_code(&diagnostic.code)
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((&self.source_name, span))
                    .with_color(color)
                    .with_message("here"),
            );

        if let Some(ref hint) = diagnostic.hint {
            report = report.with_help(hint);
        }

        report
            .finish()
            .eprint((&self.source_name, Source::from(self.source)))
    }

    /// Report every diagnostic in order.
    pub fn report_all<'a>(
        &self,
        diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
    ) -> std::io::Result<()> {
        for diagnostic in diagnostics {
            self.report(diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_error_messages_and_codes() {
        let err = LineError::MissingEndpoint {
            target: "weather".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API target 'weather' has no '.' separating service and endpoint"
        );
        assert_eq!(err.code(), "W_API_ENDPOINT");
        assert!(err.hint().is_some());
        assert_eq!(
            LineError::MissingName { keyword: "CLASS" }.to_string(),
            "CLASS requires a name"
        );
    }

    #[test]
    fn test_parse_failure_display() {
        let err = TagScriptError::ParseFailure {
            line: 4,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "parse failure at line 4: boom");
    }

    #[test]
    fn test_source_error_display() {
        let err = TagScriptError::Decode {
            path: PathBuf::from("input.tag"),
            encoding: "ascii",
        };
        assert_eq!(err.to_string(), "could not decode input.tag as ascii");
        let err = TagScriptError::FileNotFound {
            path: PathBuf::from("missing.tag"),
        };
        assert_eq!(err.to_string(), "input file not found: missing.tag");
    }
}
