//! # tagscript-parser
//!
//! A permissive parser for TagScript, a line-oriented language for
//! describing automation tasks: goals, conditionals, loops, references to
//! tools, files, projects and databases, and API calls.
//!
//! TagScript is written by people, not generated, so the parser tolerates
//! loose and partly malformed input. Lines it cannot use are skipped, and
//! parameter blocks it cannot read degrade to `{"raw": text}`.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagscript_parser::{parse, Reference};
//!
//! let source = r#"
//! TASK: summarize
//! ACTION: read file
//! @file:"/tmp/a.txt" { permission: "read" }
//! IF score > 10 THEN
//! flag it
//! END
//! "#;
//!
//! let doc = parse(source).unwrap();
//! assert_eq!(doc.task, vec!["summarize"]);
//! assert!(matches!(&doc.llm_references[0], Reference::File { path, .. } if path == "/tmp/a.txt"));
//! assert_eq!(doc.if_blocks[0].then_body, "flag it\n");
//! ```
//!
//! ## Language Overview
//!
//! | Line | Meaning |
//! |------|---------|
//! | `TASK:`, `ACTION:`, `GOAL:` | Tags; each may repeat |
//! | `CLASS Name` | Class with `key: value` property lines |
//! | `DEFINE FUNCTION name` | Function whose body may set TASK/ACTION/GOAL, up to `END` |
//! | `CALL name(args)` | Call site |
//! | `CALL API svc.endpoint WITH {..}` | API call; an `@` target is an LLM reference |
//! | `IF cond THEN` / `ELSE` / `END` | Conditional; body lines are kept as text |
//! | `@tool:`, `@file:`, `@project:`, `@db:` | References, optionally with `{ ... }` parameters |
//! | `FOR EACH x IN xs DO` | Loop; the last one in a document wins |
//! | `LOOPGUARD max_depth: 3` | Loop bounds |
//! | `ON ERROR` | Marks the document as handling errors |
//!
//! Blank lines and lines starting with `#` are ignored.
//!
//! ## Module Overview
//!
//! - [`ast`] - Document types, all serializable with serde
//! - [`parser`] - The line scanner and keyword handlers
//! - [`headers`] - chumsky grammars for single-line keyword headers
//! - [`config`] - Parser options, including the legacy behaviors
//! - [`validation`] - Diagnostics and semantic checks
//! - [`error`] - Error types with pretty printing via ariadne
//! - [`source`] - Reading source files in a named encoding
//!
//! ## Diagnostics
//!
//! ```rust
//! use tagscript_parser::{parse_with_diagnostics, validate};
//!
//! let source = "TASK: t\nACTION: a\nGOAL: g\nIF ready\nCALL missing()\n";
//! let (doc, diagnostics) = parse_with_diagnostics(source).unwrap();
//! assert_eq!(diagnostics[0].code, "W_IF_SYNTAX");
//!
//! let report = validate(&doc, &diagnostics);
//! assert!(report.is_ok());
//! assert_eq!(report.warnings.len(), 2);
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod headers;
pub mod parser;
pub mod source;
pub mod validation;

// Re-export commonly used types
pub use ast::{ApiCall, ConditionNode, Document, IfBlock, Reference, Summary, Value};
pub use config::{MappingSplit, OperatorOrder, ParserConfig};
pub use error::{ErrorReporter, TagScriptError};
pub use parser::{parse, parse_with_diagnostics, TagScriptParser};
pub use source::{read_source, Encoding};
pub use validation::{validate, validate_document, Diagnostic, Severity, ValidationReport};

/// Parse source and run every check on the result.
///
/// # Example
///
/// ```rust
/// let (doc, report) = tagscript_parser::validate_source("TASK: only a task\n").unwrap();
/// assert_eq!(doc.task.len(), 1);
/// assert!(!report.is_ok());
/// ```
pub fn validate_source(source: &str) -> error::Result<(Document, ValidationReport)> {
    let (document, diagnostics) = parse_with_diagnostics(source)?;
    let report = validate(&document, &diagnostics);
    Ok((document, report))
}
