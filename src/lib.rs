//! # tagscript
//!
//! Parse TagScript automation scripts into structured, JSON-serializable
//! documents.
//!
//! | Crate | Description |
//! |-------|-------------|
//! | [`tagscript-parser`](parser) | Line scanner, document model, diagnostics, validation |
//! | `tagscript-cli` | The `tagscript` command: TagScript file in, JSON file out |
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tagscript = "0.1"
//! ```
//!
//! ```rust
//! use tagscript::parse;
//!
//! let doc = parse("TASK: summarize\nFOR EACH doc IN docs DO\nEND\n").unwrap();
//! assert_eq!(doc.task, vec!["summarize"]);
//! assert_eq!(doc.for_loop.unwrap().collection, "docs");
//! ```

pub use tagscript_parser as parser;

pub use tagscript_parser::{
    parse, parse_with_diagnostics, validate, validate_source, Diagnostic, Document, ParserConfig,
    TagScriptError, TagScriptParser, ValidationReport,
};
