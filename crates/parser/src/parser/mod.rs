//! Line scanner for TagScript source.
//!
//! TagScript has no grammar for whole documents. The scanner walks the
//! source one physical line at a time, classifies each line by its leading
//! keyword and hands it to a handler. Handlers may claim more than one line
//! (class bodies, function bodies, multi-line parameter blocks); the scanner
//! always advances by at least one line, so every parse terminates.
//!
//! # Usage
//!
//! ```rust
//! use tagscript_parser::parser::TagScriptParser;
//!
//! let source = "TASK: summarize\nIF score > 10 THEN\nflag it\nEND\n";
//! let doc = TagScriptParser::new().parse(source).unwrap();
//! assert_eq!(doc.task, vec!["summarize"]);
//! assert_eq!(doc.if_blocks[0].then_body, "flag it\n");
//! ```
//!
//! # Recovery
//!
//! A malformed line (an `IF` without `THEN`, a `CALL API` without `WITH`) is
//! skipped and reported as a warning [`Diagnostic`]. Use
//! [`TagScriptParser::parse_with_diagnostics`] to receive them, or enable
//! [`ParserConfig::strict`] to turn the first one into an error.
//!
//! # Module Structure
//!
//! - `handlers` - One handler per keyword
//! - `conditions` - `IF` condition trees
//! - `references` - `@tool:`, `@file:`, `@project:`, `@db:` annotations
//! - `span` - Multi-line `{ ... }` parameter blocks
//! - `values` - Permissive value parsing

mod conditions;
mod handlers;
mod references;
mod span;
mod values;

pub use conditions::parse_condition;
pub use references::{resolve, Resolved};
pub use span::{read_block, Block};
pub use values::{coerce_scalar, parse_value, split_top_level, strip_quotes, MAX_NESTING_DEPTH};

use crate::ast::Document;
use crate::config::ParserConfig;
use crate::error::{LineError, Result, TagScriptError};
use crate::validation::Diagnostic;
use std::ops::Range;
use tracing::{debug, trace, warn};

// ============================================================================
// Keyword Dispatch
// ============================================================================

/// The keyword a line starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Task,
    Action,
    Goal,
    Class,
    DefineFunction,
    CallApi,
    Call,
    If,
    Else,
    End,
    Reference,
    ForEach,
    LoopGuard,
    OnError,
}

/// Prefix table, tried top to bottom. `CALL API` must precede `CALL`.
pub const DISPATCH_ORDER: [(&str, Keyword); 14] = [
    ("TASK:", Keyword::Task),
    ("ACTION:", Keyword::Action),
    ("GOAL:", Keyword::Goal),
    ("CLASS", Keyword::Class),
    ("DEFINE FUNCTION", Keyword::DefineFunction),
    ("CALL API", Keyword::CallApi),
    ("CALL", Keyword::Call),
    ("IF", Keyword::If),
    ("ELSE", Keyword::Else),
    ("END", Keyword::End),
    ("@", Keyword::Reference),
    ("FOR EACH", Keyword::ForEach),
    ("LOOPGUARD", Keyword::LoopGuard),
    ("ON ERROR", Keyword::OnError),
];

type Handler = fn(&mut ParseState, &Cursor<'_>) -> std::result::Result<usize, LineError>;

impl Keyword {
    /// Classify a trimmed line. `None` means the line is body text.
    ///
    /// ```rust
    /// use tagscript_parser::parser::Keyword;
    ///
    /// assert_eq!(Keyword::classify("CALL API svc.run WITH {}"), Some(Keyword::CallApi));
    /// assert_eq!(Keyword::classify("CALL notify()"), Some(Keyword::Call));
    /// assert_eq!(Keyword::classify("just text"), None);
    /// ```
    pub fn classify(line: &str) -> Option<Keyword> {
        DISPATCH_ORDER
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|&(_, keyword)| keyword)
    }

    fn handler(self) -> Handler {
        match self {
            Keyword::Task => handlers::task,
            Keyword::Action => handlers::action,
            Keyword::Goal => handlers::goal,
            Keyword::Class => handlers::class,
            Keyword::DefineFunction => handlers::function,
            Keyword::CallApi => handlers::call_api,
            Keyword::Call => handlers::call,
            Keyword::If => handlers::if_open,
            Keyword::Else => handlers::else_branch,
            Keyword::End => handlers::end,
            Keyword::Reference => handlers::reference,
            Keyword::ForEach => handlers::for_each,
            Keyword::LoopGuard => handlers::loop_guard,
            Keyword::OnError => handlers::on_error,
        }
    }
}

// ============================================================================
// Source Lines
// ============================================================================

/// Physical lines of the source with their byte offsets.
struct SourceLines<'src> {
    lines: Vec<&'src str>,
    offsets: Vec<usize>,
}

impl<'src> SourceLines<'src> {
    fn new(source: &'src str) -> Self {
        let mut lines = Vec::new();
        let mut offsets = Vec::new();
        let mut offset = 0;
        for line in source.split('\n') {
            offsets.push(offset);
            offset += line.len() + 1;
            lines.push(line.strip_suffix('\r').unwrap_or(line));
        }
        Self { lines, offsets }
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn span(&self, index: usize) -> Range<usize> {
        let start = self.offsets[index];
        start..start + self.lines[index].len()
    }

    fn cursor(&self, index: usize) -> Cursor<'_> {
        Cursor {
            line: index + 1,
            text: self.lines[index].trim(),
            following: &self.lines[index + 1..],
            span: self.span(index),
        }
    }
}

/// The line being dispatched.
pub(crate) struct Cursor<'a> {
    /// 1-based line number.
    pub line: usize,
    /// The line, trimmed.
    pub text: &'a str,
    /// Untrimmed lines after this one.
    pub following: &'a [&'a str],
    pub span: Range<usize>,
}

// ============================================================================
// Parse State
// ============================================================================

/// Which `IF` branch unmatched lines are appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CurrentBlock {
    None,
    IfThen,
    IfElse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    If,
    ForEach,
    OnError,
}

impl FrameKind {
    fn keyword(self) -> &'static str {
        match self {
            FrameKind::If => "IF",
            FrameKind::ForEach => "FOR EACH",
            FrameKind::OnError => "ON ERROR",
        }
    }
}

/// An open block waiting for its `END`.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub kind: FrameKind,
    pub line: usize,
    pub span: Range<usize>,
}

/// Mutable state for one parse call.
pub(crate) struct ParseState {
    pub config: ParserConfig,
    pub document: Document,
    pub block: CurrentBlock,
    pub stack: Vec<Frame>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseState {
    fn new(config: ParserConfig) -> Self {
        Self {
            config,
            document: Document::new(),
            block: CurrentBlock::None,
            stack: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record a warning against the cursor's line.
    pub fn warn(&mut self, cursor: &Cursor<'_>, code: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(line = cursor.line, code, "{}", message);
        self.diagnostics
            .push(Diagnostic::warning(code, message).at(cursor.line, cursor.span.clone()));
    }

    pub fn open(&mut self, kind: FrameKind, cursor: &Cursor<'_>) {
        self.stack.push(Frame {
            kind,
            line: cursor.line,
            span: cursor.span.clone(),
        });
    }

    fn skip(&mut self, cursor: &Cursor<'_>, err: &LineError) {
        warn!(line = cursor.line, code = err.code(), %err, "skipping malformed line");
        let mut diagnostic =
            Diagnostic::warning(err.code(), err.to_string()).at(cursor.line, cursor.span.clone());
        if let Some(hint) = err.hint() {
            diagnostic = diagnostic.with_hint(hint);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Unmatched lines belong to the current `IF` branch, if any.
    fn append_body(&mut self, cursor: &Cursor<'_>) {
        let target = match (self.block, self.document.if_blocks.last_mut()) {
            (CurrentBlock::IfThen, Some(block)) => &mut block.then_body,
            (CurrentBlock::IfElse, Some(block)) => block.else_body.get_or_insert_with(String::new),
            _ => {
                trace!(line = cursor.line, "dropping unmatched line");
                return;
            }
        };
        target.push_str(cursor.text);
        target.push('\n');
    }

    fn finish(mut self) -> (Document, Vec<Diagnostic>) {
        for frame in std::mem::take(&mut self.stack) {
            let message = format!(
                "{} opened on line {} has no END",
                frame.kind.keyword(),
                frame.line
            );
            self.diagnostics
                .push(Diagnostic::warning("W_UNCLOSED", message).at(frame.line, frame.span));
        }
        (self.document, self.diagnostics)
    }
}

// ============================================================================
// Parser
// ============================================================================

/// A configured TagScript parser.
///
/// Each call starts from fresh state, so one parser can be reused across
/// documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagScriptParser {
    config: ParserConfig,
}

impl TagScriptParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse source into a [`Document`], discarding warnings.
    pub fn parse(&self, source: &str) -> Result<Document> {
        self.parse_with_diagnostics(source).map(|(document, _)| document)
    }

    /// Parse source into a [`Document`] plus the warnings raised on the way.
    ///
    /// Fails only in strict mode, on the first malformed line.
    pub fn parse_with_diagnostics(&self, source: &str) -> Result<(Document, Vec<Diagnostic>)> {
        let lines = SourceLines::new(source);
        let mut state = ParseState::new(self.config);
        let mut index = 0;

        while index < lines.len() {
            let cursor = lines.cursor(index);
            if cursor.text.is_empty() || cursor.text.starts_with('#') {
                index += 1;
                continue;
            }

            let consumed = match Keyword::classify(cursor.text) {
                Some(keyword) => {
                    debug!(line = cursor.line, ?keyword, "dispatch");
                    match keyword.handler()(&mut state, &cursor) {
                        Ok(consumed) => consumed,
                        Err(err) if self.config.strict => {
                            return Err(TagScriptError::ParseFailure {
                                line: cursor.line,
                                message: err.to_string(),
                            });
                        }
                        Err(err) => {
                            state.skip(&cursor, &err);
                            1
                        }
                    }
                }
                None => {
                    state.append_body(&cursor);
                    1
                }
            };

            index += consumed.max(1);
        }

        let (document, diagnostics) = state.finish();
        debug!(summary = %document.summary(), warnings = diagnostics.len(), "parsed document");
        Ok((document, diagnostics))
    }
}

/// Parse source with the default configuration.
///
/// ```rust
/// let doc = tagscript_parser::parse("GOAL: ship it\nON ERROR\nEND\n").unwrap();
/// assert_eq!(doc.goal, vec!["ship it"]);
/// assert!(doc.error_handling);
/// ```
pub fn parse(source: &str) -> Result<Document> {
    TagScriptParser::new().parse(source)
}

/// Parse source with the default configuration, keeping warnings.
pub fn parse_with_diagnostics(source: &str) -> Result<(Document, Vec<Diagnostic>)> {
    TagScriptParser::new().parse_with_diagnostics(source)
}
