//! Document types produced by the TagScript parser.
//!
//! Every parse call yields one [`Document`]. All categories are optional:
//! empty collections, a missing `FOR EACH` and an unset error flag are left
//! out of the serialized form entirely.
//!
//! # Document Structure
//!
//! ```text
//! Document
//! ├── task / action / goal: Vec<String>   (TASK:, ACTION:, GOAL: lines)
//! ├── classes: Vec<ClassDef>              (CLASS blocks)
//! ├── functions: Vec<FunctionDef>         (DEFINE FUNCTION blocks)
//! ├── calls: Vec<CallSite>                (CALL name(args))
//! ├── if_blocks: Vec<IfBlock>             (IF ... THEN / ELSE / END)
//! ├── for_loop: Option<ForLoop>           (last FOR EACH wins)
//! ├── api_calls: Vec<ApiCall>             (CALL API ... WITH ...)
//! ├── llm_references: Vec<Reference>      (@tool:, @file:, @project:, @db:)
//! ├── loop_guards: Vec<LoopGuard>         (LOOPGUARD)
//! └── error_handling: bool                (ON ERROR)
//! ```
//!
//! # Serialization
//!
//! ```rust
//! use tagscript_parser::parse;
//!
//! let doc = parse("TASK: summarize\n").unwrap();
//! let json = serde_json::to_value(&doc).unwrap();
//! assert_eq!(json["task"][0], "summarize");
//! assert!(json.get("if_blocks").is_none());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Top-Level Document
// ============================================================================

/// A fully assembled TagScript document.
///
/// Returned by [`crate::parse()`]. Entities are appended in source order while
/// the scanner walks the input once; only the bodies of the current
/// [`IfBlock`] keep growing after creation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// `TASK:` lines, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task: Vec<String>,

    /// `ACTION:` lines, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action: Vec<String>,

    /// `GOAL:` lines, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goal: Vec<String>,

    /// `CLASS` declarations with their `key: value` properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassDef>,

    /// `DEFINE FUNCTION` declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionDef>,

    /// Plain `CALL name(args)` sites.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallSite>,

    /// Conditional blocks. Nesting is not modeled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_blocks: Vec<IfBlock>,

    /// The last `FOR EACH` header seen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_loop: Option<ForLoop>,

    /// `CALL API` invocations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_calls: Vec<ApiCall>,

    /// Standalone `@` references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub llm_references: Vec<Reference>,

    /// `LOOPGUARD` directives.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loop_guards: Vec<LoopGuard>,

    /// Set when any `ON ERROR` line was seen.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error_handling: bool,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no category holds anything.
    pub fn is_empty(&self) -> bool {
        self.summary().total() == 0
    }

    /// Count the entries of every category.
    ///
    /// ```rust
    /// use tagscript_parser::parse;
    ///
    /// let doc = parse("TASK: a\nTASK: b\n@tool:search\n").unwrap();
    /// let summary = doc.summary();
    /// assert_eq!(summary.task, 2);
    /// assert_eq!(summary.llm_references, 1);
    /// ```
    pub fn summary(&self) -> Summary {
        Summary {
            task: self.task.len(),
            action: self.action.len(),
            goal: self.goal.len(),
            classes: self.classes.len(),
            functions: self.functions.len(),
            calls: self.calls.len(),
            if_blocks: self.if_blocks.len(),
            for_loop: usize::from(self.for_loop.is_some()),
            api_calls: self.api_calls.len(),
            llm_references: self.llm_references.len(),
            loop_guards: self.loop_guards.len(),
            error_handling: usize::from(self.error_handling),
        }
    }

    /// Look up a function definition by name.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Serialize to JSON text, indented with two spaces when `pretty`.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Per-category entry counts of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub task: usize,
    pub action: usize,
    pub goal: usize,
    pub classes: usize,
    pub functions: usize,
    pub calls: usize,
    pub if_blocks: usize,
    pub for_loop: usize,
    pub api_calls: usize,
    pub llm_references: usize,
    pub loop_guards: usize,
    pub error_handling: usize,
}

impl Summary {
    /// Sum over all categories.
    pub fn total(&self) -> usize {
        self.entries().iter().map(|(_, n)| n).sum()
    }

    /// Category names paired with their counts, in output order.
    pub fn entries(&self) -> [(&'static str, usize); 12] {
        [
            ("task", self.task),
            ("action", self.action),
            ("goal", self.goal),
            ("classes", self.classes),
            ("functions", self.functions),
            ("calls", self.calls),
            ("if_blocks", self.if_blocks),
            ("for_loop", self.for_loop),
            ("api_calls", self.api_calls),
            ("llm_references", self.llm_references),
            ("loop_guards", self.loop_guards),
            ("error_handling", self.error_handling),
        ]
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries()
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(name, n)| format!("{}: {}", name, n))
            .collect();
        if parts.is_empty() {
            write!(f, "empty document")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A `CLASS` declaration.
///
/// # TagScript Syntax
///
/// ```text
/// CLASS Report
/// title: Monthly sales
/// format: pdf
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    /// Ordered properties; a repeated key keeps its first position and its last value.
    pub properties: IndexMap<String, String>,
    /// 1-based line of the `CLASS` header.
    pub line: usize,
}

/// A `DEFINE FUNCTION` declaration.
///
/// Only the tag lines inside the body are kept; the last occurrence of each wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub line: usize,
}

/// A plain `CALL name(args)` site. Arguments are kept as raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub target: String,
    pub args: String,
    pub line: usize,
}

// ============================================================================
// Control Flow
// ============================================================================

/// A conditional block.
///
/// Body lines that no keyword claims are appended, newline-terminated, to
/// `then` or `else` while the block is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfBlock {
    pub condition: ConditionNode,
    #[serde(rename = "then")]
    pub then_body: String,
    /// `None` until an `ELSE` line is seen.
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub else_body: Option<String>,
    pub line: usize,
}

impl IfBlock {
    pub fn new(condition: ConditionNode, line: usize) -> Self {
        Self {
            condition,
            then_body: String::new(),
            else_body: None,
            line,
        }
    }
}

/// A `FOR EACH <variable> IN <collection> DO` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForLoop {
    pub variable: String,
    pub collection: String,
    pub line: usize,
}

/// A parsed `IF` condition.
///
/// | Variant | Example |
/// |---------|---------|
/// | `Logical` | `a > 1 AND b < 2`, `NOT done` |
/// | `Comparison` | `score >= 10`, `tag IN labels` |
/// | `FunctionCall` | `is_ready(job, 3)` |
/// | `Raw` | anything else |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionNode {
    Logical {
        operator: LogicalOp,
        left: Box<ConditionNode>,
        /// Absent for unary `NOT`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        right: Option<Box<ConditionNode>>,
    },
    Comparison {
        left: String,
        operator: CompareOp,
        right: String,
    },
    FunctionCall {
        name: String,
        args: Vec<String>,
    },
    Raw {
        text: String,
    },
}

impl ConditionNode {
    /// Shorthand for a comparison node.
    ///
    /// ```rust
    /// use tagscript_parser::ast::{CompareOp, ConditionNode};
    ///
    /// let node = ConditionNode::comparison("score", CompareOp::Gt, "10");
    /// assert!(matches!(node, ConditionNode::Comparison { operator: CompareOp::Gt, .. }));
    /// ```
    pub fn comparison(
        left: impl Into<String>,
        operator: CompareOp,
        right: impl Into<String>,
    ) -> Self {
        ConditionNode::Comparison {
            left: left.into(),
            operator,
            right: right.into(),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        ConditionNode::Raw { text: text.into() }
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "NOT")]
    Not,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
            LogicalOp::Not => "NOT",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq, // =
    #[serde(rename = "!=")]
    Ne, // !=
    #[serde(rename = "<")]
    Lt, // <
    #[serde(rename = ">")]
    Gt, // >
    #[serde(rename = "<=")]
    Le, // <=
    #[serde(rename = ">=")]
    Ge, // >=
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "CONTAINS")]
    Contains,
}

impl CompareOp {
    /// The operator's literal source text.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::In => "IN",
            CompareOp::Contains => "CONTAINS",
        }
    }

    /// Word operators are spelled with letters rather than symbols.
    pub fn is_word(&self) -> bool {
        matches!(self, CompareOp::In | CompareOp::Contains)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// References and API Calls
// ============================================================================

/// An `@`-prefixed resource annotation.
///
/// # TagScript Syntax
///
/// ```text
/// @tool:google_drive { action: "list_files", folder: "123" }
/// @file:"/data/sales.csv" { permission: "read", format: "csv" }
/// @project:analytics_dashboard
/// @db:sales_database { query: "SELECT * FROM sales" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Reference {
    Tool {
        tool: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<Value>,
    },
    File {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<Value>,
    },
    Project {
        project: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<Value>,
    },
    Database {
        database: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parameters: Option<Value>,
    },
    Unknown {
        content: String,
    },
}

impl Reference {
    /// The serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Reference::Tool { .. } => "tool",
            Reference::File { .. } => "file",
            Reference::Project { .. } => "project",
            Reference::Database { .. } => "database",
            Reference::Unknown { .. } => "unknown",
        }
    }

    /// The tool name, path, project or database name. `None` for unknown references.
    pub fn target(&self) -> Option<&str> {
        match self {
            Reference::Tool { tool: name, .. }
            | Reference::File { path: name, .. }
            | Reference::Project { project: name, .. }
            | Reference::Database { database: name, .. } => Some(name.as_str()),
            Reference::Unknown { .. } => None,
        }
    }

    pub fn parameters(&self) -> Option<&Value> {
        match self {
            Reference::Tool { parameters, .. }
            | Reference::File { parameters, .. }
            | Reference::Project { parameters, .. }
            | Reference::Database { parameters, .. } => parameters.as_ref(),
            Reference::Unknown { .. } => None,
        }
    }
}

/// A `CALL API <target> WITH <payload>` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiCall {
    /// The target contained `@` and was resolved as a reference.
    LlmApi { reference: Reference, payload: Value },
    /// `service.endpoint`, split on the first `.`.
    Service {
        service: String,
        endpoint: String,
        payload: Value,
    },
}

/// A `LOOPGUARD` directive. Recognized keys are `max_depth` and `allow_repeat`,
/// but any key is kept.
pub type LoopGuard = IndexMap<String, Value>;

// ============================================================================
// Values
// ============================================================================

/// A permissively parsed parameter value.
///
/// Serialized untagged, so a [`Value::Mapping`] becomes a JSON object and a
/// [`Value::Integer`] a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// The fallback produced when a chunk of text cannot be parsed: `{"raw": text}`.
    pub fn raw(text: impl Into<String>) -> Self {
        let mut map = IndexMap::new();
        map.insert("raw".to_string(), Value::String(text.into()));
        Value::Mapping(map)
    }

    /// An empty mapping.
    pub fn empty_mapping() -> Self {
        Value::Mapping(IndexMap::new())
    }

    /// Look up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_mapping(self) -> Option<IndexMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_document_serializes_to_empty_object() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({}));
    }

    #[test]
    fn test_reference_serialization_shape() {
        let mut params = IndexMap::new();
        params.insert("permission".to_string(), Value::from("read"));
        let r = Reference::File {
            path: "/tmp/a.txt".to_string(),
            parameters: Some(Value::Mapping(params)),
        };
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"type": "file", "path": "/tmp/a.txt", "parameters": {"permission": "read"}})
        );

        let bare = Reference::Tool {
            tool: "search".to_string(),
            parameters: None,
        };
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!({"type": "tool", "tool": "search"}));
    }

    #[test]
    fn test_condition_serialization_uses_operator_text() {
        let node = ConditionNode::Logical {
            operator: LogicalOp::Not,
            left: Box::new(ConditionNode::comparison("a", CompareOp::Ge, "5")),
            right: None,
        };
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "logical",
                "operator": "NOT",
                "left": {"type": "comparison", "left": "a", "operator": ">=", "right": "5"}
            })
        );
    }

    #[test]
    fn test_if_block_omits_missing_else() {
        let block = IfBlock::new(ConditionNode::raw("ready"), 3);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["then"], "");
        assert!(json.get("else").is_none());
    }

    #[test]
    fn test_value_roundtrip_through_json() {
        let value = Value::Sequence(vec![
            Value::Integer(1),
            Value::Float(2.5),
            Value::from("x"),
            Value::Bool(true),
        ]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"[1,2.5,"x",true]"#);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_value_accessors_on_parsed_parameters() {
        let source =
            "@db:sales { tags: [a, b], limit: 10, ratio: 0.25 }\nLOOPGUARD allow_repeat: false\n";
        let doc = crate::parse(source).unwrap();
        let params = doc.llm_references[0].parameters().unwrap();

        let tags: Vec<&str> = params
            .get("tags")
            .and_then(Value::as_sequence)
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(params.get("limit").and_then(Value::as_i64), Some(10));
        assert_eq!(params.get("limit").and_then(Value::as_f64), Some(10.0));
        assert_eq!(params.get("ratio").and_then(Value::as_f64), Some(0.25));
        assert_eq!(params.get("ratio").and_then(Value::as_i64), None);
        assert_eq!(params.get("tags").and_then(Value::as_bool), None);

        let guard = &doc.loop_guards[0];
        assert_eq!(guard.get("allow_repeat").and_then(Value::as_bool), Some(false));
    }

    #[test]
    fn test_summary_display_skips_empty_categories() {
        let mut doc = Document::new();
        doc.task.push("a".to_string());
        doc.error_handling = true;
        assert_eq!(doc.summary().to_string(), "task: 1, error_handling: 1");
        assert_eq!(Document::new().summary().to_string(), "empty document");
    }
}
