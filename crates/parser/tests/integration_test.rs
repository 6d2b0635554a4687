//! End-to-end tests: whole documents in, serialized JSON out.

use pretty_assertions::assert_eq;
use serde_json::json;
use tagscript_parser::{
    parse, parse_with_diagnostics, validate, MappingSplit, OperatorOrder, ParserConfig,
    TagScriptError, TagScriptParser,
};

const SALES_REPORT: &str = include_str!("fixtures/sales_report.tag");

fn to_json(source: &str) -> serde_json::Value {
    serde_json::to_value(parse(source).unwrap()).unwrap()
}

// =============================================================================
// Documents
// =============================================================================

#[test]
fn test_minimal_document_end_to_end() {
    let source = r#"TASK: summarize
ACTION: read file
@file:"/tmp/a.txt" { permission: "read" }
IF score > 10 THEN
flag it
END
"#;
    assert_eq!(
        to_json(source),
        json!({
            "task": ["summarize"],
            "action": ["read file"],
            "if_blocks": [{
                "condition": {
                    "type": "comparison",
                    "left": "score",
                    "operator": ">",
                    "right": "10"
                },
                "then": "flag it\n",
                "line": 4
            }],
            "llm_references": [{
                "type": "file",
                "path": "/tmp/a.txt",
                "parameters": {"permission": "read"}
            }]
        })
    );
}

#[test]
fn test_fixture_document() {
    let (doc, diagnostics) = parse_with_diagnostics(SALES_REPORT).unwrap();
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");

    let summary = doc.summary();
    assert_eq!(
        summary.entries().to_vec(),
        vec![
            ("task", 1),
            ("action", 1),
            ("goal", 1),
            ("classes", 1),
            ("functions", 1),
            ("calls", 1),
            ("if_blocks", 1),
            ("for_loop", 1),
            ("api_calls", 2),
            ("llm_references", 4),
            ("loop_guards", 1),
            ("error_handling", 1),
        ]
    );

    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(
        json["llm_references"][0],
        json!({
            "type": "tool",
            "tool": "google_drive",
            "parameters": {"action": "list_files", "folder": 123, "include": ["sheets", "docs"]}
        })
    );
    assert_eq!(
        json["llm_references"][3]["parameters"],
        json!({"query": "SELECT * FROM sales", "limit": 100})
    );
    assert_eq!(json["api_calls"][0]["type"], "llm_api");
    assert_eq!(json["api_calls"][1], json!({
        "type": "service",
        "service": "crm",
        "endpoint": "contacts",
        "payload": {"region": "EMEA"}
    }));
    assert_eq!(json["calls"][0], json!({"target": "summarize", "args": "region", "line": 28}));
    assert_eq!(
        json["for_loop"],
        json!({"variable": "region", "collection": "regions", "line": 27})
    );
    assert_eq!(
        json["if_blocks"][0],
        json!({
            "condition": {
                "type": "logical",
                "operator": "AND",
                "left": {"type": "comparison", "left": "total", "operator": ">=", "right": "10000"},
                "right": {"type": "comparison", "left": "region", "operator": "=", "right": "EMEA"}
            },
            "then": "highlight the region\n",
            "else": "list it normally\n",
            "line": 33
        })
    );
    assert_eq!(json["error_handling"], true);

    let report = validate(&doc, &diagnostics);
    assert!(report.is_ok());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_output_key_order_is_stable() {
    let json = parse(SALES_REPORT).unwrap().to_json(false).unwrap();
    let keys: Vec<&str> = [
        "\"task\"",
        "\"action\"",
        "\"goal\"",
        "\"classes\"",
        "\"functions\"",
        "\"calls\"",
        "\"if_blocks\"",
        "\"for_loop\"",
        "\"api_calls\"",
        "\"llm_references\"",
        "\"loop_guards\"",
        "\"error_handling\"",
    ]
    .into_iter()
    .filter(|key| json.contains(key))
    .collect();
    let positions: Vec<usize> = keys.iter().filter_map(|key| json.find(key)).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
    assert_eq!(keys.len(), 12);
}

#[test]
fn test_empty_input_is_empty_document() {
    assert_eq!(to_json(""), json!({}));
    assert_eq!(to_json("\n\n# only comments\n"), json!({}));
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_parsing_is_deterministic() {
    let first = parse(SALES_REPORT).unwrap();
    let second = parse(SALES_REPORT).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json(true).unwrap(), second.to_json(true).unwrap());
}

#[test]
fn test_reference_types_are_closed_set() {
    let source = "@tool:a\n@file:b\n@project:c\n@db:d\n@web:e\n@\n";
    let doc = parse(source).unwrap();
    let kinds: Vec<&str> = doc.llm_references.iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, vec!["tool", "file", "project", "database", "unknown", "unknown"]);
}

#[test]
fn test_loop_guard_coercion() {
    let json = to_json("LOOPGUARD max_depth: 3, allow_repeat: false\n");
    assert_eq!(json["loop_guards"], json!([{"max_depth": 3, "allow_repeat": false}]));
}

#[test]
fn test_parameter_block_spanning_lines_consumes_exactly_those_lines() {
    for n in 2..8 {
        let mut source = String::from("@tool:batch {\n");
        for i in 0..n - 2 {
            source.push_str(&format!("  key{i}: {{ inner: [{i}, {{ deep: {i} }}] }},\n"));
        }
        source.push_str("}\nTASK: after block\n");

        let doc = parse(&source).unwrap();
        let params = doc.llm_references[0].parameters().unwrap().as_mapping().unwrap();
        assert_eq!(params.len(), n - 2, "block of {n} lines");
        for i in 0..n - 2 {
            assert!(params.contains_key(&format!("key{i}")));
        }
        // the line right after the block is dispatched normally
        assert_eq!(doc.task, vec!["after block"]);
    }
}

#[test]
fn test_second_for_each_wins() {
    let json = to_json("FOR EACH a IN first DO x\nFOR EACH b IN second DO y\n");
    assert_eq!(json["for_loop"], json!({"variable": "b", "collection": "second", "line": 2}));
}

#[test]
fn test_greater_or_equal_under_both_operator_orders() {
    let source = "IF a >= 5 THEN\nEND\n";

    let default = to_json(source);
    assert_eq!(
        default["if_blocks"][0]["condition"],
        json!({"type": "comparison", "left": "a", "operator": ">=", "right": "5"})
    );

    let config = ParserConfig::new().with_operator_order(OperatorOrder::Legacy);
    let legacy = TagScriptParser::with_config(config).parse(source).unwrap();
    assert_eq!(
        serde_json::to_value(&legacy.if_blocks[0].condition).unwrap(),
        json!({"type": "comparison", "left": "a >", "operator": "=", "right": "5"})
    );
}

#[test]
fn test_mapping_split_compatibility() {
    let legacy = TagScriptParser::with_config(ParserConfig::legacy());
    let default = TagScriptParser::new();

    let flat = "@db:sales { query: \"SELECT 1\", limit: 10, ratio: 0.25 }\n";
    assert_eq!(legacy.parse(flat).unwrap(), default.parse(flat).unwrap());

    let nested = "@tool:drive { include: [\"a\", \"b\"], access: read }\n";
    let legacy_params = legacy.parse(nested).unwrap().llm_references[0].parameters().cloned();
    let default_params = default.parse(nested).unwrap().llm_references[0].parameters().cloned();
    assert_eq!(
        serde_json::to_value(legacy_params).unwrap(),
        json!({"include": "[\"a", "access": "read"})
    );
    assert_eq!(
        serde_json::to_value(default_params).unwrap(),
        json!({"include": ["a", "b"], "access": "read"})
    );

    let mapping_only = ParserConfig::new().with_mapping_split(MappingSplit::Legacy);
    assert_eq!(mapping_only.operator_order, OperatorOrder::LongestFirst);
}

#[test]
fn test_trailing_content_after_closing_brace_is_tolerated() {
    let source = "@tool:x {\n  a: 1\n} # trailing note\nTASK: next\n";
    let (doc, diagnostics) = parse_with_diagnostics(source).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(doc.llm_references.len(), 1);
    assert_eq!(doc.task, vec!["next"]);
    let params = doc.llm_references[0].parameters().unwrap();
    assert!(params.get("a").is_some());
}

#[test]
fn test_unclosed_block_consumes_rest_of_input() {
    let source = "@tool:x {\n  a: 1,\nTASK: swallowed\n";
    let (doc, diagnostics) = parse_with_diagnostics(source).unwrap();
    assert!(doc.task.is_empty());
    assert_eq!(diagnostics[0].code, "W_UNTERMINATED_BLOCK");
}

#[test]
fn test_malformed_value_never_fails_the_parse() {
    let deep = format!("@tool:x {{ a: {}1{} }}\n", "[".repeat(100), "]".repeat(100));
    let doc = parse(&deep).unwrap();
    let params = doc.llm_references[0].parameters().unwrap();
    assert!(params.get("raw").is_some());
}

// =============================================================================
// Strict mode
// =============================================================================

#[test]
fn test_strict_mode_aborts_on_malformed_line() {
    let strict = TagScriptParser::with_config(ParserConfig::new().with_strict(true));
    let err = strict.parse("TASK: ok\nFOR EACH x DO\n").unwrap_err();
    assert!(matches!(err, TagScriptError::ParseFailure { line: 2, .. }));
    assert_eq!(
        err.to_string(),
        "parse failure at line 2: expected FOR EACH <variable> IN <collection> DO"
    );

    // the same input parses permissively by default
    let doc = parse("TASK: ok\nFOR EACH x DO\n").unwrap();
    assert_eq!(doc.task, vec!["ok"]);
    assert!(doc.for_loop.is_none());
}
