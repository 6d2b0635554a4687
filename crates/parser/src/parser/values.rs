//! Permissive value parsing for parameter blocks and payloads.
//!
//! This is not a JSON parser. Keys need no quotes, values are coerced from
//! their text, and anything unexpected degrades instead of failing:
//!
//! | Input | Result |
//! |-------|--------|
//! | `{ a: 1, b: "x" }` | mapping `{a: 1, b: "x"}` |
//! | `[1, 2.5, "three"]` | sequence `[1, 2.5, "three"]` |
//! | `"42"` | integer `42` (quotes are stripped before coercion) |
//! | `1.2.3` | string `"1.2.3"` |
//!
//! Text that is not delimited at all is read as the body of a mapping, so a
//! payload of `city: Lisbon` still yields `{city: "Lisbon"}`.

use crate::ast::Value;
use crate::config::MappingSplit;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

/// Deepest nesting of `{}`/`[]` the parser descends into.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Error)]
enum ValueError {
    #[error("value nests deeper than {MAX_NESTING_DEPTH} levels")]
    TooDeep,
}

/// Parse a block of text into a [`Value`].
///
/// Never fails: on error the result is `{"raw": text}`.
pub fn parse_value(text: &str, split: MappingSplit) -> Value {
    match parse_block(text, split, 0) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "value fell back to raw text");
            Value::raw(text)
        }
    }
}

fn parse_block(text: &str, split: MappingSplit, depth: usize) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    if let Some(inner) = delimited(trimmed, '[', ']') {
        return parse_sequence(inner, split, depth);
    }
    let body = delimited(trimmed, '{', '}').unwrap_or(trimmed);
    parse_mapping(body, split, depth)
}

/// A nested value: delimited text recurses, anything else is a scalar.
fn parse_element(text: &str, split: MappingSplit, depth: usize) -> Result<Value, ValueError> {
    let trimmed = text.trim();
    if let Some(inner) = delimited(trimmed, '{', '}') {
        parse_mapping(inner, split, depth)
    } else if let Some(inner) = delimited(trimmed, '[', ']') {
        parse_sequence(inner, split, depth)
    } else {
        Ok(coerce_scalar(trimmed))
    }
}

fn parse_mapping(body: &str, split: MappingSplit, depth: usize) -> Result<Value, ValueError> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(ValueError::TooDeep);
    }

    let pairs = match split {
        MappingSplit::DepthAware => split_top_level(body),
        MappingSplit::Legacy => body.split(',').collect(),
    };

    let mut map = IndexMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let key = strip_quotes(key.trim()).to_string();
        map.insert(key, parse_element(value, split, depth + 1)?);
    }
    Ok(Value::Mapping(map))
}

fn parse_sequence(body: &str, split: MappingSplit, depth: usize) -> Result<Value, ValueError> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(ValueError::TooDeep);
    }

    split_top_level(body)
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .map(|item| parse_element(item, split, depth + 1))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Sequence)
}

/// The text between `open` and `close` when `text` starts and ends with them.
fn delimited(text: &str, open: char, close: char) -> Option<&str> {
    text.strip_prefix(open)?.strip_suffix(close)
}

/// Split on commas that sit outside every `{}` and `[]`.
///
/// A stray closer never drives the depth below zero, so unbalanced trailing
/// text still splits sensibly.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Remove one leading and one trailing double quote, when present.
pub fn strip_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

/// Integer when integral, float when it has a `.`, otherwise the unquoted string.
pub fn coerce_scalar(text: &str) -> Value {
    let s = strip_quotes(text.trim());
    if s.contains('.') {
        if let Ok(n) = s.parse::<f64>() {
            if n.is_finite() {
                return Value::Float(n);
            }
        }
    } else if let Ok(n) = s.parse::<i64>() {
        return Value::Integer(n);
    }
    Value::String(s.to_string())
}
