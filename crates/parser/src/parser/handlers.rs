//! Keyword handlers.
//!
//! Each handler reads the dispatched line (and possibly the lines after it),
//! updates the parse state and returns how many physical lines it claimed.
//! A handler that returns an error leaves the state untouched.

use super::conditions::parse_condition;
use super::references::resolve;
use super::span::read_block;
use super::values::{coerce_scalar, parse_value};
use super::{Cursor, CurrentBlock, FrameKind, ParseState};
use crate::ast::{
    ApiCall, CallSite, ClassDef, ForLoop, FunctionDef, IfBlock, LoopGuard, Reference, Value,
};
use crate::error::LineError;
use crate::headers;
use indexmap::IndexMap;

type Consumed = Result<usize, LineError>;

/// Prefixes that end a class body.
const CLASS_STOPS: [&str; 6] = ["TASK:", "ACTION:", "GOAL:", "IF", "ELSE", "END"];

fn after<'a>(text: &'a str, prefix: &str) -> &'a str {
    text.strip_prefix(prefix).unwrap_or(text).trim()
}

// ============================================================================
// Tags
// ============================================================================

pub(super) fn task(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    state.document.task.push(after(cursor.text, "TASK:").to_string());
    Ok(1)
}

pub(super) fn action(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    state.document.action.push(after(cursor.text, "ACTION:").to_string());
    Ok(1)
}

pub(super) fn goal(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    state.document.goal.push(after(cursor.text, "GOAL:").to_string());
    Ok(1)
}

// ============================================================================
// Declarations
// ============================================================================

/// `CLASS Name` followed by `key: value` property lines.
pub(super) fn class(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let name = headers::class_name(cursor.text).ok_or(LineError::MissingName { keyword: "CLASS" })?;

    let mut properties = IndexMap::new();
    let mut consumed = 1;
    for line in cursor.following {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || CLASS_STOPS.iter().any(|stop| line.starts_with(stop))
        {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            break;
        };
        // later duplicates overwrite in place
        properties.insert(key.trim().to_string(), value.trim().to_string());
        consumed += 1;
    }

    state.document.classes.push(ClassDef {
        name: name.to_string(),
        properties,
        line: cursor.line,
    });
    Ok(consumed)
}

/// `DEFINE FUNCTION name` followed by a body that may set TASK, ACTION and GOAL.
pub(super) fn function(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let name = headers::function_name(cursor.text).ok_or(LineError::MissingName {
        keyword: "DEFINE FUNCTION",
    })?;

    let mut def = FunctionDef {
        name: name.to_string(),
        task: None,
        action: None,
        goal: None,
        line: cursor.line,
    };

    let mut consumed = 1;
    for line in cursor.following {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("DEFINE FUNCTION") {
            break;
        }
        consumed += 1;
        if line.starts_with("END") {
            break;
        }
        if let Some(text) = line.strip_prefix("TASK:") {
            def.task = Some(text.trim().to_string());
        } else if let Some(text) = line.strip_prefix("ACTION:") {
            def.action = Some(text.trim().to_string());
        } else if let Some(text) = line.strip_prefix("GOAL:") {
            def.goal = Some(text.trim().to_string());
        }
    }

    state.document.functions.push(def);
    Ok(consumed)
}

// ============================================================================
// Calls
// ============================================================================

pub(super) fn call(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let (target, args) =
        headers::call(cursor.text).ok_or(LineError::MissingName { keyword: "CALL" })?;
    state.document.calls.push(CallSite {
        target: target.to_string(),
        args: args.to_string(),
        line: cursor.line,
    });
    Ok(1)
}

/// `CALL API <target> WITH <payload>`. A target containing `@` is an LLM
/// reference; anything else must be `service.endpoint`.
pub(super) fn call_api(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let (target, payload) = headers::call_api(cursor.text).ok_or(LineError::MissingWith)?;
    let split = state.config.mapping_split;

    let call = if let Some(at) = target.find('@') {
        ApiCall::LlmApi {
            reference: resolve(&target[at..], &[], split).reference,
            payload: parse_value(payload, split),
        }
    } else {
        let (service, endpoint) = target.split_once('.').ok_or_else(|| LineError::MissingEndpoint {
            target: target.to_string(),
        })?;
        ApiCall::Service {
            service: service.to_string(),
            endpoint: endpoint.to_string(),
            payload: parse_value(payload, split),
        }
    };

    state.document.api_calls.push(call);
    Ok(1)
}

/// An `@kind:identifier { params }` line, possibly spanning several lines.
pub(super) fn reference(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let resolved = resolve(cursor.text, cursor.following, state.config.mapping_split);

    if let Reference::Unknown { content } = &resolved.reference {
        let message = format!("unknown reference kind in '@{}'", content);
        state.warn(cursor, "W_UNKNOWN_REFERENCE", message);
    }
    if !resolved.closed {
        state.warn(cursor, "W_UNTERMINATED_BLOCK", "parameter block is never closed");
    }

    state.document.llm_references.push(resolved.reference);
    Ok(resolved.consumed)
}

// ============================================================================
// Blocks
// ============================================================================

pub(super) fn if_open(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let condition = headers::if_condition(cursor.text).ok_or(LineError::MissingThen)?;
    let condition = parse_condition(condition, state.config.operator_order);

    state.document.if_blocks.push(IfBlock::new(condition, cursor.line));
    state.block = CurrentBlock::IfThen;
    state.open(FrameKind::If, cursor);
    Ok(1)
}

/// Switches the open `IF` to its else branch. An `ELSE` with no open `IF`
/// is dropped, so a closed block never collects more lines.
pub(super) fn else_branch(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    if state.block == CurrentBlock::None {
        state.warn(cursor, "W_STRAY_ELSE", "ELSE without an open IF");
        return Ok(1);
    }
    state.block = CurrentBlock::IfElse;
    if let Some(block) = state.document.if_blocks.last_mut() {
        block.else_body.get_or_insert_with(String::new);
    }
    Ok(1)
}

pub(super) fn end(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    match state.stack.pop() {
        Some(frame) if frame.kind == FrameKind::If => state.block = CurrentBlock::None,
        Some(_) => {}
        None => state.warn(cursor, "W_UNBALANCED_END", "END without an open block"),
    }
    Ok(1)
}

/// `FOR EACH <variable> IN <collection> DO`. Later loops replace earlier ones.
/// With nothing after `DO` the loop is a block closed by `END`.
pub(super) fn for_each(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let (variable, collection, body) =
        headers::for_each(cursor.text).ok_or(LineError::MalformedForEach)?;

    state.document.for_loop = Some(ForLoop {
        variable: variable.to_string(),
        collection: collection.to_string(),
        line: cursor.line,
    });
    if body.is_empty() {
        state.open(FrameKind::ForEach, cursor);
    }
    Ok(1)
}

/// `ON ERROR` sets the error flag. The handler body is not captured.
pub(super) fn on_error(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    state.document.error_handling = true;
    if matches!(after(cursor.text, "ON ERROR"), "" | ":" | "DO") {
        state.open(FrameKind::OnError, cursor);
    }
    Ok(1)
}

// ============================================================================
// Loop Guards
// ============================================================================

/// `LOOPGUARD { max_depth: 3 }` or the inline `LOOPGUARD max_depth: 3, allow_repeat: false`.
pub(super) fn loop_guard(state: &mut ParseState, cursor: &Cursor<'_>) -> Consumed {
    let body = after(cursor.text, "LOOPGUARD");
    let body = body.strip_prefix(':').unwrap_or(body).trim();

    let (guard, consumed) = if body.contains('{') {
        let block = read_block(body, 0, cursor.following, state.config.mapping_split);
        if !block.closed {
            state.warn(cursor, "W_UNTERMINATED_BLOCK", "LOOPGUARD block is never closed");
        }
        let guard: LoopGuard = block
            .value
            .into_mapping()
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, coerce_bool(value)))
            .collect();
        (guard, block.consumed)
    } else {
        let guard: LoopGuard = body
            .split(',')
            .filter_map(|pair| pair.split_once(':'))
            .map(|(key, value)| (key.trim().to_string(), coerce_guard_value(value)))
            .collect();
        (guard, 1)
    };

    state.document.loop_guards.push(guard);
    Ok(consumed)
}

fn coerce_guard_value(text: &str) -> Value {
    match text.trim() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => coerce_scalar(other),
    }
}

fn coerce_bool(value: Value) -> Value {
    match value {
        Value::String(s) if s == "true" => Value::Bool(true),
        Value::String(s) if s == "false" => Value::Bool(false),
        other => other,
    }
}
