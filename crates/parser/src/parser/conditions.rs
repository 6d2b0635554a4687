//! `IF` condition parsing.
//!
//! Conditions are split rather than parsed with precedence: the first
//! logical connective found splits the text once, and each side is parsed
//! again. Without a connective the text is tried as a comparison, then as a
//! function call, and otherwise kept raw.

use crate::ast::{CompareOp, ConditionNode, LogicalOp};
use crate::config::OperatorOrder;
use crate::headers;

/// Connectives in the order they are tried.
const LOGICAL: [(&str, LogicalOp); 3] = [
    (" AND ", LogicalOp::And),
    (" OR ", LogicalOp::Or),
    (" NOT ", LogicalOp::Not),
];

const LEGACY_ORDER: [CompareOp; 8] = [
    CompareOp::Eq,
    CompareOp::Ne,
    CompareOp::Lt,
    CompareOp::Gt,
    CompareOp::Le,
    CompareOp::Ge,
    CompareOp::In,
    CompareOp::Contains,
];

const LONGEST_FIRST_ORDER: [CompareOp; 8] = [
    CompareOp::Contains,
    CompareOp::Ne,
    CompareOp::Le,
    CompareOp::Ge,
    CompareOp::Eq,
    CompareOp::Lt,
    CompareOp::Gt,
    CompareOp::In,
];

/// Parse the text between `IF` and `THEN`.
pub fn parse_condition(text: &str, order: OperatorOrder) -> ConditionNode {
    let text = text.trim();

    for (needle, operator) in LOGICAL {
        if let Some((left, right)) = text.split_once(needle) {
            let right = right.trim();
            return ConditionNode::Logical {
                operator,
                left: Box::new(parse_condition(left, order)),
                right: (!right.is_empty()).then(|| Box::new(parse_condition(right, order))),
            };
        }
    }

    if let Some(rest) = text.strip_prefix("NOT ") {
        return ConditionNode::Logical {
            operator: LogicalOp::Not,
            left: Box::new(parse_condition(rest, order)),
            right: None,
        };
    }

    if let Some(node) = comparison(text, order) {
        return node;
    }

    if let Some((name, args)) = headers::function_call(text) {
        let args = args
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(str::to_string)
            .collect();
        return ConditionNode::FunctionCall {
            name: name.to_string(),
            args,
        };
    }

    ConditionNode::raw(text)
}

fn comparison(text: &str, order: OperatorOrder) -> Option<ConditionNode> {
    let operators = match order {
        OperatorOrder::LongestFirst => &LONGEST_FIRST_ORDER,
        OperatorOrder::Legacy => &LEGACY_ORDER,
    };

    operators.iter().find_map(|&operator| {
        let needle = match (order, operator.is_word()) {
            (OperatorOrder::LongestFirst, true) => format!(" {} ", operator.as_str()),
            _ => operator.as_str().to_string(),
        };
        let parts: Vec<&str> = text.split(needle.as_str()).collect();
        match parts.as_slice() {
            [left, right] => Some(ConditionNode::comparison(left.trim(), operator, right.trim())),
            _ => None,
        }
    })
}
