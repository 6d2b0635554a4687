//! `@` reference resolution.

use super::span::read_block;
use super::values::strip_quotes;
use crate::ast::Reference;
use crate::config::MappingSplit;

/// A resolved reference and how many lines it claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub reference: Reference,
    pub consumed: usize,
    /// False when a parameter block ran to the end of input.
    pub closed: bool,
}

#[derive(Clone, Copy)]
enum Kind {
    Tool,
    File,
    Project,
    Database,
}

const PREFIXES: [(&str, Kind); 4] = [
    ("tool:", Kind::Tool),
    ("file:", Kind::File),
    ("project:", Kind::Project),
    ("db:", Kind::Database),
];

/// Resolve an `@kind:identifier { params }` annotation.
///
/// `text` is the reference line with or without its leading `@`; `following`
/// are the lines after it, available to a multi-line parameter block.
pub fn resolve(text: &str, following: &[&str], split: MappingSplit) -> Resolved {
    let body = text.trim();
    let body = body.strip_prefix('@').unwrap_or(body);

    let Some((kind, rest)) = PREFIXES
        .iter()
        .find_map(|&(prefix, kind)| body.strip_prefix(prefix).map(|rest| (kind, rest)))
    else {
        return Resolved {
            reference: Reference::Unknown {
                content: body.to_string(),
            },
            consumed: 1,
            closed: true,
        };
    };

    let (identifier, parameters, consumed, closed) = match rest.find('{') {
        Some(open) => {
            let block = read_block(rest, open, following, split);
            (&rest[..open], Some(block.value), block.consumed, block.closed)
        }
        None => (rest, None, 1, true),
    };
    let identifier = identifier.trim();

    let reference = match kind {
        Kind::Tool => Reference::Tool {
            tool: identifier.to_string(),
            parameters,
        },
        Kind::File => Reference::File {
            path: strip_quotes(identifier).to_string(),
            parameters,
        },
        Kind::Project => Reference::Project {
            project: identifier.to_string(),
            parameters,
        },
        Kind::Database => Reference::Database {
            database: identifier.to_string(),
            parameters,
        },
    };

    Resolved {
        reference,
        consumed,
        closed,
    }
}
