//! Reads `{ ... }` parameter blocks that may span several physical lines.

use super::values::parse_value;
use crate::ast::Value;
use crate::config::MappingSplit;

/// A parameter block read from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub value: Value,
    /// Physical lines claimed, counting the starting line. Always at least 1.
    pub consumed: usize,
    /// False when input ended before the braces balanced.
    pub closed: bool,
}

/// Open `{` and `[` counts while walking a block.
#[derive(Debug, Clone, Copy)]
struct Depth {
    braces: i32,
    brackets: i32,
}

impl Depth {
    fn feed(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '{' => self.braces += 1,
                '}' => self.braces -= 1,
                '[' => self.brackets += 1,
                ']' => self.brackets -= 1,
                _ => {}
            }
            if self.is_closed() {
                // the rest of the line is still captured
                return;
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.braces <= 0 && self.brackets <= 0
    }
}

/// Read the block opened by the first `{` at or after `offset` in `first`.
///
/// `following` holds the physical lines after `first`. Closing is detected
/// per line: the whole closing line is captured, trailing text included.
/// A block that never closes claims every remaining line.
///
/// Without a `{` the result is an empty mapping claiming one line.
pub fn read_block(first: &str, offset: usize, following: &[&str], split: MappingSplit) -> Block {
    let Some(open) = first.get(offset..).and_then(|tail| tail.find('{')) else {
        return Block {
            value: Value::empty_mapping(),
            consumed: 1,
            closed: true,
        };
    };

    let head = &first[offset + open + 1..];
    let mut depth = Depth {
        braces: 1,
        brackets: 0,
    };
    let mut captured = String::from(head);
    let mut consumed = 1;

    depth.feed(head);
    for line in following {
        if depth.is_closed() {
            break;
        }
        depth.feed(line);
        captured.push_str(line);
        consumed += 1;
    }

    let closed = depth.is_closed();
    let body = captured.trim_end();
    let body = body.strip_suffix('}').unwrap_or(body);
    let value = parse_value(&format!("{{{}}}", body), split);

    Block {
        value,
        consumed,
        closed,
    }
}
