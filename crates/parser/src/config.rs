//! Parser configuration.
//!
//! The defaults select the corrected behaviors. The `Legacy` variants keep
//! the older observable output for inputs that depend on it.

/// Order in which comparison operators are tried inside an `IF` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorOrder {
    /// `CONTAINS, !=, <=, >=, =, <, >, IN`. Word operators must stand alone
    /// between whitespace.
    #[default]
    LongestFirst,
    /// `=, !=, <, >, <=, >=, IN, CONTAINS` as plain substrings. `a >= 5`
    /// splits on `=` under this order.
    Legacy,
}

/// How the body of a `{ ... }` mapping is split into `key: value` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingSplit {
    /// Split on commas outside nested `{}` and `[]`.
    #[default]
    DepthAware,
    /// Split on every comma.
    Legacy,
}

/// Options for a [`crate::TagScriptParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    pub operator_order: OperatorOrder,
    pub mapping_split: MappingSplit,
    /// Abort the parse on the first malformed line instead of skipping it.
    pub strict: bool,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both legacy orderings, matching the output of the first TagScript tool.
    pub fn legacy() -> Self {
        Self {
            operator_order: OperatorOrder::Legacy,
            mapping_split: MappingSplit::Legacy,
            strict: false,
        }
    }

    pub fn with_operator_order(mut self, order: OperatorOrder) -> Self {
        self.operator_order = order;
        self
    }

    pub fn with_mapping_split(mut self, split: MappingSplit) -> Self {
        self.mapping_split = split;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
