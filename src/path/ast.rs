use serde_json::Value;

use crate::expr::Expr;
use crate::Result;

/// Parsed form of a full path string:
/// `segments ( '?' conditional )? ( '|' converter )*`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    pub raw: String,
    pub segments: Vec<Segment>,
    pub conditional: Option<Conditional>,
    pub converters: Vec<ConverterCall>,
}

impl Path {
    pub(crate) fn parse(input: &str) -> Result<Self> {
        super::parser::parse(input)
    }

    /// True when the path carries the conditional marker, with or
    /// without a default.
    pub(crate) fn is_conditional(&self) -> bool {
        self.conditional.is_some()
    }
}

/// One dotted component with its optional array suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub key: String,
    pub index: IndexOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IndexOp {
    /// Plain object key.
    None,
    /// `key[N]`
    At(usize),
    /// `key[*]` fan-out.
    Wildcard,
    /// `key[+]`, write-side append.
    Append,
    /// `key[-]`, write-side prepend.
    Prepend,
}

/// The `? predicate : default` clause. Either half may be absent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Conditional {
    pub predicate: Predicate,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    /// Bare `?`, no gating expression.
    None,
    Expr(Expr),
    /// The predicate text did not parse. The path degrades to
    /// always-use-default, or skip when no default exists.
    Invalid,
}

/// One `| name args` stage of the converter pipeline. `args` holds the
/// trimmed, backslash-unescaped argument text; it is re-quoted as a JSON
/// string at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConverterCall {
    pub name: String,
    pub args: String,
}
