//! Built-in converters. Each is a small value-level rewrite registered
//! under its pipe name by the default configuration.

mod logic;
mod mapped;
mod numbers;
mod pattern;
mod strings;

use serde_json::Value;

use crate::registry::Registry;
use crate::value::JsonView;
use crate::{Error, Result};

pub use mapped::Mapped;
pub use pattern::RegexReplace;

pub(crate) fn register_defaults(registry: &mut Registry) -> Result<()> {
    registry.register("add", Box::new(numbers::Add), b"")?;
    registry.register("mul", Box::new(numbers::Mul), b"")?;
    registry.register("div", Box::new(numbers::Div), b"")?;
    registry.register("ceil", Box::new(numbers::Ceil), b"")?;
    registry.register("floor", Box::new(numbers::Floor), b"")?;
    registry.register("round", Box::new(numbers::Round), b"")?;
    registry.register("float", Box::new(numbers::Float), b"")?;
    registry.register("ston", Box::new(numbers::Ston), b"")?;
    registry.register("ntos", Box::new(numbers::Ntos), b"")?;
    registry.register("len", Box::new(strings::Len), b"")?;
    registry.register("lower", Box::new(strings::Lower), b"")?;
    registry.register("upper", Box::new(strings::Upper), b"")?;
    registry.register("trim", Box::new(strings::Trim), b"")?;
    registry.register("substr", Box::new(strings::Substr), b"")?;
    registry.register("split", Box::new(strings::Split), b"")?;
    registry.register("splitn", Box::new(strings::Splitn), b"")?;
    registry.register("join", Box::new(strings::Join), b"")?;
    registry.register("format", Box::new(strings::Format), b"")?;
    registry.register("not", Box::new(logic::Not), b"")?;
    registry.register("eqs", Box::new(logic::Eqs), b"")?;
    registry.register("mapped", Box::new(Mapped::default()), b"")?;
    registry.register("regex", Box::new(RegexReplace::default()), b"")?;
    Ok(())
}

/// Parses the `args` bytes, which cross the converter boundary as a
/// JSON-quoted string. Empty args are a `ParseError` for converters
/// that need them.
fn args_text(args: &[u8]) -> Result<String> {
    if args.is_empty() {
        return Err(Error::parse("converter requires arguments"));
    }
    let view = JsonView::new(args)?;
    view.as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::parse("converter arguments must be a string"))
}

fn quote(text: &str) -> Vec<u8> {
    serde_json::to_vec(&Value::String(text.to_string())).expect("string serializes")
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::registry::Converter;

    /// Runs a converter over inline JSON text, quoting the args the way
    /// the path engine does.
    pub(crate) fn run(conv: &dyn Converter, value: &str, args: &str) -> Result<String> {
        let args_bytes = if args.is_empty() {
            Vec::new()
        } else {
            quote(args)
        };
        let out = conv.convert(b"{}", value.as_bytes(), &args_bytes)?;
        Ok(String::from_utf8(out).expect("utf8 output"))
    }
}
