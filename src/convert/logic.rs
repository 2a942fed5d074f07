use super::args_text;
use crate::registry::Converter;
use crate::value::JsonView;
use crate::Result;

/// Boolean negation; anything that is not a boolean reads as `false`.
pub struct Not;

impl Converter for Not {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        let view = JsonView::new(value)?;
        let out = match view.as_bool() {
            Some(b) => !b,
            None => false,
        };
        Ok(if out { b"true".to_vec() } else { b"false".to_vec() })
    }
}

/// `eqs text` — byte equality between the raw value and the argument
/// text. String values carry their quotes, so matching one takes
/// escaped quotes in the argument.
pub struct Eqs;

impl Converter for Eqs {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let expected = args_text(args)?;
        let out = value == expected.as_bytes();
        Ok(if out { b"true".to_vec() } else { b"false".to_vec() })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::convert::testutil::run;

    #[test]
    fn test_not() {
        assert_eq!(run(&Not, "true", "").unwrap(), "false");
        assert_eq!(run(&Not, "false", "").unwrap(), "true");
        assert_eq!(run(&Not, "\"str\"", "").unwrap(), "false");
    }

    #[test]
    fn test_eqs_on_numbers() {
        assert_eq!(run(&Eqs, "500", "500").unwrap(), "true");
        assert_eq!(run(&Eqs, "500", "501").unwrap(), "false");
    }

    #[test]
    fn test_eqs_compares_raw_bytes() {
        // string values keep their quotes on this side of the boundary
        assert_eq!(run(&Eqs, "\"abc\"", "\"abc\"").unwrap(), "true");
        assert_eq!(run(&Eqs, "\"abc\"", "abc").unwrap(), "false");
    }
}
