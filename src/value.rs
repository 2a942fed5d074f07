use serde_json::Value;

use crate::{Error, Result};

/// Kind tag for a single JSON value.
///
/// Numbers keep the int/float distinction of their source token: a
/// fractional part or exponent makes a [`Kind::Float`], anything else a
/// [`Kind::Int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

/// Typed view over a raw byte slice holding exactly one JSON value.
///
/// The view never reformats its input: [`JsonView::raw`] hands back the
/// original bytes, so a value that is read and written elsewhere
/// round-trips byte-identically. Number tokens with leading-zero
/// anomalies (`-007`, `.5`) are normalized for *ingestion only* before
/// they are parsed.
#[derive(Debug, Clone)]
pub struct JsonView<'a> {
    raw: &'a [u8],
    kind: Kind,
    parsed: Value,
    precision: Option<usize>,
}

impl<'a> JsonView<'a> {
    /// Builds a view over `raw`. Fails with `ParseError` if the slice is
    /// not a single valid JSON value.
    pub fn new(raw: &'a [u8]) -> Result<Self> {
        let trimmed = trim_ascii(raw);
        if trimmed.is_empty() {
            return Err(Error::parse("empty value"));
        }

        let parsed: Value = match parse_lenient(trimmed) {
            Some(v) => v,
            None => {
                return Err(Error::parse(format!(
                    "not a valid JSON value: {}",
                    String::from_utf8_lossy(trimmed)
                )))
            }
        };

        let kind = match &parsed {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Kind::Int
                } else {
                    Kind::Float
                }
            }
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        };

        Ok(Self {
            raw,
            kind,
            parsed,
            precision: None,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.kind == Kind::Null
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind, Kind::Int | Kind::Float)
    }

    pub fn is_string(&self) -> bool {
        self.kind == Kind::String
    }

    pub fn as_int(&self) -> Option<i64> {
        self.parsed.as_i64()
    }

    /// Numeric value widened to a float; available for both number kinds.
    pub fn as_float(&self) -> Option<f64> {
        self.parsed.as_f64()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.parsed.as_bool()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.parsed.as_str()
    }

    /// The original slice, unchanged.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// The parsed form of the value.
    pub fn value(&self) -> &Value {
        &self.parsed
    }

    /// Overrides the digit count used when rendering a float back out.
    pub fn set_precision(&mut self, digits: usize) {
        self.precision = Some(digits);
    }

    /// Renders the value back to JSON text. Numbers keep their original
    /// digits unless a float precision override is set.
    pub fn to_json_string(&self) -> String {
        match self.kind {
            Kind::Float => {
                if let (Some(digits), Some(f)) = (self.precision, self.as_float()) {
                    return format!("{f:.digits$}");
                }
                String::from_utf8_lossy(trim_ascii(self.raw)).into_owned()
            }
            Kind::Int => String::from_utf8_lossy(trim_ascii(self.raw)).into_owned(),
            _ => self.parsed.to_string(),
        }
    }
}

fn trim_ascii(raw: &[u8]) -> &[u8] {
    let start = raw
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(raw.len());
    let end = raw
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|i| i + 1)
        .unwrap_or(start);
    &raw[start..end]
}

fn parse_lenient(trimmed: &[u8]) -> Option<Value> {
    if let Ok(v) = serde_json::from_slice(trimmed) {
        return Some(v);
    }
    let text = std::str::from_utf8(trimmed).ok()?;
    let normalized = normalize_number(text)?;
    serde_json::from_str(&normalized).ok()
}

/// Rewrites number tokens JSON itself rejects: `-007` becomes `-7`,
/// `-007.5` becomes `-7.5`, `.5` becomes `0.5`. Returns `None` for
/// anything that is not a plain number token.
fn normalize_number(text: &str) -> Option<String> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if digits.chars().filter(|c| *c == '.').count() > 1 {
        return None;
    }

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let int_part = {
        let stripped = int_part.trim_start_matches('0');
        if stripped.is_empty() {
            "0"
        } else {
            stripped
        }
    };

    Some(match frac_part {
        Some(f) => format!("{sign}{int_part}.{f}"),
        None => format!("{sign}{int_part}"),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(JsonView::new(b"null").unwrap().kind(), Kind::Null);
        assert_eq!(JsonView::new(b"true").unwrap().kind(), Kind::Bool);
        assert_eq!(JsonView::new(b"12").unwrap().kind(), Kind::Int);
        assert_eq!(JsonView::new(b"12.5").unwrap().kind(), Kind::Float);
        assert_eq!(JsonView::new(b"1e3").unwrap().kind(), Kind::Float);
        assert_eq!(JsonView::new(b"\"hi\"").unwrap().kind(), Kind::String);
    }

    #[test]
    fn test_typed_accessors() {
        //given
        let view = JsonView::new(b"42").unwrap();

        //then
        assert_eq!(view.as_int(), Some(42));
        assert_eq!(view.as_float(), Some(42.0));
        assert_eq!(view.as_bool(), None);
    }

    #[test]
    fn test_leading_zero_normalization() {
        assert_eq!(JsonView::new(b"-007").unwrap().as_int(), Some(-7));
        assert_eq!(JsonView::new(b"-007.5").unwrap().as_float(), Some(-7.5));
        assert_eq!(JsonView::new(b".5").unwrap().as_float(), Some(0.5));
    }

    #[test]
    fn test_raw_round_trip() {
        //given
        let raw = b"\"a \\\"quoted\\\" string\"";

        //when
        let view = JsonView::new(raw).unwrap();

        //then
        assert_eq!(view.raw(), raw);
        assert_eq!(view.as_str(), Some("a \"quoted\" string"));
    }

    #[test]
    fn test_number_rendering_preserves_digits() {
        let view = JsonView::new(b"1.500").unwrap();
        assert_eq!(view.to_json_string(), "1.500");
    }

    #[test]
    fn test_float_precision_override() {
        let mut view = JsonView::new(b"1.23456").unwrap();
        view.set_precision(2);
        assert_eq!(view.to_json_string(), "1.23");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(JsonView::new(b"").is_err());
        assert!(JsonView::new(b"{not json").is_err());
        assert!(JsonView::new(b"1.2.3").is_err());
    }
}
