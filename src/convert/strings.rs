use regex::Regex;
use serde_json::Value;

use super::{args_text, quote};
use crate::registry::Converter;
use crate::value::JsonView;
use crate::{Error, Result};

fn string_value(value: &[u8]) -> Result<String> {
    JsonView::new(value)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::parse("value must be a string"))
}

/// Length of the string value, in bytes.
pub struct Len;

impl Converter for Len {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        let text = string_value(value)?;
        Ok(text.len().to_string().into_bytes())
    }
}

pub struct Lower;

impl Converter for Lower {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        Ok(quote(&string_value(value)?.to_lowercase()))
    }
}

pub struct Upper;

impl Converter for Upper {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        Ok(quote(&string_value(value)?.to_uppercase()))
    }
}

pub struct Trim;

impl Converter for Trim {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        let text = string_value(value)?;
        Ok(quote(text.trim_matches([' ', '\t'])))
    }
}

/// `substr start [end]` — character indices; `end` defaults to the end
/// of the string and clamps to its length.
pub struct Substr;

impl Converter for Substr {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let text = string_value(value)?;
        let args = args_text(args)?;

        let mut parts = args.split_whitespace();
        let start = parse_index(parts.next())?;
        let end = match parts.next() {
            Some(tok) => parse_index(Some(tok))?,
            None => text.chars().count(),
        };
        if parts.next().is_some() {
            return Err(Error::parse(format!("malformed substr arguments '{args}'")));
        }

        let end = end.min(text.chars().count());
        if start > end {
            return Err(Error::parse(format!(
                "substr start {start} is past end {end}"
            )));
        }

        let out: String = text.chars().skip(start).take(end - start).collect();
        Ok(quote(&out))
    }
}

fn parse_index(tok: Option<&str>) -> Result<usize> {
    tok.and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| Error::parse("substr expects non-negative integer indices"))
}

/// `split delim` — string to array of pieces.
pub struct Split;

impl Converter for Split {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let text = string_value(value)?;
        let delim = args_text(args)?;
        if delim.is_empty() {
            return Err(Error::parse("split requires a delimiter"));
        }

        let pieces: Vec<&str> = text.split(delim.as_str()).collect();
        serde_json::to_vec(&pieces).map_err(|e| Error::parse(e.to_string()))
    }
}

/// `splitn delim n` — the 1-based n-th piece after splitting, or `null`
/// when the string has fewer pieces.
pub struct Splitn;

impl Converter for Splitn {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let text = string_value(value)?;
        let args = args_text(args)?;

        let re = Regex::new(r"^(?s)(.+)\s+(\d+)\s*$").expect("static pattern");
        let caps = re
            .captures(&args)
            .ok_or_else(|| Error::parse(format!("malformed splitn arguments '{args}'")))?;
        let delim = caps.get(1).unwrap().as_str();
        let n: usize = caps[2]
            .parse()
            .map_err(|_| Error::parse("splitn index out of range"))?;
        if n == 0 {
            return Err(Error::parse("splitn index is 1-based"));
        }

        match text.split(delim).nth(n - 1) {
            Some(piece) => Ok(quote(piece)),
            None => Ok(b"null".to_vec()),
        }
    }
}

/// `join delim` — array of strings to a single string.
pub struct Join;

impl Converter for Join {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let pieces: Vec<String> = serde_json::from_slice(value)
            .map_err(|_| Error::parse("join expects an array of strings"))?;
        let delim = args_text(args)?;
        Ok(quote(&pieces.join(&delim)))
    }
}

/// `format pattern` — substitutes the single printf-style verb in the
/// pattern (`%s`, `%d`, `%f`, `%v`) with the value.
pub struct Format;

impl Converter for Format {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let view = JsonView::new(value)?;
        let pattern = args_text(args)?;

        let pos = pattern
            .find('%')
            .ok_or_else(|| Error::parse(format!("no verb in format pattern '{pattern}'")))?;
        let verb = pattern[pos + 1..]
            .chars()
            .next()
            .ok_or_else(|| Error::parse("dangling '%' in format pattern"))?;

        let rendered = match verb {
            's' => match view.as_str() {
                Some(s) => s.to_string(),
                None => view.to_json_string(),
            },
            'd' => view
                .as_int()
                .ok_or_else(|| Error::parse("%d requires an integer value"))?
                .to_string(),
            'f' => view
                .as_float()
                .ok_or_else(|| Error::parse("%f requires a numeric value"))?
                .to_string(),
            'v' => match view.value() {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            other => {
                return Err(Error::parse(format!(
                    "unsupported format verb '%{other}'"
                )))
            }
        };

        let mut out = String::with_capacity(pattern.len() + rendered.len());
        out.push_str(&pattern[..pos]);
        out.push_str(&rendered);
        out.push_str(&pattern[pos + 2..]);
        Ok(quote(&out))
    }
}
