use serde_json::Value;

use super::ast::{Conditional, ConverterCall, IndexOp, Path, Predicate, Segment};
use crate::expr::Expr;
use crate::{Error, Result};

pub(crate) fn parse(input: &str) -> Result<Path> {
    let tokens = split_pipes(input);
    let head = tokens.first().map(String::as_str).unwrap_or("");

    let (path_part, conditional) = match find_unquoted(head, '?') {
        Some(idx) => {
            let remainder = &head[idx + 1..];
            (&head[..idx], Some(parse_conditional(remainder)?))
        }
        None => (head, None),
    };

    let segments = parse_dotted(&unescape_pipes(path_part))?;

    let converters = tokens[1..]
        .iter()
        .map(|tok| parse_converter(tok))
        .collect::<Result<Vec<_>>>()?;

    Ok(Path {
        raw: input.to_string(),
        segments,
        conditional,
        converters,
    })
}

/// Splits a dotted path into segments, validating array suffixes.
/// Shared with the expression evaluator and the `over` modifier, which
/// use the segment syntax without conditionals or converters.
pub(crate) fn parse_dotted(path: &str) -> Result<Vec<Segment>> {
    let path = path.trim();
    if path.is_empty() {
        return Err(Error::parse("empty path"));
    }

    path.split('.').map(parse_segment).collect()
}

fn parse_segment(component: &str) -> Result<Segment> {
    let component = component.trim();

    let (key, suffix) = match component.find('[') {
        Some(open) => {
            let close = component
                .rfind(']')
                .filter(|end| *end == component.len() - 1)
                .ok_or_else(|| {
                    Error::parse(format!("unterminated array suffix in '{component}'"))
                })?;
            (&component[..open], Some(&component[open + 1..close]))
        }
        None => (component, None),
    };

    if key.is_empty() {
        return Err(Error::parse(format!("empty key in path component '{component}'")));
    }

    let index = match suffix {
        None => IndexOp::None,
        Some("*") => IndexOp::Wildcard,
        Some("+") => IndexOp::Append,
        Some("-") => IndexOp::Prepend,
        Some(num) => {
            if num.starts_with('-') {
                return Err(Error::parse(format!("negative array index '{num}'")));
            }
            let idx = num
                .parse::<usize>()
                .map_err(|_| Error::parse(format!("invalid array index '{num}'")))?;
            IndexOp::At(idx)
        }
    };

    Ok(Segment {
        key: key.to_string(),
        index,
    })
}

fn parse_conditional(remainder: &str) -> Result<Conditional> {
    match find_unquoted(remainder, ':') {
        Some(idx) => {
            let predicate_text = remainder[..idx].trim();
            let default_text = &remainder[idx + 1..];

            let predicate = if predicate_text.is_empty() {
                Predicate::None
            } else {
                match Expr::parse(predicate_text) {
                    Ok(expr) => Predicate::Expr(expr),
                    Err(_) => Predicate::Invalid,
                }
            };

            Ok(Conditional {
                predicate,
                default: parse_default(default_text),
            })
        }
        None => Ok(Conditional {
            predicate: Predicate::None,
            default: parse_default(remainder),
        }),
    }
}

/// A default is a JSON literal; bare words fall back to a plain string
/// so `path ? fallback` works without inner quoting.
fn parse_default(text: &str) -> Option<Value> {
    let text = unescape(text.trim());
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(text)),
    }
}

fn parse_converter(token: &str) -> Result<ConverterCall> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::parse("empty converter in pipeline"));
    }

    let (name, args) = match token.find(char::is_whitespace) {
        Some(idx) => (&token[..idx], token[idx..].trim()),
        None => (token, ""),
    };

    Ok(ConverterCall {
        name: name.to_string(),
        args: unescape(args),
    })
}

/// Splits on `|`, except a pipe preceded by an odd number of backslashes
/// or one half of a doubled `||` (a logical-or inside a predicate).
fn split_pipes(input: &str) -> Vec<String> {
    let mut tokens = vec![String::new()];
    let mut chars = input.chars().peekable();
    let mut backslashes = 0usize;

    while let Some(c) = chars.next() {
        if c == '|' {
            if backslashes % 2 == 1 {
                tokens.last_mut().unwrap().push(c);
            } else if chars.peek() == Some(&'|') {
                chars.next();
                tokens.last_mut().unwrap().push_str("||");
            } else {
                tokens.push(String::new());
            }
            backslashes = 0;
        } else {
            backslashes = if c == '\\' { backslashes + 1 } else { 0 };
            tokens.last_mut().unwrap().push(c);
        }
    }

    tokens
}

/// Index of the first unquoted occurrence of `needle`.
fn find_unquoted(haystack: &str, needle: char) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in haystack.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            _ if c == needle && !in_string => return Some(idx),
            _ => {}
        }
    }

    None
}

/// Folds `\c` to `c`.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Folds only `\|`, leaving other escapes for later stages.
fn unescape_pipes(text: &str) -> String {
    text.replace("\\|", "|")
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_parse_plain_segments() {
        //given
        let path = Path::parse("a.b.c").unwrap();

        //then
        assert_eq!(path.segments.len(), 3);
        assert_eq!(path.segments[1].key, "b");
        assert!(path.conditional.is_none());
        assert!(path.converters.is_empty());
    }

    #[test]
    fn test_parse_array_suffixes() {
        let path = Path::parse("a[0].b[*].c[+].d[-]").unwrap();
        let ops: Vec<_> = path.segments.iter().map(|s| s.index.clone()).collect();
        assert_eq!(
            ops,
            vec![
                IndexOp::At(0),
                IndexOp::Wildcard,
                IndexOp::Append,
                IndexOp::Prepend
            ]
        );
    }

    #[test]
    fn test_negative_index_is_parse_error() {
        assert!(Path::parse("a[-1]").is_err());
        assert!(Path::parse("a[x]").is_err());
        assert!(Path::parse("a[0").is_err());
    }

    #[test]
    fn test_bare_conditional() {
        //given
        let path = Path::parse("a.b ?").unwrap();

        //then
        let cond = path.conditional.expect("conditional clause");
        assert_eq!(cond.predicate, Predicate::None);
        assert_eq!(cond.default, None);
    }

    #[test]
    fn test_conditional_with_default_literal() {
        let path = Path::parse("a.b ? 5").unwrap();
        let cond = path.conditional.unwrap();
        assert_eq!(cond.default, Some(json!(5)));
    }

    #[test]
    fn test_conditional_with_string_fallback() {
        // an unquoted default degrades to a plain string
        let path = Path::parse("a.b ? missing").unwrap();
        assert_eq!(path.conditional.unwrap().default, Some(json!("missing")));
    }

    #[test]
    fn test_conditional_with_predicate_and_default() {
        let path = Path::parse("a.b ? a.c == 1 : \"dflt\"").unwrap();
        let cond = path.conditional.unwrap();
        assert!(matches!(cond.predicate, Predicate::Expr(_)));
        assert_eq!(cond.default, Some(json!("dflt")));
    }

    #[test]
    fn test_conditional_predicate_without_default() {
        let path = Path::parse("a.b ? a.c == 1 :").unwrap();
        let cond = path.conditional.unwrap();
        assert!(matches!(cond.predicate, Predicate::Expr(_)));
        assert_eq!(cond.default, None);
    }

    #[test]
    fn test_unparseable_predicate_degrades() {
        let path = Path::parse("a.b ? ((( : 7").unwrap();
        let cond = path.conditional.unwrap();
        assert_eq!(cond.predicate, Predicate::Invalid);
        assert_eq!(cond.default, Some(json!(7)));
    }

    #[test]
    fn test_converter_pipeline() {
        //given
        let path = Path::parse("a.b | lower | substr 0 3").unwrap();

        //then
        assert_eq!(
            path.converters,
            vec![
                ConverterCall {
                    name: "lower".into(),
                    args: "".into()
                },
                ConverterCall {
                    name: "substr".into(),
                    args: "0 3".into()
                },
            ]
        );
    }

    #[test]
    fn test_double_pipe_does_not_split() {
        let path = Path::parse("a.b ? a.c == 1 || a.d == 2 : 0").unwrap();
        assert!(path.converters.is_empty());
        assert!(matches!(
            path.conditional.unwrap().predicate,
            Predicate::Expr(_)
        ));
    }

    #[test]
    fn test_escaped_pipe_does_not_split() {
        let path = Path::parse("a\\|b.c").unwrap();
        assert_eq!(path.segments[0].key, "a|b");
        assert!(path.converters.is_empty());
    }

    #[test]
    fn test_converter_args_unescaped() {
        let path = Path::parse("a.b | eqs \\c").unwrap();
        assert_eq!(path.converters[0].args, "c");
    }
}
