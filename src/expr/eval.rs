use serde_json::Value;

use super::ast::{BinOp, Expr, Literal};
use crate::accessor::{fetch, Fetched};
use crate::registry::Registry;
use crate::value::JsonView;
use crate::{Error, Result};

/// Typed carrier for intermediate expression results. Arrays and objects
/// have no place in the expression language and are rejected on ingest.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Evaluates `expr` against `doc`. The top level must come out boolean.
pub(crate) fn eval_bool(expr: &Expr, doc: &Value, registry: &Registry) -> Result<bool> {
    match eval(expr, doc, registry)? {
        ExprValue::Bool(b) => Ok(b),
        other => Err(Error::spec(format!(
            "expression must evaluate to a boolean, got {other:?}"
        ))),
    }
}

fn eval(expr: &Expr, doc: &Value, registry: &Registry) -> Result<ExprValue> {
    match expr {
        Expr::Literal(lit) => Ok(match lit {
            Literal::Null => ExprValue::Null,
            Literal::Bool(b) => ExprValue::Bool(*b),
            Literal::Int(i) => ExprValue::Int(*i),
            Literal::Float(f) => ExprValue::Float(*f),
            Literal::Str(s) => ExprValue::Str(s.clone()),
        }),
        Expr::Path(segments) => match fetch(doc, segments, true)? {
            Fetched::Found(value) => ingest(&value),
            Fetched::Missing => Err(Error::spec(format!(
                "undefined identifier '{}'",
                join_segments(segments)
            ))),
        },
        Expr::Not(inner) => match eval(inner, doc, registry)? {
            ExprValue::Bool(b) => Ok(ExprValue::Bool(!b)),
            other => Err(Error::spec(format!(
                "'!' requires a boolean operand, got {other:?}"
            ))),
        },
        Expr::Binary { op, lhs, rhs } => {
            let left = eval(lhs, doc, registry)?;
            let right = eval(rhs, doc, registry)?;
            eval_binary(*op, left, right)
        }
        Expr::Call { name, args } => eval_call(name, args, doc, registry),
    }
}

fn eval_binary(op: BinOp, left: ExprValue, right: ExprValue) -> Result<ExprValue> {
    use ExprValue::*;

    match op {
        BinOp::And | BinOp::Or => match (left, right) {
            (Bool(l), Bool(r)) => Ok(Bool(if op == BinOp::And { l && r } else { l || r })),
            _ => Err(Error::spec("logical operators require boolean operands")),
        },
        BinOp::Eq | BinOp::Ne => {
            let eq = values_equal(&left, &right)?;
            Ok(Bool(if op == BinOp::Eq { eq } else { !eq }))
        }
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            let ord = values_ordering(&left, &right)?;
            Ok(Bool(match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Gt => ord.is_gt(),
                BinOp::Le => ord.is_le(),
                BinOp::Ge => ord.is_ge(),
                _ => unreachable!(),
            }))
        }
    }
}

/// Equality. Null compares against any kind and equals only null; other
/// operands must share a kind, except int/float which compare as numbers.
fn values_equal(left: &ExprValue, right: &ExprValue) -> Result<bool> {
    use ExprValue::*;

    Ok(match (left, right) {
        (Null, Null) => true,
        (Null, _) | (_, Null) => false,
        (Bool(l), Bool(r)) => l == r,
        (Int(l), Int(r)) => l == r,
        (Float(l), Float(r)) => l == r,
        (Int(l), Float(r)) | (Float(r), Int(l)) => (*l as f64) == *r,
        (Str(l), Str(r)) => l == r,
        _ => {
            return Err(Error::spec(
                "comparison operators require operands of the same kind",
            ))
        }
    })
}

fn values_ordering(left: &ExprValue, right: &ExprValue) -> Result<std::cmp::Ordering> {
    use ExprValue::*;

    let ord = match (left, right) {
        (Int(l), Int(r)) => l.partial_cmp(r),
        (Float(l), Float(r)) => l.partial_cmp(r),
        (Int(l), Float(r)) => (*l as f64).partial_cmp(r),
        (Float(l), Int(r)) => l.partial_cmp(&(*r as f64)),
        (Str(l), Str(r)) => l.partial_cmp(r),
        _ => {
            return Err(Error::spec(
                "ordering comparison requires two numbers or two strings",
            ))
        }
    };

    ord.ok_or_else(|| Error::spec("values are not comparable"))
}

/// `name(pathLiteral, args?)` — reads the value at the path, pipes it
/// through the named converter, and re-ingests the produced bytes.
fn eval_call(name: &str, args: &[Expr], doc: &Value, registry: &Registry) -> Result<ExprValue> {
    if args.is_empty() {
        return Err(Error::spec(format!(
            "converter call '{name}' expects a path string and optional arguments"
        )));
    }

    let mut evaluated = Vec::with_capacity(args.len());
    for arg in args {
        evaluated.push(eval(arg, doc, registry)?);
    }

    let path = match &evaluated[0] {
        ExprValue::Str(s) => s.clone(),
        _ => return Err(Error::spec("converter call expects a json path as string")),
    };
    let conv_args = match evaluated.get(1) {
        Some(ExprValue::Str(s)) => Some(s.clone()),
        Some(_) => {
            return Err(Error::spec(
                "converter call expects its arguments as string",
            ))
        }
        None => None,
    };

    let converter = registry
        .get(name)
        .ok_or_else(|| Error::spec(format!("unknown converter '{name}'")))?;

    let segments = crate::path::parse_dotted(&path)?;
    let value = match fetch(doc, &segments, true)? {
        Fetched::Found(value) => value,
        Fetched::Missing => {
            return Err(Error::spec(format!("undefined identifier '{path}'")))
        }
    };

    let doc_bytes = serde_json::to_vec(doc).map_err(|e| Error::parse(e.to_string()))?;
    let value_bytes = serde_json::to_vec(&value).map_err(|e| Error::parse(e.to_string()))?;
    let args_bytes = match conv_args {
        Some(text) if !text.is_empty() => {
            serde_json::to_vec(&Value::String(text)).map_err(|e| Error::parse(e.to_string()))?
        }
        _ => Vec::new(),
    };

    let out = converter.convert(&doc_bytes, &value_bytes, &args_bytes)?;
    ingest(JsonView::new(&out)?.value())
}

fn ingest(value: &Value) -> Result<ExprValue> {
    match value {
        Value::Null => Ok(ExprValue::Null),
        Value::Bool(b) => Ok(ExprValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ExprValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(ExprValue::Float(f))
            } else {
                Err(Error::parse(format!("number out of range: {n}")))
            }
        }
        Value::String(s) => Ok(ExprValue::Str(s.clone())),
        Value::Array(_) | Value::Object(_) => {
            Err(Error::spec("arrays and objects are not expression values"))
        }
    }
}

fn join_segments(segments: &[crate::path::Segment]) -> String {
    segments
        .iter()
        .map(|s| s.key.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    fn eval_str(expr: &str, doc: &Value) -> Result<bool> {
        let parsed = Expr::parse(expr).expect("parsed expression");
        eval_bool(&parsed, doc, &Registry::new())
    }

    #[test]
    fn test_int_path_comparison() {
        //given
        let doc = json!({"tests": {"test_int": 500}});

        //then
        assert_eq!(eval_str("tests.test_int == 500", &doc), Ok(true));
        assert_eq!(eval_str("tests.test_int != 500", &doc), Ok(false));
        assert_eq!(eval_str("tests.test_int > 499", &doc), Ok(true));
    }

    #[test]
    fn test_numeric_cross_kind_comparison() {
        let doc = json!({});
        assert_eq!(eval_str("50.0 == 50", &doc), Ok(true));
        assert_eq!(eval_str("49.5 < 50", &doc), Ok(true));
    }

    #[test]
    fn test_logical_ops_require_bools() {
        let doc = json!({});
        assert!(eval_str("1 && 1", &doc).is_err());
        assert_eq!(eval_str("true && false", &doc), Ok(false));
        assert_eq!(eval_str("true || false", &doc), Ok(true));
    }

    #[test]
    fn test_null_equality() {
        //given
        let doc = json!({"tests": {"test_null": null, "test_int": 1}});

        //then
        assert_eq!(
            eval_str("tests.test_null == null && tests.test_null == nil", &doc),
            Ok(true)
        );
        assert_eq!(eval_str("tests.test_int == null", &doc), Ok(false));
        assert_eq!(eval_str("tests.test_int != null", &doc), Ok(true));
    }

    #[test]
    fn test_null_ordering_is_error() {
        let doc = json!({"a": null});
        assert!(eval_str("a < 1", &doc).is_err());
    }

    #[test]
    fn test_undefined_identifier_is_error() {
        let doc = json!({"a": 1});
        assert!(eval_str("missing == 1", &doc).is_err());
    }

    #[test]
    fn test_string_comparison() {
        let doc = json!({"name": "abc"});
        assert_eq!(eval_str("name == \"abc\"", &doc), Ok(true));
        assert_eq!(eval_str("name < \"abd\"", &doc), Ok(true));
    }

    #[test]
    fn test_mismatched_kinds_error() {
        let doc = json!({"name": "abc"});
        assert!(eval_str("name == 5", &doc).is_err());
    }

    #[test]
    fn test_not_and_grouping() {
        let doc = json!({"a": 1, "b": 2});
        assert_eq!(eval_str("!(a == 1 && b == 3)", &doc), Ok(true));
    }

    #[test]
    fn test_top_level_must_be_bool() {
        let doc = json!({"a": 1});
        assert!(eval_str("a", &doc).is_err());
    }
}
