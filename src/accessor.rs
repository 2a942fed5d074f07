use serde_json::{Map, Value};

use crate::expr::eval_bool;
use crate::path::{Conditional, ConverterCall, IndexOp, Path, Predicate, Segment};
use crate::registry::Registry;
use crate::value::JsonView;
use crate::{Error, Result};

/// Result of a raw segment walk. `Missing` is folded into the
/// require/conditional policy by [`get`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fetched {
    Found(Value),
    Missing,
}

/// Reads the value addressed by `path`, applying the full policy stack:
/// conditional predicate, missing-path handling, converter pipeline.
///
/// `Ok(None)` is the skip signal: the path was conditional with no
/// default and did not resolve, so the enclosing operation omits the
/// assignment. The signal outranks `require`.
pub(crate) fn get(
    doc: &Value,
    path: &Path,
    require: bool,
    registry: &Registry,
) -> Result<Option<Value>> {
    if let Some(cond) = &path.conditional {
        match &cond.predicate {
            Predicate::None => {}
            Predicate::Expr(expr) => {
                // evaluation errors read as "predicate is false"
                if !eval_bool(expr, doc, registry).unwrap_or(false) {
                    return Ok(cond.default.clone());
                }
            }
            Predicate::Invalid => return Ok(cond.default.clone()),
        }
    }

    match fetch(doc, &path.segments, require)? {
        Fetched::Found(value) => {
            let value = apply_converters(doc, value, &path.converters, registry)?;
            Ok(Some(value))
        }
        Fetched::Missing => match &path.conditional {
            Some(Conditional { default, .. }) => Ok(default.clone()),
            None if require => Err(Error::require(format!(
                "path does not exist: {}",
                path.raw.trim()
            ))),
            None => Ok(Some(Value::Null)),
        },
    }
}

/// Raw segment walk without conditional or converter handling.
///
/// Wildcard segments fan out over the named array: the tail path is
/// applied to each element and results collect into a new array in
/// source order. A missing wildcard array reads as an empty array unless
/// `require` is set, in which case absence propagates as `Missing`.
pub(crate) fn fetch(doc: &Value, segments: &[Segment], require: bool) -> Result<Fetched> {
    let mut current = doc;

    for (pos, segment) in segments.iter().enumerate() {
        match &segment.index {
            IndexOp::None => match current.get(&segment.key) {
                Some(next) => current = next,
                None => return Ok(Fetched::Missing),
            },
            IndexOp::At(idx) => {
                let next = current.get(&segment.key).and_then(|v| v.get(*idx));
                match next {
                    Some(next) => current = next,
                    None => return Ok(Fetched::Missing),
                }
            }
            IndexOp::Wildcard => {
                let elements = match current.get(&segment.key) {
                    Some(Value::Array(elements)) => elements,
                    Some(_) => return Ok(Fetched::Found(Value::Array(Vec::new()))),
                    None if require => return Ok(Fetched::Missing),
                    None => return Ok(Fetched::Found(Value::Array(Vec::new()))),
                };

                let tail = &segments[pos + 1..];
                let mut results = Vec::with_capacity(elements.len());
                for element in elements {
                    if tail.is_empty() {
                        results.push(element.clone());
                    } else {
                        match fetch(element, tail, require)? {
                            Fetched::Found(value) => results.push(value),
                            Fetched::Missing if require => return Ok(Fetched::Missing),
                            Fetched::Missing => results.push(Value::Null),
                        }
                    }
                }
                return Ok(Fetched::Found(Value::Array(results)));
            }
            IndexOp::Append | IndexOp::Prepend => {
                return Err(Error::parse(format!(
                    "append/prepend suffix is write-only: {}",
                    segment.key
                )))
            }
        }
    }

    Ok(Fetched::Found(current.clone()))
}

/// Left-to-right converter pipeline; each stage sees the previous
/// stage's output as raw JSON bytes.
fn apply_converters(
    doc: &Value,
    value: Value,
    calls: &[ConverterCall],
    registry: &Registry,
) -> Result<Value> {
    if calls.is_empty() {
        return Ok(value);
    }

    let doc_bytes = serde_json::to_vec(doc).map_err(|e| Error::parse(e.to_string()))?;
    let mut bytes = serde_json::to_vec(&value).map_err(|e| Error::parse(e.to_string()))?;

    for call in calls {
        let converter = registry
            .get(&call.name)
            .ok_or_else(|| Error::spec(format!("unknown converter '{}'", call.name)))?;
        let args = if call.args.is_empty() {
            Vec::new()
        } else {
            serde_json::to_vec(&Value::String(call.args.clone()))
                .map_err(|e| Error::parse(e.to_string()))?
        };
        bytes = converter.convert(&doc_bytes, &bytes, &args)?;
    }

    Ok(JsonView::new(&bytes)?.value().clone())
}

/// Writes `val` at the address described by `segments`, creating
/// intermediate objects and arrays as needed. Integer indices extend the
/// array with null fills, `[+]` appends, `[-]` prepends, `[*]`
/// overwrites every element.
pub(crate) fn set(doc: &mut Value, segments: &[Segment], val: Value) -> Result<()> {
    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            *doc = val;
            return Ok(());
        }
    };

    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    let map = doc.as_object_mut().unwrap();

    match &segment.index {
        IndexOp::None => {
            if rest.is_empty() {
                map.insert(segment.key.clone(), val);
            } else {
                let child = map.entry(segment.key.clone()).or_insert(Value::Null);
                set(child, rest, val)?;
            }
        }
        index => {
            let child = map
                .entry(segment.key.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if !child.is_array() {
                *child = Value::Array(Vec::new());
            }
            let arr = child.as_array_mut().unwrap();

            match index {
                IndexOp::At(idx) => {
                    if arr.len() <= *idx {
                        arr.resize(idx + 1, Value::Null);
                    }
                    if rest.is_empty() {
                        arr[*idx] = val;
                    } else {
                        set(&mut arr[*idx], rest, val)?;
                    }
                }
                IndexOp::Wildcard => {
                    for element in arr.iter_mut() {
                        if rest.is_empty() {
                            *element = val.clone();
                        } else {
                            set(element, rest, val.clone())?;
                        }
                    }
                }
                IndexOp::Append => {
                    arr.push(Value::Null);
                    let last = arr.last_mut().unwrap();
                    if rest.is_empty() {
                        *last = val;
                    } else {
                        set(last, rest, val)?;
                    }
                }
                IndexOp::Prepend => {
                    arr.insert(0, Value::Null);
                    if rest.is_empty() {
                        arr[0] = val;
                    } else {
                        set(&mut arr[0], rest, val)?;
                    }
                }
                IndexOp::None => unreachable!(),
            }
        }
    }

    Ok(())
}

/// Removes the addressed value. Wildcards are rejected; under `require`
/// a missing path is a `RequireError`, otherwise the delete is a no-op.
pub(crate) fn delete(doc: &mut Value, segments: &[Segment], require: bool) -> Result<()> {
    if segments
        .iter()
        .any(|s| matches!(s.index, IndexOp::Wildcard))
    {
        return Err(Error::spec("delete does not support wildcards"));
    }

    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };

    let missing = |require: bool, key: &str| {
        if require {
            Err(Error::require(format!("path does not exist: {key}")))
        } else {
            Ok(())
        }
    };

    if !rest.is_empty() {
        let next = match &segment.index {
            IndexOp::None => doc.get_mut(&segment.key),
            IndexOp::At(idx) => doc.get_mut(&segment.key).and_then(|v| v.get_mut(*idx)),
            _ => return Err(Error::spec("delete does not support append/prepend")),
        };
        return match next {
            Some(next) => delete(next, rest, require),
            None => missing(require, &segment.key),
        };
    }

    match &segment.index {
        IndexOp::None => {
            let map = match doc.as_object_mut() {
                Some(map) => map,
                None => return missing(require, &segment.key),
            };
            // shift_remove keeps the remaining keys in document order
            if map.shift_remove(&segment.key).is_none() {
                return missing(require, &segment.key);
            }
        }
        IndexOp::At(idx) => {
            let arr = match doc.get_mut(&segment.key).and_then(Value::as_array_mut) {
                Some(arr) => arr,
                None => return missing(require, &segment.key),
            };
            if *idx >= arr.len() {
                return missing(require, &segment.key);
            }
            arr.remove(*idx);
        }
        _ => return Err(Error::spec("delete does not support append/prepend")),
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    fn parse(path: &str) -> Path {
        Path::parse(path).expect("parsed path")
    }

    fn get_plain(doc: &Value, path: &str, require: bool) -> Result<Option<Value>> {
        get(doc, &parse(path), require, &Registry::new())
    }

    #[test]
    fn test_get_nested() {
        //given
        let doc = json!({"rating": {"primary": {"value": 3}}});

        //when
        let out = get_plain(&doc, "rating.primary.value", false).unwrap();

        //then
        assert_eq!(out, Some(json!(3)));
    }

    #[test]
    fn test_get_missing_substitutes_null() {
        let doc = json!({"a": 1});
        assert_eq!(get_plain(&doc, "a.b.c", false).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_get_missing_with_require_errors() {
        let doc = json!({"a": 1});
        let err = get_plain(&doc, "a.b.c", true).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Require);
    }

    #[test]
    fn test_get_indexed() {
        let doc = json!({"a": {"list": [10, 20, 30]}});
        assert_eq!(
            get_plain(&doc, "a.list[1]", false).unwrap(),
            Some(json!(20))
        );
    }

    #[test]
    fn test_wildcard_fans_out() {
        //given
        let doc = json!({"docs": [{"n": {"t": "one"}}, {"n": {"t": "two"}}]});

        //when
        let out = get_plain(&doc, "docs[*].n.t", false).unwrap();

        //then
        assert_eq!(out, Some(json!(["one", "two"])));
    }

    #[test]
    fn test_wildcard_on_empty_array() {
        let doc = json!({"docs": []});
        assert_eq!(get_plain(&doc, "docs[*]", false).unwrap(), Some(json!([])));
    }

    #[test]
    fn test_wildcard_on_missing_array() {
        let doc = json!({});
        // absent array reads as empty without require
        assert_eq!(get_plain(&doc, "docs[*]", false).unwrap(), Some(json!([])));
        assert!(get_plain(&doc, "docs[*]", true).is_err());
    }

    #[test]
    fn test_wildcard_missing_tail_under_require() {
        let doc = json!({"docs": [{"n": 1}, {"m": 2}]});
        assert_eq!(
            get_plain(&doc, "docs[*].n", false).unwrap(),
            Some(json!([1, null]))
        );
        assert!(get_plain(&doc, "docs[*].n", true).is_err());
    }

    #[test]
    fn test_conditional_skip_outranks_require() {
        let doc = json!({"a": 1});
        assert_eq!(get_plain(&doc, "a.b ?", true).unwrap(), None);
    }

    #[test]
    fn test_conditional_default_substitutes() {
        let doc = json!({"a": 1});
        assert_eq!(
            get_plain(&doc, "a.b ? 42", false).unwrap(),
            Some(json!(42))
        );
    }

    #[test]
    fn test_conditional_present_value_wins_over_default() {
        let doc = json!({"a": {"b": 7}});
        assert_eq!(get_plain(&doc, "a.b ? 42", false).unwrap(), Some(json!(7)));
    }

    #[test]
    fn test_false_predicate_uses_default() {
        let doc = json!({"a": {"b": 7}, "flag": false});
        assert_eq!(
            get_plain(&doc, "a.b ? flag == true : 0", false).unwrap(),
            Some(json!(0))
        );
    }

    #[test]
    fn test_false_predicate_without_default_skips() {
        let doc = json!({"a": {"b": 7}, "flag": false});
        assert_eq!(
            get_plain(&doc, "a.b ? flag == true :", false).unwrap(),
            None
        );
    }

    #[test]
    fn test_predicate_eval_error_reads_as_false() {
        // `1 && 1` is a typing error, so the default applies
        let doc = json!({"a": {"b": 7}});
        assert_eq!(
            get_plain(&doc, "a.b ? 1 && 1 : 9", false).unwrap(),
            Some(json!(9))
        );
    }

    #[test]
    fn test_set_creates_intermediates() {
        //given
        let mut doc = json!({});

        //when
        set(&mut doc, &parse("a.b.c").segments, json!(5)).unwrap();

        //then
        assert_eq!(doc, json!({"a": {"b": {"c": 5}}}));
    }

    #[test]
    fn test_set_index_extends_with_nulls() {
        let mut doc = json!({});
        set(&mut doc, &parse("a.list[2]").segments, json!(9)).unwrap();
        assert_eq!(doc, json!({"a": {"list": [null, null, 9]}}));
    }

    #[test]
    fn test_set_append_and_prepend() {
        let mut doc = json!({"a": {"list": [1, 2]}});
        set(&mut doc, &parse("a.list[+]").segments, json!(3)).unwrap();
        set(&mut doc, &parse("a.list[-]").segments, json!(0)).unwrap();
        assert_eq!(doc, json!({"a": {"list": [0, 1, 2, 3]}}));
    }

    #[test]
    fn test_set_wildcard_overwrites_all() {
        let mut doc = json!({"a": {"list": [1, 2, 3]}});
        set(&mut doc, &parse("a.list[*]").segments, json!(0)).unwrap();
        assert_eq!(doc, json!({"a": {"list": [0, 0, 0]}}));
    }

    #[test]
    fn test_delete_key_preserves_order() {
        //given
        let mut doc = json!({"a": 1, "b": 2, "c": 3});

        //when
        delete(&mut doc, &parse("b").segments, false).unwrap();

        //then
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_delete_array_element_shifts() {
        let mut doc = json!({"list": [{"id": "a"}, {"id": "b"}, {"id": "c"}]});
        delete(&mut doc, &parse("list[1]").segments, false).unwrap();
        assert_eq!(doc, json!({"list": [{"id": "a"}, {"id": "c"}]}));
    }

    #[test]
    fn test_delete_missing_respects_require() {
        let mut doc = json!({"a": 1});
        assert!(delete(&mut doc, &parse("b").segments, false).is_ok());
        assert!(delete(&mut doc, &parse("b").segments, true).is_err());
    }

    #[test]
    fn test_delete_wildcard_is_spec_error() {
        let mut doc = json!({"list": [1, 2]});
        let err = delete(&mut doc, &parse("list[*]").segments, false).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spec);
    }
}
