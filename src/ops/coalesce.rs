use serde_json::Value;

use crate::accessor::{get, set};
use crate::path::Path;
use crate::shared::Shared;
use crate::{Error, Result};

/// Checks source paths in order and assigns the first value outside the
/// ignore set. JSON `null` is always ignored. Spec shape:
/// `target → [source_path, ...]` plus an optional top-level `"ignore"`
/// list of literals. The operation rejects `require` at parse time.
#[derive(Debug)]
pub(crate) struct Coalesce {
    entries: Vec<(Path, Vec<Path>)>,
    ignore: Vec<Value>,
}

impl Coalesce {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let map = spec
            .as_object()
            .ok_or_else(|| Error::spec("coalesce spec must be an object"))?;

        let mut entries = Vec::new();
        let mut ignore = Vec::new();

        for (key, value) in map {
            if key == "ignore" {
                ignore = value
                    .as_array()
                    .cloned()
                    .ok_or_else(|| Error::spec("coalesce \"ignore\" must be an array"))?;
                continue;
            }

            let paths = value
                .as_array()
                .ok_or_else(|| {
                    Error::parse(format!("expected a list of paths for key '{key}'"))
                })?
                .iter()
                .map(|item| {
                    let path = item.as_str().ok_or_else(|| {
                        Error::parse(format!("unable to coerce element to a path string: {item}"))
                    })?;
                    Path::parse(path)
                })
                .collect::<Result<Vec<_>>>()?;

            entries.push((Path::parse(key)?, paths));
        }

        Ok(Self { entries, ignore })
    }

    pub(crate) fn apply(&self, mut doc: Value, shared: &Shared) -> Result<Value> {
        for (target, sources) in &self.entries {
            for source in sources {
                let value = match get(&doc, source, false, &shared.registry)? {
                    Some(value) => value,
                    None => continue,
                };
                if value.is_null() || self.ignore.contains(&value) {
                    continue;
                }
                set(&mut doc, &target.segments, value)?;
                break;
            }
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    fn shared() -> Shared {
        Shared {
            registry: crate::registry::Registry::new(),
            transforms: Default::default(),
        }
    }

    fn apply(spec: Value, doc: Value) -> Value {
        Coalesce::compile(&spec)
            .unwrap()
            .apply(doc, &shared())
            .unwrap()
    }

    #[test]
    fn test_first_present_value_wins() {
        //given
        let spec = json!({"foo": ["rating.foo", "rating.primary"]});
        let doc = json!({"rating": {"example": {"value": 3}, "primary": {"value": 3}}});

        //when
        let out = apply(spec, doc);

        //then
        assert_eq!(
            out,
            json!({
                "rating": {"example": {"value": 3}, "primary": {"value": 3}},
                "foo": {"value": 3}
            })
        );
    }

    #[test]
    fn test_no_match_leaves_document() {
        let spec = json!({"foo": ["a.b", "a.c"]});
        let doc = json!({"a": {"d": 1}});
        assert_eq!(apply(spec, doc.clone()), doc);
    }

    #[test]
    fn test_ignore_list_skips_values() {
        //given "" is ignored alongside null
        let spec = json!({"out": ["a.empty", "a.real"], "ignore": [""]});
        let doc = json!({"a": {"empty": "", "real": "kept"}});

        //when
        let out = apply(spec, doc);

        //then
        assert_eq!(out.get("out").unwrap(), &json!("kept"));
    }

    #[test]
    fn test_non_list_sources_rejected() {
        assert!(Coalesce::compile(&json!({"foo": "a.b"})).is_err());
    }
}
