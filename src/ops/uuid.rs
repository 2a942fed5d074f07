use serde_json::Value;
use uuid::Uuid;

use crate::accessor::{fetch, set, Fetched};
use crate::path::{parse_dotted, Segment};
use crate::{Error, Result};

/// Writes a UUID at each target. Spec shape: `target → {"version": V,
/// ...}`. Version 4 is random; versions 3 and 5 take a `namespace`
/// (`DNS`, `URL`, `OID`, `X500` or a UUID string) and a `names` list of
/// `{"path": P, "default": D}` entries folded into the UUID one after
/// another.
#[derive(Debug)]
pub(crate) struct UuidOp {
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    target: Vec<Segment>,
    version: Version,
}

#[derive(Debug)]
enum Version {
    V4,
    Named {
        v5: bool,
        namespace: Uuid,
        names: Vec<NameSource>,
    },
}

#[derive(Debug)]
struct NameSource {
    path: Vec<Segment>,
    default: Option<String>,
}

impl UuidOp {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let map = spec
            .as_object()
            .ok_or_else(|| Error::spec("uuid spec must be an object"))?;

        let mut entries = Vec::with_capacity(map.len());
        for (target, config) in map {
            let config = config
                .as_object()
                .ok_or_else(|| Error::spec("invalid spec for uuid"))?;

            let declared = config.get("version").and_then(Value::as_i64);
            let version = match declared {
                Some(4) => Version::V4,
                Some(3) | Some(5) => {
                    let namespace = config
                        .get("namespace")
                        .and_then(Value::as_str)
                        .ok_or_else(|| Error::spec("must provide `namespace` as a string"))?;
                    let names = config
                        .get("names")
                        .ok_or_else(|| Error::spec("must provide names field"))?
                        .as_array()
                        .ok_or_else(|| Error::spec("`names` field must be an array"))?;

                    let names = names
                        .iter()
                        .map(|field| {
                            let path = field
                                .get("path")
                                .and_then(Value::as_str)
                                .ok_or_else(|| Error::spec("name entry must have a path"))?;
                            Ok(NameSource {
                                path: parse_dotted(path)?,
                                default: field
                                    .get("default")
                                    .and_then(Value::as_str)
                                    .map(str::to_string),
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;

                    Version::Named {
                        v5: declared == Some(5),
                        namespace: namespace_from_str(namespace)?,
                        names,
                    }
                }
                _ => return Err(Error::spec("please set version 3 || 4 || 5")),
            };

            entries.push(Entry {
                target: parse_dotted(target)?,
                version,
            });
        }

        Ok(Self { entries })
    }

    pub(crate) fn apply(&self, mut doc: Value, _require: bool) -> Result<Value> {
        for entry in &self.entries {
            let uuid = match &entry.version {
                Version::V4 => Uuid::new_v4(),
                Version::Named {
                    v5,
                    namespace,
                    names,
                } => {
                    let mut uuid = *namespace;
                    for name in names {
                        let text = resolve_name(&doc, name)?;
                        uuid = if *v5 {
                            Uuid::new_v5(&uuid, text.as_bytes())
                        } else {
                            Uuid::new_v3(&uuid, text.as_bytes())
                        };
                    }
                    uuid
                }
            };
            set(&mut doc, &entry.target, Value::String(uuid.to_string()))?;
        }
        Ok(doc)
    }
}

// name paths always resolve as if required; the per-name default is the
// only fallback
fn resolve_name(doc: &Value, name: &NameSource) -> Result<String> {
    match fetch(doc, &name.path, true)? {
        Fetched::Found(Value::String(s)) => Ok(s),
        Fetched::Found(other) => Ok(other.to_string()),
        Fetched::Missing => name
            .default
            .clone()
            .ok_or_else(|| Error::spec("unable to get path or default")),
    }
}

fn namespace_from_str(namespace: &str) -> Result<Uuid> {
    match namespace {
        "DNS" => Ok(Uuid::NAMESPACE_DNS),
        "URL" => Ok(Uuid::NAMESPACE_URL),
        "OID" => Ok(Uuid::NAMESPACE_OID),
        "X500" => Ok(Uuid::NAMESPACE_X500),
        other => Uuid::parse_str(other).map_err(|_| {
            Error::spec("namespace is not a valid UUID or is not DNS, URL, OID, X500")
        }),
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    fn apply(spec: Value, doc: Value) -> Result<Value> {
        UuidOp::compile(&spec)?.apply(doc, false)
    }

    #[test]
    fn test_v4_generates_valid_uuid() {
        //given
        let spec = json!({"doc.uuid": {"version": 4}});

        //when
        let out = apply(spec, json!({"doc": {"id": 1}})).unwrap();

        //then
        let text = out.pointer("/doc/uuid").unwrap().as_str().unwrap();
        let parsed = Uuid::parse_str(text).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_v5_is_deterministic() {
        let spec = json!({
            "uuid": {
                "version": 5,
                "namespace": "DNS",
                "names": [{"path": "a"}, {"path": "b"}]
            }
        });
        let doc = json!({"a": "first", "b": "second"});

        let one = apply(spec.clone(), doc.clone()).unwrap();
        let two = apply(spec, doc).unwrap();
        assert_eq!(one.get("uuid"), two.get("uuid"));
    }

    #[test]
    fn test_v3_differs_from_v5() {
        let make = |version: u8| {
            apply(
                json!({
                    "uuid": {
                        "version": version,
                        "namespace": "URL",
                        "names": [{"path": "a"}]
                    }
                }),
                json!({"a": "value"}),
            )
            .unwrap()
        };
        assert_ne!(make(3).get("uuid"), make(5).get("uuid"));
    }

    #[test]
    fn test_missing_name_uses_default() {
        let spec = json!({
            "uuid": {
                "version": 5,
                "namespace": "DNS",
                "names": [{"path": "missing", "default": "fallback"}]
            }
        });
        let out = apply(spec, json!({"a": 1})).unwrap();
        assert!(out.get("uuid").unwrap().as_str().is_some());
    }

    #[test]
    fn test_missing_name_without_default() {
        let spec = json!({
            "uuid": {
                "version": 5,
                "namespace": "DNS",
                "names": [{"path": "missing"}]
            }
        });
        let err = apply(spec, json!({"a": 1})).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spec);
    }

    #[test]
    fn test_invalid_version() {
        let err = UuidOp::compile(&json!({"uuid": {"version": 7}})).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spec);
    }

    #[test]
    fn test_custom_namespace_uuid() {
        let spec = json!({
            "uuid": {
                "version": 5,
                "namespace": "e902893a-9d22-3c7e-a7b8-d6e313b71d9f",
                "names": [{"path": "a"}]
            }
        });
        assert!(apply(spec, json!({"a": "x"})).is_ok());
    }

    #[test]
    fn test_bad_namespace() {
        let err = UuidOp::compile(&json!({
            "uuid": {"version": 5, "namespace": "nope", "names": []}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spec);
    }
}
