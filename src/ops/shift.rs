use serde_json::{Map, Value};

use super::target_allows_write;
use crate::accessor::{get, set};
use crate::path::Path;
use crate::shared::Shared;
use crate::{Error, Result};

/// Moves values from source paths into a new output object.
///
/// Spec shape: `target → source_path | [source_path, ...]`. The special
/// source `"$"` addresses the whole document. An array of sources wraps
/// each read in a singleton array; with several sources the last
/// resolved one wins the slot.
#[derive(Debug)]
pub(crate) struct Shift {
    map: ShiftMap,
}

impl Shift {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        Ok(Self {
            map: ShiftMap::compile(spec)?,
        })
    }

    pub(crate) fn apply(&self, doc: Value, require: bool, shared: &Shared) -> Result<Value> {
        let mut out = Value::Object(Map::new());
        self.map.apply_into(&doc, &mut out, require, shared)?;
        Ok(out)
    }
}

/// One shift-style mapping. Shared with the `steps` operation, whose
/// steps are each a map of this shape.
#[derive(Debug)]
pub(crate) struct ShiftMap {
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    target: Path,
    sources: Vec<Source>,
    /// Set when the spec value was an array of paths: each read is
    /// wrapped in a singleton JSON array before writing.
    wrap: bool,
}

#[derive(Debug)]
enum Source {
    /// `"$"`, the whole document.
    Document,
    Path(Path),
}

impl ShiftMap {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let map = spec
            .as_object()
            .ok_or_else(|| Error::spec("shift spec must be an object"))?;

        let mut entries = Vec::with_capacity(map.len());
        for (target, sources) in map {
            let (paths, wrap) = match sources {
                Value::String(path) => (vec![path.clone()], false),
                Value::Array(items) => {
                    let paths = items
                        .iter()
                        .map(|item| {
                            item.as_str().map(str::to_string).ok_or_else(|| {
                                Error::parse(format!(
                                    "unable to coerce element to a path string: {item}"
                                ))
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    (paths, true)
                }
                other => {
                    return Err(Error::parse(format!(
                        "unknown source type for key '{target}': {other}"
                    )))
                }
            };

            let sources = paths
                .into_iter()
                .map(|path| {
                    if path == "$" {
                        Ok(Source::Document)
                    } else {
                        Path::parse(&path).map(Source::Path)
                    }
                })
                .collect::<Result<Vec<_>>>()?;

            entries.push(Entry {
                target: Path::parse(target)?,
                sources,
                wrap,
            });
        }

        Ok(Self { entries })
    }

    /// Resolves every entry against `src` and writes into `out`.
    pub(crate) fn apply_into(
        &self,
        src: &Value,
        out: &mut Value,
        require: bool,
        shared: &Shared,
    ) -> Result<()> {
        for entry in &self.entries {
            if !target_allows_write(src, &entry.target, shared)? {
                continue;
            }

            for source in &entry.sources {
                let value = match source {
                    Source::Document => Some(src.clone()),
                    Source::Path(path) => get(src, path, require, &shared.registry)?,
                };
                let value = match value {
                    Some(value) => value,
                    None => continue,
                };

                let value = if entry.wrap {
                    Value::Array(vec![value])
                } else {
                    value
                };
                set(out, &entry.target.segments, value)?;
            }
        }
        Ok(())
    }
}
