use serde_json::{Map, Value};

use crate::accessor::{fetch, set, Fetched};
use crate::path::{parse_dotted, Segment};
use crate::{Error, Result};

/// Zips several equal-length arrays into one array of objects. Spec
/// shape: `target → [{"name": N, "array": A}, ...]`; element `i` of the
/// result is `{N1: A1[i], N2: A2[i], ...}`.
#[derive(Debug)]
pub(crate) struct Merge {
    entries: Vec<(Vec<Segment>, Vec<MergeSource>)>,
}

#[derive(Debug)]
struct MergeSource {
    name: String,
    array: Vec<Segment>,
}

impl Merge {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let map = spec
            .as_object()
            .ok_or_else(|| Error::spec("invalid spec for merge"))?;

        let mut entries = Vec::with_capacity(map.len());
        for (target, sources) in map {
            let sources = sources
                .as_array()
                .ok_or_else(|| Error::spec("invalid spec for merge"))?
                .iter()
                .map(|source| {
                    let name = source
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or_else(|| Error::spec("array spec missing name for merge"))?;
                    let array = source
                        .get("array")
                        .and_then(Value::as_str)
                        .ok_or_else(|| Error::spec("array spec missing array for merge"))?;
                    Ok(MergeSource {
                        name: name.to_string(),
                        array: parse_dotted(array)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            entries.push((parse_dotted(target)?, sources));
        }

        Ok(Self { entries })
    }

    pub(crate) fn apply(&self, mut doc: Value) -> Result<Value> {
        for (target, sources) in &self.entries {
            let mut columns: Vec<(String, Vec<Value>)> = Vec::with_capacity(sources.len());

            for source in sources {
                let values = match fetch(&doc, &source.array, true)? {
                    Fetched::Found(Value::Array(values)) => values,
                    Fetched::Found(_) => {
                        return Err(Error::spec("merge sources must be arrays"))
                    }
                    Fetched::Missing => return Err(Error::require("path does not exist")),
                };
                if let Some((_, first)) = columns.first() {
                    if first.len() != values.len() {
                        return Err(Error::spec("arrays must be the same length for merge"));
                    }
                }
                columns.push((source.name.clone(), values));
            }

            let length = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
            let mut out = Vec::with_capacity(length);
            for i in 0..length {
                let mut row = Map::new();
                for (name, values) in &columns {
                    row.insert(name.clone(), values[i].clone());
                }
                out.push(Value::Object(row));
            }

            set(&mut doc, target, Value::Array(out))?;
        }
        Ok(doc)
    }
}
