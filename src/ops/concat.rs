use serde_json::Value;

use crate::accessor::{get, set};
use crate::path::Path;
use crate::shared::Shared;
use crate::{Error, Result};

/// Joins string renderings of the sources with a delimiter and writes
/// the result to `targetPath`. Spec shape:
/// `{"sources": [{"path": P} | {"value": L}, ...], "targetPath": T,
/// "delim": D?}`. An array source contributes its elements back to back
/// with no delimiter between them.
#[derive(Debug)]
pub(crate) struct Concat {
    sources: Vec<Source>,
    target: Path,
    delim: String,
}

#[derive(Debug)]
enum Source {
    Literal(Value),
    Path(Path),
}

impl Concat {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let sources = spec
            .get("sources")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::spec("unable to get sources"))?;
        let target = spec
            .get("targetPath")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::spec("unable to get targetPath"))?;
        let delim = spec
            .get("delim")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let sources = sources
            .iter()
            .map(|item| {
                if let Some(value) = item.get("value") {
                    Ok(Source::Literal(value.clone()))
                } else if let Some(path) = item.get("path").and_then(Value::as_str) {
                    Ok(Source::Path(Path::parse(path)?))
                } else {
                    Err(Error::spec(format!(
                        "error processing {item}: must have either value or path specified"
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sources,
            target: Path::parse(target)?,
            delim,
        })
    }

    pub(crate) fn apply(&self, mut doc: Value, require: bool, shared: &Shared) -> Result<Value> {
        let mut out = String::new();

        for (pos, source) in self.sources.iter().enumerate() {
            if pos > 0 {
                out.push_str(&self.delim);
            }
            let piece = match source {
                Source::Literal(value) => render(value),
                Source::Path(path) => match get(&doc, path, require, &shared.registry)? {
                    Some(value) => render(&value),
                    // a skipped conditional source contributes nothing
                    None => String::new(),
                },
            };
            out.push_str(&piece);
        }

        set(&mut doc, &self.target.segments, Value::String(out))?;
        Ok(doc)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // array elements run together without a delimiter
        Value::Array(items) => items.iter().map(render).collect(),
        Value::Object(_) => value.to_string(),
    }
}
