use serde_json::Value;

use crate::accessor;
use crate::path::{IndexOp, Path};
use crate::{Error, Result};

/// Deletes each listed path in turn. Spec shape: `{"paths": [P, ...]}`.
/// Wildcards are rejected when the spec is compiled.
#[derive(Debug)]
pub(crate) struct Delete {
    paths: Vec<Path>,
}

impl Delete {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let paths = spec
            .get("paths")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::spec("unable to get paths to delete"))?;

        let paths = paths
            .iter()
            .map(|item| {
                let text = item.as_str().ok_or_else(|| {
                    Error::spec(format!("error processing {item}: path should be a string"))
                })?;
                let path = Path::parse(text)?;
                if path
                    .segments
                    .iter()
                    .any(|s| matches!(s.index, IndexOp::Wildcard))
                {
                    return Err(Error::spec("delete does not support wildcards"));
                }
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { paths })
    }

    pub(crate) fn apply(&self, mut doc: Value, require: bool) -> Result<Value> {
        for path in &self.paths {
            accessor::delete(&mut doc, &path.segments, require)?;
        }
        Ok(doc)
    }
}
