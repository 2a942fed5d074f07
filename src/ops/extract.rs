use serde_json::Value;

use crate::accessor::get;
use crate::path::Path;
use crate::shared::Shared;
use crate::{Error, Result};

/// Replaces the document with the subvalue at `path`.
#[derive(Debug)]
pub(crate) struct Extract {
    path: Path,
}

impl Extract {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let path = spec
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::spec("unable to get path"))?;
        Ok(Self {
            path: Path::parse(path)?,
        })
    }

    pub(crate) fn apply(&self, doc: Value, require: bool, shared: &Shared) -> Result<Value> {
        match get(&doc, &self.path, require, &shared.registry)? {
            Some(value) => Ok(value),
            // conditional skip leaves the document untouched
            None => Ok(doc),
        }
    }
}
