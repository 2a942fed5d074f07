use serde_json::Value;

use super::target_allows_write;
use crate::accessor::set;
use crate::path::Path;
use crate::shared::Shared;
use crate::{Error, Result};

/// Writes literal values into the document. Spec shape:
/// `target → literal`; an existing value is overwritten. A conditional
/// target (`path ?`) that does not resolve skips its write.
#[derive(Debug)]
pub(crate) struct Defaults {
    entries: Vec<(Path, Value)>,
}

impl Defaults {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let map = spec
            .as_object()
            .ok_or_else(|| Error::spec("default spec must be an object"))?;

        let entries = map
            .iter()
            .map(|(target, literal)| Ok((Path::parse(target)?, literal.clone())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub(crate) fn apply(&self, mut doc: Value, _require: bool, shared: &Shared) -> Result<Value> {
        for (target, literal) in &self.entries {
            if !target_allows_write(&doc, target, shared)? {
                continue;
            }
            set(&mut doc, &target.segments, literal.clone())?;
        }
        Ok(doc)
    }
}
