use serde_json::{Map, Value};

use super::shift::ShiftMap;
use crate::shared::Shared;
use crate::{Error, Result};

/// A sequence of shift-style maps applied one after another. The first
/// step reads the input document; every later step reads the output
/// accumulated so far, so steps can build on each other's writes.
#[derive(Debug)]
pub(crate) struct Steps {
    steps: Vec<ShiftMap>,
}

impl Steps {
    pub(crate) fn compile(spec: &Value) -> Result<Self> {
        let steps = spec
            .get("steps")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::spec("unable to get steps"))?;

        let steps = steps
            .iter()
            .map(ShiftMap::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { steps })
    }

    pub(crate) fn apply(&self, doc: Value, require: bool, shared: &Shared) -> Result<Value> {
        let mut out = Value::Object(Map::new());
        let mut read = doc;

        for step in &self.steps {
            step.apply_into(&read, &mut out, require, shared)?;
            read = out.clone();
        }

        Ok(out)
    }
}
